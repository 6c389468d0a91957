// SPDX-FileCopyrightText: 2026 Balloon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the exchange engine, storage backends and channel adapters.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Opaque user identity: the platform name and the platform-native id joined by a space.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub String);

impl UserId {
    /// Composes an identity from a platform name and its native user id.
    pub fn new(platform: &str, native_id: impl fmt::Display) -> Self {
        Self(format!("{platform} {native_id}"))
    }

    /// The platform-native part of the identity.
    pub fn native_id(&self) -> &str {
        self.0.split_once(' ').map_or(self.0.as_str(), |(_, id)| id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A derived channel key: the canonical, space-joined hashtag set of a message.
///
/// Two messages are in the same channel iff their keys are byte-equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Channel(pub String);

impl Channel {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterates the individual tags of the channel key.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.0.split(' ').filter(|t| !t.is_empty())
    }

    /// Renders the channel as hashtags, e.g. `#fr #paris`.
    pub fn to_hashtags(&self) -> String {
        self.tags()
            .map(|t| format!("#{t}"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier for a stored message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier for a reply thread.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThreadId(pub String);

impl ThreadId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    Storage,
}

/// Outcome of a conditionally-guarded store mutation.
///
/// A failed guard is a control-flow signal (quota exhausted, already claimed),
/// never an error. Store failures travel separately as `Err(BalloonError)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conditional<T> {
    /// The guard held and the mutation was applied.
    Applied(T),
    /// The guard did not hold; nothing was written.
    GuardFailed,
}

impl<T> Conditional<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    pub fn applied(self) -> Option<T> {
        match self {
            Self::Applied(v) => Some(v),
            Self::GuardFailed => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Conditional<U> {
        match self {
            Self::Applied(v) => Conditional::Applied(f(v)),
            Self::GuardFailed => Conditional::GuardFailed,
        }
    }
}

/// Read consistency requested from the store.
///
/// Backends without replication lag may serve both the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ReadConsistency {
    /// May miss writes that completed shortly before the read.
    Eventual,
    /// Observes every write that completed before the read started.
    Strong,
}

/// Per-user pending question, routing the next freeform message.
///
/// Serialized as `{"name": ..., "params": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", content = "params", rename_all = "snake_case")]
pub enum Question {
    /// The next message is a new message for its channel.
    NewMessage,
    /// The next message is a reply on the given thread.
    Reply { thread: ThreadId },
}

/// A user record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub created_at: DateTime<Utc>,
    /// Remaining send credits. Never negative.
    pub credits: u32,
    /// Time of the last debit or replenishment.
    pub credits_updated_at: DateTime<Utc>,
    pub pending_question: Option<Question>,
    /// True until the user's first message is accepted.
    pub first_send: bool,
}

impl User {
    /// A fresh user record as created on first interaction.
    pub fn new(id: UserId, now: DateTime<Utc>, initial_credits: u32) -> Self {
        Self {
            id,
            created_at: now,
            credits: initial_credits,
            credits_updated_at: now,
            pending_question: None,
            first_send: true,
        }
    }
}

/// A stored message.
///
/// Channel messages carry a sequence number; replies carry `reply_to` instead.
/// `delivered_to` and `credit_returned` are the only fields mutated after
/// creation, each exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub channel: Channel,
    pub sequence: Option<u64>,
    pub sender: UserId,
    pub display_name: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub delivered_to: Option<UserId>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub reply_to: Option<MessageId>,
    pub credit_returned: bool,
}

/// A reply-capable link between a delivered message and its recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyThread {
    pub id: ThreadId,
    /// Set once, by the first reply attempt.
    pub claimed: bool,
    /// Author of the message the thread was opened for.
    pub sender: UserId,
    /// The only participant allowed to reply.
    pub recipient: UserId,
    pub message_id: MessageId,
    pub reply_message_id: Option<MessageId>,
    pub created_at: DateTime<Utc>,
    pub claimed_at: Option<DateTime<Utc>>,
}

/// Activity summary of one channel, as kept by its sequence counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelActivity {
    pub channel: Channel,
    /// All-time number of accepted messages in the channel.
    pub sequence: u64,
    pub last_message_day: NaiveDate,
    pub last_message_at: DateTime<Utc>,
}

// --- Adapter boundary ---

/// A slash-command typed by a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingCommand {
    pub user: UserId,
    pub text: String,
}

/// A freeform text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub user: UserId,
    pub display_name: String,
    pub text: String,
    /// Thread the user replied to natively on their platform, if any.
    pub reply_to: Option<ThreadId>,
}

/// A button press carrying an opaque command payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingButtonCallback {
    pub user: UserId,
    pub payload: String,
    /// Platform id of the message the button was attached to.
    pub original_message: Option<String>,
}

/// An inbound event produced by a channel adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncomingEvent {
    Command(IncomingCommand),
    Message(IncomingMessage),
    ButtonCallback(IncomingButtonCallback),
}

impl IncomingEvent {
    pub fn user(&self) -> &UserId {
        match self {
            Self::Command(c) => &c.user,
            Self::Message(m) => &m.user,
            Self::ButtonCallback(b) => &b.user,
        }
    }
}

/// A button attached to an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    /// Opaque command sent back as a button callback payload.
    pub command: String,
}

impl Button {
    pub fn new(label: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            command: command.into(),
        }
    }
}

/// A message the core asks an adapter to deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub recipient: UserId,
    pub text: String,
    pub buttons: Vec<Button>,
    /// Thread a native platform reply to this message should be mapped onto.
    pub thread: Option<ThreadId>,
    /// Whether `text` uses Markdown formatting.
    pub markdown: bool,
}

impl OutgoingMessage {
    pub fn new(recipient: UserId, text: impl Into<String>) -> Self {
        Self {
            recipient,
            text: text.into(),
            buttons: Vec::new(),
            thread: None,
            markdown: false,
        }
    }

    pub fn with_buttons(mut self, buttons: Vec<Button>) -> Self {
        self.buttons = buttons;
        self
    }

    pub fn with_thread(mut self, thread: ThreadId) -> Self {
        self.thread = Some(thread);
        self
    }

    pub fn markdown(mut self) -> Self {
        self.markdown = true;
        self
    }
}
