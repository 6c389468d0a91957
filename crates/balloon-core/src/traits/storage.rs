// SPDX-FileCopyrightText: 2026 Balloon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for persistence backends (SQLite, in-memory).

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::error::BalloonError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    Channel, ChannelActivity, Conditional, Message, MessageId, Question, ReadConsistency,
    ReplyThread, ThreadId, User, UserId,
};

/// Adapter for the backing store of the exchange.
///
/// Every mutation that coordinates concurrent events is a single,
/// conditionally-guarded record update. A guard that does not hold is
/// reported as [`Conditional::GuardFailed`]; `Err` is reserved for store
/// failures. Implementations must not rely on client-side locking held
/// across calls.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), BalloonError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), BalloonError>;

    // --- Users ---

    /// Creates `user` if no record exists for its id, then returns the stored record.
    async fn ensure_user(&self, user: &User) -> Result<User, BalloonError>;

    async fn get_user(&self, id: &UserId) -> Result<Option<User>, BalloonError>;

    /// Decrements credits by one and stamps `now`, guarded by `credits > 0`.
    ///
    /// Returns the remaining credits.
    async fn debit_credit(
        &self,
        id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<Conditional<u32>, BalloonError>;

    /// Unconditionally sets the credit balance and its timestamp.
    async fn reset_credits(
        &self,
        id: &UserId,
        credits: u32,
        now: DateTime<Utc>,
    ) -> Result<(), BalloonError>;

    /// Adds one credit without touching the replenishment timestamp.
    async fn grant_credit(&self, id: &UserId) -> Result<(), BalloonError>;

    /// Clears the first-send flag, guarded by it being set.
    async fn clear_first_send(&self, id: &UserId) -> Result<Conditional<()>, BalloonError>;

    /// Replaces the pending question.
    async fn set_question(
        &self,
        id: &UserId,
        question: Option<&Question>,
    ) -> Result<(), BalloonError>;

    /// Reads and clears the pending question in one atomic operation.
    async fn take_question(&self, id: &UserId) -> Result<Option<Question>, BalloonError>;

    // --- Channels and messages ---

    /// Atomically increments the channel counter (initializing it at 0) and
    /// returns the new value. Also records the activity time for trending.
    async fn next_sequence(
        &self,
        channel: &Channel,
        now: DateTime<Utc>,
    ) -> Result<u64, BalloonError>;

    async fn insert_message(&self, message: &Message) -> Result<(), BalloonError>;

    async fn get_message(&self, id: &MessageId) -> Result<Option<Message>, BalloonError>;

    /// Reads the channel message stored at `(channel, sequence)`.
    async fn get_message_at(
        &self,
        channel: &Channel,
        sequence: u64,
        consistency: ReadConsistency,
    ) -> Result<Option<Message>, BalloonError>;

    /// Sets `delivered_to`, guarded by it being unset.
    async fn claim_delivery(
        &self,
        id: &MessageId,
        recipient: &UserId,
        now: DateTime<Utc>,
    ) -> Result<Conditional<()>, BalloonError>;

    /// Sets `credit_returned`, guarded by it being unset and the message
    /// having been delivered to `by`. Returns the updated message.
    async fn mark_credit_returned(
        &self,
        id: &MessageId,
        by: &UserId,
    ) -> Result<Conditional<Message>, BalloonError>;

    /// Lists channels whose last activity day is on or after `since`.
    async fn channels_active_since(
        &self,
        since: NaiveDate,
    ) -> Result<Vec<ChannelActivity>, BalloonError>;

    // --- Reply threads ---

    async fn insert_thread(&self, thread: &ReplyThread) -> Result<(), BalloonError>;

    async fn get_thread(&self, id: &ThreadId) -> Result<Option<ReplyThread>, BalloonError>;

    /// Sets `claimed`, guarded by it being unset. Returns the updated thread.
    async fn claim_thread(
        &self,
        id: &ThreadId,
        now: DateTime<Utc>,
    ) -> Result<Conditional<ReplyThread>, BalloonError>;

    /// Records the reply message id, guarded by none being recorded yet.
    async fn set_thread_reply(
        &self,
        id: &ThreadId,
        reply: &MessageId,
    ) -> Result<Conditional<()>, BalloonError>;

    // --- Command aliases ---

    /// Inserts an alias, guarded by the id being unused.
    async fn insert_alias(
        &self,
        id: &str,
        command: &str,
    ) -> Result<Conditional<()>, BalloonError>;

    async fn get_alias(
        &self,
        id: &str,
        consistency: ReadConsistency,
    ) -> Result<Option<String>, BalloonError>;
}
