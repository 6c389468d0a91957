// SPDX-FileCopyrightText: 2026 Balloon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory `StorageAdapter` with controllable read visibility and outages.
//!
//! Guarded mutations are applied under one lock, matching the single-record
//! atomicity of a real backend. Reads can be made to miss in order to
//! exercise the polling paths that tolerate eventually-consistent stores.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use balloon_core::types::{
    AdapterType, Channel, ChannelActivity, Conditional, HealthStatus, Message, MessageId,
    Question, ReadConsistency, ReplyThread, ThreadId, User, UserId,
};
use balloon_core::{BalloonError, PluginAdapter, StorageAdapter};

/// A record whose visibility can be delayed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReadKey {
    Message(Channel, u64),
    Alias(String),
}

#[derive(Default)]
struct State {
    users: HashMap<UserId, User>,
    channels: HashMap<Channel, ChannelActivity>,
    messages: HashMap<MessageId, Message>,
    by_sequence: HashMap<(Channel, u64), MessageId>,
    threads: HashMap<ThreadId, ReplyThread>,
    aliases: HashMap<String, String>,
    /// Remaining forced misses per key, consumed by reads of any consistency.
    hidden: HashMap<ReadKey, u32>,
}

/// In-memory store for tests.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    stale_eventual_reads: AtomicBool,
    unavailable: AtomicBool,
    eventual_reads: AtomicUsize,
    strong_reads: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// When set, every eventual read of a message or alias misses.
    pub fn set_stale_eventual_reads(&self, stale: bool) {
        self.stale_eventual_reads.store(stale, Ordering::SeqCst);
    }

    /// Make the next `misses` reads of `key` miss, whatever their consistency.
    pub fn hide_for_reads(&self, key: ReadKey, misses: u32) {
        self.lock().hidden.insert(key, misses);
    }

    /// Simulate an outage: every operation fails with a storage error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn eventual_reads(&self) -> usize {
        self.eventual_reads.load(Ordering::SeqCst)
    }

    pub fn strong_reads(&self) -> usize {
        self.strong_reads.load(Ordering::SeqCst)
    }

    /// All stored messages, replies included, in no particular order.
    pub fn messages(&self) -> Vec<Message> {
        self.lock().messages.values().cloned().collect()
    }

    /// All reply threads, in no particular order.
    pub fn threads(&self) -> Vec<ReplyThread> {
        self.lock().threads.values().cloned().collect()
    }

    /// Overwrite the activity record of a channel, e.g. to backdate it.
    pub fn put_channel_activity(&self, activity: ChannelActivity) {
        self.lock()
            .channels
            .insert(activity.channel.clone(), activity);
    }

    /// Replace a stored user record wholesale.
    pub fn put_user(&self, user: User) {
        self.lock().users.insert(user.id.clone(), user);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        // A poisoned lock only happens after a panicking test thread.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check(&self) -> Result<(), BalloonError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(BalloonError::storage("memory store unavailable"));
        }
        Ok(())
    }

    /// Record a read and report whether it is forced to miss.
    fn read_misses(&self, state: &mut State, key: ReadKey, consistency: ReadConsistency) -> bool {
        match consistency {
            ReadConsistency::Eventual => self.eventual_reads.fetch_add(1, Ordering::SeqCst),
            ReadConsistency::Strong => self.strong_reads.fetch_add(1, Ordering::SeqCst),
        };
        if let Some(left) = state.hidden.get_mut(&key)
            && *left > 0
        {
            *left -= 1;
            return true;
        }
        consistency == ReadConsistency::Eventual && self.stale_eventual_reads.load(Ordering::SeqCst)
    }

    fn missing_user(id: &UserId) -> BalloonError {
        BalloonError::storage(format!("no user record for {id}"))
    }
}

#[async_trait]
impl PluginAdapter for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, BalloonError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Ok(HealthStatus::Unhealthy("unavailable".into()));
        }
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), BalloonError> {
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for MemoryStore {
    async fn initialize(&self) -> Result<(), BalloonError> {
        self.check()
    }

    async fn close(&self) -> Result<(), BalloonError> {
        Ok(())
    }

    async fn ensure_user(&self, user: &User) -> Result<User, BalloonError> {
        self.check()?;
        let mut state = self.lock();
        Ok(state
            .users
            .entry(user.id.clone())
            .or_insert_with(|| user.clone())
            .clone())
    }

    async fn get_user(&self, id: &UserId) -> Result<Option<User>, BalloonError> {
        self.check()?;
        Ok(self.lock().users.get(id).cloned())
    }

    async fn debit_credit(
        &self,
        id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<Conditional<u32>, BalloonError> {
        self.check()?;
        let mut state = self.lock();
        let user = state.users.get_mut(id).ok_or_else(|| Self::missing_user(id))?;
        if user.credits == 0 {
            return Ok(Conditional::GuardFailed);
        }
        user.credits -= 1;
        user.credits_updated_at = now;
        Ok(Conditional::Applied(user.credits))
    }

    async fn reset_credits(
        &self,
        id: &UserId,
        credits: u32,
        now: DateTime<Utc>,
    ) -> Result<(), BalloonError> {
        self.check()?;
        if let Some(user) = self.lock().users.get_mut(id) {
            user.credits = credits;
            user.credits_updated_at = now;
        }
        Ok(())
    }

    async fn grant_credit(&self, id: &UserId) -> Result<(), BalloonError> {
        self.check()?;
        if let Some(user) = self.lock().users.get_mut(id) {
            user.credits += 1;
        }
        Ok(())
    }

    async fn clear_first_send(&self, id: &UserId) -> Result<Conditional<()>, BalloonError> {
        self.check()?;
        let mut state = self.lock();
        match state.users.get_mut(id) {
            Some(user) if user.first_send => {
                user.first_send = false;
                Ok(Conditional::Applied(()))
            }
            _ => Ok(Conditional::GuardFailed),
        }
    }

    async fn set_question(
        &self,
        id: &UserId,
        question: Option<&Question>,
    ) -> Result<(), BalloonError> {
        self.check()?;
        if let Some(user) = self.lock().users.get_mut(id) {
            user.pending_question = question.cloned();
        }
        Ok(())
    }

    async fn take_question(&self, id: &UserId) -> Result<Option<Question>, BalloonError> {
        self.check()?;
        Ok(self
            .lock()
            .users
            .get_mut(id)
            .and_then(|user| user.pending_question.take()))
    }

    async fn next_sequence(
        &self,
        channel: &Channel,
        now: DateTime<Utc>,
    ) -> Result<u64, BalloonError> {
        self.check()?;
        let mut state = self.lock();
        let activity = state
            .channels
            .entry(channel.clone())
            .or_insert_with(|| ChannelActivity {
                channel: channel.clone(),
                sequence: 0,
                last_message_day: now.date_naive(),
                last_message_at: now,
            });
        activity.sequence += 1;
        activity.last_message_day = now.date_naive();
        activity.last_message_at = now;
        Ok(activity.sequence)
    }

    async fn insert_message(&self, message: &Message) -> Result<(), BalloonError> {
        self.check()?;
        let mut state = self.lock();
        if state.messages.contains_key(&message.id) {
            return Err(BalloonError::storage(format!(
                "duplicate message id {}",
                message.id
            )));
        }
        if let Some(seq) = message.sequence {
            let key = (message.channel.clone(), seq);
            if state.by_sequence.contains_key(&key) {
                return Err(BalloonError::storage(format!(
                    "duplicate sequence {seq} in channel {}",
                    message.channel
                )));
            }
            state.by_sequence.insert(key, message.id.clone());
        }
        state.messages.insert(message.id.clone(), message.clone());
        Ok(())
    }

    async fn get_message(&self, id: &MessageId) -> Result<Option<Message>, BalloonError> {
        self.check()?;
        Ok(self.lock().messages.get(id).cloned())
    }

    async fn get_message_at(
        &self,
        channel: &Channel,
        sequence: u64,
        consistency: ReadConsistency,
    ) -> Result<Option<Message>, BalloonError> {
        self.check()?;
        let mut state = self.lock();
        if self.read_misses(
            &mut state,
            ReadKey::Message(channel.clone(), sequence),
            consistency,
        ) {
            return Ok(None);
        }
        Ok(state
            .by_sequence
            .get(&(channel.clone(), sequence))
            .and_then(|id| state.messages.get(id))
            .cloned())
    }

    async fn claim_delivery(
        &self,
        id: &MessageId,
        recipient: &UserId,
        now: DateTime<Utc>,
    ) -> Result<Conditional<()>, BalloonError> {
        self.check()?;
        let mut state = self.lock();
        match state.messages.get_mut(id) {
            Some(message) if message.delivered_to.is_none() => {
                message.delivered_to = Some(recipient.clone());
                message.delivered_at = Some(now);
                Ok(Conditional::Applied(()))
            }
            _ => Ok(Conditional::GuardFailed),
        }
    }

    async fn mark_credit_returned(
        &self,
        id: &MessageId,
        by: &UserId,
    ) -> Result<Conditional<Message>, BalloonError> {
        self.check()?;
        let mut state = self.lock();
        match state.messages.get_mut(id) {
            Some(message) if !message.credit_returned && message.delivered_to.as_ref() == Some(by) => {
                message.credit_returned = true;
                Ok(Conditional::Applied(message.clone()))
            }
            _ => Ok(Conditional::GuardFailed),
        }
    }

    async fn channels_active_since(
        &self,
        since: NaiveDate,
    ) -> Result<Vec<ChannelActivity>, BalloonError> {
        self.check()?;
        let mut active: Vec<_> = self
            .lock()
            .channels
            .values()
            .filter(|a| a.last_message_day >= since)
            .cloned()
            .collect();
        active.sort_by(|a, b| b.sequence.cmp(&a.sequence).then(a.channel.cmp(&b.channel)));
        Ok(active)
    }

    async fn insert_thread(&self, thread: &ReplyThread) -> Result<(), BalloonError> {
        self.check()?;
        self.lock().threads.insert(thread.id.clone(), thread.clone());
        Ok(())
    }

    async fn get_thread(&self, id: &ThreadId) -> Result<Option<ReplyThread>, BalloonError> {
        self.check()?;
        Ok(self.lock().threads.get(id).cloned())
    }

    async fn claim_thread(
        &self,
        id: &ThreadId,
        now: DateTime<Utc>,
    ) -> Result<Conditional<ReplyThread>, BalloonError> {
        self.check()?;
        let mut state = self.lock();
        match state.threads.get_mut(id) {
            Some(thread) if !thread.claimed => {
                thread.claimed = true;
                thread.claimed_at = Some(now);
                Ok(Conditional::Applied(thread.clone()))
            }
            _ => Ok(Conditional::GuardFailed),
        }
    }

    async fn set_thread_reply(
        &self,
        id: &ThreadId,
        reply: &MessageId,
    ) -> Result<Conditional<()>, BalloonError> {
        self.check()?;
        let mut state = self.lock();
        match state.threads.get_mut(id) {
            Some(thread) if thread.reply_message_id.is_none() => {
                thread.reply_message_id = Some(reply.clone());
                Ok(Conditional::Applied(()))
            }
            _ => Ok(Conditional::GuardFailed),
        }
    }

    async fn insert_alias(&self, id: &str, command: &str) -> Result<Conditional<()>, BalloonError> {
        self.check()?;
        let mut state = self.lock();
        if state.aliases.contains_key(id) {
            return Ok(Conditional::GuardFailed);
        }
        state.aliases.insert(id.to_string(), command.to_string());
        Ok(Conditional::Applied(()))
    }

    async fn get_alias(
        &self,
        id: &str,
        consistency: ReadConsistency,
    ) -> Result<Option<String>, BalloonError> {
        self.check()?;
        let mut state = self.lock();
        if self.read_misses(&mut state, ReadKey::Alias(id.to_string()), consistency) {
            return Ok(None);
        }
        Ok(state.aliases.get(id).cloned())
    }
}
