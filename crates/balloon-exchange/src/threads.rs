// SPDX-FileCopyrightText: 2026 Balloon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-time reply threads.
//!
//! A thread is opened whenever a message is delivered. Its recipient may
//! answer once: the first claim wins, and a claim made after the reply
//! deadline consumes the thread without delivering anything.

use std::sync::Arc;
use std::time::Duration;

use balloon_core::types::{Conditional, Message, ReplyThread};
use balloon_core::{BalloonError, MessageId, StorageAdapter, ThreadId, UserId};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

/// Result of a reply claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyClaim {
    /// The caller owns the reply slot and must deliver the reply.
    Accepted(ReplyThread),
    /// Someone (possibly the caller, concurrently) already claimed it.
    AlreadyClaimed,
    /// The claim landed after the deadline. The slot is consumed anyway.
    Expired,
    /// No such thread, or the caller is not its recipient.
    NotFound,
}

pub struct ReplyThreads {
    store: Arc<dyn StorageAdapter + Send + Sync>,
    deadline: Duration,
}

impl ReplyThreads {
    /// `deadline` is the reply window plus its grace period.
    pub fn new(store: Arc<dyn StorageAdapter + Send + Sync>, deadline: Duration) -> Self {
        Self { store, deadline }
    }

    /// Open a thread allowing `recipient` to answer `message` once.
    pub async fn open(
        &self,
        message: &Message,
        recipient: &UserId,
        now: DateTime<Utc>,
    ) -> Result<ReplyThread, BalloonError> {
        let thread = ReplyThread {
            id: ThreadId::generate(),
            claimed: false,
            sender: message.sender.clone(),
            recipient: recipient.clone(),
            message_id: message.id.clone(),
            reply_message_id: None,
            created_at: now,
            claimed_at: None,
        };
        self.store.insert_thread(&thread).await?;
        debug!(thread = %thread.id, message = %message.id, "reply thread opened");
        Ok(thread)
    }

    /// The thread `id` if `replier` is allowed to answer on it.
    pub async fn get_for(
        &self,
        id: &ThreadId,
        replier: &UserId,
    ) -> Result<Option<ReplyThread>, BalloonError> {
        Ok(self
            .store
            .get_thread(id)
            .await?
            .filter(|thread| thread.recipient == *replier))
    }

    /// Claim the reply slot of `id` for `replier`.
    pub async fn claim(
        &self,
        id: &ThreadId,
        replier: &UserId,
        now: DateTime<Utc>,
    ) -> Result<ReplyClaim, BalloonError> {
        if self.get_for(id, replier).await?.is_none() {
            debug!(thread = %id, replier = %replier, "reply thread not found");
            return Ok(ReplyClaim::NotFound);
        }

        let thread = match self.store.claim_thread(id, now).await? {
            Conditional::Applied(thread) => thread,
            Conditional::GuardFailed => {
                debug!(thread = %id, "reply thread already claimed");
                return Ok(ReplyClaim::AlreadyClaimed);
            }
        };

        if self.is_expired(&thread, now) {
            info!(thread = %id, created_at = %thread.created_at, "reply arrived after deadline");
            return Ok(ReplyClaim::Expired);
        }
        Ok(ReplyClaim::Accepted(thread))
    }

    /// Record the stored reply on a claimed thread.
    pub async fn record_reply(
        &self,
        id: &ThreadId,
        reply: &MessageId,
    ) -> Result<(), BalloonError> {
        if let Conditional::GuardFailed = self.store.set_thread_reply(id, reply).await? {
            warn!(thread = %id, reply = %reply, "thread already has a reply recorded");
        }
        Ok(())
    }

    fn is_expired(&self, thread: &ReplyThread, now: DateTime<Utc>) -> bool {
        match chrono::Duration::from_std(self.deadline) {
            Ok(deadline) => now > thread.created_at + deadline,
            Err(_) => false,
        }
    }
}
