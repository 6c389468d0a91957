// SPDX-FileCopyrightText: 2026 Balloon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message acceptance and predecessor pairing.
//!
//! Every accepted message is stored under `(channel, sequence)`. The sender
//! of message `n` receives message `n - 1` of the same channel, provided they
//! win the single-assignment delivery claim on it.

use std::sync::Arc;

use balloon_core::types::{Conditional, Message};
use balloon_core::{BalloonError, Channel, MessageId, ReadConsistency, StorageAdapter, UserId};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::backoff::PollPolicy;
use crate::sequence::SequenceAllocator;

/// A message about to be accepted.
#[derive(Debug, Clone)]
pub struct Draft {
    pub channel: Channel,
    pub sender: UserId,
    pub display_name: String,
    pub body: String,
}

/// A message persisted under its channel sequence.
#[derive(Debug, Clone)]
pub struct Accepted {
    pub message: Message,
    pub sequence: u64,
}

pub struct PairingStore {
    store: Arc<dyn StorageAdapter + Send + Sync>,
    sequences: SequenceAllocator,
    poll: PollPolicy,
}

impl PairingStore {
    pub fn new(store: Arc<dyn StorageAdapter + Send + Sync>, poll: PollPolicy) -> Self {
        Self {
            sequences: SequenceAllocator::new(store.clone()),
            store,
            poll,
        }
    }

    /// Allocate the next sequence of the draft's channel and persist the message.
    ///
    /// This is the point of permanent record. A failure before it is safe to
    /// retry; once it returns, the message exists.
    pub async fn accept(&self, draft: Draft, now: DateTime<Utc>) -> Result<Accepted, BalloonError> {
        let sequence = self.sequences.next(&draft.channel, now).await?;
        let message = Message {
            id: MessageId::generate(),
            channel: draft.channel,
            sequence: Some(sequence),
            sender: draft.sender,
            display_name: draft.display_name,
            body: draft.body,
            created_at: now,
            delivered_to: None,
            delivered_at: None,
            reply_to: None,
            credit_returned: false,
        };
        self.store.insert_message(&message).await?;
        info!(
            channel = %message.channel,
            sequence,
            sender = %message.sender,
            "message accepted"
        );
        Ok(Accepted { message, sequence })
    }

    /// The message accepted just before `sequence` in `channel`.
    ///
    /// The first message of a channel has no predecessor, so no read is made.
    /// Otherwise a miss on the cheap eventual read may only mean the write is
    /// not visible yet, and strong reads are polled before giving up.
    pub async fn fetch_predecessor(
        &self,
        channel: &Channel,
        sequence: u64,
    ) -> Result<Option<Message>, BalloonError> {
        if sequence <= 1 {
            return Ok(None);
        }
        let previous = sequence - 1;

        if let Some(message) = self
            .store
            .get_message_at(channel, previous, ReadConsistency::Eventual)
            .await?
        {
            return Ok(Some(message));
        }

        debug!(channel = %channel, previous, "predecessor not visible yet, polling");
        let store = &self.store;
        let found = self
            .poll
            .poll(move || store.get_message_at(channel, previous, ReadConsistency::Strong))
            .await?;
        if found.is_none() {
            debug!(channel = %channel, previous, "predecessor never became visible");
        }
        Ok(found)
    }

    /// Claim `message` for `recipient`. Exactly one claimant ever wins;
    /// losers get `false` and must not retry.
    pub async fn claim_for_delivery(
        &self,
        message: &Message,
        recipient: &UserId,
        now: DateTime<Utc>,
    ) -> Result<bool, BalloonError> {
        match self.store.claim_delivery(&message.id, recipient, now).await? {
            Conditional::Applied(()) => {
                info!(message = %message.id, recipient = %recipient, "message delivered");
                Ok(true)
            }
            Conditional::GuardFailed => {
                debug!(message = %message.id, "delivery claim lost");
                Ok(false)
            }
        }
    }
}
