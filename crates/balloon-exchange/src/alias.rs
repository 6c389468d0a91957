// SPDX-FileCopyrightText: 2026 Balloon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Short aliases for commands too long for a platform's button payloads.

use std::sync::Arc;

use balloon_core::types::Conditional;
use balloon_core::{BalloonError, ReadConsistency, StorageAdapter};
use tracing::{debug, warn};

use crate::backoff::PollPolicy;

/// Marker prefixed to an alias id to form a command.
pub const ALIAS_PREFIX: char = ':';

const MAX_INSERT_ATTEMPTS: u32 = 3;

pub struct AliasStore {
    store: Arc<dyn StorageAdapter + Send + Sync>,
    poll: PollPolicy,
}

impl AliasStore {
    pub fn new(store: Arc<dyn StorageAdapter + Send + Sync>, poll: PollPolicy) -> Self {
        Self { store, poll }
    }

    /// Store `command` under a fresh random id and return the id.
    ///
    /// Ids are 128 random bits rendered as 32 hex digits. A collision is
    /// detected by the guarded insert and retried with a new id.
    pub async fn create(&self, command: &str) -> Result<String, BalloonError> {
        for attempt in 1..=MAX_INSERT_ATTEMPTS {
            let id = uuid::Uuid::new_v4().simple().to_string();
            match self.store.insert_alias(&id, command).await? {
                Conditional::Applied(()) => {
                    debug!(alias = %id, len = command.len(), "command aliased");
                    return Ok(id);
                }
                Conditional::GuardFailed => {
                    warn!(alias = %id, attempt, "alias id collision");
                }
            }
        }
        Err(BalloonError::Internal(format!(
            "no free alias id after {MAX_INSERT_ATTEMPTS} attempts"
        )))
    }

    /// The command stored under `id`, polling strong reads on an eventual miss.
    pub async fn resolve(&self, id: &str) -> Result<Option<String>, BalloonError> {
        if let Some(command) = self.store.get_alias(id, ReadConsistency::Eventual).await? {
            return Ok(Some(command));
        }
        let store = &self.store;
        let command = self
            .poll
            .poll(move || store.get_alias(id, ReadConsistency::Strong))
            .await?;
        if command.is_none() {
            debug!(alias = %id, "alias not found");
        }
        Ok(command)
    }
}
