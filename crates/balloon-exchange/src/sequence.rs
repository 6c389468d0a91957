// SPDX-FileCopyrightText: 2026 Balloon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-channel sequence allocation.

use std::sync::Arc;

use balloon_core::{BalloonError, Channel, StorageAdapter};
use chrono::{DateTime, Utc};
use tracing::trace;

/// Hands out sequence numbers `1, 2, 3, ...` per channel.
///
/// Allocation is a single atomic increment in the store, so concurrent
/// callers on one channel always receive distinct, gap-free values. Store
/// failures are returned to the caller without retry.
pub struct SequenceAllocator {
    store: Arc<dyn StorageAdapter + Send + Sync>,
}

impl SequenceAllocator {
    pub fn new(store: Arc<dyn StorageAdapter + Send + Sync>) -> Self {
        Self { store }
    }

    pub async fn next(&self, channel: &Channel, now: DateTime<Utc>) -> Result<u64, BalloonError> {
        let sequence = self.store.next_sequence(channel, now).await?;
        trace!(channel = %channel, sequence, "sequence allocated");
        Ok(sequence)
    }
}
