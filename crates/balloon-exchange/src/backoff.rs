// SPDX-FileCopyrightText: 2026 Balloon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded exponential backoff for reads that may lag behind writes.

use std::future::Future;
use std::time::Duration;

use balloon_config::model::PairingConfig;
use balloon_core::BalloonError;
use rand::Rng;
use tokio::time::Instant;
use tracing::trace;

/// Polling schedule: delays start at `factor`, double after every miss, are
/// capped at `max_delay`, and the whole poll gives up after `max_wait`.
///
/// Each sleep is drawn uniformly from `[0, delay]` ("full jitter") so that
/// concurrent pollers spread out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub factor: Duration,
    pub max_delay: Duration,
    pub max_wait: Duration,
}

impl PollPolicy {
    pub fn from_config(config: &PairingConfig) -> Self {
        Self {
            factor: Duration::from_millis(config.poll_factor_ms),
            max_delay: Duration::from_millis(config.poll_max_delay_ms),
            max_wait: Duration::from_millis(config.poll_max_wait_ms),
        }
    }

    /// The un-jittered delay before attempt `n + 1` (zero-based `n`).
    pub fn delay(&self, n: u32) -> Duration {
        let doubled = self
            .factor
            .checked_mul(1u32.checked_shl(n).unwrap_or(u32::MAX))
            .unwrap_or(self.max_delay);
        doubled.min(self.max_delay)
    }

    /// Call `attempt` until it yields a value or the wait budget is spent.
    ///
    /// Errors from `attempt` are returned immediately; only misses are retried.
    /// Returns `Ok(None)` once `max_wait` has elapsed without a hit.
    pub async fn poll<T, F, Fut>(&self, mut attempt: F) -> Result<Option<T>, BalloonError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>, BalloonError>>,
    {
        let started = Instant::now();
        let mut n = 0;
        loop {
            if let Some(value) = attempt().await? {
                return Ok(Some(value));
            }
            let elapsed = started.elapsed();
            if elapsed >= self.max_wait {
                trace!(attempts = n + 1, ?elapsed, "poll budget exhausted");
                return Ok(None);
            }
            let sleep = jitter(self.delay(n)).min(self.max_wait - elapsed);
            tokio::time::sleep(sleep).await;
            n = n.saturating_add(1);
        }
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::from_config(&PairingConfig::default())
    }
}

fn jitter(delay: Duration) -> Duration {
    let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
    Duration::from_millis(rand::thread_rng().gen_range(0..=millis))
}
