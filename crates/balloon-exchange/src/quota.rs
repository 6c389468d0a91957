// SPDX-FileCopyrightText: 2026 Balloon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-user send credits with halving-interval replenishment.
//!
//! A debit first tries a guarded decrement. When the balance is empty, the
//! credits accrued since the last debit or refill are computed from the
//! elapsed time: every halving of the elapsed duration that still exceeds half
//! the base interval grants one credit, so refills come quickly at first and
//! slow down afterwards.

use std::sync::Arc;
use std::time::Duration;

use balloon_core::types::Conditional;
use balloon_core::{BalloonError, StorageAdapter, UserId};
use chrono::{DateTime, Utc};
use tracing::{debug, info};

/// Result of a debit attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebitOutcome {
    /// One credit was spent; `remaining` is the balance afterwards.
    Authorized { remaining: u32 },
    /// No credit is available yet.
    Exhausted,
}

/// Credits accrued over `elapsed` under a halving rule with base interval `base`.
///
/// Equivalent to halving the elapsed whole seconds (integer division) and
/// counting the halvings while the remainder exceeds `base / 2`, but computed
/// directly: with `t = base / 2` the loop runs once for every `k` such that
/// `2^k <= elapsed / (t + 1)`.
pub fn accrued_credits(elapsed: chrono::Duration, base: Duration) -> u32 {
    let Ok(elapsed) = u64::try_from(elapsed.num_seconds()) else {
        return 0;
    };
    let threshold = base.as_secs() / 2;
    match elapsed / (threshold + 1) {
        0 => 0,
        q => q.ilog2() + 1,
    }
}

pub struct QuotaManager {
    store: Arc<dyn StorageAdapter + Send + Sync>,
    base: Duration,
}

impl QuotaManager {
    pub fn new(store: Arc<dyn StorageAdapter + Send + Sync>, base: Duration) -> Self {
        Self { store, base }
    }

    /// Spend one credit of `user`, replenishing from elapsed time if the
    /// balance is empty.
    ///
    /// The refill overwrites the balance unconditionally. It only runs once
    /// the balance was seen at zero, so a lost concurrent update costs at most
    /// one credit.
    pub async fn try_debit(
        &self,
        user: &UserId,
        now: DateTime<Utc>,
    ) -> Result<DebitOutcome, BalloonError> {
        if let Conditional::Applied(remaining) = self.store.debit_credit(user, now).await? {
            debug!(user = %user, remaining, "credit debited");
            return Ok(DebitOutcome::Authorized { remaining });
        }

        let record = self
            .store
            .get_user(user)
            .await?
            .ok_or_else(|| BalloonError::Internal(format!("no user record for {user}")))?;
        let accrued = accrued_credits(now - record.credits_updated_at, self.base);
        if accrued == 0 {
            debug!(user = %user, "no credits available");
            return Ok(DebitOutcome::Exhausted);
        }

        let remaining = accrued - 1;
        self.store.reset_credits(user, remaining, now).await?;
        info!(user = %user, accrued, remaining, "credits replenished");
        Ok(DebitOutcome::Authorized { remaining })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use balloon_core::Clock;
    use balloon_core::types::User;
    use balloon_test_utils::{ManualClock, MemoryStore};
    use proptest::prelude::*;

    const HOUR: Duration = Duration::from_secs(3600);

    /// Reference halving loop over whole seconds.
    fn accrued_by_loop(elapsed_secs: i64, base: Duration) -> u32 {
        let threshold = (base.as_secs() / 2) as i64;
        let mut remaining = elapsed_secs;
        let mut accrued = 0;
        while remaining > threshold {
            accrued += 1;
            remaining /= 2;
        }
        accrued
    }

    #[test]
    fn accrual_boundaries() {
        let secs = chrono::Duration::seconds;
        assert_eq!(accrued_credits(secs(0), HOUR), 0);
        assert_eq!(accrued_credits(secs(1800), HOUR), 0);
        assert_eq!(accrued_credits(secs(1801), HOUR), 1);
        assert_eq!(accrued_credits(secs(3600), HOUR), 1);
        assert_eq!(accrued_credits(secs(3602), HOUR), 2);
        assert_eq!(accrued_credits(secs(7200), HOUR), 2);
        assert_eq!(accrued_credits(secs(24 * 3600), HOUR), 6);
    }

    #[test]
    fn negative_elapsed_accrues_nothing() {
        assert_eq!(accrued_credits(chrono::Duration::seconds(-10_000), HOUR), 0);
    }

    proptest! {
        #[test]
        fn closed_form_matches_halving_loop(
            elapsed in -1_000i64..10_000_000_000,
            base_secs in 2u64..1_000_000,
        ) {
            let base = Duration::from_secs(base_secs);
            prop_assert_eq!(
                accrued_credits(chrono::Duration::seconds(elapsed), base),
                accrued_by_loop(elapsed, base)
            );
        }
    }

    async fn setup(credits: u32) -> (QuotaManager, Arc<MemoryStore>, ManualClock, UserId) {
        let store = Arc::new(MemoryStore::new());
        let clock = ManualClock::fixed();
        let user = UserId::new("test", "alice");
        store
            .ensure_user(&User::new(user.clone(), clock.now(), credits))
            .await
            .unwrap();
        (QuotaManager::new(store.clone(), HOUR), store, clock, user)
    }

    #[tokio::test]
    async fn sixth_immediate_debit_fails() {
        let (quota, _store, clock, user) = setup(5).await;
        for expected in (0..5).rev() {
            assert_eq!(
                quota.try_debit(&user, clock.now()).await.unwrap(),
                DebitOutcome::Authorized { remaining: expected }
            );
        }
        assert_eq!(
            quota.try_debit(&user, clock.now()).await.unwrap(),
            DebitOutcome::Exhausted
        );
    }

    #[tokio::test]
    async fn one_hour_replenishes_one_credit() {
        let (quota, store, clock, user) = setup(0).await;
        clock.advance(chrono::Duration::hours(1));
        assert_eq!(
            quota.try_debit(&user, clock.now()).await.unwrap(),
            DebitOutcome::Authorized { remaining: 0 }
        );
        let record = store.get_user(&user).await.unwrap().unwrap();
        assert_eq!(record.credits, 0);
        assert_eq!(record.credits_updated_at, clock.now());

        // The refill restarted the clock.
        assert_eq!(
            quota.try_debit(&user, clock.now()).await.unwrap(),
            DebitOutcome::Exhausted
        );
    }

    #[tokio::test]
    async fn thirty_minutes_is_not_enough() {
        let (quota, store, clock, user) = setup(0).await;
        let before = store.get_user(&user).await.unwrap().unwrap();
        clock.advance(chrono::Duration::minutes(30));
        assert_eq!(
            quota.try_debit(&user, clock.now()).await.unwrap(),
            DebitOutcome::Exhausted
        );
        // A failed debit leaves the refill clock alone.
        let after = store.get_user(&user).await.unwrap().unwrap();
        assert_eq!(after.credits_updated_at, before.credits_updated_at);
    }

    #[tokio::test]
    async fn long_absence_refills_several() {
        let (quota, _store, clock, user) = setup(0).await;
        clock.advance(chrono::Duration::hours(24));
        assert_eq!(
            quota.try_debit(&user, clock.now()).await.unwrap(),
            DebitOutcome::Authorized { remaining: 5 }
        );
    }

    #[tokio::test]
    async fn store_outage_propagates() {
        let (quota, store, clock, user) = setup(5).await;
        store.set_unavailable(true);
        assert!(quota.try_debit(&user, clock.now()).await.is_err());
    }
}
