// SPDX-FileCopyrightText: 2026 Balloon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ranking of recently active channels.

use std::sync::Arc;

use balloon_config::model::TrendingConfig;
use balloon_core::types::ChannelActivity;
use balloon_core::{BalloonError, Channel, StorageAdapter};
use chrono::{Days, NaiveDate};
use tracing::debug;

pub struct Trending {
    store: Arc<dyn StorageAdapter + Send + Sync>,
    default_channel: Channel,
    window_days: u32,
    limit: usize,
}

impl Trending {
    pub fn new(
        store: Arc<dyn StorageAdapter + Send + Sync>,
        default_channel: Channel,
        config: &TrendingConfig,
    ) -> Self {
        Self {
            store,
            default_channel,
            window_days: config.window_days,
            limit: config.limit,
        }
    }

    /// Channels active during the window ending `today`, busiest first.
    ///
    /// The ranking uses the all-time message count of each channel. Ties are
    /// broken by channel key so the order is stable.
    pub async fn top(&self, today: NaiveDate) -> Result<Vec<ChannelActivity>, BalloonError> {
        let since = today
            .checked_sub_days(Days::new(u64::from(self.window_days.saturating_sub(1))))
            .unwrap_or(NaiveDate::MIN);

        let mut active: Vec<ChannelActivity> = self
            .store
            .channels_active_since(since)
            .await?
            .into_iter()
            .filter(|activity| activity.channel != self.default_channel)
            .collect();
        active.sort_by(|a, b| {
            b.sequence
                .cmp(&a.sequence)
                .then_with(|| a.channel.cmp(&b.channel))
        });
        active.truncate(self.limit);

        debug!(%since, count = active.len(), "trending channels computed");
        Ok(active)
    }
}

/// One `"{rank} - #tag1 #tag2"` line per channel, ranks starting at 1.
pub fn render(entries: &[ChannelActivity]) -> Vec<String> {
    entries
        .iter()
        .enumerate()
        .map(|(i, activity)| format!("{} - {}", i + 1, activity.channel.to_hashtags()))
        .collect()
}
