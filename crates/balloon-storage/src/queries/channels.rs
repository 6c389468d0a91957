// SPDX-FileCopyrightText: 2026 Balloon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-channel sequence counters and the activity index built on them.

use balloon_core::BalloonError;
use balloon_core::types::{Channel, ChannelActivity};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::params;

use crate::database::{Database, map_tr_err};
use crate::models::{CHANNEL_COLUMNS, activity_from_row};

/// Increment the channel counter (creating it at 1) and return the new value.
///
/// A single upsert statement, so concurrent callers on one channel each
/// observe a distinct value.
pub async fn next_sequence(
    db: &Database,
    channel: &Channel,
    now: DateTime<Utc>,
) -> Result<u64, BalloonError> {
    let channel = channel.as_str().to_string();
    let day = now.date_naive();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "INSERT INTO channels (channel, seq, last_message_day, last_message_at)
                 VALUES (?1, 1, ?2, ?3)
                 ON CONFLICT (channel) DO UPDATE SET
                     seq = seq + 1,
                     last_message_day = excluded.last_message_day,
                     last_message_at = excluded.last_message_at
                 RETURNING seq",
                params![channel, day, now],
                |row| row.get::<_, u64>(0),
            )
        })
        .await
        .map_err(map_tr_err)
}

/// Channels whose last activity day is `since` or later, busiest first.
pub async fn channels_active_since(
    db: &Database,
    since: NaiveDate,
) -> Result<Vec<ChannelActivity>, BalloonError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CHANNEL_COLUMNS} FROM channels
                 WHERE last_message_day >= ?1
                 ORDER BY seq DESC, channel ASC"
            ))?;
            let rows = stmt.query_map(params![since], activity_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
