// SPDX-FileCopyrightText: 2026 Balloon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reply threads: opened on delivery, claimable once.

use balloon_core::BalloonError;
use balloon_core::types::{Conditional, MessageId, ReplyThread, ThreadId};
use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};
use crate::models::{THREAD_COLUMNS, thread_from_row};

pub async fn insert_thread(db: &Database, thread: &ReplyThread) -> Result<(), BalloonError> {
    let t = thread.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO threads (id, claimed, sender, recipient, message_id,
                                      reply_message_id, created_at, claimed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    t.id.as_str(),
                    t.claimed,
                    t.sender.as_str(),
                    t.recipient.as_str(),
                    t.message_id.as_str(),
                    t.reply_message_id.as_ref().map(MessageId::as_str),
                    t.created_at,
                    t.claimed_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_thread(db: &Database, id: &ThreadId) -> Result<Option<ReplyThread>, BalloonError> {
    let id = id.as_str().to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {THREAD_COLUMNS} FROM threads WHERE id = ?1"),
                params![id],
                thread_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Set `claimed`, guarded by it being unset. Returns the claimed thread.
pub async fn claim_thread(
    db: &Database,
    id: &ThreadId,
    now: DateTime<Utc>,
) -> Result<Conditional<ReplyThread>, BalloonError> {
    let id = id.as_str().to_string();
    let claimed = db
        .connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "UPDATE threads SET claimed = 1, claimed_at = ?2
                     WHERE id = ?1 AND claimed = 0
                     RETURNING {THREAD_COLUMNS}"
                ),
                params![id, now],
                thread_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)?;
    Ok(claimed.map_or(Conditional::GuardFailed, Conditional::Applied))
}

/// Record the reply message, guarded by none being recorded yet.
pub async fn set_thread_reply(
    db: &Database,
    id: &ThreadId,
    reply: &MessageId,
) -> Result<Conditional<()>, BalloonError> {
    let id = id.as_str().to_string();
    let reply = reply.as_str().to_string();
    let changed = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE threads SET reply_message_id = ?2
                 WHERE id = ?1 AND reply_message_id IS NULL",
                params![id, reply],
            )
        })
        .await
        .map_err(map_tr_err)?;
    Ok(if changed == 1 {
        Conditional::Applied(())
    } else {
        Conditional::GuardFailed
    })
}
