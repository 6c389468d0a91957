// SPDX-FileCopyrightText: 2026 Balloon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message records and their single-assignment claims.

use balloon_core::BalloonError;
use balloon_core::types::{Channel, Conditional, Message, MessageId, UserId};
use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};
use crate::models::{MESSAGE_COLUMNS, message_from_row};

pub async fn insert_message(db: &Database, message: &Message) -> Result<(), BalloonError> {
    let m = message.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO messages (id, channel, sequence, sender, display_name, body,
                                       created_at, delivered_to, delivered_at, reply_to, credit_returned)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    m.id.as_str(),
                    m.channel.as_str(),
                    m.sequence,
                    m.sender.as_str(),
                    m.display_name,
                    m.body,
                    m.created_at,
                    m.delivered_to.as_ref().map(UserId::as_str),
                    m.delivered_at,
                    m.reply_to.as_ref().map(MessageId::as_str),
                    m.credit_returned,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_message(db: &Database, id: &MessageId) -> Result<Option<Message>, BalloonError> {
    let id = id.as_str().to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?1"),
                params![id],
                message_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// The channel message stored under `(channel, sequence)`.
pub async fn get_message_at(
    db: &Database,
    channel: &Channel,
    sequence: u64,
) -> Result<Option<Message>, BalloonError> {
    let channel = channel.as_str().to_string();
    db.connection()
        .call(move |conn| {
            let result = conn.query_row(
                &format!(
                    "SELECT {MESSAGE_COLUMNS} FROM messages WHERE channel = ?1 AND sequence = ?2"
                ),
                params![channel, sequence],
                message_from_row,
            );
            match result {
                Ok(message) => Ok(Some(message)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Assign the message to `recipient`, guarded by it being unassigned.
pub async fn claim_delivery(
    db: &Database,
    id: &MessageId,
    recipient: &UserId,
    now: DateTime<Utc>,
) -> Result<Conditional<()>, BalloonError> {
    let id = id.as_str().to_string();
    let recipient = recipient.as_str().to_string();
    let changed = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE messages SET delivered_to = ?2, delivered_at = ?3
                 WHERE id = ?1 AND delivered_to IS NULL",
                params![id, recipient, now],
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

/// Flag the message's credit as returned by its recipient `by`, at most once.
pub async fn mark_credit_returned(
    db: &Database,
    id: &MessageId,
    by: &UserId,
) -> Result<Conditional<Message>, BalloonError> {
    let id = id.as_str().to_string();
    let by = by.as_str().to_string();
    let updated = db
        .connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "UPDATE messages SET credit_returned = 1
                     WHERE id = ?1 AND delivered_to = ?2 AND credit_returned = 0
                     RETURNING {MESSAGE_COLUMNS}"
                ),
                params![id, by],
                message_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)?;
    Ok(updated.map_or(Conditional::GuardFailed, Conditional::Applied))
}
