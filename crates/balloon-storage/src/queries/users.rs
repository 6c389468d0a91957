// SPDX-FileCopyrightText: 2026 Balloon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User records: credits, first-send flag and pending question.

use balloon_core::BalloonError;
use balloon_core::types::{Conditional, Question, User, UserId};
use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, TransactionBehavior, params};

use crate::database::{Database, map_tr_err};
use crate::models::{USER_COLUMNS, parse_question, user_from_row};

fn encode_question(question: Option<&Question>) -> Result<Option<String>, BalloonError> {
    question
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| BalloonError::Internal(format!("failed to encode question: {e}")))
}

/// Insert the user unless a record already exists, then return the stored record.
pub async fn ensure_user(db: &Database, user: &User) -> Result<User, BalloonError> {
    let question = encode_question(user.pending_question.as_ref())?;
    let user = user.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO users (id, created_at, credits, credits_updated_at, pending_question, first_send)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT (id) DO NOTHING",
                params![
                    user.id.as_str(),
                    user.created_at,
                    user.credits,
                    user.credits_updated_at,
                    question,
                    user.first_send,
                ],
            )?;
            conn.query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![user.id.as_str()],
                user_from_row,
            )
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_user(db: &Database, id: &UserId) -> Result<Option<User>, BalloonError> {
    let id = id.as_str().to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                user_from_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}

/// Spend one credit, guarded by `credits > 0`. Returns the remaining balance.
pub async fn debit_credit(
    db: &Database,
    id: &UserId,
    now: DateTime<Utc>,
) -> Result<Conditional<u32>, BalloonError> {
    let id = id.as_str().to_string();
    let remaining = db
        .connection()
        .call(move |conn| {
            conn.query_row(
                "UPDATE users SET credits = credits - 1, credits_updated_at = ?2
                 WHERE id = ?1 AND credits > 0
                 RETURNING credits",
                params![id, now],
                |row| row.get::<_, u32>(0),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)?;
    Ok(remaining.map_or(Conditional::GuardFailed, Conditional::Applied))
}

pub async fn reset_credits(
    db: &Database,
    id: &UserId,
    credits: u32,
    now: DateTime<Utc>,
) -> Result<(), BalloonError> {
    let id = id.as_str().to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE users SET credits = ?2, credits_updated_at = ?3 WHERE id = ?1",
                params![id, credits, now],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn grant_credit(db: &Database, id: &UserId) -> Result<(), BalloonError> {
    let id = id.as_str().to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE users SET credits = credits + 1 WHERE id = ?1",
                params![id],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn clear_first_send(db: &Database, id: &UserId) -> Result<Conditional<()>, BalloonError> {
    let id = id.as_str().to_string();
    let changed = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE users SET first_send = 0 WHERE id = ?1 AND first_send = 1",
                params![id],
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

pub async fn set_question(
    db: &Database,
    id: &UserId,
    question: Option<&Question>,
) -> Result<(), BalloonError> {
    let encoded = encode_question(question)?;
    let id = id.as_str().to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE users SET pending_question = ?2 WHERE id = ?1",
                params![id, encoded],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Read and clear the pending question inside one immediate transaction.
pub async fn take_question(db: &Database, id: &UserId) -> Result<Option<Question>, BalloonError> {
    let id = id.as_str().to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let raw: Option<String> = tx
                .query_row(
                    "SELECT pending_question FROM users WHERE id = ?1",
                    params![id],
                    |row| row.get(0),
                )
                .optional()?
                .flatten();
            if raw.is_some() {
                tx.execute(
                    "UPDATE users SET pending_question = NULL WHERE id = ?1",
                    params![id],
                )?;
            }
            tx.commit()?;
            raw.as_deref().map(parse_question).transpose()
        })
        .await
        .map_err(map_tr_err)
}
