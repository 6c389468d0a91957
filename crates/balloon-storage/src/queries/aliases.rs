// SPDX-FileCopyrightText: 2026 Balloon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Short aliases for command strings that exceed a platform's limit.

use balloon_core::BalloonError;
use balloon_core::types::Conditional;
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, map_tr_err};

/// Insert `id -> command`, guarded by `id` being unused.
pub async fn insert_alias(
    db: &Database,
    id: &str,
    command: &str,
) -> Result<Conditional<()>, BalloonError> {
    let id = id.to_string();
    let command = command.to_string();
    let changed = db
        .connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO aliases (id, command) VALUES (?1, ?2) ON CONFLICT (id) DO NOTHING",
                params![id, command],
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

pub async fn get_alias(db: &Database, id: &str) -> Result<Option<String>, BalloonError> {
    let id = id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT command FROM aliases WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)
}
