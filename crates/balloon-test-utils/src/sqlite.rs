// SPDX-FileCopyrightText: 2026 Balloon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Temporary SQLite stores for tests that need the real backend.

use std::sync::Arc;

use balloon_config::model::StorageConfig;
use balloon_core::{BalloonError, StorageAdapter};
use balloon_storage::SqliteStorage;
use tempfile::TempDir;

/// An initialized SQLite store in a temp directory.
///
/// The directory is deleted when this value is dropped, so keep it alive for
/// the duration of the test.
pub struct TempSqlite {
    pub storage: Arc<SqliteStorage>,
    _dir: TempDir,
}

impl TempSqlite {
    pub async fn new() -> Result<Self, BalloonError> {
        let dir = TempDir::new().map_err(BalloonError::storage)?;
        let path = dir.path().join("balloon-test.db");
        let storage = SqliteStorage::new(StorageConfig {
            database_path: path.to_string_lossy().into_owned(),
            wal_mode: true,
        });
        storage.initialize().await?;
        Ok(Self {
            storage: Arc::new(storage),
            _dir: dir,
        })
    }

    pub fn store(&self) -> Arc<dyn StorageAdapter + Send + Sync> {
        self.storage.clone()
    }
}
