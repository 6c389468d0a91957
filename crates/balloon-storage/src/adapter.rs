// SPDX-FileCopyrightText: 2026 Balloon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::OnceCell;
use tracing::debug;

use balloon_config::model::StorageConfig;
use balloon_core::types::{
    Channel, ChannelActivity, Conditional, Message, MessageId, Question, ReadConsistency,
    ReplyThread, ThreadId, User, UserId,
};
use balloon_core::{AdapterType, BalloonError, HealthStatus, PluginAdapter, StorageAdapter};

use crate::database::{self, Database};
use crate::queries;

/// SQLite-backed storage adapter.
///
/// The database is opened on the first call to [`StorageAdapter::initialize`].
/// SQLite has no replication lag, so eventual and strong reads are served
/// identically.
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage with the given configuration.
    ///
    /// The database connection is not opened until [`StorageAdapter::initialize`] is called.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
        }
    }

    /// Returns a reference to the underlying Database, or an error if not initialized.
    fn db(&self) -> Result<&Database, BalloonError> {
        self.db
            .get()
            .ok_or_else(|| BalloonError::storage("storage not initialized -- call initialize() first"))
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, BalloonError> {
        let db = self.db()?;
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), BalloonError> {
        if let Some(db) = self.db.get() {
            database::checkpoint(db.connection()).await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), BalloonError> {
        let db = Database::open_with(&self.config.database_path, self.config.wal_mode).await?;
        self.db
            .set(db)
            .map_err(|_| BalloonError::storage("storage already initialized"))?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), BalloonError> {
        database::checkpoint(self.db()?.connection()).await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    // --- Users ---

    async fn ensure_user(&self, user: &User) -> Result<User, BalloonError> {
        queries::users::ensure_user(self.db()?, user).await
    }

    async fn get_user(&self, id: &UserId) -> Result<Option<User>, BalloonError> {
        queries::users::get_user(self.db()?, id).await
    }

    async fn debit_credit(
        &self,
        id: &UserId,
        now: DateTime<Utc>,
    ) -> Result<Conditional<u32>, BalloonError> {
        queries::users::debit_credit(self.db()?, id, now).await
    }

    async fn reset_credits(
        &self,
        id: &UserId,
        credits: u32,
        now: DateTime<Utc>,
    ) -> Result<(), BalloonError> {
        queries::users::reset_credits(self.db()?, id, credits, now).await
    }

    async fn grant_credit(&self, id: &UserId) -> Result<(), BalloonError> {
        queries::users::grant_credit(self.db()?, id).await
    }

    async fn clear_first_send(&self, id: &UserId) -> Result<Conditional<()>, BalloonError> {
        queries::users::clear_first_send(self.db()?, id).await
    }

    async fn set_question(
        &self,
        id: &UserId,
        question: Option<&Question>,
    ) -> Result<(), BalloonError> {
        queries::users::set_question(self.db()?, id, question).await
    }

    async fn take_question(&self, id: &UserId) -> Result<Option<Question>, BalloonError> {
        queries::users::take_question(self.db()?, id).await
    }

    // --- Channels and messages ---

    async fn next_sequence(
        &self,
        channel: &Channel,
        now: DateTime<Utc>,
    ) -> Result<u64, BalloonError> {
        queries::channels::next_sequence(self.db()?, channel, now).await
    }

    async fn insert_message(&self, message: &Message) -> Result<(), BalloonError> {
        queries::messages::insert_message(self.db()?, message).await
    }

    async fn get_message(&self, id: &MessageId) -> Result<Option<Message>, BalloonError> {
        queries::messages::get_message(self.db()?, id).await
    }

    async fn get_message_at(
        &self,
        channel: &Channel,
        sequence: u64,
        _consistency: ReadConsistency,
    ) -> Result<Option<Message>, BalloonError> {
        queries::messages::get_message_at(self.db()?, channel, sequence).await
    }

    async fn claim_delivery(
        &self,
        id: &MessageId,
        recipient: &UserId,
        now: DateTime<Utc>,
    ) -> Result<Conditional<()>, BalloonError> {
        queries::messages::claim_delivery(self.db()?, id, recipient, now).await
    }

    async fn mark_credit_returned(
        &self,
        id: &MessageId,
        by: &UserId,
    ) -> Result<Conditional<Message>, BalloonError> {
        queries::messages::mark_credit_returned(self.db()?, id, by).await
    }

    async fn channels_active_since(
        &self,
        since: NaiveDate,
    ) -> Result<Vec<ChannelActivity>, BalloonError> {
        queries::channels::channels_active_since(self.db()?, since).await
    }

    // --- Reply threads ---

    async fn insert_thread(&self, thread: &ReplyThread) -> Result<(), BalloonError> {
        queries::threads::insert_thread(self.db()?, thread).await
    }

    async fn get_thread(&self, id: &ThreadId) -> Result<Option<ReplyThread>, BalloonError> {
        queries::threads::get_thread(self.db()?, id).await
    }

    async fn claim_thread(
        &self,
        id: &ThreadId,
        now: DateTime<Utc>,
    ) -> Result<Conditional<ReplyThread>, BalloonError> {
        queries::threads::claim_thread(self.db()?, id, now).await
    }

    async fn set_thread_reply(
        &self,
        id: &ThreadId,
        reply: &MessageId,
    ) -> Result<Conditional<()>, BalloonError> {
        queries::threads::set_thread_reply(self.db()?, id, reply).await
    }

    // --- Command aliases ---

    async fn insert_alias(&self, id: &str, command: &str) -> Result<Conditional<()>, BalloonError> {
        queries::aliases::insert_alias(self.db()?, id, command).await
    }

    async fn get_alias(
        &self,
        id: &str,
        _consistency: ReadConsistency,
    ) -> Result<Option<String>, BalloonError> {
        queries::aliases::get_alias(self.db()?, id).await
    }
}
