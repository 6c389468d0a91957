// SPDX-FileCopyrightText: 2026 Balloon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end exchange scenarios.
//!
//! `TestHarness` assembles an [`Exchange`] over an in-memory or temp SQLite
//! store and a manual clock, and offers helpers that build inbound events
//! for named users.

use std::sync::Arc;

use balloon_config::BalloonConfig;
use balloon_core::types::{
    IncomingButtonCallback, IncomingCommand, IncomingEvent, IncomingMessage, OutgoingMessage,
};
use balloon_core::{BalloonError, StorageAdapter, ThreadId, UserId};
use balloon_exchange::Exchange;

use crate::clock::ManualClock;
use crate::memory_store::MemoryStore;
use crate::sqlite::TempSqlite;

/// Platform name used for harness user ids.
pub const PLATFORM: &str = "test";

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    config: BalloonConfig,
    sqlite: bool,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            config: BalloonConfig::default(),
            sqlite: false,
        }
    }

    /// Use `config` instead of the defaults.
    pub fn with_config(mut self, config: BalloonConfig) -> Self {
        self.config = config;
        self
    }

    /// Back the exchange with a temporary SQLite database.
    pub fn with_sqlite(mut self) -> Self {
        self.sqlite = true;
        self
    }

    pub async fn build(self) -> Result<TestHarness, BalloonError> {
        let clock = Arc::new(ManualClock::fixed());
        let mut memory = None;
        let mut sqlite = None;
        let store: Arc<dyn StorageAdapter + Send + Sync> = if self.sqlite {
            let temp = TempSqlite::new().await?;
            let store = temp.store();
            sqlite = Some(temp);
            store
        } else {
            let store = Arc::new(MemoryStore::new());
            memory = Some(store.clone());
            store as Arc<dyn StorageAdapter + Send + Sync>
        };

        Ok(TestHarness {
            exchange: Exchange::new(store.clone(), clock.clone(), &self.config),
            store,
            memory,
            clock,
            config: self.config,
            _sqlite: sqlite,
        })
    }
}

/// A complete exchange with a controllable clock.
pub struct TestHarness {
    pub exchange: Exchange,
    pub store: Arc<dyn StorageAdapter + Send + Sync>,
    /// The in-memory store, when not running on SQLite.
    pub memory: Option<Arc<MemoryStore>>,
    pub clock: Arc<ManualClock>,
    pub config: BalloonConfig,
    /// Temp database kept alive for cleanup on drop.
    _sqlite: Option<TempSqlite>,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// An in-memory harness with default configuration.
    pub async fn new() -> Result<Self, BalloonError> {
        Self::builder().build().await
    }

    /// The id of the named test user.
    pub fn user(name: &str) -> UserId {
        UserId::new(PLATFORM, name)
    }

    /// `name` writes a freeform message.
    pub async fn send(&self, name: &str, text: &str) -> Result<Vec<OutgoingMessage>, BalloonError> {
        self.exchange
            .handle(IncomingEvent::Message(IncomingMessage {
                user: Self::user(name),
                display_name: name.to_string(),
                text: text.to_string(),
                reply_to: None,
            }))
            .await
    }

    /// `name` answers `thread` with their platform's native reply feature.
    pub async fn reply_natively(
        &self,
        name: &str,
        thread: &ThreadId,
        text: &str,
    ) -> Result<Vec<OutgoingMessage>, BalloonError> {
        self.exchange
            .handle(IncomingEvent::Message(IncomingMessage {
                user: Self::user(name),
                display_name: name.to_string(),
                text: text.to_string(),
                reply_to: Some(thread.clone()),
            }))
            .await
    }

    /// `name` types a command.
    pub async fn command(
        &self,
        name: &str,
        text: &str,
    ) -> Result<Vec<OutgoingMessage>, BalloonError> {
        self.exchange
            .handle(IncomingEvent::Command(IncomingCommand {
                user: Self::user(name),
                text: text.to_string(),
            }))
            .await
    }

    /// `name` presses a button carrying `payload`.
    pub async fn press(
        &self,
        name: &str,
        payload: &str,
    ) -> Result<Vec<OutgoingMessage>, BalloonError> {
        self.exchange
            .handle(IncomingEvent::ButtonCallback(IncomingButtonCallback {
                user: Self::user(name),
                payload: payload.to_string(),
                original_message: None,
            }))
            .await
    }

    /// Stored credits of the named user.
    pub async fn credits(&self, name: &str) -> Result<Option<u32>, BalloonError> {
        self.exchange.credits(&Self::user(name)).await
    }
}
