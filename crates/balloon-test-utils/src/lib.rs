// SPDX-FileCopyrightText: 2026 Balloon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Balloon unit and integration tests.
//!
//! Provides in-memory and temporary backends, a manual clock, a mock channel
//! and an end-to-end harness, so tests run fast and deterministically
//! without external services.
//!
//! # Components
//!
//! - [`MemoryStore`] - In-memory store with simulated stale reads and outages
//! - [`ManualClock`] - Clock advanced explicitly by tests
//! - [`MockChannel`] - Mock messaging channel with event injection and capture
//! - [`TempSqlite`] - Initialized SQLite store in a temp directory
//! - [`TestHarness`] - Exchange wired to the above

pub mod clock;
pub mod harness;
pub mod memory_store;
pub mod mock_channel;
pub mod sqlite;

pub use clock::ManualClock;
pub use harness::TestHarness;
pub use memory_store::{MemoryStore, ReadKey};
pub use mock_channel::MockChannel;
pub use sqlite::TempSqlite;
