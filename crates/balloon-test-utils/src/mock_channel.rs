// SPDX-FileCopyrightText: 2026 Balloon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock channel adapter for deterministic testing.
//!
//! `MockChannel` implements `ChannelAdapter` with injectable inbound events
//! and captured outbound messages for assertion in tests.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};

use balloon_core::BalloonError;
use balloon_core::traits::adapter::PluginAdapter;
use balloon_core::traits::channel::ChannelAdapter;
use balloon_core::types::{AdapterType, HealthStatus, IncomingEvent, OutgoingMessage};

/// A mock messaging channel for testing.
///
/// Provides two queues:
/// - **inbound**: events injected via `inject()` are returned by `receive()`
/// - **sent**: messages passed to `send()` are captured and retrievable via `sent_messages()`
///
/// Once `close()` is called and the inbound queue drains, `receive()` returns `None`.
pub struct MockChannel {
    inbound: Arc<Mutex<VecDeque<IncomingEvent>>>,
    sent: Arc<Mutex<Vec<OutgoingMessage>>>,
    notify: Arc<Notify>,
    closed: Arc<Mutex<bool>>,
    max_command_len: usize,
}

impl MockChannel {
    /// Create a new mock channel with empty queues and a 64-byte command limit.
    pub fn new() -> Self {
        Self::with_command_limit(64)
    }

    pub fn with_command_limit(max_command_len: usize) -> Self {
        Self {
            inbound: Arc::new(Mutex::new(VecDeque::new())),
            sent: Arc::new(Mutex::new(Vec::new())),
            notify: Arc::new(Notify::new()),
            closed: Arc::new(Mutex::new(false)),
            max_command_len,
        }
    }

    /// Inject an inbound event into the receive queue.
    pub async fn inject(&self, event: IncomingEvent) {
        self.inbound.lock().await.push_back(event);
        self.notify.notify_one();
    }

    /// Stop delivering events once the queue is empty.
    pub async fn close(&self) {
        *self.closed.lock().await = true;
        self.notify.notify_one();
    }

    /// Get all messages that were sent through `send()`.
    pub async fn sent_messages(&self) -> Vec<OutgoingMessage> {
        self.sent.lock().await.clone()
    }

    /// Get the count of sent messages.
    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// Clear all sent messages.
    pub async fn clear_sent(&self) {
        self.sent.lock().await.clear();
    }
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockChannel {
    fn name(&self) -> &str {
        "mock-channel"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Channel
    }

    async fn health_check(&self) -> Result<HealthStatus, BalloonError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), BalloonError> {
        Ok(())
    }
}

#[async_trait]
impl ChannelAdapter for MockChannel {
    fn max_command_len(&self) -> usize {
        self.max_command_len
    }

    async fn send(&self, msg: OutgoingMessage) -> Result<String, BalloonError> {
        let id = format!("mock-msg-{}", uuid::Uuid::new_v4());
        self.sent.lock().await.push(msg);
        Ok(id)
    }

    async fn receive(&self) -> Result<Option<IncomingEvent>, BalloonError> {
        loop {
            {
                let mut queue = self.inbound.lock().await;
                if let Some(event) = queue.pop_front() {
                    return Ok(Some(event));
                }
                if *self.closed.lock().await {
                    return Ok(None);
                }
            }
            self.notify.notified().await;
        }
    }
}
