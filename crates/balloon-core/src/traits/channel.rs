// SPDX-FileCopyrightText: 2026 Balloon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel adapter trait for messaging platform integrations.

use async_trait::async_trait;

use crate::error::BalloonError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{IncomingEvent, OutgoingMessage};

/// Adapter for a messaging platform.
///
/// Channel adapters parse platform payloads into [`IncomingEvent`]s and
/// render [`OutgoingMessage`]s into platform envelopes. The core never
/// talks to a transport directly.
#[async_trait]
pub trait ChannelAdapter: PluginAdapter {
    /// Maximum length of a button command the platform accepts.
    fn max_command_len(&self) -> usize;

    /// Delivers a message, returning the platform id of the sent message.
    async fn send(&self, msg: OutgoingMessage) -> Result<String, BalloonError>;

    /// Receives the next inbound event, or `None` once the channel is closed.
    async fn receive(&self) -> Result<Option<IncomingEvent>, BalloonError>;
}
