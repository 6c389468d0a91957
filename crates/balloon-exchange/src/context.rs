// SPDX-FileCopyrightText: 2026 Balloon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-event request context.

use balloon_core::UserId;
use chrono::{DateTime, Utc};

use crate::messages;

/// Immutable facts about the event being handled, threaded through each
/// stage. Stages that learn something new return an updated copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub user: UserId,
    pub display_name: String,
    /// Event time, read once from the clock.
    pub now: DateTime<Utc>,
    /// Credit balance as last observed during this event.
    pub credits: u32,
}

impl RequestContext {
    pub fn new(user: UserId, display_name: impl Into<String>, now: DateTime<Utc>, credits: u32) -> Self {
        Self {
            user,
            display_name: display_name.into(),
            now,
            credits,
        }
    }

    pub fn with_credits(&self, credits: u32) -> Self {
        Self {
            credits,
            ..self.clone()
        }
    }

    /// Appends the credit status line to `text`.
    pub fn with_status(&self, text: &str) -> String {
        format!("{text}\n\n{}", messages::status(self.credits))
    }
}
