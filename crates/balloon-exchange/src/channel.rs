// SPDX-FileCopyrightText: 2026 Balloon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel derivation from message text.

use std::collections::BTreeSet;

use balloon_core::Channel;

/// Derive the channel key of a message.
///
/// Whitespace-separated tokens starting with `#` are the message's hashtags.
/// The marker is stripped, tags are lower-cased, de-duplicated and sorted,
/// then joined with single spaces. A message without any non-empty hashtag
/// belongs to `default`.
pub fn derive_channel(text: &str, default: &str) -> Channel {
    let tags: BTreeSet<String> = text
        .split_whitespace()
        .filter_map(|token| token.strip_prefix('#'))
        .filter(|tag| !tag.is_empty())
        .map(str::to_lowercase)
        .collect();

    if tags.is_empty() {
        return Channel(default.to_string());
    }
    Channel(tags.into_iter().collect::<Vec<_>>().join(" "))
}
