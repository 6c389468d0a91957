// SPDX-FileCopyrightText: 2026 Balloon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Balloon message exchange.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level Balloon configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BalloonConfig {
    /// Bot identity and logging.
    #[serde(default)]
    pub bot: BotConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Message exchange settings.
    #[serde(default)]
    pub exchange: ExchangeConfig,

    /// Send quota settings.
    #[serde(default)]
    pub quota: QuotaConfig,

    /// Predecessor lookup polling settings.
    #[serde(default)]
    pub pairing: PairingConfig,

    /// Reply thread settings.
    #[serde(default)]
    pub threads: ThreadsConfig,

    /// Trending list settings.
    #[serde(default)]
    pub trending: TrendingConfig,

    /// Command alias settings.
    #[serde(default)]
    pub aliases: AliasConfig,
}

/// Bot identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BotConfig {
    /// Display name of the bot.
    #[serde(default = "default_bot_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: default_bot_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_bot_name() -> String {
    "balloon".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("balloon").join("balloon.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("balloon.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Message exchange configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ExchangeConfig {
    /// Channel used for messages without any hashtag.
    #[serde(default = "default_channel")]
    pub default_channel: String,

    /// Minimum message length in characters, hashtags included. 0 disables the check.
    #[serde(default)]
    pub min_message_length: usize,

    /// Upper bound on handling one inbound event, store round trips and
    /// predecessor polling included.
    #[serde(default = "default_event_timeout_ms")]
    pub event_timeout_ms: u64,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            default_channel: default_channel(),
            min_message_length: 0,
            event_timeout_ms: default_event_timeout_ms(),
        }
    }
}

impl ExchangeConfig {
    pub fn event_timeout(&self) -> Duration {
        Duration::from_millis(self.event_timeout_ms)
    }
}

fn default_channel() -> String {
    "world".to_string()
}

fn default_event_timeout_ms() -> u64 {
    30_000
}

/// Send quota configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QuotaConfig {
    /// Credits granted to a user on first interaction.
    #[serde(default = "default_initial_credits")]
    pub initial_credits: u32,

    /// Base interval of the halving replenishment rule, in seconds.
    #[serde(default = "default_replenish_base_secs")]
    pub replenish_base_secs: u64,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            initial_credits: default_initial_credits(),
            replenish_base_secs: default_replenish_base_secs(),
        }
    }
}

impl QuotaConfig {
    pub fn replenish_base(&self) -> Duration {
        Duration::from_secs(self.replenish_base_secs)
    }
}

fn default_initial_credits() -> u32 {
    5
}

fn default_replenish_base_secs() -> u64 {
    3600
}

/// Backoff settings for polling reads that may lag behind writes.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PairingConfig {
    /// First backoff delay in milliseconds; each later delay doubles.
    #[serde(default = "default_poll_factor_ms")]
    pub poll_factor_ms: u64,

    /// Cap on a single backoff delay in milliseconds.
    #[serde(default = "default_poll_max_delay_ms")]
    pub poll_max_delay_ms: u64,

    /// Cap on the total time spent polling in milliseconds.
    #[serde(default = "default_poll_max_wait_ms")]
    pub poll_max_wait_ms: u64,
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            poll_factor_ms: default_poll_factor_ms(),
            poll_max_delay_ms: default_poll_max_delay_ms(),
            poll_max_wait_ms: default_poll_max_wait_ms(),
        }
    }
}

fn default_poll_factor_ms() -> u64 {
    125
}

fn default_poll_max_delay_ms() -> u64 {
    1_000
}

fn default_poll_max_wait_ms() -> u64 {
    5_000
}

/// Reply thread configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ThreadsConfig {
    /// How long a delivered message can be replied to, in seconds.
    #[serde(default = "default_reply_window_secs")]
    pub reply_window_secs: u64,

    /// Extra tolerance added to the reply window, in seconds.
    #[serde(default = "default_grace_secs")]
    pub grace_secs: u64,
}

impl Default for ThreadsConfig {
    fn default() -> Self {
        Self {
            reply_window_secs: default_reply_window_secs(),
            grace_secs: default_grace_secs(),
        }
    }
}

impl ThreadsConfig {
    /// Total time after thread creation during which a reply is still delivered.
    pub fn reply_deadline(&self) -> Duration {
        Duration::from_secs(self.reply_window_secs + self.grace_secs)
    }
}

fn default_reply_window_secs() -> u64 {
    24 * 60 * 60
}

fn default_grace_secs() -> u64 {
    60
}

/// Trending list configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TrendingConfig {
    /// Number of days of activity considered, today included.
    #[serde(default = "default_window_days")]
    pub window_days: u32,

    /// Maximum number of channels listed.
    #[serde(default = "default_trending_limit")]
    pub limit: usize,
}

impl Default for TrendingConfig {
    fn default() -> Self {
        Self {
            window_days: default_window_days(),
            limit: default_trending_limit(),
        }
    }
}

fn default_window_days() -> u32 {
    7
}

fn default_trending_limit() -> usize {
    10
}

/// Command alias configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AliasConfig {
    /// Commands at least this long are replaced by a short alias.
    #[serde(default = "default_command_limit")]
    pub command_limit: usize,
}

impl Default for AliasConfig {
    fn default() -> Self {
        Self {
            command_limit: default_command_limit(),
        }
    }
}

fn default_command_limit() -> usize {
    64
}
