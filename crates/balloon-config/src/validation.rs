// SPDX-FileCopyrightText: 2026 Balloon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as non-empty paths, a well-formed default channel, and coherent
//! backoff bounds.

use crate::diagnostic::ConfigError;
use crate::model::BalloonConfig;

/// Length of an aliased command: a `:` marker followed by a 32-character id.
pub const ALIASED_COMMAND_LEN: usize = 33;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &BalloonConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if !LOG_LEVELS.contains(&config.bot.log_level.as_str()) {
        fail(format!(
            "bot.log_level `{}` is not one of {}",
            config.bot.log_level,
            LOG_LEVELS.join(", ")
        ));
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    // The default channel is compared byte-for-byte with derived keys, so it
    // must look like one.
    let channel = &config.exchange.default_channel;
    if channel.is_empty() {
        fail("exchange.default_channel must not be empty".to_string());
    } else if channel.contains(char::is_whitespace)
        || channel.contains('#')
        || channel.to_lowercase() != *channel
    {
        fail(format!(
            "exchange.default_channel `{channel}` must be a single lower-case tag without `#`"
        ));
    }

    // A timeout below the poll budget would fail every lagging pairing.
    if config.exchange.event_timeout_ms <= config.pairing.poll_max_wait_ms {
        fail(format!(
            "exchange.event_timeout_ms ({}) must exceed pairing.poll_max_wait_ms ({})",
            config.exchange.event_timeout_ms, config.pairing.poll_max_wait_ms
        ));
    }

    if config.quota.replenish_base_secs < 2 {
        fail(format!(
            "quota.replenish_base_secs must be at least 2, got {}",
            config.quota.replenish_base_secs
        ));
    }

    if config.pairing.poll_factor_ms == 0 {
        fail("pairing.poll_factor_ms must be positive".to_string());
    }

    if config.pairing.poll_max_delay_ms < config.pairing.poll_factor_ms {
        fail(format!(
            "pairing.poll_max_delay_ms ({}) must not be below pairing.poll_factor_ms ({})",
            config.pairing.poll_max_delay_ms, config.pairing.poll_factor_ms
        ));
    }

    if config.pairing.poll_max_wait_ms == 0 {
        fail("pairing.poll_max_wait_ms must be positive".to_string());
    }

    if config.threads.reply_window_secs == 0 {
        fail("threads.reply_window_secs must be positive".to_string());
    }

    if config.trending.window_days == 0 {
        fail("trending.window_days must be at least 1".to_string());
    }

    if config.trending.limit == 0 {
        fail("trending.limit must be at least 1".to_string());
    }

    if config.aliases.command_limit <= ALIASED_COMMAND_LEN {
        fail(format!(
            "aliases.command_limit must exceed {ALIASED_COMMAND_LEN}, got {}",
            config.aliases.command_limit
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_error(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        let config = BalloonConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = BalloonConfig::default();
        config.storage.database_path = "".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "database_path"));
    }

    #[test]
    fn hashtag_default_channel_fails_validation() {
        let mut config = BalloonConfig::default();
        config.exchange.default_channel = "#World".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "default_channel"));
    }

    #[test]
    fn multi_tag_default_channel_fails_validation() {
        let mut config = BalloonConfig::default();
        config.exchange.default_channel = "a b".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn inverted_backoff_bounds_fail_validation() {
        let mut config = BalloonConfig::default();
        config.pairing.poll_factor_ms = 2_000;
        config.pairing.poll_max_delay_ms = 1_000;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "poll_max_delay_ms"));
    }

    #[test]
    fn event_timeout_must_cover_the_poll() {
        let mut config = BalloonConfig::default();
        config.exchange.event_timeout_ms = config.pairing.poll_max_wait_ms;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "event_timeout_ms"));
    }

    #[test]
    fn unknown_log_level_fails_validation() {
        let mut config = BalloonConfig::default();
        config.bot.log_level = "verbose".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "log_level"));
    }

    #[test]
    fn alias_limit_must_fit_an_alias() {
        let mut config = BalloonConfig::default();
        config.aliases.command_limit = ALIASED_COMMAND_LEN;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "command_limit"));
    }

    #[test]
    fn all_errors_are_collected() {
        let mut config = BalloonConfig::default();
        config.storage.database_path = " ".to_string();
        config.trending.limit = 0;
        config.threads.reply_window_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
