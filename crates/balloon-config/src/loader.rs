// SPDX-FileCopyrightText: 2026 Balloon Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./balloon.toml` > `~/.config/balloon/balloon.toml` > `/etc/balloon/balloon.toml`
//! with environment variable overrides via `BALLOON_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::BalloonConfig;

/// Config sections addressable as `BALLOON_<SECTION>_<KEY>`.
const ENV_SECTIONS: &[&str] = &[
    "bot", "storage", "exchange", "quota", "pairing", "threads", "trending", "aliases",
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/balloon/balloon.toml` (system-wide)
/// 3. `~/.config/balloon/balloon.toml` (user XDG config)
/// 4. `./balloon.toml` (local directory)
/// 5. `BALLOON_*` environment variables
pub fn load_config() -> Result<BalloonConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<BalloonConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(BalloonConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<BalloonConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(BalloonConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(BalloonConfig::default()))
        .merge(Toml::file("/etc/balloon/balloon.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("balloon/balloon.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("balloon.toml"))
        .merge(env_provider())
}

/// Create the environment variable provider with explicit section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `BALLOON_QUOTA_INITIAL_CREDITS` must map to
/// `quota.initial_credits`, not `quota.initial.credits`.
fn env_provider() -> Env {
    Env::prefixed("BALLOON_").map(|key| map_env_key(key.as_str()).into())
}

/// Maps a prefix-stripped env var name onto a dotted config path.
///
/// Figment hands the key over before lowercasing it, so matching is done on
/// a lowercased copy.
fn map_env_key(key: &str) -> String {
    let key = key.to_ascii_lowercase();
    for section in ENV_SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|rest| rest.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_sections() {
        assert_eq!(map_env_key("quota_initial_credits"), "quota.initial_credits");
        assert_eq!(map_env_key("storage_database_path"), "storage.database_path");
        assert_eq!(map_env_key("bot_log_level"), "bot.log_level");
        assert_eq!(map_env_key("unrelated"), "unrelated");
    }

    #[test]
    fn upper_case_env_keys_map_to_sections() {
        assert_eq!(map_env_key("QUOTA_INITIAL_CREDITS"), "quota.initial_credits");
        assert_eq!(
            map_env_key("EXCHANGE_DEFAULT_CHANNEL"),
            "exchange.default_channel"
        );
    }

    #[test]
    fn env_override_applies_over_file() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("custom.toml", "[quota]\ninitial_credits = 2\n")?;
            jail.set_env("BALLOON_QUOTA_INITIAL_CREDITS", "9");
            let config = load_config_from_path(Path::new("custom.toml"))?;
            assert_eq!(config.quota.initial_credits, 9);
            Ok(())
        });
    }
}
