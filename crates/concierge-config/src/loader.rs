// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./concierge.toml` > `~/.config/concierge/concierge.toml`
//! > `/etc/concierge/concierge.toml` with environment variable overrides via the
//! `CONCIERGE_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::ConciergeConfig;

/// System-wide configuration file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/concierge/concierge.toml";

/// Local configuration file, relative to the working directory.
pub const LOCAL_CONFIG_FILE: &str = "concierge.toml";

/// Path of the per-user configuration file, if a config directory exists.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("concierge/concierge.toml"))
}

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/concierge/concierge.toml` (system-wide)
/// 3. `~/.config/concierge/concierge.toml` (user XDG config)
/// 4. `./concierge.toml` (local directory)
/// 5. `CONCIERGE_*` environment variables
pub fn load_config() -> Result<ConciergeConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<ConciergeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ConciergeConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<ConciergeConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(ConciergeConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for XDG config loading, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(ConciergeConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// Environment provider mapping the first underscore after a section name to a dot.
///
/// Uses `Env::map()` rather than `Env::split("_")` because keys contain
/// underscores: `CONCIERGE_GEMINI_API_KEY` must map to `gemini.api_key`,
/// not `gemini.api.key`.
fn env_provider() -> Env {
    Env::prefixed("CONCIERGE_").map(|key| {
        let mapped = map_env_key(key.as_str());
        mapped.into()
    })
}

/// Maps a lowercased, prefix-stripped env key onto its dotted config path.
pub(crate) fn map_env_key(key: &str) -> String {
    const SECTIONS: [&str; 5] = ["agent", "gemini", "audio", "timing", "booking"];
    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section)
            && let Some(field) = rest.strip_prefix('_')
        {
            return format!("{section}.{field}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_map_to_sections() {
        assert_eq!(map_env_key("gemini_api_key"), "gemini.api_key");
        assert_eq!(map_env_key("timing_manager_call_delay_ms"), "timing.manager_call_delay_ms");
        assert_eq!(map_env_key("booking_post_confirm_policy"), "booking.post_confirm_policy");
        assert_eq!(map_env_key("unrelated"), "unrelated");
    }

    #[test]
    fn env_overrides_file_values() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(
                "custom.toml",
                r#"
[agent]
hotel_name = "Seaside Inn"
"#,
            )?;
            jail.set_env("CONCIERGE_AGENT_HOTEL_NAME", "Harbor Lodge");
            jail.set_env("CONCIERGE_TIMING_MANAGER_CALL_DELAY_MS", "10");

            let config = load_config_from_path(Path::new("custom.toml"))?;
            assert_eq!(config.agent.hotel_name, "Harbor Lodge");
            assert_eq!(config.timing.manager_call_delay_ms, 10);
            Ok(())
        });
    }
}
