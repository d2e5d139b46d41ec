// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::ConciergeConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every problem instead of failing on the first one.
pub fn validate_config(config: &ConciergeConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut invalid = |message: String| errors.push(ConfigError::Validation { message });

    if config.agent.hotel_name.trim().is_empty() {
        invalid("agent.hotel_name must not be empty".to_string());
    }

    if !LOG_LEVELS.contains(&config.agent.log_level.to_ascii_lowercase().as_str()) {
        invalid(format!(
            "agent.log_level `{}` must be one of {}",
            config.agent.log_level,
            LOG_LEVELS.join(", ")
        ));
    }

    if config.agent.max_tool_rounds == 0 {
        invalid("agent.max_tool_rounds must be at least 1".to_string());
    }

    if let Some(path) = &config.agent.system_prompt_file
        && !std::path::Path::new(path).is_file()
    {
        invalid(format!("agent.system_prompt_file `{path}` does not exist"));
    }

    for (key, value) in [
        ("gemini.chat_model", &config.gemini.chat_model),
        ("gemini.voice_model", &config.gemini.voice_model),
    ] {
        if value.trim().is_empty() {
            invalid(format!("{key} must not be empty"));
        }
    }

    if !config.gemini.base_url.starts_with("http://")
        && !config.gemini.base_url.starts_with("https://")
    {
        invalid(format!(
            "gemini.base_url `{}` must be an http(s) URL",
            config.gemini.base_url
        ));
    }

    if !config.gemini.live_url.starts_with("ws://") && !config.gemini.live_url.starts_with("wss://")
    {
        invalid(format!(
            "gemini.live_url `{}` must be a ws(s) URL",
            config.gemini.live_url
        ));
    }

    if config.gemini.setup_timeout_secs == 0 {
        invalid("gemini.setup_timeout_secs must be at least 1".to_string());
    }

    for (key, rate) in [
        ("audio.capture_sample_rate", config.audio.capture_sample_rate),
        ("audio.playback_sample_rate", config.audio.playback_sample_rate),
    ] {
        if !(8_000..=192_000).contains(&rate) {
            invalid(format!("{key} must be between 8000 and 192000 Hz, got {rate}"));
        }
    }

    if config.audio.frame_size == 0 {
        invalid("audio.frame_size must be positive".to_string());
    }

    if !config.audio.analyser_size.is_power_of_two() || config.audio.analyser_size < 32 {
        invalid(format!(
            "audio.analyser_size must be a power of two of at least 32, got {}",
            config.audio.analyser_size
        ));
    }

    if config.audio.outbound_queue_frames == 0 {
        invalid("audio.outbound_queue_frames must be positive".to_string());
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

    fn has_message(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        let config = ConciergeConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_hotel_name_fails_validation() {
        let mut config = ConciergeConfig::default();
        config.agent.hotel_name = "  ".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "agent.hotel_name"));
    }

    #[test]
    fn bad_urls_are_all_reported() {
        let mut config = ConciergeConfig::default();
        config.gemini.base_url = "ftp://example".to_string();
        config.gemini.live_url = "https://example".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(has_message(&errors, "gemini.base_url"));
        assert!(has_message(&errors, "gemini.live_url"));
    }

    #[test]
    fn analyser_size_must_be_power_of_two() {
        let mut config = ConciergeConfig::default();
        config.audio.analyser_size = 300;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "audio.analyser_size"));
    }

    #[test]
    fn unknown_log_level_fails_validation() {
        let mut config = ConciergeConfig::default();
        config.agent.log_level = "verbose".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "agent.log_level"));
    }

    #[test]
    fn missing_prompt_file_fails_validation() {
        let mut config = ConciergeConfig::default();
        config.agent.system_prompt_file = Some("/nonexistent/prompt.md".to_string());
        let errors = validate_config(&config).unwrap_err();
        assert!(has_message(&errors, "system_prompt_file"));
    }
}
