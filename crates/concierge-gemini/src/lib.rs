// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gemini adapters for the concierge.
//!
//! [`GeminiChatProvider`] implements the turn-based text mode over
//! `generateContent`; [`GeminiLiveProvider`] implements the voice mode over
//! the bidirectional live websocket.

pub mod chat;
pub mod client;
pub mod live;
pub mod types;

use concierge_config::model::GeminiConfig;
use concierge_core::ConciergeError;

pub use chat::GeminiChatProvider;
pub use client::GeminiClient;
pub use live::GeminiLiveProvider;

pub(crate) fn require_api_key(config: &GeminiConfig) -> Result<String, ConciergeError> {
    config.resolve_api_key().ok_or_else(|| {
        ConciergeError::Config(
            "Gemini API key not found. Set gemini.api_key in config or the GEMINI_API_KEY environment variable.".into(),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_key_is_used() {
        let config = GeminiConfig {
            api_key: Some("key-123".into()),
            ..GeminiConfig::default()
        };
        assert_eq!(require_api_key(&config).unwrap(), "key-123");
    }

    #[test]
    fn missing_key_names_both_sources() {
        let config = GeminiConfig {
            api_key: Some("  ".into()),
            ..GeminiConfig::default()
        };
        // Succeeds only when GEMINI_API_KEY is exported in the test environment.
        if let Err(err) = require_api_key(&config) {
            let msg = err.to_string();
            assert!(msg.contains("gemini.api_key"), "got: {msg}");
            assert!(msg.contains("GEMINI_API_KEY"), "got: {msg}");
        }
    }
}
