// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the concierge.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use concierge_core::types::PostConfirmPolicy;
use serde::{Deserialize, Serialize};

/// Top-level concierge configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to the values
/// the hosted demo runs with.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConciergeConfig {
    /// Concierge identity and conversation settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Remote model endpoints and credentials.
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Capture and playback parameters.
    #[serde(default)]
    pub audio: AudioConfig,

    /// Simulated delays and display timeouts of the tool handlers.
    #[serde(default)]
    pub timing: TimingConfig,

    /// Booking draft behavior.
    #[serde(default)]
    pub booking: BookingConfig,
}

/// Concierge identity and conversation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Hotel name used in the greeting and the default system prompt.
    #[serde(default = "default_hotel_name")]
    pub hotel_name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Inline system prompt string. Overridden by `system_prompt_file` if both set.
    #[serde(default)]
    pub system_prompt: Option<String>,

    /// Path to a markdown file containing the system prompt.
    #[serde(default)]
    pub system_prompt_file: Option<String>,

    /// Text-mode greeting override.
    #[serde(default)]
    pub greeting: Option<String>,

    /// Maximum consecutive tool batches resolved within one text turn.
    #[serde(default = "default_max_tool_rounds")]
    pub max_tool_rounds: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            hotel_name: default_hotel_name(),
            log_level: default_log_level(),
            system_prompt: None,
            system_prompt_file: None,
            greeting: None,
            max_tool_rounds: default_max_tool_rounds(),
        }
    }
}

fn default_hotel_name() -> String {
    "Grand Horizon Hotel".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_tool_rounds() -> usize {
    5
}

/// Remote model configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeminiConfig {
    /// API key. `None` requires `CONCIERGE_GEMINI_API_KEY` or `GEMINI_API_KEY`.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model used for the turn-based text mode.
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Native-audio model used for the live voice mode.
    #[serde(default = "default_voice_model")]
    pub voice_model: String,

    /// REST endpoint root for `generateContent`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Websocket endpoint for the bidirectional live session.
    #[serde(default = "default_live_url")]
    pub live_url: String,

    /// How long to wait for the live session to acknowledge its setup.
    #[serde(default = "default_setup_timeout_secs")]
    pub setup_timeout_secs: u64,

    /// Retries on transient HTTP errors (429, 500, 503).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            chat_model: default_chat_model(),
            voice_model: default_voice_model(),
            base_url: default_base_url(),
            live_url: default_live_url(),
            setup_timeout_secs: default_setup_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

impl GeminiConfig {
    /// The configured key, falling back to the conventional `GEMINI_API_KEY`.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var("GEMINI_API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
    }

    pub fn setup_timeout(&self) -> Duration {
        Duration::from_secs(self.setup_timeout_secs)
    }
}

fn default_chat_model() -> String {
    "gemini-3-flash-preview".to_string()
}

fn default_voice_model() -> String {
    "gemini-2.5-flash-native-audio-preview-09-2025".to_string()
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_live_url() -> String {
    "wss://generativelanguage.googleapis.com/ws/google.ai.generativelanguage.v1beta.GenerativeService.BidiGenerateContent".to_string()
}

fn default_setup_timeout_secs() -> u64 {
    10
}

fn default_max_retries() -> u32 {
    1
}

/// Audio pipeline configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AudioConfig {
    /// Microphone capture rate sent to the remote model.
    #[serde(default = "default_capture_sample_rate")]
    pub capture_sample_rate: u32,

    /// Output rate the playback context runs at.
    #[serde(default = "default_playback_sample_rate")]
    pub playback_sample_rate: u32,

    /// Samples per captured frame.
    #[serde(default = "default_frame_size")]
    pub frame_size: usize,

    /// Samples held by the visualizer's analyser tap.
    #[serde(default = "default_analyser_size")]
    pub analyser_size: usize,

    /// Capacity of the outbound queue, in frames.
    #[serde(default = "default_outbound_queue_frames")]
    pub outbound_queue_frames: usize,

    /// Input device name. `None` uses the host default.
    #[serde(default)]
    pub input_device: Option<String>,

    /// Output device name. `None` uses the host default.
    #[serde(default)]
    pub output_device: Option<String>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            capture_sample_rate: default_capture_sample_rate(),
            playback_sample_rate: default_playback_sample_rate(),
            frame_size: default_frame_size(),
            analyser_size: default_analyser_size(),
            outbound_queue_frames: default_outbound_queue_frames(),
            input_device: None,
            output_device: None,
        }
    }
}

fn default_capture_sample_rate() -> u32 {
    16_000
}

fn default_playback_sample_rate() -> u32 {
    24_000
}

fn default_frame_size() -> usize {
    4096
}

fn default_analyser_size() -> usize {
    256
}

fn default_outbound_queue_frames() -> usize {
    64
}

/// Simulated delays of the tool handlers, in milliseconds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TimingConfig {
    #[serde(default = "default_manager_call_delay_ms")]
    pub manager_call_delay_ms: u64,

    #[serde(default = "default_manager_message_delay_ms")]
    pub manager_message_delay_ms: u64,

    #[serde(default = "default_email_dispatch_delay_ms")]
    pub email_dispatch_delay_ms: u64,

    /// How long a confirmed draft stays visible before it is cleared.
    #[serde(default = "default_confirmation_display_ms")]
    pub confirmation_display_ms: u64,

    /// How long the manager status shows `completed` before returning to idle.
    #[serde(default = "default_manager_status_reset_ms")]
    pub manager_status_reset_ms: u64,

    #[serde(default = "default_notification_ttl_ms")]
    pub notification_ttl_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            manager_call_delay_ms: default_manager_call_delay_ms(),
            manager_message_delay_ms: default_manager_message_delay_ms(),
            email_dispatch_delay_ms: default_email_dispatch_delay_ms(),
            confirmation_display_ms: default_confirmation_display_ms(),
            manager_status_reset_ms: default_manager_status_reset_ms(),
            notification_ttl_ms: default_notification_ttl_ms(),
        }
    }
}

impl TimingConfig {
    /// All delays set to zero, for tests and scripted runs.
    pub fn immediate() -> Self {
        Self {
            manager_call_delay_ms: 0,
            manager_message_delay_ms: 0,
            email_dispatch_delay_ms: 0,
            confirmation_display_ms: 0,
            manager_status_reset_ms: 0,
            notification_ttl_ms: 0,
        }
    }

    pub fn manager_call_delay(&self) -> Duration {
        Duration::from_millis(self.manager_call_delay_ms)
    }

    pub fn manager_message_delay(&self) -> Duration {
        Duration::from_millis(self.manager_message_delay_ms)
    }

    pub fn email_dispatch_delay(&self) -> Duration {
        Duration::from_millis(self.email_dispatch_delay_ms)
    }

    pub fn confirmation_display(&self) -> Duration {
        Duration::from_millis(self.confirmation_display_ms)
    }

    pub fn manager_status_reset(&self) -> Duration {
        Duration::from_millis(self.manager_status_reset_ms)
    }

    pub fn notification_ttl(&self) -> Duration {
        Duration::from_millis(self.notification_ttl_ms)
    }
}

fn default_manager_call_delay_ms() -> u64 {
    3000
}

fn default_manager_message_delay_ms() -> u64 {
    2000
}

fn default_email_dispatch_delay_ms() -> u64 {
    1500
}

fn default_confirmation_display_ms() -> u64 {
    5000
}

fn default_manager_status_reset_ms() -> u64 {
    3000
}

fn default_notification_ttl_ms() -> u64 {
    4000
}

/// Booking draft configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BookingConfig {
    /// What a confirmed draft does with further `updateBookingDraft` calls.
    #[serde(default)]
    pub post_confirm_policy: PostConfirmPolicy,
}
