// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the concierge core.

use thiserror::Error;

/// The primary error type used across all concierge traits and core operations.
#[derive(Debug, Error)]
pub enum ConciergeError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Microphone access was refused by the platform or the user.
    #[error("microphone permission denied: {0}")]
    PermissionDenied(String),

    /// An audio device could not be opened or failed while running.
    #[error("audio device unavailable: {message}")]
    DeviceUnavailable {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An inbound audio frame could not be decoded.
    #[error("malformed audio frame: {0}")]
    MalformedAudioFrame(String),

    /// The bidirectional live session failed or could not be opened.
    #[error("remote session error: {message}")]
    RemoteSession {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A draft operation was attempted with no draft in progress.
    #[error("no active booking draft")]
    NoActiveDraft,

    /// A partial update was attempted on a confirmed draft.
    #[error("booking {booking_id} is already confirmed")]
    DraftAlreadyConfirmed { booking_id: String },

    /// Request/response model API failures (HTTP, parse, blocked prompt).
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A tool invocation carried missing or ill-typed arguments.
    #[error("invalid arguments for tool {tool}: {message}")]
    InvalidToolArguments { tool: String, message: String },

    /// A continuation resolved after its session was superseded.
    #[error("session epoch {epoch} is stale (current epoch {current})")]
    StaleSession { epoch: u64, current: u64 },

    /// A text turn was submitted while another one is still pending.
    #[error("a turn is already in flight")]
    TurnInFlight,

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ConciergeError {
    /// Short message suitable for the inline error shown to the guest.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::PermissionDenied(_) => "Microphone access denied. Please allow access and try again.",
            Self::DeviceUnavailable { .. } => "Audio device unavailable. Please check your microphone.",
            Self::RemoteSession { .. } | Self::Timeout { .. } => {
                "Connection error. Please try again."
            }
            Self::Config(_) => "The concierge is not configured correctly.",
            _ => "Something went wrong. Please try again.",
        }
    }

    /// Whether this error ends the active session when raised by a controller.
    pub fn is_session_ending(&self) -> bool {
        matches!(
            self,
            Self::PermissionDenied(_)
                | Self::DeviceUnavailable { .. }
                | Self::RemoteSession { .. }
                | Self::Timeout { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ending_errors_have_connection_messages() {
        let err = ConciergeError::RemoteSession {
            message: "socket closed".into(),
            source: None,
        };
        assert!(err.is_session_ending());
        assert_eq!(err.user_message(), "Connection error. Please try again.");

        let err = ConciergeError::PermissionDenied("denied".into());
        assert!(err.is_session_ending());
        assert!(err.user_message().contains("Microphone"));
    }

    #[test]
    fn draft_errors_do_not_end_sessions() {
        assert!(!ConciergeError::NoActiveDraft.is_session_ending());
        let err = ConciergeError::DraftAlreadyConfirmed {
            booking_id: "BK-12345".into(),
        };
        assert!(!err.is_session_ending());
        assert_eq!(err.to_string(), "booking BK-12345 is already confirmed");
    }

    #[test]
    fn malformed_frame_displays_reason() {
        let err = ConciergeError::MalformedAudioFrame("odd byte length 3".into());
        assert_eq!(err.to_string(), "malformed audio frame: odd byte length 3");
    }
}
