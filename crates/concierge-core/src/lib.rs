// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the hotel concierge.
//!
//! Provides the error taxonomy, the domain types shared between the voice
//! and text controllers, and the adapter traits implemented by the remote
//! model clients.

pub mod error;
pub mod traits;
pub mod types;

pub use error::ConciergeError;
pub use types::{AdapterType, HealthStatus, SessionEpoch};

pub use traits::{
    AudioSendOutcome, ChatProvider, LiveConnection, LiveProvider, LiveSender, PluginAdapter,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_type_round_trips_through_display() {
        use std::str::FromStr;

        let variants = [
            AdapterType::ChatProvider,
            AdapterType::LiveProvider,
            AdapterType::AudioSource,
            AdapterType::AudioSink,
        ];
        for variant in &variants {
            let s = variant.to_string();
            let parsed = AdapterType::from_str(&s).expect("should parse back");
            assert_eq!(*variant, parsed);
        }
    }

    #[test]
    fn epochs_order_by_generation() {
        assert!(SessionEpoch(2) > SessionEpoch(1));
        assert_eq!(SessionEpoch(7).to_string(), "7");
    }

    #[test]
    fn all_trait_modules_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_chat_provider<T: ChatProvider>() {}
        fn _assert_live_provider<T: LiveProvider>() {}
    }
}
