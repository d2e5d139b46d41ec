// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod live;
pub mod provider;

pub use adapter::PluginAdapter;
pub use live::{AudioSendOutcome, LiveConnection, LiveProvider, LiveSender};
pub use provider::ChatProvider;
