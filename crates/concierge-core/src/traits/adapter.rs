// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base adapter trait shared by remote-model and audio-device adapters.

use async_trait::async_trait;

use crate::error::ConciergeError;
use crate::types::{AdapterType, HealthStatus};

/// The base trait for all concierge adapters.
///
/// Every adapter (chat provider, live provider, audio device) implements
/// this trait, which provides identity and health check capabilities.
#[async_trait]
pub trait PluginAdapter: Send + Sync + 'static {
    /// Returns the human-readable name of this adapter instance.
    fn name(&self) -> &str;

    /// Returns the semantic version of this adapter.
    fn version(&self) -> semver::Version;

    /// Returns the kind of adapter.
    fn adapter_type(&self) -> AdapterType;

    /// Performs a health check and returns the adapter's current status.
    async fn health_check(&self) -> Result<HealthStatus, ConciergeError>;
}
