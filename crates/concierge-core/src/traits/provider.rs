// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat provider trait for the turn-based text mode.

use async_trait::async_trait;

use crate::error::ConciergeError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ChatRequest, ChatResponse};

/// Adapter for request/response exchanges with the remote model.
///
/// The provider is stateless: each request carries the full conversation
/// history, the system instruction and the declared tools.
#[async_trait]
pub trait ChatProvider: PluginAdapter {
    /// Sends one exchange and returns either text or a batch of tool calls.
    async fn generate(&self, request: ChatRequest) -> Result<ChatResponse, ConciergeError>;
}
