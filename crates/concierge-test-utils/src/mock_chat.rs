// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock chat provider for deterministic text-mode tests.
//!
//! `MockChatProvider` pops scripted replies from a FIFO queue and records
//! every request it receives. An exhausted queue is a provider error.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use concierge_core::types::{AdapterType, ChatRequest, ChatResponse, HealthStatus, ToolInvocation};
use concierge_core::{ChatProvider, ConciergeError, PluginAdapter};
use serde_json::Value;

enum Scripted {
    Reply(ChatResponse),
    Failure(String),
}

/// A chat provider that replays pre-configured responses.
pub struct MockChatProvider {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<ChatRequest>>,
    latency: Duration,
}

impl MockChatProvider {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            latency: Duration::ZERO,
        }
    }

    pub fn with_responses(responses: Vec<ChatResponse>) -> Self {
        let provider = Self::new();
        for response in responses {
            provider.push_response(response);
        }
        provider
    }

    /// Delays every reply, for tests that act while a turn is pending.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn push_response(&self, response: ChatResponse) {
        self.script.lock().unwrap().push_back(Scripted::Reply(response));
    }

    pub fn push_text(&self, text: &str) {
        self.push_response(text_reply(text));
    }

    /// Queues a reply made only of tool calls, given as `(name, args)`.
    pub fn push_tool_calls(&self, calls: Vec<(&str, Value)>) {
        self.push_response(tool_reply(calls));
    }

    pub fn push_error(&self, message: &str) {
        self.script
            .lock()
            .unwrap()
            .push_back(Scripted::Failure(message.to_string()));
    }

    /// Every request received so far, oldest first.
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap().len()
    }
}

impl Default for MockChatProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// A plain text reply.
pub fn text_reply(text: &str) -> ChatResponse {
    ChatResponse {
        text: Some(text.to_string()),
        tool_calls: Vec::new(),
    }
}

/// A reply carrying only tool calls.
pub fn tool_reply(calls: Vec<(&str, Value)>) -> ChatResponse {
    ChatResponse {
        text: None,
        tool_calls: calls
            .into_iter()
            .map(|(name, args)| ToolInvocation {
                id: None,
                name: name.to_string(),
                args,
            })
            .collect(),
    }
}

#[async_trait]
impl PluginAdapter for MockChatProvider {
    fn name(&self) -> &str {
        "mock-chat"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::ChatProvider
    }

    async fn health_check(&self) -> Result<HealthStatus, ConciergeError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl ChatProvider for MockChatProvider {
    async fn generate(&self, request: ChatRequest) -> Result<ChatResponse, ConciergeError> {
        self.requests.lock().unwrap().push(request);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Scripted::Reply(response)) => Ok(response),
            Some(Scripted::Failure(message)) => Err(ConciergeError::Provider {
                message,
                source: None,
            }),
            None => Err(ConciergeError::Provider {
                message: "mock chat provider has no scripted response".into(),
                source: None,
            }),
        }
    }
}
