// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end controller tests.
//!
//! `TestHarness` wires a [`SessionContext`] to mock providers and in-memory
//! audio devices, with every simulated delay set to zero unless the test
//! asks otherwise.

use std::sync::Arc;
use std::time::Duration;

use concierge_agent::{AgentSettings, SessionContext, TextSessionController, VoiceSessionController};
use concierge_config::model::{ConciergeConfig, TimingConfig};
use concierge_core::types::{ChatResponse, PostConfirmPolicy};
use concierge_tools::prompt;

use crate::audio::{ManualClockSink, ScriptedAudioSource};
use crate::mock_chat::MockChatProvider;
use crate::mock_live::MockLiveProvider;

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    config: ConciergeConfig,
    responses: Vec<ChatResponse>,
    system_prompt: Option<String>,
    queue_capacity: usize,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        let mut config = ConciergeConfig::default();
        config.timing = TimingConfig::immediate();
        Self {
            config,
            responses: Vec::new(),
            system_prompt: None,
            queue_capacity: 64,
        }
    }

    /// Set mock chat provider responses.
    pub fn with_chat_responses(mut self, responses: Vec<ChatResponse>) -> Self {
        self.responses = responses;
        self
    }

    pub fn with_timing(mut self, timing: TimingConfig) -> Self {
        self.config.timing = timing;
        self
    }

    pub fn with_post_confirm_policy(mut self, policy: PostConfirmPolicy) -> Self {
        self.config.booking.post_confirm_policy = policy;
        self
    }

    pub fn with_hotel_name(mut self, name: &str) -> Self {
        self.config.agent.hotel_name = name.to_string();
        self
    }

    pub fn with_max_tool_rounds(mut self, rounds: usize) -> Self {
        self.config.agent.max_tool_rounds = rounds;
        self
    }

    pub fn with_system_prompt(mut self, prompt: &str) -> Self {
        self.system_prompt = Some(prompt.to_string());
        self
    }

    /// Capacity of the mock live session's outbound queue.
    pub fn with_outbound_queue(mut self, frames: usize) -> Self {
        self.queue_capacity = frames;
        self
    }

    pub fn build(self) -> TestHarness {
        let system_prompt = self
            .system_prompt
            .unwrap_or_else(|| prompt::system_instruction(&self.config.agent.hotel_name));
        TestHarness {
            ctx: SessionContext::from_config(&self.config),
            settings: AgentSettings::new(&self.config, system_prompt),
            chat: Arc::new(MockChatProvider::with_responses(self.responses)),
            live: Arc::new(MockLiveProvider::with_queue_capacity(self.queue_capacity)),
            microphone: Arc::new(ScriptedAudioSource::new()),
            speaker: Arc::new(ManualClockSink::new()),
            config: self.config,
        }
    }
}

/// A complete controller stack over mock adapters.
pub struct TestHarness {
    pub ctx: SessionContext,
    pub settings: AgentSettings,
    pub chat: Arc<MockChatProvider>,
    pub live: Arc<MockLiveProvider>,
    pub microphone: Arc<ScriptedAudioSource>,
    pub speaker: Arc<ManualClockSink>,
    pub config: ConciergeConfig,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    pub fn text_controller(&self) -> TextSessionController {
        TextSessionController::new(self.ctx.clone(), self.chat.clone(), self.settings.clone())
    }

    pub fn voice_controller(&self) -> VoiceSessionController {
        VoiceSessionController::new(
            self.ctx.clone(),
            self.live.clone(),
            self.microphone.clone(),
            self.speaker.clone(),
            self.settings.clone(),
        )
    }
}

/// Polls `condition` until it holds, panicking after ten seconds.
pub async fn eventually(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not met within 10s"
        );
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
