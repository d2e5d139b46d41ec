// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Controller settings resolved from the loaded configuration.

use concierge_config::model::{AgentConfig, AudioConfig, ConciergeConfig};
use concierge_tools::prompt;
use tracing::{info, warn};

/// What both controllers need from the configuration, with the system
/// prompt already loaded.
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub hotel_name: String,
    pub system_instruction: String,
    pub greeting: String,
    pub chat_model: String,
    pub voice_model: String,
    pub max_tool_rounds: usize,
    pub audio: AudioConfig,
}

impl AgentSettings {
    pub fn new(config: &ConciergeConfig, system_instruction: String) -> Self {
        let agent = &config.agent;
        let greeting = agent
            .greeting
            .clone()
            .filter(|g| !g.trim().is_empty())
            .unwrap_or_else(|| prompt::greeting(&agent.hotel_name));
        Self {
            hotel_name: agent.hotel_name.clone(),
            system_instruction,
            greeting,
            chat_model: config.gemini.chat_model.clone(),
            voice_model: config.gemini.voice_model.clone(),
            max_tool_rounds: agent.max_tool_rounds.max(1),
            audio: config.audio.clone(),
        }
    }

    /// Resolves the system prompt, then builds the settings.
    pub async fn load(config: &ConciergeConfig) -> Self {
        let system_instruction = load_system_prompt(&config.agent).await;
        Self::new(config, system_instruction)
    }
}

impl Default for AgentSettings {
    fn default() -> Self {
        let config = ConciergeConfig::default();
        let instruction = prompt::system_instruction(&config.agent.hotel_name);
        Self::new(&config, instruction)
    }
}

/// Loads the system prompt.
///
/// Priority: `system_prompt_file` > `system_prompt` > the built-in prompt
/// for the configured hotel. An unreadable file falls through with a warning.
pub async fn load_system_prompt(config: &AgentConfig) -> String {
    if let Some(ref path) = config.system_prompt_file {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => {
                let trimmed = content.trim();
                if !trimmed.is_empty() {
                    info!(path = path.as_str(), "loaded system prompt from file");
                    return trimmed.to_string();
                }
            }
            Err(e) => {
                warn!(
                    path = path.as_str(),
                    error = %e,
                    "failed to read system prompt file, falling back"
                );
            }
        }
    }

    if let Some(ref inline) = config.system_prompt
        && !inline.trim().is_empty()
    {
        return inline.clone();
    }

    prompt::system_instruction(&config.hotel_name)
}
