// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text session controller: one request/response turn at a time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use concierge_core::types::{
    ChatPart, ChatRequest, ChatRole, ChatTurn, ConversationMessage, ConversationRole,
};
use concierge_core::{ChatProvider, ConciergeError};
use concierge_tools::{function_declarations, prompt};
use tracing::{debug, error, info};

use crate::context::{EpochGuard, SessionContext};
use crate::dispatch::ToolDispatcher;
use crate::settings::AgentSettings;

struct TextState {
    guard: EpochGuard,
    messages: Vec<ConversationMessage>,
    history: Vec<ChatTurn>,
}

/// Clears the loading flag however the turn ends.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Drives the typed conversation with the chat model.
pub struct TextSessionController {
    ctx: SessionContext,
    dispatcher: ToolDispatcher,
    provider: Arc<dyn ChatProvider>,
    settings: AgentSettings,
    state: Mutex<TextState>,
    in_flight: AtomicBool,
}

impl TextSessionController {
    /// Starts a fresh session seeded with the greeting.
    pub fn new(ctx: SessionContext, provider: Arc<dyn ChatProvider>, settings: AgentSettings) -> Self {
        let guard = ctx.begin_epoch();
        let greeting = ConversationMessage::new(ConversationRole::Agent, settings.greeting.clone());
        Self {
            dispatcher: ToolDispatcher::new(ctx.clone(), settings.hotel_name.clone()),
            ctx,
            provider,
            settings,
            state: Mutex::new(TextState {
                guard,
                messages: vec![greeting],
                history: Vec::new(),
            }),
            in_flight: AtomicBool::new(false),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TextState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn context(&self) -> &SessionContext {
        &self.ctx
    }

    pub fn messages(&self) -> Vec<ConversationMessage> {
        self.lock().messages.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Sends one guest message and returns the agent's reply.
    ///
    /// Blank input is ignored. A failed turn appends and returns the
    /// apology; its exchange is dropped from the remote history. If the
    /// session is reset while the turn is pending, the reply is discarded
    /// and [`ConciergeError::StaleSession`] is returned.
    pub async fn send_turn(&self, text: &str) -> Result<Option<ConversationMessage>, ConciergeError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        let _in_flight = InFlight::acquire(&self.in_flight).ok_or(ConciergeError::TurnInFlight)?;

        let (guard, mut history) = {
            let mut state = self.lock();
            state
                .messages
                .push(ConversationMessage::new(ConversationRole::User, text));
            let mut history = state.history.clone();
            history.push(ChatTurn::user_text(text));
            (state.guard.clone(), history)
        };

        let result = tokio::select! {
            biased;
            _ = guard.cancelled() => Err(ConciergeError::StaleSession {
                epoch: guard.epoch().0,
                current: self.ctx.current_epoch().0,
            }),
            result = self.run_turn(&guard, &mut history) => result,
        };

        let mut state = self.lock();
        if state.guard.epoch() != guard.epoch() {
            debug!(epoch = %guard.epoch(), "discarding reply from a reset session");
            return Err(ConciergeError::StaleSession {
                epoch: guard.epoch().0,
                current: state.guard.epoch().0,
            });
        }

        let reply = match result {
            Ok(reply) => {
                state.history = history;
                reply
            }
            Err(err) => {
                error!(epoch = %guard.epoch(), error = %err, "text turn failed");
                prompt::APOLOGY.to_string()
            }
        };
        let message = ConversationMessage::new(ConversationRole::Agent, reply);
        state.messages.push(message.clone());
        Ok(Some(message))
    }

    async fn run_turn(
        &self,
        guard: &EpochGuard,
        history: &mut Vec<ChatTurn>,
    ) -> Result<String, ConciergeError> {
        let max_rounds = self.settings.max_tool_rounds;
        for round in 0..=max_rounds {
            let response = self.provider.generate(self.request(history)).await?;
            if response.tool_calls.is_empty() {
                let text = response
                    .text
                    .unwrap_or_else(|| prompt::FALLBACK_REPLY.to_string());
                history.push(ChatTurn {
                    role: ChatRole::Model,
                    parts: vec![ChatPart::Text { text: text.clone() }],
                });
                return Ok(text);
            }
            if round == max_rounds {
                break;
            }

            debug!(round, count = response.tool_calls.len(), "resolving tool calls");
            history.push(response.as_turn());
            let results = self
                .dispatcher
                .dispatch_batch(guard, &response.tool_calls)
                .await?;
            history.push(ChatTurn::tool_results(results));
        }
        Err(ConciergeError::Internal(format!(
            "model requested tools for more than {max_rounds} rounds"
        )))
    }

    fn request(&self, history: &[ChatTurn]) -> ChatRequest {
        ChatRequest {
            model: self.settings.chat_model.clone(),
            system_instruction: self.settings.system_instruction.clone(),
            tools: function_declarations(),
            history: history.to_vec(),
        }
    }

    /// Discards the conversation and starts over from the greeting.
    ///
    /// Clears the draft and the manager-call status; a pending turn is
    /// abandoned.
    pub fn reset_session(&self) {
        let mut state = self.lock();
        state.guard = self.ctx.begin_epoch();
        state.messages = vec![ConversationMessage::new(
            ConversationRole::Agent,
            self.settings.greeting.clone(),
        )];
        state.history.clear();
        info!(epoch = %state.guard.epoch(), "text session reset");
    }
}
