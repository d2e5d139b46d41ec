// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request/response chat provider over `generateContent`.

use async_trait::async_trait;
use concierge_config::model::GeminiConfig;
use concierge_core::types::{
    AdapterType, ChatPart, ChatRequest, ChatResponse, ChatRole, ChatTurn, HealthStatus,
    ToolInvocation,
};
use concierge_core::{ChatProvider, ConciergeError, PluginAdapter};
use tracing::{debug, info};

use crate::client::GeminiClient;
use crate::types::{
    Content, FunctionCall, FunctionResponse, GenerateContentRequest, GenerateContentResponse,
    Part, Tool,
};

/// Gemini text-mode provider implementing [`ChatProvider`].
pub struct GeminiChatProvider {
    client: GeminiClient,
}

impl GeminiChatProvider {
    /// Creates a provider from config. API key resolution order:
    /// `gemini.api_key` -> `GEMINI_API_KEY` env var -> error.
    pub fn new(config: &GeminiConfig) -> Result<Self, ConciergeError> {
        let api_key = crate::require_api_key(config)?;
        let client = GeminiClient::new(&api_key, &config.base_url, config.max_retries)?;
        info!(model = config.chat_model, "Gemini chat provider initialized");
        Ok(Self { client })
    }

    pub fn with_client(client: GeminiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PluginAdapter for GeminiChatProvider {
    fn name(&self) -> &str {
        "gemini-chat"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::ChatProvider
    }

    async fn health_check(&self) -> Result<HealthStatus, ConciergeError> {
        // Avoid spending quota on health checks; the key is validated at construction.
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl ChatProvider for GeminiChatProvider {
    async fn generate(&self, request: ChatRequest) -> Result<ChatResponse, ConciergeError> {
        let api_request = to_generate_request(&request);
        let response = self
            .client
            .generate_content(&request.model, &api_request)
            .await?;
        let chat = from_generate_response(response)?;
        debug!(
            tool_calls = chat.tool_calls.len(),
            has_text = chat.text.is_some(),
            "chat response received"
        );
        Ok(chat)
    }
}

/// Converts a provider-neutral [`ChatRequest`] to the Gemini wire request.
pub fn to_generate_request(request: &ChatRequest) -> GenerateContentRequest {
    let contents = request.history.iter().map(to_content).collect();
    let system_instruction = if request.system_instruction.is_empty() {
        None
    } else {
        Some(Content::system(request.system_instruction.clone()))
    };
    GenerateContentRequest {
        contents,
        system_instruction,
        tools: Tool::wrap(&request.tools),
    }
}

fn to_content(turn: &ChatTurn) -> Content {
    let role = match turn.role {
        ChatRole::User => "user",
        ChatRole::Model => "model",
    };
    let parts = turn
        .parts
        .iter()
        .map(|part| match part {
            ChatPart::Text { text } => Part::text(text.clone()),
            ChatPart::ToolCall(call) => Part::function_call(FunctionCall {
                id: call.id.clone(),
                name: call.name.clone(),
                args: call.args.clone(),
            }),
            ChatPart::ToolResult(result) => Part::function_response(FunctionResponse {
                id: result.id.clone(),
                name: result.name.clone(),
                response: result.response.clone(),
            }),
        })
        .collect();
    Content {
        role: Some(role.to_string()),
        parts,
    }
}

/// Extracts text and function calls from the first candidate.
pub fn from_generate_response(
    response: GenerateContentResponse,
) -> Result<ChatResponse, ConciergeError> {
    if response.candidates.is_empty()
        && let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason)
    {
        return Err(ConciergeError::Provider {
            message: format!("prompt blocked: {reason}"),
            source: None,
        });
    }

    let parts = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts)
        .unwrap_or_default();

    let mut text = String::new();
    let mut tool_calls = Vec::new();
    for part in parts {
        if part.is_thought() {
            continue;
        }
        if let Some(t) = part.text {
            text.push_str(&t);
        }
        if let Some(call) = part.function_call {
            tool_calls.push(ToolInvocation {
                id: call.id,
                name: call.name,
                args: call.args,
            });
        }
    }

    Ok(ChatResponse {
        text: (!text.trim().is_empty()).then_some(text),
        tool_calls,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use concierge_core::types::ToolResponse;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request_with_history(history: Vec<ChatTurn>) -> ChatRequest {
        ChatRequest {
            model: "gemini-3-flash-preview".into(),
            system_instruction: "You are a concierge.".into(),
            tools: vec![json!({"name": "saveServiceRequest"})],
            history,
        }
    }

    #[test]
    fn tool_round_trip_maps_to_function_parts() {
        let call = ToolInvocation {
            id: None,
            name: "saveServiceRequest".into(),
            args: json!({"details": "towels"}),
        };
        let history = vec![
            ChatTurn::user_text("Towels please"),
            ChatResponse {
                text: None,
                tool_calls: vec![call],
            }
            .as_turn(),
            ChatTurn::tool_results(vec![ToolResponse {
                id: None,
                name: "saveServiceRequest".into(),
                response: json!({"result": {"status": "success"}}),
            }]),
        ];
        let wire = serde_json::to_value(to_generate_request(&request_with_history(history))).unwrap();
        assert_eq!(wire["contents"][1]["role"], "model");
        assert_eq!(wire["contents"][1]["parts"][0]["functionCall"]["name"], "saveServiceRequest");
        assert_eq!(wire["contents"][2]["role"], "user");
        assert_eq!(
            wire["contents"][2]["parts"][0]["functionResponse"]["response"]["result"]["status"],
            "success"
        );
        assert_eq!(wire["tools"][0]["functionDeclarations"][0]["name"], "saveServiceRequest");
    }

    #[test]
    fn response_keeps_call_order_and_skips_thoughts() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{"content": {"role": "model", "parts": [
                {"text": "thinking...", "thought": true},
                {"functionCall": {"name": "updateBookingDraft", "args": {"guestName": "J. Smith"}}},
                {"functionCall": {"name": "updateBookingDraft", "args": {"email": "j@x.com"}}}
            ]}}]
        }))
        .unwrap();
        let chat = from_generate_response(response).unwrap();
        assert!(chat.text.is_none());
        assert_eq!(chat.tool_calls.len(), 2);
        assert_eq!(chat.tool_calls[1].args["email"], "j@x.com");
    }

    #[test]
    fn blocked_prompt_is_an_error() {
        let response: GenerateContentResponse =
            serde_json::from_value(json!({"promptFeedback": {"blockReason": "SAFETY"}})).unwrap();
        let err = from_generate_response(response).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn empty_candidate_yields_empty_response() {
        let chat = from_generate_response(GenerateContentResponse::default()).unwrap();
        assert_eq!(chat, ChatResponse { text: None, tool_calls: vec![] });
    }

    #[tokio::test]
    async fn generate_through_mock_server() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-3-flash-preview:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"role": "model", "parts": [{"text": "Welcome to the hotel."}]}}]
            })))
            .mount(&server)
            .await;

        let provider =
            GeminiChatProvider::with_client(GeminiClient::new("k", &server.uri(), 0).unwrap());
        let response = provider
            .generate(request_with_history(vec![ChatTurn::user_text("Hi")]))
            .await
            .unwrap();
        assert_eq!(response.text.as_deref(), Some("Welcome to the hotel."));
        assert_eq!(provider.adapter_type(), AdapterType::ChatProvider);
    }
}
