// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Gemini `generateContent` endpoint.
//!
//! Provides [`GeminiClient`] which handles request construction,
//! authentication and transient error retry.

use std::time::Duration;

use concierge_core::ConciergeError;
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, warn};

use crate::types::{ApiErrorResponse, GenerateContentRequest, GenerateContentResponse};

/// HTTP client for Gemini REST communication.
///
/// Retries transient errors (429, 500, 502, 503) up to `max_retries` times.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    base_url: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl GeminiClient {
    /// Creates a client that authenticates every request with `api_key`.
    pub fn new(api_key: &str, base_url: &str, max_retries: u32) -> Result<Self, ConciergeError> {
        let mut headers = HeaderMap::new();
        let mut key = HeaderValue::from_str(api_key)
            .map_err(|e| ConciergeError::Config(format!("invalid API key header value: {e}")))?;
        key.set_sensitive(true);
        headers.insert("x-goog-api-key", key);
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| ConciergeError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retries,
            retry_delay: Duration::from_secs(1),
        })
    }

    /// Overrides the pause between retries.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{model}:generateContent", self.base_url)
    }

    /// Sends one `generateContent` request and returns the parsed response.
    pub async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, ConciergeError> {
        let url = self.endpoint(model);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying generateContent after transient error");
                tokio::time::sleep(self.retry_delay).await;
            }

            let response = self
                .client
                .post(&url)
                .json(request)
                .send()
                .await
                .map_err(|e| ConciergeError::Provider {
                    message: format!("HTTP request failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(status = %status, attempt, model, "generateContent response received");

            if status.is_success() {
                let body = response.text().await.map_err(|e| ConciergeError::Provider {
                    message: format!("failed to read response body: {e}"),
                    source: Some(Box::new(e)),
                })?;
                return serde_json::from_str(&body).map_err(|e| ConciergeError::Provider {
                    message: format!("failed to parse API response: {e}"),
                    source: Some(Box::new(e)),
                });
            }

            let body = response.text().await.unwrap_or_default();
            let error = ConciergeError::Provider {
                message: describe_error(status, &body),
                source: None,
            };

            if is_transient_error(status) && attempt < self.max_retries {
                warn!(status = %status, "transient error, will retry");
                last_error = Some(error);
                continue;
            }
            return Err(error);
        }

        Err(last_error.unwrap_or_else(|| ConciergeError::Provider {
            message: "generateContent failed after retries".into(),
            source: None,
        }))
    }
}

fn describe_error(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<ApiErrorResponse>(body) {
        Ok(api_err) => format!(
            "Gemini API error ({}): {}",
            api_err.error.status.as_deref().unwrap_or(status.as_str()),
            api_err.error.message
        ),
        Err(_) => format!("API returned {status}: {body}"),
    }
}

/// Returns true for HTTP status codes that indicate transient errors worth retrying.
fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Content, Part, Tool};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MODEL: &str = "gemini-3-flash-preview";
    const ENDPOINT: &str = "/models/gemini-3-flash-preview:generateContent";

    fn test_client(base_url: &str) -> GeminiClient {
        GeminiClient::new("test-api-key", base_url, 1)
            .unwrap()
            .with_retry_delay(Duration::from_millis(10))
    }

    fn test_request() -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".into()),
                parts: vec![Part::text("Hello")],
            }],
            system_instruction: Some(Content::system("You are a concierge.")),
            tools: Tool::wrap(&[]),
        }
    }

    fn text_response(text: &str) -> serde_json::Value {
        serde_json::json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": text}]},
                "finishReason": "STOP"
            }]
        })
    }

    #[tokio::test]
    async fn generate_content_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .and(body_partial_json(serde_json::json!({
                "contents": [{"role": "user", "parts": [{"text": "Hello"}]}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_response("Welcome!")))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let result = client.generate_content(MODEL, &test_request()).await.unwrap();
        let parts = &result.candidates[0].content.as_ref().unwrap().parts;
        assert_eq!(parts[0].text.as_deref(), Some("Welcome!"));
    }

    #[tokio::test]
    async fn generate_content_retries_on_429() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": {"code": 429, "message": "Quota exceeded", "status": "RESOURCE_EXHAUSTED"}
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_response("After retry")))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let result = client.generate_content(MODEL, &test_request()).await.unwrap();
        assert_eq!(result.candidates.len(), 1);
    }

    #[tokio::test]
    async fn generate_content_fails_on_400() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": {"code": 400, "message": "Bad model", "status": "INVALID_ARGUMENT"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client
            .generate_content(MODEL, &test_request())
            .await
            .unwrap_err()
            .to_string();
        assert!(err.contains("INVALID_ARGUMENT"), "got: {err}");
        assert!(err.contains("Bad model"), "got: {err}");
    }

    #[tokio::test]
    async fn generate_content_exhausts_retries_on_503() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .expect(2)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client
            .generate_content(MODEL, &test_request())
            .await
            .unwrap_err()
            .to_string();
        assert!(err.contains("503"), "got: {err}");
    }

    #[tokio::test]
    async fn client_sends_api_key_header() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT))
            .and(header("x-goog-api-key", "test-api-key"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(text_response("ok")))
            .mount(&server)
            .await;

        let client = test_client(&format!("{}/", server.uri()));
        let result = client.generate_content(MODEL, &test_request()).await;
        assert!(result.is_ok(), "headers should match: {result:?}");
    }
}
