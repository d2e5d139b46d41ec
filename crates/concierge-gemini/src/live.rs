// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bidirectional live-audio session over the `BidiGenerateContent` websocket.
//!
//! `connect` performs the setup handshake, then splits the socket between a
//! writer task draining the session's single outbound queue and a reader task
//! translating server frames into [`LiveEvent`]s.

use std::time::Duration;

use async_trait::async_trait;
use concierge_config::model::GeminiConfig;
use concierge_core::types::{
    AdapterType, HealthStatus, LiveEvent, LiveOutbound, LiveSetup, ToolInvocation,
};
use concierge_core::{ConciergeError, LiveConnection, LiveProvider, LiveSender, PluginAdapter};
use futures::stream::{SplitSink, SplitStream};
use futures::{Sink, SinkExt, StreamExt};
use serde::Serialize;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::types::{
    Blob, ClientMessage, Content, FunctionResponse, GenerationConfig, RealtimeInput, ServerMessage,
    SetupBody, Tool, ToolResponseBody,
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const EVENT_BUFFER: usize = 256;

/// Gemini live provider implementing [`LiveProvider`].
pub struct GeminiLiveProvider {
    api_key: String,
    live_url: String,
    setup_timeout: Duration,
    queue_capacity: usize,
}

impl GeminiLiveProvider {
    /// Creates a provider from config; `queue_capacity` bounds the outbound queue.
    pub fn new(config: &GeminiConfig, queue_capacity: usize) -> Result<Self, ConciergeError> {
        let api_key = crate::require_api_key(config)?;
        info!(model = config.voice_model, "Gemini live provider initialized");
        Ok(Self::with_endpoint(
            api_key,
            config.live_url.clone(),
            config.setup_timeout(),
            queue_capacity,
        ))
    }

    pub fn with_endpoint(
        api_key: impl Into<String>,
        live_url: impl Into<String>,
        setup_timeout: Duration,
        queue_capacity: usize,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            live_url: live_url.into(),
            setup_timeout,
            queue_capacity: queue_capacity.max(1),
        }
    }

    fn session_url(&self) -> String {
        let separator = if self.live_url.contains('?') { '&' } else { '?' };
        format!("{}{separator}key={}", self.live_url, self.api_key)
    }
}

#[async_trait]
impl PluginAdapter for GeminiLiveProvider {
    fn name(&self) -> &str {
        "gemini-live"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::LiveProvider
    }

    async fn health_check(&self) -> Result<HealthStatus, ConciergeError> {
        if self.live_url.starts_with("wss://") || self.live_url.starts_with("ws://") {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Unhealthy(format!(
                "live_url is not a websocket endpoint: {}",
                self.live_url
            )))
        }
    }
}

#[async_trait]
impl LiveProvider for GeminiLiveProvider {
    async fn connect(&self, setup: LiveSetup) -> Result<LiveConnection, ConciergeError> {
        debug!(url = %self.live_url, model = %setup.model, "opening live session");
        let (mut ws, _response) = tokio_tungstenite::connect_async(self.session_url())
            .await
            .map_err(|e| remote_error("failed to open live session", e))?;

        send_json(&mut ws, &setup_message(&setup)).await?;

        match tokio::time::timeout(self.setup_timeout, await_setup_complete(&mut ws)).await {
            Ok(result) => result?,
            Err(_) => {
                let _ = ws.close(None).await;
                return Err(ConciergeError::Timeout {
                    duration: self.setup_timeout,
                });
            }
        }
        info!(model = %setup.model, "live session established");

        let (sink, stream) = ws.split();
        let (sender, outbound) = LiveSender::channel(self.queue_capacity);
        let (event_tx, events) = mpsc::channel(EVENT_BUFFER);
        tokio::spawn(write_loop(sink, outbound, sender.closing(), event_tx.clone()));
        tokio::spawn(read_loop(stream, event_tx));

        Ok(LiveConnection { sender, events })
    }
}

/// Builds the first client message of a session.
pub fn setup_message(setup: &LiveSetup) -> ClientMessage {
    let model = if setup.model.starts_with("models/") {
        setup.model.clone()
    } else {
        format!("models/{}", setup.model)
    };
    ClientMessage::Setup(SetupBody {
        model,
        generation_config: GenerationConfig {
            response_modalities: vec!["AUDIO".to_string()],
        },
        system_instruction: (!setup.system_instruction.is_empty())
            .then(|| Content::system(setup.system_instruction.clone())),
        tools: Tool::wrap(&setup.tools),
    })
}

/// Wire message for one outbound queue item; `None` for a close request.
pub fn outbound_message(item: LiveOutbound) -> Option<ClientMessage> {
    match item {
        LiveOutbound::Audio(blob) => Some(ClientMessage::RealtimeInput(RealtimeInput {
            media_chunks: vec![Blob {
                mime_type: blob.mime_type,
                data: blob.data,
            }],
        })),
        LiveOutbound::ToolResponses(responses) => {
            Some(ClientMessage::ToolResponse(ToolResponseBody {
                function_responses: responses
                    .into_iter()
                    .map(|r| FunctionResponse {
                        id: r.id,
                        name: r.name,
                        response: r.response,
                    })
                    .collect(),
            }))
        }
        LiveOutbound::Close => None,
    }
}

/// Translates one server message into session events, in delivery order.
pub fn map_server_message(msg: ServerMessage) -> Vec<LiveEvent> {
    let mut events = Vec::new();

    if let Some(content) = msg.server_content {
        if content.interrupted {
            events.push(LiveEvent::Interrupted);
        }
        for part in content.model_turn.map(|t| t.parts).unwrap_or_default() {
            if let Some(blob) = part.inline_data {
                events.push(LiveEvent::Audio {
                    data: blob.data,
                    mime_type: blob.mime_type,
                });
            }
        }
        if content.turn_complete {
            events.push(LiveEvent::TurnComplete);
        }
    }

    if let Some(call) = msg.tool_call
        && !call.function_calls.is_empty()
    {
        events.push(LiveEvent::ToolCall(
            call.function_calls
                .into_iter()
                .map(|c| ToolInvocation {
                    id: c.id,
                    name: c.name,
                    args: c.args,
                })
                .collect(),
        ));
    }

    if let Some(cancellation) = msg.tool_call_cancellation {
        events.push(LiveEvent::ToolCallCancellation(cancellation.ids));
    }

    if let Some(go_away) = msg.go_away {
        let reason = match go_away.time_left {
            Some(left) => format!("server requested disconnect (time left {left})"),
            None => "server requested disconnect".to_string(),
        };
        events.push(LiveEvent::Closed {
            reason: Some(reason),
        });
    }

    events
}

enum Inbound {
    Message(ServerMessage),
    Closed(Option<String>),
    Ignored,
}

/// Server messages arrive as text or binary JSON frames.
fn classify(frame: Message) -> Inbound {
    let parsed = match &frame {
        Message::Text(text) => serde_json::from_str::<ServerMessage>(text.as_str()),
        Message::Binary(bytes) => serde_json::from_slice::<ServerMessage>(bytes),
        Message::Close(close) => {
            return Inbound::Closed(
                close
                    .as_ref()
                    .map(|c| c.reason.to_string())
                    .filter(|r| !r.is_empty()),
            );
        }
        _ => return Inbound::Ignored,
    };
    match parsed {
        Ok(msg) => Inbound::Message(msg),
        Err(e) => {
            warn!(error = %e, "ignoring unparseable live frame");
            Inbound::Ignored
        }
    }
}

async fn await_setup_complete(ws: &mut WsStream) -> Result<(), ConciergeError> {
    while let Some(frame) = ws.next().await {
        let frame = frame.map_err(|e| remote_error("live session failed during setup", e))?;
        match classify(frame) {
            Inbound::Message(msg) if msg.setup_complete.is_some() => return Ok(()),
            Inbound::Message(_) | Inbound::Ignored => continue,
            Inbound::Closed(reason) => {
                return Err(ConciergeError::RemoteSession {
                    message: format!(
                        "live session closed during setup: {}",
                        reason.as_deref().unwrap_or("no reason given")
                    ),
                    source: None,
                });
            }
        }
    }
    Err(ConciergeError::RemoteSession {
        message: "live session ended before setup completed".into(),
        source: None,
    })
}

async fn read_loop(mut stream: SplitStream<WsStream>, events: mpsc::Sender<LiveEvent>) {
    loop {
        let batch = match stream.next().await {
            Some(Ok(frame)) => match classify(frame) {
                Inbound::Message(msg) => map_server_message(msg),
                Inbound::Closed(reason) => vec![LiveEvent::Closed { reason }],
                Inbound::Ignored => continue,
            },
            Some(Err(e)) => vec![LiveEvent::Error {
                message: e.to_string(),
            }],
            None => vec![LiveEvent::Closed { reason: None }],
        };

        for event in batch {
            let terminal = matches!(event, LiveEvent::Closed { .. } | LiveEvent::Error { .. });
            if events.send(event).await.is_err() || terminal {
                debug!("live reader stopped");
                return;
            }
        }
    }
}

/// Drains the outbound queue onto the socket until it ends or the session
/// is closed; a close request skips whatever is still queued.
async fn write_loop<S>(
    mut sink: S,
    mut outbound: mpsc::Receiver<LiveOutbound>,
    closing: CancellationToken,
    events: mpsc::Sender<LiveEvent>,
) where
    S: Sink<Message, Error = tungstenite::Error> + Unpin,
{
    loop {
        let item = tokio::select! {
            biased;
            _ = closing.cancelled() => break,
            item = outbound.recv() => item,
        };
        let Some(message) = item.and_then(outbound_message) else {
            break;
        };
        if let Err(e) = send_json(&mut sink, &message).await {
            warn!(error = %e, "live writer failed");
            let _ = events.try_send(LiveEvent::Error {
                message: e.to_string(),
            });
            return;
        }
    }
    let _ = sink.send(Message::Close(None)).await;
    let _ = sink.close().await;
    debug!("live writer stopped");
}

async fn send_json<S>(sink: &mut S, message: &impl Serialize) -> Result<(), ConciergeError>
where
    S: Sink<Message, Error = tungstenite::Error> + Unpin,
{
    let text = serde_json::to_string(message).map_err(|e| ConciergeError::Internal(format!(
        "failed to encode live message: {e}"
    )))?;
    sink.send(Message::Text(text.into()))
        .await
        .map_err(|e| remote_error("failed to send on live session", e))
}

fn remote_error(context: &str, err: tungstenite::Error) -> ConciergeError {
    ConciergeError::RemoteSession {
        message: format!("{context}: {err}"),
        source: Some(Box::new(err)),
    }
}
