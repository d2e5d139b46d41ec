// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared domain types for the concierge core.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// Generation counter identifying one connect/reset cycle of a controller.
///
/// Every continuation captures the epoch it started under and checks it
/// before mutating shared state, so results from a superseded session are
/// discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionEpoch(pub u64);

impl fmt::Display for SessionEpoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a [`crate::PluginAdapter`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    ChatProvider,
    LiveProvider,
    AudioSource,
    AudioSink,
}

/// What a confirmed draft does with further partial updates.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PostConfirmPolicy {
    /// Reject with [`crate::ConciergeError::DraftAlreadyConfirmed`].
    #[default]
    Reject,
    /// Leave the confirmed draft untouched and report success.
    Ignore,
}

// --- Tickets ---

/// Escalation urgency for manager messages.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

/// A finalized booking summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationSummary {
    pub guest_name: String,
    pub email: String,
    pub check_in: String,
    pub check_out: String,
    pub guests: u32,
    pub room_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_requests: Option<String>,
    pub confirmation_code: String,
    /// Draft identifier the reservation was assembled under, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking_id: Option<String>,
}

/// A logged housekeeping or amenity request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequest {
    pub guest_name: String,
    pub request_type: String,
    pub details: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// An escalation forwarded to the duty manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagerMessage {
    pub guest_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_details: Option<String>,
    pub issue: String,
    pub urgency: Urgency,
    pub timestamp: DateTime<Utc>,
}

/// A confirmation letter delivered to the guest mailbox.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailDispatch {
    pub email: String,
    pub guest_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking_details: Option<String>,
    pub subject: String,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub is_read: bool,
}

/// An immutable log entry describing a completed concierge action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Ticket {
    Reservation(ReservationSummary),
    Service(ServiceRequest),
    Manager(ManagerMessage),
    EmailDispatch(EmailDispatch),
}

impl Ticket {
    /// Wire tag of the variant (`RESERVATION`, `SERVICE`, ...).
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Reservation(_) => "RESERVATION",
            Self::Service(_) => "SERVICE",
            Self::Manager(_) => "MANAGER",
            Self::EmailDispatch(_) => "EMAIL_DISPATCH",
        }
    }
}

/// A recorded ticket together with its log identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketEntry {
    pub id: Uuid,
    pub recorded_at: DateTime<Utc>,
    pub ticket: Ticket,
}

// --- Conversation ---

/// Author of a text-mode conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ConversationRole {
    User,
    Agent,
}

/// One message of the text-mode conversation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub id: Uuid,
    pub role: ConversationRole,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl ConversationMessage {
    pub fn new(role: ConversationRole, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

// --- Session status ---

/// Progress of the simulated duty-manager escalation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ManagerCallStatus {
    #[default]
    Idle,
    Calling,
    Busy,
    #[serde(rename = "sending_msg")]
    #[strum(serialize = "sending_msg")]
    SendingMessage,
    Completed,
}

/// Connection state of a voice session controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Interrupted,
}

// --- Tool contract ---

/// A structured request from the remote model to run a declared tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Correlation id assigned by the remote session (voice mode only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub args: serde_json::Value,
}

/// The answer to one [`ToolInvocation`], sent back in the same batch order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub response: serde_json::Value,
}

impl ToolResponse {
    /// Whether the payload reports a failed tool-result.
    pub fn is_error(&self) -> bool {
        self.response.get("error").is_some()
    }
}

/// Base64 audio payload tagged with its media type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaBlob {
    pub mime_type: String,
    pub data: String,
}

// --- Chat (request/response) mode ---

/// Speaker of a turn in the remote conversation history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

/// One part of a chat turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChatPart {
    Text { text: String },
    ToolCall(ToolInvocation),
    ToolResult(ToolResponse),
}

/// A turn of the remote conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub parts: Vec<ChatPart>,
}

impl ChatTurn {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            parts: vec![ChatPart::Text { text: text.into() }],
        }
    }

    pub fn tool_results(responses: Vec<ToolResponse>) -> Self {
        Self {
            role: ChatRole::User,
            parts: responses.into_iter().map(ChatPart::ToolResult).collect(),
        }
    }
}

/// A single request/response exchange with the chat model.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub model: String,
    pub system_instruction: String,
    /// Declared tool schemas, already in provider function-declaration form.
    pub tools: Vec<serde_json::Value>,
    pub history: Vec<ChatTurn>,
}

/// The model's reply to a [`ChatRequest`].
#[derive(Debug, Clone, PartialEq)]
pub struct ChatResponse {
    pub text: Option<String>,
    pub tool_calls: Vec<ToolInvocation>,
}

impl ChatResponse {
    /// The model turn to append to history before answering tool calls.
    pub fn as_turn(&self) -> ChatTurn {
        let mut parts = Vec::new();
        if let Some(text) = &self.text {
            parts.push(ChatPart::Text { text: text.clone() });
        }
        parts.extend(self.tool_calls.iter().cloned().map(ChatPart::ToolCall));
        ChatTurn {
            role: ChatRole::Model,
            parts,
        }
    }
}

// --- Live (voice) mode ---

/// Parameters for opening a bidirectional live session.
#[derive(Debug, Clone)]
pub struct LiveSetup {
    pub model: String,
    pub system_instruction: String,
    pub tools: Vec<serde_json::Value>,
}

/// An event delivered by an open live session.
#[derive(Debug, Clone, PartialEq)]
pub enum LiveEvent {
    /// A chunk of agent speech: base64 PCM16 at the session output rate.
    Audio { data: String, mime_type: String },
    /// The guest started speaking over the agent.
    Interrupted,
    /// The agent finished its turn.
    TurnComplete,
    /// A batch of tool invocations to answer before further audio.
    ToolCall(Vec<ToolInvocation>),
    /// The remote side withdrew pending invocations.
    ToolCallCancellation(Vec<String>),
    /// The remote side closed the session.
    Closed { reason: Option<String> },
    /// The transport failed.
    Error { message: String },
}

/// A message queued for the remote side of a live session.
#[derive(Debug, Clone, PartialEq)]
pub enum LiveOutbound {
    Audio(MediaBlob),
    ToolResponses(Vec<ToolResponse>),
    Close,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticket_serializes_with_type_tag() {
        let ticket = Ticket::Service(ServiceRequest {
            guest_name: "J. Smith".into(),
            request_type: "housekeeping".into(),
            details: "towels".into(),
            room_number: None,
            notes: None,
            timestamp: Utc::now(),
        });
        let json = serde_json::to_value(&ticket).unwrap();
        assert_eq!(json["type"], "SERVICE");
        assert_eq!(json["data"]["guestName"], "J. Smith");
        assert!(json["data"].get("roomNumber").is_none());
        assert_eq!(ticket.kind(), "SERVICE");
    }

    #[test]
    fn email_dispatch_tag_is_screaming_snake() {
        let ticket = Ticket::EmailDispatch(EmailDispatch {
            email: "j@x.com".into(),
            guest_name: "J. Smith".into(),
            booking_details: None,
            subject: "Your stay".into(),
            body: "Dear guest".into(),
            sent_at: Utc::now(),
            is_read: false,
        });
        let json = serde_json::to_value(&ticket).unwrap();
        assert_eq!(json["type"], "EMAIL_DISPATCH");
        assert_eq!(ticket.kind(), "EMAIL_DISPATCH");
    }

    #[test]
    fn manager_status_uses_sending_msg() {
        let json = serde_json::to_string(&ManagerCallStatus::SendingMessage).unwrap();
        assert_eq!(json, "\"sending_msg\"");
        assert_eq!(ManagerCallStatus::SendingMessage.to_string(), "sending_msg");
        assert_eq!(ManagerCallStatus::default(), ManagerCallStatus::Idle);
    }

    #[test]
    fn urgency_parses_lowercase() {
        use std::str::FromStr;
        assert_eq!(Urgency::from_str("high").unwrap(), Urgency::High);
        let u: Urgency = serde_json::from_str("\"medium\"").unwrap();
        assert_eq!(u, Urgency::Medium);
        assert!(serde_json::from_str::<Urgency>("\"urgent\"").is_err());
    }

    #[test]
    fn chat_response_turn_keeps_call_order() {
        let response = ChatResponse {
            text: None,
            tool_calls: vec![
                ToolInvocation {
                    id: None,
                    name: "updateBookingDraft".into(),
                    args: serde_json::json!({"guestName": "J. Smith"}),
                },
                ToolInvocation {
                    id: None,
                    name: "saveServiceRequest".into(),
                    args: serde_json::json!({}),
                },
            ],
        };
        let turn = response.as_turn();
        assert_eq!(turn.role, ChatRole::Model);
        assert_eq!(turn.parts.len(), 2);
        match &turn.parts[1] {
            ChatPart::ToolCall(call) => assert_eq!(call.name, "saveServiceRequest"),
            other => panic!("unexpected part: {other:?}"),
        }
    }

    #[test]
    fn tool_response_error_detection() {
        let ok = ToolResponse {
            id: None,
            name: "saveServiceRequest".into(),
            response: serde_json::json!({"result": {"status": "success"}}),
        };
        let failed = ToolResponse {
            id: None,
            name: "saveServiceRequest".into(),
            response: serde_json::json!({"error": {"message": "missing details"}}),
        };
        assert!(!ok.is_error());
        assert!(failed.is_error());
    }
}
