// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed decoding of tool invocations at the remote boundary.

use concierge_core::ConciergeError;
use concierge_core::types::{ToolInvocation, Urgency};
use concierge_desk::DraftPatch;
use concierge_desk::draft::parse_guest_count;
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::schema::ToolName;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationArgs {
    #[serde(deserialize_with = "required_text")]
    pub guest_name: String,
    #[serde(deserialize_with = "required_text")]
    pub email: String,
    #[serde(deserialize_with = "required_text")]
    pub check_in: String,
    #[serde(deserialize_with = "required_text")]
    pub check_out: String,
    #[serde(deserialize_with = "guest_count")]
    pub guests: u32,
    #[serde(deserialize_with = "required_text")]
    pub room_type: String,
    #[serde(default, deserialize_with = "optional_text")]
    pub special_requests: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailArgs {
    #[serde(deserialize_with = "required_text")]
    pub email: String,
    #[serde(deserialize_with = "required_text")]
    pub guest_name: String,
    #[serde(default, deserialize_with = "optional_text")]
    pub booking_details: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceArgs {
    #[serde(deserialize_with = "required_text")]
    pub guest_name: String,
    #[serde(deserialize_with = "required_text")]
    pub request_type: String,
    #[serde(deserialize_with = "required_text")]
    pub details: String,
    #[serde(default, deserialize_with = "optional_text")]
    pub room_number: Option<String>,
    #[serde(default, deserialize_with = "optional_text")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagerCallArgs {
    #[serde(deserialize_with = "required_text")]
    pub guest_name: String,
    #[serde(deserialize_with = "required_text")]
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagerMessageArgs {
    #[serde(deserialize_with = "required_text")]
    pub guest_name: String,
    #[serde(default, deserialize_with = "optional_text")]
    pub contact_details: Option<String>,
    #[serde(deserialize_with = "required_text")]
    pub issue: String,
    pub urgency: Urgency,
}

/// One decoded invocation. Names outside the declared set decode to
/// [`ToolCall::Unknown`] so they can be answered rather than dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCall {
    UpdateBookingDraft(DraftPatch),
    SendEmailConfirmation(EmailArgs),
    SaveReservation(ReservationArgs),
    SaveServiceRequest(ServiceArgs),
    AttemptManagerCall(ManagerCallArgs),
    CreateManagerMessage(ManagerMessageArgs),
    Unknown { name: String },
}

impl ToolCall {
    /// Decodes `invocation`, failing with `InvalidToolArguments` when a
    /// declared tool carries missing or ill-typed arguments.
    pub fn decode(invocation: &ToolInvocation) -> Result<Self, ConciergeError> {
        let Ok(name) = invocation.name.parse::<ToolName>() else {
            return Ok(Self::Unknown {
                name: invocation.name.clone(),
            });
        };
        let args = &invocation.args;
        Ok(match name {
            ToolName::UpdateBookingDraft => Self::UpdateBookingDraft(parse_args(name, args)?),
            ToolName::SendEmailConfirmation => Self::SendEmailConfirmation(parse_args(name, args)?),
            ToolName::SaveReservation => Self::SaveReservation(parse_args(name, args)?),
            ToolName::SaveServiceRequest => Self::SaveServiceRequest(parse_args(name, args)?),
            ToolName::AttemptManagerCall => Self::AttemptManagerCall(parse_args(name, args)?),
            ToolName::CreateManagerMessage => Self::CreateManagerMessage(parse_args(name, args)?),
        })
    }

    pub fn name(&self) -> &str {
        match self {
            Self::UpdateBookingDraft(_) => ToolName::UpdateBookingDraft.as_ref(),
            Self::SendEmailConfirmation(_) => ToolName::SendEmailConfirmation.as_ref(),
            Self::SaveReservation(_) => ToolName::SaveReservation.as_ref(),
            Self::SaveServiceRequest(_) => ToolName::SaveServiceRequest.as_ref(),
            Self::AttemptManagerCall(_) => ToolName::AttemptManagerCall.as_ref(),
            Self::CreateManagerMessage(_) => ToolName::CreateManagerMessage.as_ref(),
            Self::Unknown { name } => name,
        }
    }
}

fn parse_args<T: DeserializeOwned>(tool: ToolName, args: &Value) -> Result<T, ConciergeError> {
    // Some providers omit `args` entirely for argument-less calls.
    let args = match args {
        Value::Null => Value::Object(Default::default()),
        other => other.clone(),
    };
    serde_json::from_value(args).map_err(|e| ConciergeError::InvalidToolArguments {
        tool: tool.to_string(),
        message: e.to_string(),
    })
}

fn required_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let text = String::deserialize(deserializer)?;
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(D::Error::custom("value must not be blank"));
    }
    Ok(trimmed.to_string())
}

/// Blank strings count as absent.
fn optional_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

fn guest_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    parse_guest_count(&Value::deserialize(deserializer)?).map_err(D::Error::custom)
}
