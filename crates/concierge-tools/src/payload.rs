// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tool-result payloads returned to the remote model.

use concierge_core::ConciergeError;
use concierge_core::types::{ToolInvocation, ToolResponse};
use serde_json::{Value, json};

/// `{"result": {"status": "success"}}`
pub fn success() -> Value {
    json!({ "result": { "status": "success" } })
}

/// Success carrying the generated reservation confirmation code.
pub fn reservation_confirmed(confirmation_code: &str) -> Value {
    json!({ "result": { "status": "success", "confirmationCode": confirmation_code } })
}

/// The duty manager did not pick up.
pub fn busy() -> Value {
    json!({ "result": { "status": "busy" } })
}

pub fn failure(message: impl Into<String>) -> Value {
    json!({ "error": { "message": message.into() } })
}

pub fn from_error(err: &ConciergeError) -> Value {
    failure(err.to_string())
}

pub fn unknown_tool(name: &str) -> Value {
    failure(format!("unknown tool: {name}"))
}

/// Pairs `payload` with the invocation it answers.
pub fn respond(invocation: &ToolInvocation, payload: Value) -> ToolResponse {
    ToolResponse {
        id: invocation.id.clone(),
        name: invocation.name.clone(),
        response: payload,
    }
}
