// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The six tools declared to the remote model in both chat and voice mode.

use serde_json::{Value, json};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

/// Names of the declared tools, as they appear on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter, AsRefStr)]
#[strum(serialize_all = "camelCase")]
pub enum ToolName {
    UpdateBookingDraft,
    SendEmailConfirmation,
    SaveReservation,
    SaveServiceRequest,
    AttemptManagerCall,
    CreateManagerMessage,
}

impl ToolName {
    pub fn description(self) -> &'static str {
        match self {
            Self::UpdateBookingDraft => {
                "Update the live on-screen receipt immediately as details emerge."
            }
            Self::SendEmailConfirmation => {
                "Deliver a physical-style digital letter to the guest mailbox."
            }
            Self::SaveReservation => {
                "Commit the booking. Call this only after verbal/text confirmation from the guest."
            }
            Self::SaveServiceRequest => "Log housekeeping or amenity requests.",
            Self::AttemptManagerCall => "Bridge a call to the duty manager.",
            Self::CreateManagerMessage => "Send an urgent message to the manager.",
        }
    }

    /// Parameter schema in the provider's `Type` vocabulary (`OBJECT`, `STRING`, `NUMBER`).
    pub fn parameters(self) -> Value {
        let string = || json!({ "type": "STRING" });
        let number = || json!({ "type": "NUMBER" });
        match self {
            Self::UpdateBookingDraft => json!({
                "type": "OBJECT",
                "properties": {
                    "guestName": string(),
                    "email": string(),
                    "checkIn": { "type": "STRING", "description": "YYYY-MM-DD" },
                    "checkOut": { "type": "STRING", "description": "YYYY-MM-DD" },
                    "roomType": {
                        "type": "STRING",
                        "enum": ["Standard Room", "Deluxe Room", "Suite"]
                    },
                    "guests": number(),
                    "specialRequests": string(),
                    "subtotal": number(),
                    "tax": number(),
                    "total": number()
                }
            }),
            Self::SendEmailConfirmation => json!({
                "type": "OBJECT",
                "properties": {
                    "email": string(),
                    "guestName": string(),
                    "bookingDetails": string()
                },
                "required": ["email", "guestName"]
            }),
            Self::SaveReservation => json!({
                "type": "OBJECT",
                "properties": {
                    "guestName": string(),
                    "email": string(),
                    "checkIn": string(),
                    "checkOut": string(),
                    "guests": number(),
                    "roomType": string(),
                    "specialRequests": string()
                },
                "required": ["guestName", "email", "checkIn", "checkOut", "guests", "roomType"]
            }),
            Self::SaveServiceRequest => json!({
                "type": "OBJECT",
                "properties": {
                    "guestName": string(),
                    "requestType": string(),
                    "details": string(),
                    "roomNumber": string(),
                    "notes": string()
                },
                "required": ["guestName", "requestType", "details"]
            }),
            Self::AttemptManagerCall => json!({
                "type": "OBJECT",
                "properties": {
                    "guestName": string(),
                    "reason": string()
                },
                "required": ["guestName", "reason"]
            }),
            Self::CreateManagerMessage => json!({
                "type": "OBJECT",
                "properties": {
                    "guestName": string(),
                    "contactDetails": string(),
                    "issue": string(),
                    "urgency": { "type": "STRING", "enum": ["low", "medium", "high"] }
                },
                "required": ["guestName", "issue", "urgency"]
            }),
        }
    }

    /// `{name, description, parameters}` function declaration.
    pub fn declaration(self) -> Value {
        json!({
            "name": self.as_ref(),
            "description": self.description(),
            "parameters": self.parameters(),
        })
    }
}

/// Function declarations for every tool, in declaration order.
pub fn function_declarations() -> Vec<Value> {
    ToolName::iter().map(ToolName::declaration).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn six_tools_in_declaration_order() {
        let names: Vec<String> = function_declarations()
            .iter()
            .map(|d| d["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "updateBookingDraft",
                "sendEmailConfirmation",
                "saveReservation",
                "saveServiceRequest",
                "attemptManagerCall",
                "createManagerMessage",
            ]
        );
    }

    #[test]
    fn names_round_trip_through_strum() {
        for tool in ToolName::iter() {
            assert_eq!(tool.to_string().parse::<ToolName>().unwrap(), tool);
        }
        assert!("bookRoom".parse::<ToolName>().is_err());
    }

    #[test]
    fn draft_update_has_no_required_fields() {
        let params = ToolName::UpdateBookingDraft.parameters();
        assert!(params.get("required").is_none());
        assert_eq!(params["properties"].as_object().unwrap().len(), 10);
        assert_eq!(params["properties"]["roomType"]["enum"][2], "Suite");
    }

    #[test]
    fn every_required_field_is_a_declared_property() {
        for decl in function_declarations() {
            let props = decl["parameters"]["properties"].as_object().unwrap();
            if let Some(required) = decl["parameters"]["required"].as_array() {
                for field in required {
                    assert!(
                        props.contains_key(field.as_str().unwrap()),
                        "{} requires undeclared {field}",
                        decl["name"]
                    );
                }
            }
        }
    }
}
