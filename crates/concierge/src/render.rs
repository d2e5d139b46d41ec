// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plain-text rendering of desk state for the terminal commands.

use concierge_config::ConciergeConfig;
use concierge_core::ConciergeError;
use concierge_core::types::{Ticket, TicketEntry};
use concierge_desk::BookingDraft;

const REDACTED: &str = "********";

/// The validated configuration as TOML, with the API key masked.
pub fn effective_config(config: &ConciergeConfig) -> Result<String, ConciergeError> {
    let mut config = config.clone();
    if config.gemini.api_key.is_some() {
        config.gemini.api_key = Some(REDACTED.to_string());
    }
    toml::to_string_pretty(&config)
        .map_err(|e| ConciergeError::Internal(format!("failed to serialize config: {e}")))
}

/// Multi-line summary of the booking draft, skipping unset fields.
pub fn draft(draft: &BookingDraft) -> String {
    let mut lines = vec![format!("booking {} ({})", draft.booking_id, draft.status)];
    let mut field = |label: &str, value: Option<String>| {
        if let Some(value) = value {
            lines.push(format!("  {label:<10} {value}"));
        }
    };
    field("guest", draft.guest_name.clone());
    field("email", draft.email.clone());
    field("check-in", draft.check_in.clone());
    field("check-out", draft.check_out.clone());
    field("room", draft.room_type.map(|r| r.to_string()));
    field("guests", draft.guests.map(|g| g.to_string()));
    field("requests", draft.special_requests.clone());
    field("subtotal", draft.subtotal.map(money));
    field("tax", draft.tax.map(money));
    field("total", draft.total.map(money));
    field("letter", draft.email_status.map(|s| s.to_string()));
    lines.join("\n")
}

/// One line per ticket, newest last.
pub fn ticket(entry: &TicketEntry) -> String {
    let at = entry.recorded_at.format("%H:%M:%S");
    let detail = match &entry.ticket {
        Ticket::Reservation(r) => format!(
            "{} {} -> {} {} x{} code {}",
            r.guest_name, r.check_in, r.check_out, r.room_type, r.guests, r.confirmation_code
        ),
        Ticket::Service(s) => {
            let room = s
                .room_number
                .as_deref()
                .map(|n| format!(" room {n}"))
                .unwrap_or_default();
            format!("{}{room}: {} ({})", s.guest_name, s.details, s.request_type)
        }
        Ticket::Manager(m) => format!("{} [{}]: {}", m.guest_name, m.urgency, m.issue),
        Ticket::EmailDispatch(e) => {
            let unread = if e.is_read { "" } else { " (unread)" };
            format!("{} <{}>: {}{unread}", e.guest_name, e.email, e.subject)
        }
    };
    format!("{at} {:<14} {detail}", entry.ticket.kind())
}

fn money(amount: f64) -> String {
    format!("${amount:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use concierge_core::types::{ManagerMessage, ServiceRequest, Urgency};
    use concierge_desk::{DraftMachine, DraftPatch, TicketLog};

    fn entry(ticket: Ticket) -> TicketEntry {
        TicketLog::new().record(ticket)
    }

    #[test]
    fn api_key_is_masked() {
        let mut config = ConciergeConfig::default();
        config.gemini.api_key = Some("AIza-secret".into());
        let rendered = effective_config(&config).unwrap();
        assert!(!rendered.contains("AIza-secret"));
        assert!(rendered.contains(REDACTED));
        assert!(rendered.contains("Grand Horizon Hotel"));
    }

    #[test]
    fn missing_key_stays_missing() {
        let rendered = effective_config(&ConciergeConfig::default()).unwrap();
        assert!(!rendered.contains(REDACTED));
    }

    #[test]
    fn draft_lists_only_set_fields() {
        let mut machine = DraftMachine::new(Default::default());
        let current = machine
            .apply_partial_update(DraftPatch {
                guest_name: Some("J. Smith".into()),
                total: Some(784.0),
                ..Default::default()
            })
            .unwrap()
            .clone();
        let text = draft(&current);
        assert!(text.starts_with(&format!("booking {}", current.booking_id)));
        assert!(text.contains("J. Smith"));
        assert!(text.contains("$784.00"));
        assert!(!text.contains("email"));
    }

    #[test]
    fn service_ticket_without_room() {
        let line = ticket(&entry(Ticket::Service(ServiceRequest {
            guest_name: "J. Smith".into(),
            request_type: "housekeeping".into(),
            details: "towels".into(),
            room_number: None,
            notes: None,
            timestamp: Utc::now(),
        })));
        assert!(line.contains("SERVICE"));
        assert!(line.contains("J. Smith: towels (housekeeping)"));
    }

    #[test]
    fn manager_ticket_shows_urgency() {
        let line = ticket(&entry(Ticket::Manager(ManagerMessage {
            guest_name: "J. Smith".into(),
            contact_details: None,
            issue: "noise".into(),
            urgency: Urgency::High,
            timestamp: Utc::now(),
        })));
        assert!(line.contains("[high]"));
    }
}
