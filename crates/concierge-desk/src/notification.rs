// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Transient banner raised by selected ticket kinds.

use std::time::Duration;

use concierge_core::types::Ticket;
use serde::Serialize;
use tokio::time::Instant;

/// Banner text for a ticket, or `None` for kinds that stay silent.
pub fn notification_for(ticket: &Ticket) -> Option<String> {
    match ticket {
        Ticket::Reservation(r) => Some(format!("Confirmation email sent to {}", r.email)),
        Ticket::Manager(m) => Some(format!("Urgent message forwarded for {}", m.guest_name)),
        Ticket::EmailDispatch(e) => Some(format!("Letter delivered to {}", e.email)),
        Ticket::Service(_) => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub message: String,
    #[serde(skip)]
    pub expires_at: Instant,
}

/// Holds at most one notification; a newer one replaces the current one.
#[derive(Debug, Clone)]
pub struct NotificationBanner {
    ttl: Duration,
    current: Option<Notification>,
}

impl NotificationBanner {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, current: None }
    }

    pub fn show(&mut self, message: impl Into<String>, now: Instant) -> &Notification {
        self.current.insert(Notification {
            message: message.into(),
            expires_at: now + self.ttl,
        })
    }

    /// Shows the banner for `ticket` if its kind has one.
    pub fn show_for(&mut self, ticket: &Ticket, now: Instant) -> Option<&Notification> {
        let message = notification_for(ticket)?;
        Some(self.show(message, now))
    }

    /// The live notification at `now`, dropping it once expired.
    pub fn current(&mut self, now: Instant) -> Option<&Notification> {
        if self.current.as_ref().is_some_and(|n| n.expires_at <= now) {
            self.current = None;
        }
        self.current.as_ref()
    }

    pub fn dismiss(&mut self) {
        self.current = None;
    }
}
