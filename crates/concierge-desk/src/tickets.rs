// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Most-recent-first log of completed concierge actions.

use std::collections::VecDeque;

use chrono::Utc;
use concierge_core::types::{Ticket, TicketEntry};
use rand::Rng;
use rand::distributions::Alphanumeric;
use tracing::info;
use uuid::Uuid;

const CONFIRMATION_CODE_LEN: usize = 6;

/// Generates a short uppercase alphanumeric confirmation code, e.g. `Q7K2ZP`.
pub fn generate_confirmation_code() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(CONFIRMATION_CODE_LEN)
        .map(|b| char::from(b).to_ascii_uppercase())
        .collect()
}

/// Append-only ticket log. Entries are never removed.
#[derive(Debug, Default, Clone)]
pub struct TicketLog {
    entries: VecDeque<TicketEntry>,
}

impl TicketLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepends `ticket` and returns the recorded entry.
    pub fn record(&mut self, ticket: Ticket) -> TicketEntry {
        let entry = TicketEntry {
            id: Uuid::new_v4(),
            recorded_at: Utc::now(),
            ticket,
        };
        info!(id = %entry.id, kind = entry.ticket.kind(), "ticket recorded");
        self.entries.push_front(entry.clone());
        entry
    }

    /// Entries, most recent first.
    pub fn entries(&self) -> impl Iterator<Item = &TicketEntry> {
        self.entries.iter()
    }

    pub fn to_vec(&self) -> Vec<TicketEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn get(&self, id: Uuid) -> Option<&TicketEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count_of(&self, kind: &str) -> usize {
        self.entries.iter().filter(|e| e.ticket.kind() == kind).count()
    }

    /// Marks an `EMAIL_DISPATCH` entry read. Returns `false` for unknown ids
    /// and for every other ticket kind, which stay immutable.
    pub fn mark_read(&mut self, id: Uuid) -> bool {
        match self.entries.iter_mut().find(|e| e.id == id) {
            Some(TicketEntry {
                ticket: Ticket::EmailDispatch(mail),
                ..
            }) => {
                mail.is_read = true;
                true
            }
            _ => false,
        }
    }
}
