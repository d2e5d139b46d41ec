// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Front-desk state shared by the voice and text controllers: the booking
//! draft, the ticket log with its notification banner, and the manager-call
//! escalation flow.

pub mod draft;
pub mod manager;
pub mod notification;
pub mod tickets;

pub use draft::{BookingDraft, DraftMachine, DraftPatch, DraftStatus, EmailStatus, RoomType};
pub use manager::{IllegalTransition, ManagerCallFlow};
pub use notification::{Notification, NotificationBanner, notification_for};
pub use tickets::{TicketLog, generate_confirmation_code};
