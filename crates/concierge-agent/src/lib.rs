// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session controllers for the hotel concierge.
//!
//! - [`SessionContext`] holds the booking draft, the manager-call flow and
//!   the ticket log behind an epoch guard shared by both controllers
//! - [`ToolDispatcher`] runs the six concierge tools
//! - [`VoiceSessionController`] drives the live audio session
//! - [`TextSessionController`] drives the turn-based chat

pub mod context;
pub mod dispatch;
pub mod settings;
pub mod shutdown;
pub mod text;
pub mod voice;

pub use context::{Desk, DeskSnapshot, EpochGuard, SessionContext};
pub use dispatch::ToolDispatcher;
pub use settings::{AgentSettings, load_system_prompt};
pub use text::TextSessionController;
pub use voice::{VoiceSessionController, VoiceStatus};
