// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The concierge tool contract.
//!
//! [`schema`] declares the six tools to the remote model, [`call`] decodes
//! invocations into the closed [`ToolCall`] set, and [`payload`] builds the
//! tool-results sent back.

pub mod call;
pub mod payload;
pub mod prompt;
pub mod schema;

pub use call::{
    EmailArgs, ManagerCallArgs, ManagerMessageArgs, ReservationArgs, ServiceArgs, ToolCall,
};
pub use schema::{ToolName, function_declarations};
