// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for concierge integration tests.
//!
//! Provides mock adapters and a test harness for fast, deterministic tests
//! without network access or audio hardware.
//!
//! # Components
//!
//! - [`MockChatProvider`] - Scripted chat replies with request capture
//! - [`MockLiveProvider`] - Scripted live session with outbound capture
//! - [`ScriptedAudioSource`] / [`ManualClockSink`] - In-memory microphone and speaker

pub mod audio;
pub mod harness;
pub mod mock_chat;
pub mod mock_live;

pub use audio::{ManualClockSink, PlaybackLog, ScriptedAudioSource, StartedSource};
pub use harness::{TestHarness, TestHarnessBuilder, eventually};
pub use mock_chat::{MockChatProvider, text_reply, tool_reply};
pub use mock_live::MockLiveProvider;
