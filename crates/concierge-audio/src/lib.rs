// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Audio pipeline for the voice concierge.
//!
//! - [`codec`]: PCM16 little-endian + base64 framing for the live session
//! - [`scheduler`] and [`playback`]: gapless, interruptible playback
//! - [`visualizer`]: microphone waveform trace
//! - [`device`]: capture/playback traits, with a `cpal` backend behind the
//!   `cpal` feature

pub mod buffer;
pub mod codec;
pub mod device;
pub mod mixer;
pub mod playback;
pub mod scheduler;
pub mod visualizer;

#[cfg(feature = "cpal")]
pub mod cpal_backend;

pub use buffer::AudioBuffer;
pub use codec::{
    decode_incoming_audio, encode_for_transport, CAPTURE_MIME_TYPE, CAPTURE_SAMPLE_RATE,
    PLAYBACK_SOURCE_RATE,
};
pub use device::{AudioSink, AudioSource, CaptureStream, PlaybackSink};
pub use playback::PlaybackEngine;
pub use scheduler::{PlaybackScheduler, ScheduledSource};
pub use visualizer::{AnalyserTap, DrawingSurface, FrameOutcome, TextCanvas, Visualizer};
