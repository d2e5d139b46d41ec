// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory audio devices.
//!
//! [`ScriptedAudioSource`] is a microphone whose frames are pushed by the
//! test. [`ManualClockSink`] is a speaker whose audio clock only moves when
//! the test sets it, logging every start, stop and close.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use concierge_audio::{AudioBuffer, AudioSink, AudioSource, CaptureStream, PlaybackSink};
use concierge_core::types::{AdapterType, HealthStatus};
use concierge_core::{ConciergeError, PluginAdapter};
use tokio::sync::mpsc;

#[derive(Default)]
struct SourceState {
    frames: Option<mpsc::UnboundedSender<Vec<f32>>>,
    deny: bool,
    busy: bool,
    opened: usize,
    opened_at: Vec<(u32, usize)>,
}

/// A microphone fed by the test.
#[derive(Default)]
pub struct ScriptedAudioSource {
    state: Mutex<SourceState>,
    stopped: Arc<AtomicUsize>,
}

impl ScriptedAudioSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later `open_capture` fail with `PermissionDenied`.
    pub fn deny_permission(&self) {
        self.state.lock().unwrap().deny = true;
    }

    /// Makes every later `open_capture` fail with `DeviceUnavailable`.
    pub fn set_busy(&self) {
        self.state.lock().unwrap().busy = true;
    }

    /// Delivers one captured frame. Returns false when no capture is open.
    pub fn push_frame(&self, frame: Vec<f32>) -> bool {
        match &self.state.lock().unwrap().frames {
            Some(tx) => tx.send(frame).is_ok(),
            None => false,
        }
    }

    /// Ends the open capture as if the device disappeared.
    pub fn unplug(&self) {
        self.state.lock().unwrap().frames = None;
    }

    pub fn open_count(&self) -> usize {
        self.state.lock().unwrap().opened
    }

    /// `(sample_rate, frame_size)` of every open request.
    pub fn open_requests(&self) -> Vec<(u32, usize)> {
        self.state.lock().unwrap().opened_at.clone()
    }

    pub fn stop_count(&self) -> usize {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Whether a capture is open and not yet released.
    pub fn is_capturing(&self) -> bool {
        self.state
            .lock()
            .unwrap()
            .frames
            .as_ref()
            .is_some_and(|tx| !tx.is_closed())
    }
}

#[async_trait]
impl PluginAdapter for ScriptedAudioSource {
    fn name(&self) -> &str {
        "scripted-microphone"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::AudioSource
    }

    async fn health_check(&self) -> Result<HealthStatus, ConciergeError> {
        Ok(HealthStatus::Healthy)
    }
}

impl AudioSource for ScriptedAudioSource {
    fn open_capture(
        &self,
        sample_rate: u32,
        frame_size: usize,
    ) -> Result<CaptureStream, ConciergeError> {
        let mut state = self.state.lock().unwrap();
        state.opened_at.push((sample_rate, frame_size));
        if state.deny {
            return Err(ConciergeError::PermissionDenied(
                "scripted permission denial".into(),
            ));
        }
        if state.busy {
            return Err(ConciergeError::DeviceUnavailable {
                message: "scripted device busy".into(),
                source: None,
            });
        }
        let (tx, rx) = mpsc::unbounded_channel();
        state.frames = Some(tx);
        state.opened += 1;
        let stopped = self.stopped.clone();
        Ok(CaptureStream::new(rx, move || {
            stopped.fetch_add(1, Ordering::SeqCst);
        }))
    }
}

/// One `start` call observed by a [`ManualClockSink`].
#[derive(Debug, Clone, PartialEq)]
pub struct StartedSource {
    pub id: u64,
    pub at: f64,
    pub duration: f64,
}

/// Everything a [`ManualClockSink`] saw.
#[derive(Debug, Clone, Default)]
pub struct PlaybackLog {
    pub now: f64,
    pub opened: usize,
    pub started: Vec<StartedSource>,
    pub stopped: Vec<u64>,
    pub closed: usize,
}

/// A speaker with a test-controlled audio clock.
#[derive(Default)]
pub struct ManualClockSink {
    log: Arc<Mutex<PlaybackLog>>,
    fail: Mutex<bool>,
}

impl ManualClockSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the audio clock of every open context to `seconds`.
    pub fn set_time(&self, seconds: f64) {
        self.log.lock().unwrap().now = seconds;
    }

    /// Makes every later `open_playback` fail.
    pub fn fail_open(&self) {
        *self.fail.lock().unwrap() = true;
    }

    pub fn log(&self) -> PlaybackLog {
        self.log.lock().unwrap().clone()
    }
}

#[async_trait]
impl PluginAdapter for ManualClockSink {
    fn name(&self) -> &str {
        "manual-clock-speaker"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::AudioSink
    }

    async fn health_check(&self) -> Result<HealthStatus, ConciergeError> {
        Ok(HealthStatus::Healthy)
    }
}

impl AudioSink for ManualClockSink {
    fn open_playback(&self, _sample_rate: u32) -> Result<Box<dyn PlaybackSink>, ConciergeError> {
        if *self.fail.lock().unwrap() {
            return Err(ConciergeError::DeviceUnavailable {
                message: "scripted output failure".into(),
                source: None,
            });
        }
        self.log.lock().unwrap().opened += 1;
        Ok(Box::new(ManualClockPlayback {
            log: self.log.clone(),
        }))
    }
}

struct ManualClockPlayback {
    log: Arc<Mutex<PlaybackLog>>,
}

impl PlaybackSink for ManualClockPlayback {
    fn current_time(&self) -> f64 {
        self.log.lock().unwrap().now
    }

    fn start(&mut self, id: u64, buffer: AudioBuffer, at: f64) {
        self.log.lock().unwrap().started.push(StartedSource {
            id,
            at,
            duration: buffer.duration(),
        });
    }

    fn stop(&mut self, id: u64) {
        self.log.lock().unwrap().stopped.push(id);
    }

    fn close(&mut self) {
        self.log.lock().unwrap().closed += 1;
    }
}
