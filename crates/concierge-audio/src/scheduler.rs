// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gapless playback scheduling on an audio clock.
//!
//! Each chunk starts at `max(now, end of previous chunk)`, so chunks that
//! arrive faster than real time queue back to back without overlap, and a
//! chunk arriving after the queue drained starts immediately.

/// One chunk placed on the playback timeline, in seconds of audio-clock time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledSource {
    pub id: u64,
    pub start: f64,
    pub duration: f64,
}

impl ScheduledSource {
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }
}

/// Tracks the next start time and the sources still scheduled or playing.
#[derive(Debug, Default)]
pub struct PlaybackScheduler {
    next_start_time: f64,
    next_id: u64,
    active: Vec<ScheduledSource>,
}

impl PlaybackScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Places a chunk of `duration` seconds on the timeline.
    pub fn schedule(&mut self, duration: f64, now: f64) -> ScheduledSource {
        let start = self.next_start_time.max(now);
        self.next_start_time = start + duration.max(0.0);
        self.next_id += 1;
        let source = ScheduledSource {
            id: self.next_id,
            start,
            duration: duration.max(0.0),
        };
        self.active.push(source);
        source
    }

    /// Forgets every scheduled source and resets the cursor to zero.
    ///
    /// Returns the ids the caller must stop on the output device.
    pub fn interrupt(&mut self) -> Vec<u64> {
        self.next_start_time = 0.0;
        self.active.drain(..).map(|s| s.id).collect()
    }

    /// Drops bookkeeping for sources that finished before `now`.
    pub fn reap(&mut self, now: f64) {
        self.active.retain(|s| s.end() > now);
    }

    /// Marks a source as ended early (device reported completion).
    pub fn finished(&mut self, id: u64) {
        self.active.retain(|s| s.id != id);
    }

    pub fn next_start_time(&self) -> f64 {
        self.next_start_time
    }

    pub fn pending(&self) -> &[ScheduledSource] {
        &self.active
    }
}
