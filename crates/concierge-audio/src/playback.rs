// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Playback engine binding the scheduler to an output context.

use tracing::debug;

use crate::buffer::AudioBuffer;
use crate::device::PlaybackSink;
use crate::scheduler::{PlaybackScheduler, ScheduledSource};

/// Schedules decoded chunks on a [`PlaybackSink`] and handles barge-in.
///
/// Callers hold the engine behind one lock so that scheduling a chunk and
/// an interruption reset never interleave.
pub struct PlaybackEngine {
    scheduler: PlaybackScheduler,
    sink: Box<dyn PlaybackSink>,
    closed: bool,
}

impl PlaybackEngine {
    pub fn new(sink: Box<dyn PlaybackSink>) -> Self {
        Self {
            scheduler: PlaybackScheduler::new(),
            sink,
            closed: false,
        }
    }

    /// Queues `buffer` after everything already scheduled.
    pub fn enqueue(&mut self, buffer: AudioBuffer) -> Option<ScheduledSource> {
        if self.closed || buffer.is_empty() {
            return None;
        }
        let now = self.sink.current_time();
        self.scheduler.reap(now);
        let slot = self.scheduler.schedule(buffer.duration(), now);
        debug!(id = slot.id, start = slot.start, duration = slot.duration, "scheduled chunk");
        self.sink.start(slot.id, buffer, slot.start);
        Some(slot)
    }

    /// Stops every scheduled or playing chunk and resets the cursor.
    pub fn interrupt(&mut self) -> usize {
        let stopped = self.scheduler.interrupt();
        for id in &stopped {
            self.sink.stop(*id);
        }
        stopped.len()
    }

    /// Stops playback and releases the output context. Idempotent.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.interrupt();
        self.sink.close();
        self.closed = true;
    }

    pub fn next_start_time(&self) -> f64 {
        self.scheduler.next_start_time()
    }

    pub fn current_time(&self) -> f64 {
        self.sink.current_time()
    }

    pub fn pending(&self) -> usize {
        self.scheduler.pending().len()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Drop for PlaybackEngine {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Default)]
    struct Log {
        now: f64,
        started: Vec<(u64, f64)>,
        stopped: Vec<u64>,
        closed: usize,
    }

    struct RecordingSink(Arc<Mutex<Log>>);

    impl PlaybackSink for RecordingSink {
        fn current_time(&self) -> f64 {
            self.0.lock().unwrap().now
        }
        fn start(&mut self, id: u64, _buffer: AudioBuffer, at: f64) {
            self.0.lock().unwrap().started.push((id, at));
        }
        fn stop(&mut self, id: u64) {
            self.0.lock().unwrap().stopped.push(id);
        }
        fn close(&mut self) {
            self.0.lock().unwrap().closed += 1;
        }
    }

    fn chunk(seconds: f64) -> AudioBuffer {
        AudioBuffer::new(vec![0.0; (seconds * 24_000.0) as usize], 24_000)
    }

    #[test]
    fn interrupt_stops_sink_sources_and_rebases_on_clock() {
        let log = Arc::new(Mutex::new(Log::default()));
        let mut engine = PlaybackEngine::new(Box::new(RecordingSink(log.clone())));

        engine.enqueue(chunk(1.0));
        engine.enqueue(chunk(1.0));
        assert_eq!(engine.interrupt(), 2);
        assert_eq!(log.lock().unwrap().stopped.len(), 2);
        assert_eq!(engine.next_start_time(), 0.0);

        log.lock().unwrap().now = 0.3;
        let slot = engine.enqueue(chunk(0.5)).unwrap();
        assert_eq!(slot.start, 0.3);
    }

    #[test]
    fn close_is_idempotent_and_blocks_enqueue() {
        let log = Arc::new(Mutex::new(Log::default()));
        let mut engine = PlaybackEngine::new(Box::new(RecordingSink(log.clone())));
        engine.enqueue(chunk(0.5));
        engine.close();
        engine.close();
        drop(engine);
        let log = log.lock().unwrap();
        assert_eq!(log.closed, 1);
        assert_eq!(log.stopped.len(), 1);
    }

    #[test]
    fn empty_chunks_are_skipped() {
        let log = Arc::new(Mutex::new(Log::default()));
        let mut engine = PlaybackEngine::new(Box::new(RecordingSink(log.clone())));
        assert!(engine.enqueue(AudioBuffer::new(Vec::new(), 24_000)).is_none());
        assert!(log.lock().unwrap().started.is_empty());
    }
}
