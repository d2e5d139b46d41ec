// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Audio device traits for microphone capture and speaker playback.

use concierge_core::{ConciergeError, PluginAdapter};
use tokio::sync::mpsc;

use crate::buffer::AudioBuffer;

/// An open microphone stream delivering fixed-size mono frames.
///
/// Dropping the stream (or calling [`CaptureStream::stop`]) releases the
/// device. The frame channel closing means the device stopped on its own.
pub struct CaptureStream {
    pub frames: mpsc::UnboundedReceiver<Vec<f32>>,
    stop: Option<Box<dyn FnOnce() + Send>>,
}

impl CaptureStream {
    pub fn new(
        frames: mpsc::UnboundedReceiver<Vec<f32>>,
        stop: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            frames,
            stop: Some(Box::new(stop)),
        }
    }

    /// Releases the device. Idempotent.
    pub fn stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            stop();
        }
        self.frames.close();
    }
}

impl Drop for CaptureStream {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for CaptureStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureStream")
            .field("stopped", &self.stop.is_none())
            .finish()
    }
}

/// A microphone that can be opened for exclusive capture.
pub trait AudioSource: PluginAdapter {
    /// Opens capture at `sample_rate`, emitting frames of `frame_size` samples.
    ///
    /// Fails with [`ConciergeError::PermissionDenied`] or
    /// [`ConciergeError::DeviceUnavailable`].
    fn open_capture(
        &self,
        sample_rate: u32,
        frame_size: usize,
    ) -> Result<CaptureStream, ConciergeError>;
}

/// An open output context with its own audio clock.
pub trait PlaybackSink: Send {
    /// Seconds of audio-clock time elapsed since the context opened.
    fn current_time(&self) -> f64;

    /// Starts `buffer` at clock time `at` (immediately if `at` is in the past).
    fn start(&mut self, id: u64, buffer: AudioBuffer, at: f64);

    /// Stops one source; unknown ids are ignored.
    fn stop(&mut self, id: u64);

    /// Stops everything and releases the output device. Idempotent.
    fn close(&mut self);
}

/// A speaker that can open an output context.
pub trait AudioSink: PluginAdapter {
    fn open_playback(&self, sample_rate: u32) -> Result<Box<dyn PlaybackSink>, ConciergeError>;
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn capture_stop_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (_tx, rx) = mpsc::unbounded_channel();
        let counter = calls.clone();
        let mut stream = CaptureStream::new(rx, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        stream.stop();
        stream.stop();
        drop(stream);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
