// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sample-accurate mixer driving an output callback.
//!
//! The output callback pulls frames from the [`Mixer`]; the number of frames
//! rendered so far is the audio clock seen by the scheduler.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::buffer::AudioBuffer;
use crate::device::PlaybackSink;

#[derive(Debug)]
struct Voice {
    id: u64,
    start_frame: u64,
    samples: Vec<f32>,
}

impl Voice {
    fn end_frame(&self) -> u64 {
        self.start_frame + self.samples.len() as u64
    }
}

/// Mono voices placed on a frame timeline.
#[derive(Debug)]
pub struct Mixer {
    sample_rate: u32,
    frames_rendered: u64,
    voices: Vec<Voice>,
}

impl Mixer {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate: sample_rate.max(1),
            frames_rendered: 0,
            voices: Vec::new(),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Audio clock in seconds.
    pub fn current_time(&self) -> f64 {
        self.frames_rendered as f64 / f64::from(self.sample_rate)
    }

    /// Adds a voice starting at clock time `at`; past start times play now.
    pub fn add(&mut self, id: u64, buffer: AudioBuffer, at: f64) {
        let buffer = buffer.resampled(self.sample_rate);
        let requested = (at.max(0.0) * f64::from(self.sample_rate)).round() as u64;
        self.voices.push(Voice {
            id,
            start_frame: requested.max(self.frames_rendered),
            samples: buffer.samples,
        });
    }

    pub fn remove(&mut self, id: u64) {
        self.voices.retain(|v| v.id != id);
    }

    pub fn clear(&mut self) {
        self.voices.clear();
    }

    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    /// Fills an interleaved output buffer and advances the clock.
    pub fn render(&mut self, out: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        for frame in out.chunks_mut(channels) {
            let t = self.frames_rendered;
            let mut acc = 0.0f32;
            for voice in &self.voices {
                if t >= voice.start_frame
                    && let Some(sample) = voice.samples.get((t - voice.start_frame) as usize)
                {
                    acc += *sample;
                }
            }
            frame.fill(acc.clamp(-1.0, 1.0));
            self.frames_rendered += 1;
        }
        let now = self.frames_rendered;
        self.voices.retain(|v| v.end_frame() > now);
    }
}

/// [`PlaybackSink`] over a mixer shared with an output callback.
pub struct MixerSink {
    mixer: Arc<Mutex<Mixer>>,
    on_close: Option<Box<dyn FnOnce() + Send>>,
}

impl MixerSink {
    pub fn new(mixer: Arc<Mutex<Mixer>>, on_close: impl FnOnce() + Send + 'static) -> Self {
        Self {
            mixer,
            on_close: Some(Box::new(on_close)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Mixer> {
        self.mixer.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl PlaybackSink for MixerSink {
    fn current_time(&self) -> f64 {
        self.lock().current_time()
    }

    fn start(&mut self, id: u64, buffer: AudioBuffer, at: f64) {
        self.lock().add(id, buffer, at);
    }

    fn stop(&mut self, id: u64) {
        self.lock().remove(id);
    }

    fn close(&mut self) {
        self.lock().clear();
        if let Some(on_close) = self.on_close.take() {
            on_close();
        }
    }
}

impl Drop for MixerSink {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voices_play_back_to_back() {
        let mut mixer = Mixer::new(4);
        mixer.add(1, AudioBuffer::new(vec![0.25; 2], 4), 0.0);
        mixer.add(2, AudioBuffer::new(vec![0.5; 2], 4), 0.5);

        let mut out = [0.0f32; 4];
        mixer.render(&mut out, 1);
        assert_eq!(out, [0.25, 0.25, 0.5, 0.5]);
        assert_eq!(mixer.current_time(), 1.0);
        assert_eq!(mixer.active_voices(), 0);
    }

    #[test]
    fn stereo_output_duplicates_mono() {
        let mut mixer = Mixer::new(2);
        mixer.add(1, AudioBuffer::new(vec![0.5], 2), 0.0);
        let mut out = [0.0f32; 4];
        mixer.render(&mut out, 2);
        assert_eq!(out, [0.5, 0.5, 0.0, 0.0]);
    }

    #[test]
    fn late_start_plays_from_now() {
        let mut mixer = Mixer::new(4);
        let mut out = [0.0f32; 4];
        mixer.render(&mut out, 1);
        mixer.add(1, AudioBuffer::new(vec![0.1], 4), 0.0);
        let mut out = [0.0f32; 1];
        mixer.render(&mut out, 1);
        assert_eq!(out, [0.1]);
    }

    #[test]
    fn sink_close_runs_hook_once_and_silences() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let mixer = Arc::new(Mutex::new(Mixer::new(4)));
        let closes = Arc::new(AtomicUsize::new(0));
        let counter = closes.clone();
        let mut sink = MixerSink::new(mixer.clone(), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        sink.start(1, AudioBuffer::new(vec![0.3; 8], 4), 0.0);
        sink.close();
        drop(sink);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
        assert_eq!(mixer.lock().unwrap().active_voices(), 0);
    }
}
