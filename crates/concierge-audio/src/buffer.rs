// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Decoded mono audio ready for playback.

/// Mono floating-point samples at a known rate.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Playback length in seconds.
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / f64::from(self.sample_rate)
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Returns this buffer converted to `target_rate`.
    pub fn resampled(self, target_rate: u32) -> Self {
        if target_rate == self.sample_rate || target_rate == 0 {
            return self;
        }
        Self {
            samples: resample_linear(&self.samples, self.sample_rate, target_rate),
            sample_rate: target_rate,
        }
    }
}

/// Linear-interpolation resampler for mono audio.
pub fn resample_linear(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() || from_rate == 0 || to_rate == 0 {
        return samples.to_vec();
    }

    let ratio = f64::from(from_rate) / f64::from(to_rate);
    let out_len = ((samples.len() as f64) / ratio).round().max(1.0) as usize;
    let last = samples.len() - 1;

    (0..out_len)
        .map(|i| {
            let pos = i as f64 * ratio;
            let idx = (pos.floor() as usize).min(last);
            let next = (idx + 1).min(last);
            let frac = (pos - idx as f64) as f32;
            samples[idx] + (samples[next] - samples[idx]) * frac
        })
        .collect()
}

/// Averages interleaved channels down to mono.
pub fn downmix(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_follows_rate() {
        let buf = AudioBuffer::new(vec![0.0; 24_000], 24_000);
        assert!((buf.duration() - 1.0).abs() < f64::EPSILON);
        let buf = AudioBuffer::new(vec![0.0; 12_000], 24_000);
        assert!((buf.duration() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn resample_preserves_duration() {
        let samples: Vec<f32> = (0..2400).map(|i| (i as f32 / 100.0).sin()).collect();
        let buf = AudioBuffer::new(samples, 24_000).resampled(48_000);
        assert_eq!(buf.sample_rate, 48_000);
        assert_eq!(buf.samples.len(), 4800);
        assert!((buf.duration() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn resample_same_rate_is_identity() {
        let samples = vec![0.1, -0.2, 0.3];
        assert_eq!(resample_linear(&samples, 16_000, 16_000), samples);
    }

    #[test]
    fn downmix_averages_frames() {
        let stereo = [1.0, 0.0, 0.5, 0.5];
        assert_eq!(downmix(&stereo, 2), vec![0.5, 0.5]);
    }
}
