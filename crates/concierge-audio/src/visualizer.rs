// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Microphone waveform visualizer.
//!
//! An [`AnalyserTap`] keeps the most recent input samples. A [`Visualizer`]
//! redraws the time-domain trace on every tick while its active flag is set;
//! once the flag clears it blanks the surface and its loop returns.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Rolling window of the latest captured samples.
#[derive(Debug)]
pub struct AnalyserTap {
    size: usize,
    window: Mutex<VecDeque<f32>>,
}

impl AnalyserTap {
    pub fn new(size: usize) -> Self {
        Self {
            size: size.max(1),
            window: Mutex::new(VecDeque::with_capacity(size.max(1))),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Appends a captured frame, keeping only the newest `size` samples.
    pub fn push(&self, frame: &[f32]) {
        let mut window = self.window.lock().unwrap_or_else(|e| e.into_inner());
        let tail = frame.len().saturating_sub(self.size);
        window.extend(frame[tail..].iter().copied());
        while window.len() > self.size {
            window.pop_front();
        }
    }

    /// Time-domain bytes centred on 128, oldest first; silence pads a short window.
    pub fn time_domain_bytes(&self) -> Vec<u8> {
        let window = self.window.lock().unwrap_or_else(|e| e.into_inner());
        let mut bytes = vec![128u8; self.size - window.len()];
        bytes.extend(
            window
                .iter()
                .map(|s| (128.0 + s.clamp(-1.0, 1.0) * 128.0).clamp(0.0, 255.0) as u8),
        );
        bytes
    }

    pub fn reset(&self) {
        self.window.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

/// Anything the trace can be drawn on.
pub trait DrawingSurface {
    /// Width and height in surface units.
    fn dimensions(&self) -> (f32, f32);

    fn clear(&mut self);

    fn stroke_polyline(&mut self, points: &[(f32, f32)]);
}

/// Maps time-domain bytes onto polyline points spanning the surface.
///
/// Each byte becomes `y = (byte / 128) * height / 2` at an even horizontal
/// step; the line ends at the vertical centre of the right edge.
pub fn trace_points(data: &[u8], width: f32, height: f32) -> Vec<(f32, f32)> {
    if data.is_empty() {
        return vec![(0.0, height / 2.0), (width, height / 2.0)];
    }
    let slice_width = width / data.len() as f32;
    let mut points: Vec<(f32, f32)> = data
        .iter()
        .enumerate()
        .map(|(i, &byte)| {
            let v = f32::from(byte) / 128.0;
            (i as f32 * slice_width, v * height / 2.0)
        })
        .collect();
    points.push((width, height / 2.0));
    points
}

/// Result of one animation tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Drawn,
    /// The visualizer is inactive; the surface was cleared and no further
    /// ticks should be scheduled.
    Stopped,
}

/// Redraws the input waveform while active.
#[derive(Debug, Clone)]
pub struct Visualizer {
    tap: Arc<AnalyserTap>,
    active: Arc<AtomicBool>,
}

impl Visualizer {
    pub fn new(tap: Arc<AnalyserTap>, active: Arc<AtomicBool>) -> Self {
        Self { tap, active }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Draws a single frame, or clears the surface when inactive.
    pub fn draw_frame<S: DrawingSurface + ?Sized>(&self, surface: &mut S) -> FrameOutcome {
        surface.clear();
        if !self.is_active() {
            return FrameOutcome::Stopped;
        }
        let (width, height) = surface.dimensions();
        let points = trace_points(&self.tap.time_domain_bytes(), width, height);
        surface.stroke_polyline(&points);
        FrameOutcome::Drawn
    }

    /// Ticks every `frame_interval` until the active flag clears.
    pub async fn run<S: DrawingSurface + ?Sized>(&self, surface: &mut S, frame_interval: Duration) {
        while self.draw_frame(surface) == FrameOutcome::Drawn {
            tokio::time::sleep(frame_interval).await;
        }
    }
}

/// Character-cell surface for terminals.
#[derive(Debug, Clone)]
pub struct TextCanvas {
    cols: usize,
    rows: usize,
    cells: Vec<Vec<char>>,
}

impl TextCanvas {
    pub fn new(cols: usize, rows: usize) -> Self {
        let cols = cols.max(1);
        let rows = rows.max(1);
        Self {
            cols,
            rows,
            cells: vec![vec![' '; cols]; rows],
        }
    }

    /// The canvas as newline-separated rows.
    pub fn render(&self) -> String {
        self.cells
            .iter()
            .map(|row| row.iter().collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn plot(&mut self, x: f32, y: f32) {
        let col = (x.round().max(0.0) as usize).min(self.cols - 1);
        let row = (y.round().max(0.0) as usize).min(self.rows - 1);
        self.cells[row][col] = '*';
    }
}

impl DrawingSurface for TextCanvas {
    fn dimensions(&self) -> (f32, f32) {
        ((self.cols - 1) as f32, (self.rows - 1) as f32)
    }

    fn clear(&mut self) {
        for row in &mut self.cells {
            row.fill(' ');
        }
    }

    fn stroke_polyline(&mut self, points: &[(f32, f32)]) {
        for pair in points.windows(2) {
            let (x0, y0) = pair[0];
            let (x1, y1) = pair[1];
            let steps = ((x1 - x0).abs().max((y1 - y0).abs()).ceil() as usize).max(1);
            for step in 0..=steps {
                let t = step as f32 / steps as f32;
                self.plot(x0 + (x1 - x0) * t, y0 + (y1 - y0) * t);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSurface {
        clears: usize,
        strokes: Vec<Vec<(f32, f32)>>,
    }

    impl DrawingSurface for RecordingSurface {
        fn dimensions(&self) -> (f32, f32) {
            (256.0, 100.0)
        }
        fn clear(&mut self) {
            self.clears += 1;
        }
        fn stroke_polyline(&mut self, points: &[(f32, f32)]) {
            self.strokes.push(points.to_vec());
        }
    }

    #[test]
    fn silence_traces_the_centre_line() {
        let points = trace_points(&[128; 4], 100.0, 50.0);
        assert_eq!(points.len(), 5);
        assert!(points.iter().all(|&(_, y)| (y - 25.0).abs() < f32::EPSILON));
        assert_eq!(points[1].0, 25.0);
        assert_eq!(points[4], (100.0, 25.0));
    }

    #[test]
    fn tap_keeps_newest_samples() {
        let tap = AnalyserTap::new(4);
        tap.push(&[0.0, 0.0]);
        assert_eq!(tap.time_domain_bytes(), vec![128, 128, 128, 128]);
        tap.push(&[1.0, 1.0, -1.0, -1.0, 0.5]);
        assert_eq!(tap.time_domain_bytes(), vec![255, 0, 0, 192]);
    }

    #[test]
    fn inactive_visualizer_clears_and_stops() {
        let tap = Arc::new(AnalyserTap::new(8));
        let active = Arc::new(AtomicBool::new(true));
        let visualizer = Visualizer::new(tap, active.clone());
        let mut surface = RecordingSurface::default();

        assert_eq!(visualizer.draw_frame(&mut surface), FrameOutcome::Drawn);
        assert_eq!(surface.strokes.len(), 1);
        assert_eq!(surface.strokes[0].len(), 9);

        active.store(false, Ordering::Release);
        assert_eq!(visualizer.draw_frame(&mut surface), FrameOutcome::Stopped);
        assert_eq!(surface.strokes.len(), 1);
        assert_eq!(surface.clears, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn run_returns_once_inactive() {
        let tap = Arc::new(AnalyserTap::new(8));
        let active = Arc::new(AtomicBool::new(true));
        let visualizer = Visualizer::new(tap, active.clone());

        let flag = active.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            flag.store(false, Ordering::Release);
        });

        let mut surface = RecordingSurface::default();
        visualizer.run(&mut surface, Duration::from_millis(16)).await;
        assert!(!surface.strokes.is_empty());
        assert!(surface.strokes.len() <= 8);
    }

    #[test]
    fn text_canvas_draws_a_flat_line_for_silence() {
        let tap = Arc::new(AnalyserTap::new(16));
        let visualizer = Visualizer::new(tap, Arc::new(AtomicBool::new(true)));
        let mut canvas = TextCanvas::new(17, 5);
        visualizer.draw_frame(&mut canvas);
        let rendered = canvas.render();
        let rows: Vec<&str> = rendered.lines().collect();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[2], "*".repeat(17));
        assert!(rows[0].trim().is_empty());
    }
}
