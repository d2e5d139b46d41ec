// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `concierge voice` command implementation.
//!
//! Opens a live voice session on the default (or configured) microphone and
//! speaker, then follows the session until Ctrl+C or until the remote side
//! ends it. Connection state, booking draft changes and new tickets are
//! printed as they happen; the microphone waveform is redrawn in place.

use std::io::{IsTerminal, Write};
use std::sync::Arc;
use std::time::Duration;

use colored::Colorize;
use concierge_agent::shutdown::install_signal_handler;
use concierge_agent::{AgentSettings, SessionContext, VoiceSessionController, VoiceStatus};
use concierge_audio::{AudioSink, AudioSource, TextCanvas, Visualizer};
use concierge_config::ConciergeConfig;
use concierge_core::types::ConnectionState;
use concierge_core::{ConciergeError, LiveProvider};
use concierge_desk::BookingDraft;
use concierge_gemini::GeminiLiveProvider;
use tracing::info;

use crate::render;
use crate::shell::print_desk_changes;

const FRAME_INTERVAL: Duration = Duration::from_millis(50);
const WAVEFORM_COLS: usize = 64;
const WAVEFORM_ROWS: usize = 7;

/// Runs the `concierge voice` command.
pub async fn run_voice(config: ConciergeConfig, waveform: bool) -> Result<(), ConciergeError> {
    let (source, sink) = audio_devices(&config)?;
    let live: Arc<dyn LiveProvider> = Arc::new(GeminiLiveProvider::new(
        &config.gemini,
        config.audio.outbound_queue_frames,
    )?);
    let settings = AgentSettings::load(&config).await;
    let ctx = SessionContext::from_config(&config);
    let voice = VoiceSessionController::new(ctx.clone(), live, source, sink, settings);
    let shutdown = install_signal_handler();

    println!("{}", config.agent.hotel_name.bold().green());
    println!("{}", "connecting...".dimmed());
    if let Err(e) = voice.connect().await {
        eprintln!("{}", e.user_message().red());
        return Err(e);
    }
    println!("Connected. Speak to the concierge; {} to hang up.\n", "Ctrl+C".yellow());

    let mut status_rx = voice.subscribe_status();
    let mut desk_rx = ctx.subscribe();
    let mut frames = tokio::time::interval(FRAME_INTERVAL);
    let mut trace = (waveform && std::io::stdout().is_terminal())
        .then(|| WaveformTrace::new(voice.visualizer()));
    let mut seen_tickets = 0;
    let mut last_draft: Option<BookingDraft> = None;

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            changed = status_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let status = status_rx.borrow_and_update().clone();
                forget(&mut trace);
                print_status(&status);
                if status.state == ConnectionState::Disconnected {
                    break;
                }
            }
            changed = desk_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let _ = desk_rx.borrow_and_update();
                forget(&mut trace);
                let draft = ctx.snapshot().draft;
                if draft != last_draft {
                    if let Some(current) = &draft {
                        println!("{}", render::draft(current).dimmed());
                    }
                    last_draft = draft;
                }
                seen_tickets = print_desk_changes(&ctx, seen_tickets);
            }
            _ = frames.tick(), if trace.is_some() => {
                if let Some(trace) = trace.as_mut() {
                    trace.redraw();
                }
            }
        }
    }

    voice.disconnect().await;
    info!(tickets = ctx.snapshot().tickets.len(), "voice session ended");
    println!("{}", "goodbye".dimmed());
    Ok(())
}

fn print_status(status: &VoiceStatus) {
    match (&status.state, &status.error) {
        (ConnectionState::Disconnected, Some(error)) => println!("{}", error.red()),
        (ConnectionState::Disconnected, None) => println!("{}", "session closed".dimmed()),
        (ConnectionState::Interrupted, _) => println!("{}", "(interrupted)".dimmed()),
        (state, _) => println!("{}", format!("({state})").dimmed()),
    }
}

fn forget(trace: &mut Option<WaveformTrace>) {
    if let Some(trace) = trace.as_mut() {
        trace.drawn = false;
    }
}

/// Redraws the microphone waveform over its previous frame.
struct WaveformTrace {
    visualizer: Visualizer,
    canvas: TextCanvas,
    drawn: bool,
}

impl WaveformTrace {
    fn new(visualizer: Visualizer) -> Self {
        Self {
            visualizer,
            canvas: TextCanvas::new(WAVEFORM_COLS, WAVEFORM_ROWS),
            drawn: false,
        }
    }

    fn redraw(&mut self) {
        self.visualizer.draw_frame(&mut self.canvas);
        let mut out = std::io::stdout().lock();
        if self.drawn {
            let _ = write!(out, "\x1b[{WAVEFORM_ROWS}A");
        }
        let _ = writeln!(out, "{}", self.canvas.render().cyan());
        let _ = out.flush();
        self.drawn = true;
    }
}

#[cfg(feature = "cpal")]
fn audio_devices(
    config: &ConciergeConfig,
) -> Result<(Arc<dyn AudioSource>, Arc<dyn AudioSink>), ConciergeError> {
    use concierge_audio::cpal_backend::{CpalAudioSink, CpalAudioSource};

    Ok((
        Arc::new(CpalAudioSource::new(config.audio.input_device.clone())),
        Arc::new(CpalAudioSink::new(config.audio.output_device.clone())),
    ))
}

#[cfg(not(feature = "cpal"))]
fn audio_devices(
    _config: &ConciergeConfig,
) -> Result<(Arc<dyn AudioSource>, Arc<dyn AudioSink>), ConciergeError> {
    Err(ConciergeError::DeviceUnavailable {
        message: "built without audio device support; rebuild with `--features cpal`".into(),
        source: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(feature = "cpal"))]
    fn voice_needs_the_audio_backend() {
        let err = audio_devices(&ConciergeConfig::default()).err().unwrap();
        assert!(matches!(err, ConciergeError::DeviceUnavailable { .. }));
    }
}
