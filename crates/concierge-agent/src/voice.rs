// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Voice session controller.
//!
//! Owns the microphone, the playback context and one live session at a
//! time. Two tasks run per session: the capture pump feeding the ordered
//! outbound queue, and the inbound loop that schedules agent speech,
//! handles barge-in and answers tool-call batches. Any session-ending
//! failure tears everything down and leaves an error for the guest.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use concierge_audio::buffer::resample_linear;
use concierge_audio::codec::check_incoming_mime;
use concierge_audio::{
    AnalyserTap, AudioSink, AudioSource, CAPTURE_SAMPLE_RATE, CaptureStream, PlaybackEngine,
    Visualizer, decode_incoming_audio, encode_for_transport,
};
use concierge_core::types::{ConnectionState, LiveEvent, LiveSetup};
use concierge_core::{AudioSendOutcome, ConciergeError, LiveConnection, LiveProvider, LiveSender};
use concierge_tools::function_declarations;
use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::context::{EpochGuard, SessionContext};
use crate::dispatch::ToolDispatcher;
use crate::settings::AgentSettings;

/// Connection state plus the last session-ending error, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VoiceStatus {
    pub state: ConnectionState,
    pub error: Option<String>,
}

type SharedPlayback = Arc<Mutex<PlaybackEngine>>;

struct ActiveSession {
    guard: EpochGuard,
    sender: LiveSender,
    playback: SharedPlayback,
    tasks: Vec<JoinHandle<()>>,
}

struct VoiceInner {
    ctx: SessionContext,
    dispatcher: ToolDispatcher,
    live: Arc<dyn LiveProvider>,
    source: Arc<dyn AudioSource>,
    sink: Arc<dyn AudioSink>,
    settings: AgentSettings,
    status: watch::Sender<VoiceStatus>,
    tap: Arc<AnalyserTap>,
    active: Arc<AtomicBool>,
    session: tokio::sync::Mutex<Option<ActiveSession>>,
}

/// Drives one guest's voice conversation.
pub struct VoiceSessionController {
    inner: Arc<VoiceInner>,
}

fn lock_playback(playback: &SharedPlayback) -> MutexGuard<'_, PlaybackEngine> {
    playback.lock().unwrap_or_else(|e| e.into_inner())
}

impl VoiceSessionController {
    pub fn new(
        ctx: SessionContext,
        live: Arc<dyn LiveProvider>,
        source: Arc<dyn AudioSource>,
        sink: Arc<dyn AudioSink>,
        settings: AgentSettings,
    ) -> Self {
        let (status, _) = watch::channel(VoiceStatus::default());
        let tap = Arc::new(AnalyserTap::new(settings.audio.analyser_size));
        Self {
            inner: Arc::new(VoiceInner {
                dispatcher: ToolDispatcher::new(ctx.clone(), settings.hotel_name.clone()),
                ctx,
                live,
                source,
                sink,
                settings,
                status,
                tap,
                active: Arc::new(AtomicBool::new(false)),
                session: tokio::sync::Mutex::new(None),
            }),
        }
    }

    pub fn context(&self) -> &SessionContext {
        &self.inner.ctx
    }

    pub fn status(&self) -> VoiceStatus {
        self.inner.status.borrow().clone()
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.status.borrow().state
    }

    pub fn subscribe_status(&self) -> watch::Receiver<VoiceStatus> {
        self.inner.status.subscribe()
    }

    /// Clears the inline error without changing the connection state.
    pub fn dismiss_error(&self) {
        self.inner.status.send_modify(|s| s.error = None);
    }

    /// Waveform visualizer over the live microphone signal.
    pub fn visualizer(&self) -> Visualizer {
        Visualizer::new(self.inner.tap.clone(), self.inner.active.clone())
    }

    /// Opens the microphone, the playback context and the live session.
    ///
    /// A no-op while a session is open. On failure everything acquired so
    /// far is released, the state returns to disconnected and the error is
    /// both returned and kept for display.
    pub async fn connect(&self) -> Result<(), ConciergeError> {
        let mut slot = self.inner.session.lock().await;
        if slot.is_some() {
            debug!("voice session already open");
            return Ok(());
        }

        self.inner.set_status(ConnectionState::Connecting, None);
        let guard = self.inner.ctx.begin_epoch();
        match self.inner.open(&guard).await {
            Ok(session) => {
                *slot = Some(session);
                self.inner.set_status(ConnectionState::Connected, None);
                info!(epoch = %guard.epoch(), "voice session connected");
                Ok(())
            }
            Err(err) => {
                error!(epoch = %guard.epoch(), error = %err, "voice session failed to connect");
                self.inner.ctx.retire(guard.epoch());
                self.inner.active.store(false, Ordering::SeqCst);
                self.inner.tap.reset();
                self.inner.set_status(
                    ConnectionState::Disconnected,
                    Some(err.user_message().to_string()),
                );
                Err(err)
            }
        }
    }

    /// Stops capture and playback and closes the live session. Idempotent.
    pub async fn disconnect(&self) {
        let session = self.inner.session.lock().await.take();
        let Some(session) = session else {
            return;
        };
        let epoch = session.guard.epoch();
        for task in self.inner.teardown(session, None) {
            if let Err(e) = task.await
                && e.is_panic()
            {
                error!(%epoch, "voice session task panicked");
            }
        }
        info!(%epoch, "voice session disconnected");
    }
}

impl Drop for VoiceSessionController {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.inner.session.try_lock()
            && let Some(session) = slot.take()
        {
            let _ = self.inner.teardown(session, None);
        }
    }
}

impl VoiceInner {
    fn set_status(&self, state: ConnectionState, error: Option<String>) {
        self.status.send_replace(VoiceStatus { state, error });
    }

    fn setup(&self) -> LiveSetup {
        LiveSetup {
            model: self.settings.voice_model.clone(),
            system_instruction: self.settings.system_instruction.clone(),
            tools: function_declarations(),
        }
    }

    async fn open(self: &Arc<Self>, guard: &EpochGuard) -> Result<ActiveSession, ConciergeError> {
        let audio = &self.settings.audio;
        // Devices acquired here are released on drop if a later step fails.
        let capture = self
            .source
            .open_capture(audio.capture_sample_rate, audio.frame_size)?;
        let playback = Arc::new(Mutex::new(PlaybackEngine::new(
            self.sink.open_playback(audio.playback_sample_rate)?,
        )));
        let LiveConnection { sender, events } = self.live.connect(self.setup()).await?;

        self.tap.reset();
        self.active.store(true, Ordering::SeqCst);
        let pump = tokio::spawn(Arc::clone(self).pump_capture(
            capture,
            sender.clone(),
            guard.clone(),
        ));
        let inbound = tokio::spawn(Arc::clone(self).run_inbound(
            events,
            sender.clone(),
            playback.clone(),
            guard.clone(),
        ));

        Ok(ActiveSession {
            guard: guard.clone(),
            sender,
            playback,
            tasks: vec![pump, inbound],
        })
    }

    /// Encodes every captured frame onto the outbound queue.
    async fn pump_capture(
        self: Arc<Self>,
        mut capture: CaptureStream,
        sender: LiveSender,
        guard: EpochGuard,
    ) {
        let capture_rate = self.settings.audio.capture_sample_rate;
        let failure = loop {
            let frame = tokio::select! {
                biased;
                _ = guard.cancelled() => break None,
                frame = capture.frames.recv() => frame,
            };
            let Some(frame) = frame else {
                break Some(ConciergeError::DeviceUnavailable {
                    message: "microphone stream ended".into(),
                    source: None,
                });
            };

            self.tap.push(&frame);
            let blob = if capture_rate == CAPTURE_SAMPLE_RATE {
                encode_for_transport(&frame)
            } else {
                encode_for_transport(&resample_linear(&frame, capture_rate, CAPTURE_SAMPLE_RATE))
            };
            match sender.try_send_audio(blob) {
                Ok(AudioSendOutcome::Queued) => {}
                Ok(AudioSendOutcome::Dropped) => {
                    warn!(epoch = %guard.epoch(), "outbound queue full, dropping audio frame");
                }
                Err(_) => {
                    debug!(epoch = %guard.epoch(), "outbound queue closed, stopping capture");
                    break None;
                }
            }
        };
        capture.stop();

        if let Some(err) = failure {
            self.finish(&guard, Some(err)).await;
        }
    }

    /// Consumes live events until the session ends.
    async fn run_inbound(
        self: Arc<Self>,
        mut events: mpsc::Receiver<LiveEvent>,
        sender: LiveSender,
        playback: SharedPlayback,
        guard: EpochGuard,
    ) {
        let epoch = guard.epoch();
        let outcome = loop {
            let event = tokio::select! {
                biased;
                _ = guard.cancelled() => {
                    debug!(%epoch, "voice session epoch cancelled");
                    break None;
                }
                event = events.recv() => event,
            };
            let Some(event) = event else {
                info!(%epoch, "live session stream ended");
                break None;
            };

            match event {
                LiveEvent::Audio { data, mime_type } => {
                    self.play_chunk(&playback, &data, &mime_type, &guard);
                }
                LiveEvent::Interrupted => {
                    let stopped = lock_playback(&playback).interrupt();
                    debug!(%epoch, stopped, "guest interrupted agent speech");
                    self.set_state(ConnectionState::Interrupted);
                }
                LiveEvent::TurnComplete => {
                    self.set_state(ConnectionState::Connected);
                }
                LiveEvent::ToolCall(calls) => {
                    debug!(%epoch, count = calls.len(), "tool call batch received");
                    let responses = match self.dispatcher.dispatch_batch(&guard, &calls).await {
                        Ok(responses) => responses,
                        Err(err) => {
                            debug!(%epoch, error = %err, "tool batch abandoned");
                            break None;
                        }
                    };
                    if let Err(err) = sender.send_tool_responses(responses).await {
                        break Some(err);
                    }
                }
                LiveEvent::ToolCallCancellation(ids) => {
                    info!(%epoch, ?ids, "remote withdrew pending tool calls");
                }
                LiveEvent::Closed { reason } => {
                    info!(%epoch, reason = reason.as_deref().unwrap_or("none"), "live session closed by remote");
                    break None;
                }
                LiveEvent::Error { message } => {
                    break Some(ConciergeError::RemoteSession {
                        message,
                        source: None,
                    });
                }
            }
        };
        self.finish(&guard, outcome).await;
    }

    fn play_chunk(&self, playback: &SharedPlayback, data: &str, mime_type: &str, guard: &EpochGuard) {
        let decoded = check_incoming_mime(mime_type)
            .and_then(|()| decode_incoming_audio(data, self.settings.audio.playback_sample_rate));
        match decoded {
            Ok(buffer) => {
                lock_playback(playback).enqueue(buffer);
                if self.status.borrow().state == ConnectionState::Interrupted {
                    self.set_state(ConnectionState::Connected);
                }
            }
            Err(err) => {
                warn!(epoch = %guard.epoch(), error = %err, "dropping malformed audio chunk");
            }
        }
    }

    fn set_state(&self, state: ConnectionState) {
        self.status.send_if_modified(|s| {
            if s.state == state || s.state == ConnectionState::Disconnected {
                return false;
            }
            s.state = state;
            true
        });
    }

    /// Ends the session owned by `guard` from inside one of its tasks.
    async fn finish(&self, guard: &EpochGuard, error: Option<ConciergeError>) {
        let session = {
            let mut slot = self.session.lock().await;
            match slot.as_ref() {
                Some(s) if s.guard.epoch() == guard.epoch() => slot.take(),
                _ => None,
            }
        };
        if let Some(session) = session {
            // The calling task is among these; the others stop on cancellation.
            drop(self.teardown(session, error));
        }
    }

    /// Releases every resource of `session` and returns its task handles.
    fn teardown(
        &self,
        session: ActiveSession,
        error: Option<ConciergeError>,
    ) -> Vec<JoinHandle<()>> {
        let epoch = session.guard.epoch();
        session.sender.close();
        self.ctx.retire(epoch);
        lock_playback(&session.playback).close();
        self.active.store(false, Ordering::SeqCst);
        self.tap.reset();

        match error {
            Some(err) => {
                error!(%epoch, error = %err, "voice session ended");
                self.set_status(
                    ConnectionState::Disconnected,
                    Some(err.user_message().to_string()),
                );
            }
            None => self.set_status(ConnectionState::Disconnected, None),
        }
        session.tasks
    }
}
