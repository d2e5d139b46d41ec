// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock live provider with a scripted remote side.
//!
//! Each `connect` opens an in-memory session: tests push [`LiveEvent`]s
//! as if the remote model sent them, and everything the controller queues
//! outbound is recorded in order.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use concierge_core::types::{
    AdapterType, HealthStatus, LiveEvent, LiveOutbound, LiveSetup, MediaBlob, ToolResponse,
};
use concierge_core::{ConciergeError, LiveConnection, LiveProvider, LiveSender, PluginAdapter};
use tokio::sync::{Notify, mpsc};

#[derive(Default)]
struct State {
    setups: Vec<LiveSetup>,
    remote: Option<mpsc::Sender<LiveEvent>>,
    outbound: Vec<LiveOutbound>,
    fail_next: Option<String>,
}

/// A live provider whose remote side is driven by the test.
pub struct MockLiveProvider {
    state: Arc<Mutex<State>>,
    changed: Arc<Notify>,
    queue_capacity: usize,
}

impl MockLiveProvider {
    pub fn new() -> Self {
        Self::with_queue_capacity(64)
    }

    pub fn with_queue_capacity(queue_capacity: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            changed: Arc::new(Notify::new()),
            queue_capacity,
        }
    }

    /// Makes the next `connect` fail with a remote session error.
    pub fn fail_next_connect(&self, message: &str) {
        self.state.lock().unwrap().fail_next = Some(message.to_string());
    }

    /// Delivers `event` on the most recent session. Returns false if that
    /// session is gone.
    pub async fn emit(&self, event: LiveEvent) -> bool {
        let remote = self.state.lock().unwrap().remote.clone();
        match remote {
            Some(tx) => tx.send(event).await.is_ok(),
            None => false,
        }
    }

    pub fn connect_count(&self) -> usize {
        self.state.lock().unwrap().setups.len()
    }

    pub fn setups(&self) -> Vec<LiveSetup> {
        self.state.lock().unwrap().setups.clone()
    }

    /// Everything queued outbound across sessions, in order.
    pub fn outbound(&self) -> Vec<LiveOutbound> {
        self.state.lock().unwrap().outbound.clone()
    }

    pub fn audio_frames(&self) -> Vec<MediaBlob> {
        self.outbound()
            .into_iter()
            .filter_map(|m| match m {
                LiveOutbound::Audio(blob) => Some(blob),
                _ => None,
            })
            .collect()
    }

    /// Tool-response batches, one entry per batch.
    pub fn tool_responses(&self) -> Vec<Vec<ToolResponse>> {
        self.outbound()
            .into_iter()
            .filter_map(|m| match m {
                LiveOutbound::ToolResponses(batch) => Some(batch),
                _ => None,
            })
            .collect()
    }

    pub fn close_requests(&self) -> usize {
        self.outbound()
            .iter()
            .filter(|m| matches!(m, LiveOutbound::Close))
            .count()
    }

    /// Waits until `predicate` holds over the outbound log, or panics after
    /// a generous timeout.
    pub async fn wait_for(&self, predicate: impl Fn(&[LiveOutbound]) -> bool) {
        let wait = async {
            loop {
                let notified = self.changed.notified();
                if predicate(&self.state.lock().unwrap().outbound) {
                    return;
                }
                notified.await;
            }
        };
        if tokio::time::timeout(Duration::from_secs(30), wait).await.is_err() {
            panic!("timed out waiting for outbound live traffic");
        }
    }

    pub async fn wait_for_tool_responses(&self, batches: usize) -> Vec<Vec<ToolResponse>> {
        self.wait_for(|log| {
            log.iter()
                .filter(|m| matches!(m, LiveOutbound::ToolResponses(_)))
                .count()
                >= batches
        })
        .await;
        self.tool_responses()
    }
}

impl Default for MockLiveProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockLiveProvider {
    fn name(&self) -> &str {
        "mock-live"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::LiveProvider
    }

    async fn health_check(&self) -> Result<HealthStatus, ConciergeError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl LiveProvider for MockLiveProvider {
    async fn connect(&self, setup: LiveSetup) -> Result<LiveConnection, ConciergeError> {
        let (event_tx, events) = mpsc::channel(64);
        let (sender, mut outbound_rx) = LiveSender::channel(self.queue_capacity);
        {
            let mut state = self.state.lock().unwrap();
            state.setups.push(setup);
            if let Some(message) = state.fail_next.take() {
                return Err(ConciergeError::RemoteSession {
                    message,
                    source: None,
                });
            }
            state.remote = Some(event_tx);
        }

        let state = self.state.clone();
        let changed = self.changed.clone();
        tokio::spawn(async move {
            while let Some(message) = outbound_rx.recv().await {
                let close = matches!(message, LiveOutbound::Close);
                state.lock().unwrap().outbound.push(message);
                changed.notify_waiters();
                if close {
                    break;
                }
            }
            state.lock().unwrap().remote = None;
            changed.notify_waiters();
        });

        Ok(LiveConnection { sender, events })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use concierge_core::AudioSendOutcome;

    fn setup() -> LiveSetup {
        LiveSetup {
            model: "voice".into(),
            system_instruction: String::new(),
            tools: Vec::new(),
        }
    }

    #[tokio::test]
    async fn records_outbound_and_delivers_events() {
        let provider = MockLiveProvider::new();
        let mut connection = provider.connect(setup()).await.unwrap();

        assert!(provider.emit(LiveEvent::TurnComplete).await);
        assert_eq!(connection.events.recv().await, Some(LiveEvent::TurnComplete));

        let outcome = connection
            .sender
            .try_send_audio(MediaBlob {
                mime_type: "audio/pcm;rate=16000".into(),
                data: "AAAA".into(),
            })
            .unwrap();
        assert_eq!(outcome, AudioSendOutcome::Queued);
        connection.sender.close();
        provider.wait_for(|log| log.len() == 2).await;
        assert_eq!(provider.audio_frames().len(), 1);
        assert_eq!(provider.close_requests(), 1);
    }

    #[tokio::test]
    async fn scripted_connect_failure() {
        let provider = MockLiveProvider::new();
        provider.fail_next_connect("handshake refused");
        let err = provider.connect(setup()).await.unwrap_err();
        assert!(matches!(err, ConciergeError::RemoteSession { .. }));
        assert!(provider.connect(setup()).await.is_ok());
        assert_eq!(provider.connect_count(), 2);
    }
}
