// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Live provider trait for the bidirectional voice session.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;

use crate::error::ConciergeError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{LiveEvent, LiveOutbound, LiveSetup, MediaBlob, ToolResponse};

/// Adapter that opens long-lived bidirectional sessions with the remote model.
#[async_trait]
pub trait LiveProvider: PluginAdapter {
    /// Opens a session and returns once the remote side accepted the setup.
    async fn connect(&self, setup: LiveSetup) -> Result<LiveConnection, ConciergeError>;
}

/// Both halves of an open live session.
#[derive(Debug)]
pub struct LiveConnection {
    pub sender: LiveSender,
    pub events: mpsc::Receiver<LiveEvent>,
}

/// Result of queueing an audio frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioSendOutcome {
    Queued,
    /// The outbound queue was full and the frame was discarded.
    Dropped,
}

/// Handle onto the single ordered outbound queue of a live session.
///
/// Audio frames and tool responses share one queue, so the transport
/// writes them in the order they were produced. Closing also fires a
/// token the transport watches, so items still queued are not flushed.
#[derive(Debug, Clone)]
pub struct LiveSender {
    tx: mpsc::Sender<LiveOutbound>,
    closing: CancellationToken,
}

impl LiveSender {
    pub fn new(tx: mpsc::Sender<LiveOutbound>) -> Self {
        Self {
            tx,
            closing: CancellationToken::new(),
        }
    }

    /// Creates a sender together with the receiving end drained by a transport.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<LiveOutbound>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(tx), rx)
    }

    /// Queues an audio frame without waiting; a full queue drops the frame.
    pub fn try_send_audio(&self, blob: MediaBlob) -> Result<AudioSendOutcome, ConciergeError> {
        if self.closing.is_cancelled() {
            return Err(closed_error());
        }
        match self.tx.try_send(LiveOutbound::Audio(blob)) {
            Ok(()) => Ok(AudioSendOutcome::Queued),
            Err(TrySendError::Full(_)) => Ok(AudioSendOutcome::Dropped),
            Err(TrySendError::Closed(_)) => Err(closed_error()),
        }
    }

    /// Queues a tool-response batch, waiting for room if necessary.
    pub async fn send_tool_responses(
        &self,
        responses: Vec<ToolResponse>,
    ) -> Result<(), ConciergeError> {
        self.tx
            .send(LiveOutbound::ToolResponses(responses))
            .await
            .map_err(|_| closed_error())
    }

    /// Asks the transport to close the session. Never fails.
    ///
    /// Frames still queued are discarded by transports that watch
    /// [`closing`](Self::closing).
    pub fn close(&self) {
        self.closing.cancel();
        let _ = self.tx.try_send(LiveOutbound::Close);
    }

    /// Token cancelled once [`close`](Self::close) is called.
    pub fn closing(&self) -> CancellationToken {
        self.closing.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.closing.is_cancelled() || self.tx.is_closed()
    }
}

fn closed_error() -> ConciergeError {
    ConciergeError::RemoteSession {
        message: "live session outbound queue is closed".into(),
        source: None,
    }
}
