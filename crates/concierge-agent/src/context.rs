// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared session context guarded by a generation counter.
//!
//! Both controllers mutate the draft, the manager-call flow and the ticket
//! log through one [`SessionContext`]. Every mutation names the
//! [`SessionEpoch`] it was started under; a mutation from a superseded
//! epoch fails with [`ConciergeError::StaleSession`] instead of landing.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use concierge_config::model::{ConciergeConfig, TimingConfig};
use concierge_core::ConciergeError;
use concierge_core::types::{ManagerCallStatus, PostConfirmPolicy, SessionEpoch, Ticket, TicketEntry};
use concierge_desk::{BookingDraft, DraftMachine, ManagerCallFlow, NotificationBanner, TicketLog};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

/// Everything the presentation layer reads, mutated only through the context.
#[derive(Debug)]
pub struct Desk {
    pub draft: DraftMachine,
    pub manager: ManagerCallFlow,
    pub tickets: TicketLog,
    pub banner: NotificationBanner,
}

impl Desk {
    /// Prepends `ticket` to the log and raises its banner, if it has one.
    pub fn record(&mut self, ticket: Ticket) -> TicketEntry {
        self.banner.show_for(&ticket, Instant::now());
        self.tickets.record(ticket)
    }
}

struct Session {
    epoch: u64,
    token: CancellationToken,
    desk: Desk,
}

struct Inner {
    session: Mutex<Session>,
    revision: watch::Sender<u64>,
    timing: TimingConfig,
}

/// Handle onto the desk state shared by the voice and text controllers.
#[derive(Clone)]
pub struct SessionContext {
    inner: Arc<Inner>,
}

/// Proof of the epoch a continuation started under.
///
/// The token is cancelled as soon as the epoch is superseded, so pending
/// delays and tasks tied to it end promptly.
#[derive(Debug, Clone)]
pub struct EpochGuard {
    epoch: SessionEpoch,
    token: CancellationToken,
}

impl EpochGuard {
    pub fn epoch(&self) -> SessionEpoch {
        self.epoch
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the epoch is superseded.
    pub fn cancelled(&self) -> impl Future<Output = ()> + Send + '_ {
        self.token.cancelled()
    }
}

/// Read-only view of the desk for the presentation layer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeskSnapshot {
    pub epoch: SessionEpoch,
    pub draft: Option<BookingDraft>,
    pub tickets: Vec<TicketEntry>,
    pub manager_status: ManagerCallStatus,
    pub notification: Option<String>,
}

impl SessionContext {
    pub fn new(timing: TimingConfig, policy: PostConfirmPolicy) -> Self {
        let (revision, _) = watch::channel(0);
        let desk = Desk {
            draft: DraftMachine::new(policy),
            manager: ManagerCallFlow::new(),
            tickets: TicketLog::new(),
            banner: NotificationBanner::new(timing.notification_ttl()),
        };
        Self {
            inner: Arc::new(Inner {
                session: Mutex::new(Session {
                    epoch: 0,
                    token: CancellationToken::new(),
                    desk,
                }),
                revision,
                timing,
            }),
        }
    }

    pub fn from_config(config: &ConciergeConfig) -> Self {
        Self::new(config.timing.clone(), config.booking.post_confirm_policy)
    }

    pub fn timing(&self) -> &TimingConfig {
        &self.inner.timing
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.inner.session.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn bump(&self) {
        self.inner.revision.send_modify(|r| *r += 1);
    }

    /// Starts a new session: supersedes the previous epoch, clears the draft
    /// and returns the manager flow to idle. The ticket log is kept.
    pub fn begin_epoch(&self) -> EpochGuard {
        let guard = {
            let mut session = self.lock();
            session.token.cancel();
            session.epoch += 1;
            session.token = CancellationToken::new();
            session.desk.draft.clear();
            session.desk.manager.reset();
            session.desk.banner.dismiss();
            EpochGuard {
                epoch: SessionEpoch(session.epoch),
                token: session.token.clone(),
            }
        };
        info!(epoch = %guard.epoch, "session epoch started");
        self.bump();
        guard
    }

    /// Ends `epoch` without touching the desk. Returns false if it was
    /// already superseded.
    pub fn retire(&self, epoch: SessionEpoch) -> bool {
        let mut session = self.lock();
        if session.epoch != epoch.0 {
            return false;
        }
        session.token.cancel();
        session.epoch += 1;
        session.token = CancellationToken::new();
        debug!(%epoch, "session epoch retired");
        true
    }

    pub fn current_epoch(&self) -> SessionEpoch {
        SessionEpoch(self.lock().epoch)
    }

    pub fn is_current(&self, epoch: SessionEpoch) -> bool {
        self.lock().epoch == epoch.0
    }

    fn stale(epoch: SessionEpoch, current: u64) -> ConciergeError {
        ConciergeError::StaleSession {
            epoch: epoch.0,
            current,
        }
    }

    /// Runs `f` against the desk if `epoch` is still the active one.
    pub fn with_state<R>(
        &self,
        epoch: SessionEpoch,
        f: impl FnOnce(&mut Desk) -> R,
    ) -> Result<R, ConciergeError> {
        let result = {
            let mut session = self.lock();
            if session.epoch != epoch.0 {
                return Err(Self::stale(epoch, session.epoch));
            }
            f(&mut session.desk)
        };
        self.bump();
        Ok(result)
    }

    /// Records `ticket` under `epoch`.
    pub fn record_ticket(
        &self,
        epoch: SessionEpoch,
        ticket: Ticket,
    ) -> Result<TicketEntry, ConciergeError> {
        self.with_state(epoch, |desk| desk.record(ticket))
    }

    /// Waits `duration`, failing early if the guard's epoch is superseded.
    pub async fn pause(&self, guard: &EpochGuard, duration: Duration) -> Result<(), ConciergeError> {
        if !duration.is_zero() {
            tokio::select! {
                biased;
                _ = guard.cancelled() => {}
                _ = tokio::time::sleep(duration) => {}
            }
        }
        if guard.is_cancelled() {
            return Err(Self::stale(guard.epoch, self.current_epoch().0));
        }
        Ok(())
    }

    /// Applies `f` after `delay` unless the guard's epoch ends first.
    pub fn spawn_after<F>(&self, guard: &EpochGuard, delay: Duration, f: F) -> JoinHandle<()>
    where
        F: FnOnce(&mut Desk) + Send + 'static,
    {
        let ctx = self.clone();
        let guard = guard.clone();
        tokio::spawn(async move {
            if ctx.pause(&guard, delay).await.is_err() {
                debug!(epoch = %guard.epoch, "delayed desk update discarded");
                return;
            }
            let _ = ctx.with_state(guard.epoch, f);
        })
    }

    /// Marks a delivered letter as read. Not tied to an epoch: the log
    /// outlives sessions.
    pub fn mark_read(&self, id: Uuid) -> bool {
        let changed = self.lock().desk.tickets.mark_read(id);
        if changed {
            self.bump();
        }
        changed
    }

    pub fn dismiss_notification(&self) {
        self.lock().desk.banner.dismiss();
        self.bump();
    }

    pub fn snapshot(&self) -> DeskSnapshot {
        let mut session = self.lock();
        let epoch = SessionEpoch(session.epoch);
        let desk = &mut session.desk;
        DeskSnapshot {
            epoch,
            draft: desk.draft.current().cloned(),
            tickets: desk.tickets.to_vec(),
            manager_status: desk.manager.status(),
            notification: desk
                .banner
                .current(Instant::now())
                .map(|n| n.message.clone()),
        }
    }

    /// Change notifications: the value increments after every mutation.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("epoch", &self.current_epoch())
            .finish_non_exhaustive()
    }
}
