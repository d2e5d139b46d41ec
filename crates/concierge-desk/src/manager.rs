// SPDX-FileCopyrightText: 2026 Concierge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Duty-manager escalation flow.
//!
//! `idle -> calling -> busy -> sending_msg -> completed -> idle`. A guest may
//! also leave a message without a prior call attempt.

use concierge_core::types::ManagerCallStatus;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("illegal manager-call transition from {from} to {to}")]
pub struct IllegalTransition {
    pub from: ManagerCallStatus,
    pub to: ManagerCallStatus,
}

#[derive(Debug, Clone, Default)]
pub struct ManagerCallFlow {
    status: ManagerCallStatus,
    history: Vec<ManagerCallStatus>,
}

impl ManagerCallFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> ManagerCallStatus {
        self.status
    }

    /// Every status entered since the last [`reset`](Self::reset), in order.
    pub fn history(&self) -> &[ManagerCallStatus] {
        &self.history
    }

    fn transition(
        &mut self,
        allowed_from: &[ManagerCallStatus],
        to: ManagerCallStatus,
    ) -> Result<ManagerCallStatus, IllegalTransition> {
        if !allowed_from.contains(&self.status) {
            return Err(IllegalTransition {
                from: self.status,
                to,
            });
        }
        debug!(from = %self.status, %to, "manager call status");
        self.status = to;
        self.history.push(to);
        Ok(to)
    }

    pub fn begin_call(&mut self) -> Result<ManagerCallStatus, IllegalTransition> {
        use ManagerCallStatus::*;
        self.transition(&[Idle, Busy, Completed], Calling)
    }

    pub fn call_busy(&mut self) -> Result<ManagerCallStatus, IllegalTransition> {
        use ManagerCallStatus::*;
        self.transition(&[Calling], Busy)
    }

    pub fn begin_message(&mut self) -> Result<ManagerCallStatus, IllegalTransition> {
        use ManagerCallStatus::*;
        self.transition(&[Idle, Busy, Completed], SendingMessage)
    }

    pub fn message_sent(&mut self) -> Result<ManagerCallStatus, IllegalTransition> {
        use ManagerCallStatus::*;
        self.transition(&[SendingMessage], Completed)
    }

    /// Returns to idle after a completed flow; other states are left alone.
    pub fn reset_to_idle(&mut self) -> bool {
        if self.status != ManagerCallStatus::Completed {
            return false;
        }
        self.status = ManagerCallStatus::Idle;
        self.history.push(ManagerCallStatus::Idle);
        true
    }

    /// Unconditionally returns to idle and forgets the history.
    pub fn reset(&mut self) {
        self.status = ManagerCallStatus::Idle;
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ManagerCallStatus::*;

    #[test]
    fn escalation_passes_through_busy() {
        let mut flow = ManagerCallFlow::new();
        flow.begin_call().unwrap();
        flow.call_busy().unwrap();
        flow.begin_message().unwrap();
        flow.message_sent().unwrap();
        assert!(flow.reset_to_idle());
        assert_eq!(flow.history(), &[Calling, Busy, SendingMessage, Completed, Idle]);
    }

    #[test]
    fn second_call_while_calling_is_rejected() {
        let mut flow = ManagerCallFlow::new();
        flow.begin_call().unwrap();
        let err = flow.begin_call().unwrap_err();
        assert_eq!(err, IllegalTransition { from: Calling, to: Calling });
        assert_eq!(err.to_string(), "illegal manager-call transition from calling to calling");
    }

    #[test]
    fn message_without_call_is_allowed() {
        let mut flow = ManagerCallFlow::new();
        flow.begin_message().unwrap();
        assert!(flow.begin_call().is_err());
        flow.message_sent().unwrap();
        assert_eq!(flow.status(), Completed);
    }

    #[test]
    fn reset_to_idle_only_from_completed() {
        let mut flow = ManagerCallFlow::new();
        flow.begin_call().unwrap();
        assert!(!flow.reset_to_idle());
        assert_eq!(flow.status(), Calling);
        flow.reset();
        assert_eq!(flow.status(), Idle);
        assert!(flow.history().is_empty());
    }
}
