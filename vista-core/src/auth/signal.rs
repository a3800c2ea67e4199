//! One-shot decision signal for pending requests.
//!
//! A pending device waits on a [`DecisionSignal`] until an administrator
//! accepts, rejects or bans it. The signal carries an explicit tagged
//! state rather than a bare flag, so a waiter that subscribes *after* the
//! decision was made still observes it.
//!
//! ```text
//!            fire(Accepted)
//!  Pending ─────────────────► Accepted
//!     │      fire(Rejected)
//!     ├─────────────────────► Rejected
//!     │      fire(Banned)
//!     └─────────────────────► Banned
//! ```
//!
//! Every resolved state is terminal; later `fire` calls are no-ops.

use std::time::Duration;

use tokio::sync::watch;

use crate::network::ConnectionId;

// ── Decision ─────────────────────────────────────────────────────

/// State of a pending episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Decision {
    /// No decision has been made yet.
    #[default]
    Pending,
    /// The device was moved to the active set.
    Accepted,
    /// The request was rejected. `notified` is the connection that already
    /// received the rejection notice, if any.
    Rejected { notified: Option<ConnectionId> },
    /// The device was banned. `notified` as for `Rejected`.
    Banned { notified: Option<ConnectionId> },
}

impl Decision {
    pub fn is_resolved(&self) -> bool {
        !matches!(self, Decision::Pending)
    }
}

// ── DecisionSignal ───────────────────────────────────────────────

/// Single-fire, multi-waiter wake primitive.
#[derive(Debug)]
pub struct DecisionSignal {
    state: watch::Sender<Decision>,
}

impl DecisionSignal {
    /// Create an unresolved signal.
    pub fn new() -> Self {
        let (state, _) = watch::channel(Decision::Pending);
        Self { state }
    }

    /// Resolve the signal. Returns `false` if it had already fired.
    pub fn fire(&self, decision: Decision) -> bool {
        if !decision.is_resolved() {
            return false;
        }
        self.state.send_if_modified(|current| {
            if current.is_resolved() {
                false
            } else {
                *current = decision;
                true
            }
        })
    }

    /// Current state without waiting.
    pub fn current(&self) -> Decision {
        *self.state.borrow()
    }

    /// Wait until the signal fires or `timeout` elapses.
    ///
    /// Returns `None` on timeout. Never blocks past `timeout`.
    pub async fn wait(&self, timeout: Duration) -> Option<Decision> {
        let mut rx = self.state.subscribe();
        match tokio::time::timeout(timeout, rx.wait_for(Decision::is_resolved)).await {
            Ok(Ok(decision)) => Some(*decision),
            // The sender lives in `self`, so it cannot be dropped while we wait.
            Ok(Err(_)) => None,
            Err(_) => None,
        }
    }
}

impl Default for DecisionSignal {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ────────────────────────────────────────────────────────
