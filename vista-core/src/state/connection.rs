//! Per-connection authorization state machine.
//!
//! Provides a `ConnectionPhase` enum that models the lifecycle of a
//! viewer connection, with validated transitions that return `Result`
//! instead of panicking.

use std::time::Instant;

use crate::auth::DeviceId;
use crate::error::VistaError;

// ── ConnectionPhase ──────────────────────────────────────────────

/// The current phase of a viewer connection.
///
/// ```text
///  Unauthenticated ──► AwaitingDecision ──► Streaming
///         │                   │                 │
///         ▼                   ▼                 ▼
///         └─────────────► Closed ◄──────────────┘
/// ```
///
/// A wrong access code keeps the connection in `Unauthenticated`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConnectionPhase {
    /// No successful `auth` yet. Initial state.
    #[default]
    Unauthenticated,

    /// Correct code received; waiting for an administrator.
    AwaitingDecision {
        device_id: DeviceId,
        since: Instant,
    },

    /// Accepted; frames flow and input events are honored.
    Streaming {
        device_id: DeviceId,
        since: Instant,
    },

    /// Terminal.
    Closed,
}

impl std::fmt::Display for ConnectionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthenticated => write!(f, "Unauthenticated"),
            Self::AwaitingDecision { .. } => write!(f, "AwaitingDecision"),
            Self::Streaming { .. } => write!(f, "Streaming"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}

impl ConnectionPhase {
    pub fn is_streaming(&self) -> bool {
        matches!(self, Self::Streaming { .. })
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }

    /// Device bound to this connection, once an `auth` was admitted.
    pub fn device_id(&self) -> Option<&DeviceId> {
        match self {
            Self::AwaitingDecision { device_id, .. } | Self::Streaming { device_id, .. } => {
                Some(device_id)
            }
            _ => None,
        }
    }

    /// How long the connection has been streaming.
    pub fn streaming_duration(&self) -> Option<std::time::Duration> {
        match self {
            Self::Streaming { since, .. } => Some(since.elapsed()),
            _ => None,
        }
    }

    // ── Transitions ──────────────────────────────────────────────

    /// Transition to `AwaitingDecision`.
    ///
    /// Valid from: `Unauthenticated`.
    pub fn begin_pending(&mut self, device_id: DeviceId) -> Result<(), VistaError> {
        match self {
            Self::Unauthenticated => {
                *self = Self::AwaitingDecision {
                    device_id,
                    since: Instant::now(),
                };
                Ok(())
            }
            _ => Err(VistaError::ProtocolViolation(
                "cannot await decision: not in Unauthenticated state",
            )),
        }
    }

    /// Transition to `Streaming`.
    ///
    /// Valid from: `AwaitingDecision`.
    pub fn accept(&mut self) -> Result<(), VistaError> {
        match std::mem::take(self) {
            Self::AwaitingDecision { device_id, .. } => {
                *self = Self::Streaming {
                    device_id,
                    since: Instant::now(),
                };
                Ok(())
            }
            other => {
                *self = other;
                Err(VistaError::ProtocolViolation(
                    "cannot stream: not in AwaitingDecision state",
                ))
            }
        }
    }

    /// Force the connection to `Closed` regardless of current state.
    pub fn close(&mut self) {
        *self = Self::Closed;
    }
}

// ── Tests ────────────────────────────────────────────────────────
