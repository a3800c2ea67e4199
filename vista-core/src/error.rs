//! Domain-specific error types for Vista.
//!
//! Authorization and capability outcomes are protocol *values*
//! (`auth_result`, `input_ack{ok:false}`) and never show up here. This
//! enum covers the failures that cross a component boundary: malformed
//! traffic, closed channels, and misbehaving collaborators.

use thiserror::Error;

/// The canonical error type for Vista.
#[derive(Debug, Error)]
pub enum VistaError {
    // ── Protocol Errors ──────────────────────────────────────────
    /// An inbound frame was not valid JSON.
    #[error("invalid json: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// A message carried a `type` the engine does not understand.
    #[error("unknown message type: {0}")]
    UnknownType(String),

    /// A message arrived that is not valid in the current phase.
    #[error("protocol violation: {0}")]
    ProtocolViolation(&'static str),

    // ── Connection Errors ────────────────────────────────────────
    /// The outbound queue of a connection is gone.
    #[error("channel closed")]
    ChannelClosed,

    // ── Collaborator Errors ──────────────────────────────────────
    /// The capture provider failed to produce a frame.
    #[error("capture failed: {0}")]
    Capture(String),

    /// The input injector rejected or failed an action.
    #[error("input injection failed: {0}")]
    Injection(String),

    /// A normalized coordinate could not be mapped onto the surface.
    #[error("invalid pointer scale: {0}")]
    InvalidScale(&'static str),

    /// Encoding a frame failed.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Catch-all for errors that do not fit another variant.
    #[error("{0}")]
    Other(String),
}

// ── Convenient From implementations ──────────────────────────────

impl From<String> for VistaError {
    fn from(s: String) -> Self {
        VistaError::Other(s)
    }
}

impl From<&str> for VistaError {
    fn from(s: &str) -> Self {
        VistaError::Other(s.to_string())
    }
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for VistaError {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        VistaError::ChannelClosed
    }
}

impl<T> From<tokio::sync::mpsc::error::TrySendError<T>> for VistaError {
    fn from(_: tokio::sync::mpsc::error::TrySendError<T>) -> Self {
        VistaError::ChannelClosed
    }
}

impl From<tokio::task::JoinError> for VistaError {
    fn from(e: tokio::task::JoinError) -> Self {
        VistaError::Other(format!("blocking task failed: {e}"))
    }
}
