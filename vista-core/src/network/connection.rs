//! Per-connection outbound plumbing.
//!
//! Every connection owns a single writer (the transport side drains an
//! [`Outbox`]), so frames from the streaming task and replies from the
//! message loop can never interleave on the wire. Two lanes feed that
//! writer:
//!
//! - **control** — unbounded; replies, acks and registry notifications.
//!   Sends never block, which lets the registry notify while holding its
//!   lock.
//! - **frames** — bounded; the frame loop awaits capacity, which gives
//!   natural backpressure against a slow peer.
//!
//! The writer drains control messages first.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::VistaError;
use crate::protocol::ServerMessage;

/// Default capacity of the frame lane.
pub const DEFAULT_FRAME_BUFFER: usize = 2;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

// ── ConnectionId ─────────────────────────────────────────────────

/// Process-unique identity of one transport connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Allocate the next id.
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

// ── ConnectionHandle ─────────────────────────────────────────────

/// Cloneable sending side of a connection.
///
/// The registry keeps clones of this handle to deliver unsolicited
/// notifications; two handles are the same connection iff their
/// [`id`](Self::id)s are equal.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    control: mpsc::UnboundedSender<ServerMessage>,
    frames: mpsc::Sender<ServerMessage>,
    closed: CancellationToken,
}

impl ConnectionHandle {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queue a control message. Never blocks.
    pub fn send(&self, message: ServerMessage) -> Result<(), VistaError> {
        self.control.send(message)?;
        Ok(())
    }

    /// Queue a frame, waiting for room in the frame lane.
    pub async fn send_frame(&self, message: ServerMessage) -> Result<(), VistaError> {
        self.frames.send(message).await?;
        Ok(())
    }

    /// Ask the owning engine to tear the connection down.
    pub fn close(&self) {
        self.closed.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Resolves once [`close`](Self::close) has been called on any clone.
    pub async fn closed(&self) {
        self.closed.cancelled().await
    }

    /// A token cancelled together with this connection.
    pub fn child_token(&self) -> CancellationToken {
        self.closed.child_token()
    }
}

// ── Outbox ───────────────────────────────────────────────────────

/// Receiving side of a connection's outbound queue, owned by the writer.
#[derive(Debug)]
pub struct Outbox {
    control: mpsc::UnboundedReceiver<ServerMessage>,
    frames: mpsc::Receiver<ServerMessage>,
}

impl Outbox {
    /// Next message to put on the wire, control lane first.
    ///
    /// Returns `None` once every [`ConnectionHandle`] clone is dropped and
    /// both lanes are drained.
    pub async fn next(&mut self) -> Option<ServerMessage> {
        tokio::select! {
            biased;
            Some(message) = self.control.recv() => Some(message),
            Some(message) = self.frames.recv() => Some(message),
            else => None,
        }
    }

    /// Non-blocking variant of [`next`](Self::next).
    pub fn try_next(&mut self) -> Option<ServerMessage> {
        self.control
            .try_recv()
            .ok()
            .or_else(|| self.frames.try_recv().ok())
    }
}

/// Create a connection's handle and outbox.
pub fn channel(frame_buffer: usize) -> (ConnectionHandle, Outbox) {
    let (control_tx, control_rx) = mpsc::unbounded_channel();
    let (frames_tx, frames_rx) = mpsc::channel(frame_buffer.max(1));
    let handle = ConnectionHandle {
        id: ConnectionId::next(),
        control: control_tx,
        frames: frames_tx,
        closed: CancellationToken::new(),
    };
    let outbox = Outbox {
        control: control_rx,
        frames: frames_rx,
    };
    (handle, outbox)
}

// ── Tests ────────────────────────────────────────────────────────
