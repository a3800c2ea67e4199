//! Connection plumbing shared by the engine and the transport layer.

pub mod connection;

pub use connection::{ConnectionHandle, ConnectionId, DEFAULT_FRAME_BUFFER, Outbox, channel};
