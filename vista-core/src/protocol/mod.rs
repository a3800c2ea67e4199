//! Wire protocol for viewer connections.
//!
//! Messages are JSON objects discriminated by a `type` field and carried
//! as WebSocket text frames. [`message`] defines the envelopes and
//! [`input`] the closed set of remote input actions.

pub mod input;
pub mod message;

pub use input::{ACTION_TABLE, ActionKind, InputAction};
pub use message::{AuthRequest, AuthStatus, ClientMessage, InputPayload, ServerMessage};
