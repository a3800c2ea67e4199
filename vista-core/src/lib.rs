//! # vista-core
//!
//! Core library of the Vista remote screen host.
//!
//! This crate contains:
//! - **Auth**: `Registry` (access code, pending requests, active sessions,
//!   ban list), `DecisionSignal`, `Permissions`
//! - **Protocol**: JSON `ClientMessage` / `ServerMessage` and the input
//!   action table
//! - **Network**: `ConnectionHandle` / `Outbox`, the two-lane outbound queue
//!   of a connection
//! - **Engine**: `ProtocolEngine`, driving one connection from `auth` to
//!   streaming
//! - **Screen**: `CaptureProvider` and `InputInjector` seams, the JPEG
//!   frame encoder, DXGI desktop capture and the synthetic capture source
//! - **State**: the per-connection `ConnectionPhase` machine
//! - **Error**: `VistaError` — typed, `thiserror`-based error hierarchy

pub mod auth;
pub mod engine;
pub mod error;
pub mod network;
pub mod protocol;
pub mod screen;
pub mod state;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use auth::{
    AccessCode, ActiveSession, Capability, DeviceId, PendingRequest, PermissionPatch,
    Permissions, Registry, Verdict,
};
pub use engine::{EngineConfig, ProtocolEngine};
pub use error::VistaError;
pub use network::{ConnectionHandle, ConnectionId, DEFAULT_FRAME_BUFFER, Outbox, channel};
pub use protocol::{AuthStatus, ClientMessage, ServerMessage};
pub use screen::{
    CaptureProvider, DesktopCapture, InputInjector, PlatformInjector, TestPatternCapture,
};
pub use state::ConnectionPhase;
