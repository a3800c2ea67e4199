//! # vista-host — screen sharing host service
//!
//! Serves the viewer protocol on `/ws` and the administrator API under
//! `/api/*` from one listener. Viewers authenticate with the current
//! access code, wait for an administrator's decision, then receive frames
//! and may send input within the permissions they were granted.
//!
//! ## Modules
//!
//! - **config**: TOML configuration (`HostConfig`)
//! - **server**: router, WebSocket bridge to `ProtocolEngine`
//! - **admin**: administrator endpoints over the shared `Registry`

pub mod admin;
pub mod config;
pub mod server;
