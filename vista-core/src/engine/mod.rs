//! Per-connection protocol engine.
//!
//! ```text
//!   transport reader ──► inbound ──► Session (message loop) ──┐
//!                                        │ spawn on accept     │ replies
//!                                        ▼                     ▼
//!                                   FrameTask ─────────► ConnectionHandle ──► Outbox ──► writer
//!                                        ▲                     ▲
//!                                        └── Registry ─────────┘ notifications
//! ```
//!
//! | Module     | Purpose                                             |
//! |------------|-----------------------------------------------------|
//! | `session`  | Handshake, message loop and teardown                |
//! | `stream`   | Permission-gated frame loop                         |
//! | `dispatch` | Capability-checked input action dispatch            |

pub mod dispatch;
pub mod session;
pub mod stream;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::auth::Registry;
use crate::network::ConnectionHandle;
use crate::screen::{CaptureProvider, InputInjector};

pub use dispatch::InputDispatcher;
pub use session::Session;
pub use stream::FrameTask;

// ── EngineConfig ─────────────────────────────────────────────────

/// Tunables for [`ProtocolEngine`].
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How long a pending device waits for an administrator.
    pub decision_timeout: Duration,
    /// Target interval between frames while viewing is allowed.
    pub frame_interval: Duration,
    /// Re-check interval while `view_screen` is denied.
    pub idle_interval: Duration,
    /// Quality passed to the capture provider (0..=100).
    pub capture_quality: u8,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            decision_timeout: Duration::from_secs(3600),
            frame_interval: Duration::from_millis(125), // ~8 fps
            idle_interval: Duration::from_millis(500),
            capture_quality: 50,
        }
    }
}

// ── ProtocolEngine ───────────────────────────────────────────────

/// Shared engine state; one [`Session`] is run per connection.
#[derive(Clone)]
pub struct ProtocolEngine {
    registry: Registry,
    capture: Arc<dyn CaptureProvider>,
    dispatcher: InputDispatcher,
    config: EngineConfig,
}

impl ProtocolEngine {
    pub fn new(
        registry: Registry,
        capture: Arc<dyn CaptureProvider>,
        injector: Arc<dyn InputInjector>,
        config: EngineConfig,
    ) -> Self {
        let dispatcher = InputDispatcher::new(injector, Arc::clone(&capture));
        Self {
            registry,
            capture,
            dispatcher,
            config,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Drive one connection until it closes.
    ///
    /// `inbound` yields the connection's text frames; the transport closes
    /// it when the peer goes away. Everything the engine says goes through
    /// `handle`.
    pub async fn serve(&self, handle: ConnectionHandle, inbound: mpsc::Receiver<String>) {
        Session::new(self.clone(), handle).run(inbound).await
    }
}
