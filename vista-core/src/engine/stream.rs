//! Permission-gated frame loop for one accepted connection.
//!
//! The loop re-reads the session's permissions every iteration, so a
//! `view_screen` change made by the administrator takes effect on the
//! next tick without any coordination with the message loop.

use std::sync::Arc;
use std::time::{Duration, Instant};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::auth::DeviceId;
use crate::engine::ProtocolEngine;
use crate::error::VistaError;
use crate::network::ConnectionHandle;
use crate::protocol::ServerMessage;
use crate::screen::CaptureProvider;

/// Handle to a running frame loop.
#[derive(Debug)]
pub struct FrameTask {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl FrameTask {
    /// Start streaming to `conn` on behalf of `device_id`.
    ///
    /// The loop ends on its own once the session is no longer active on
    /// `conn`, the frame lane closes, or capture fails.
    pub fn spawn(engine: ProtocolEngine, device_id: DeviceId, conn: ConnectionHandle) -> Self {
        let token = conn.child_token();
        let handle = tokio::spawn(frame_loop(engine, device_id, conn, token.clone()));
        Self { token, handle }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Cancel the loop and wait for it to exit.
    pub async fn stop(self) {
        self.token.cancel();
        if let Err(e) = self.handle.await {
            if !e.is_cancelled() {
                warn!("frame task ended abnormally: {e}");
            }
        }
    }
}

async fn frame_loop(
    engine: ProtocolEngine,
    device_id: DeviceId,
    conn: ConnectionHandle,
    token: CancellationToken,
) {
    let config = engine.config.clone();
    let mut sent: u64 = 0;

    while !token.is_cancelled() {
        let loop_start = Instant::now();

        let Some(permissions) = engine.registry.permissions_for(&device_id, conn.id()) else {
            debug!(device_id = %device_id, "session gone, frame loop exiting");
            break;
        };

        if !permissions.view_screen {
            if !sleep_or_cancel(&token, config.idle_interval).await {
                break;
            }
            continue;
        }

        let data = match capture_frame(Arc::clone(&engine.capture), config.capture_quality).await {
            Ok(data) => data,
            Err(e) => {
                warn!(device_id = %device_id, "capture failed, stopping stream: {e}");
                break;
            }
        };

        let frame = ServerMessage::Frame { data };
        let delivered = tokio::select! {
            _ = token.cancelled() => break,
            result = conn.send_frame(frame) => result,
        };
        if delivered.is_err() {
            debug!(device_id = %device_id, "frame lane closed");
            break;
        }
        sent += 1;

        if !pace(&token, loop_start, config.frame_interval).await {
            break;
        }
    }

    debug!(device_id = %device_id, conn = %conn.id(), frames = sent, "frame loop stopped");
}

/// Capture on a blocking worker and base64-encode the result.
async fn capture_frame(
    capture: Arc<dyn CaptureProvider>,
    quality: u8,
) -> Result<String, VistaError> {
    let bytes = tokio::task::spawn_blocking(move || capture.capture(quality)).await??;
    Ok(STANDARD.encode(bytes))
}

/// Sleep for the remainder of the frame interval. `false` if cancelled.
async fn pace(token: &CancellationToken, loop_start: Instant, interval: Duration) -> bool {
    let elapsed = loop_start.elapsed();
    if elapsed >= interval {
        tokio::task::yield_now().await;
        return !token.is_cancelled();
    }
    sleep_or_cancel(token, interval - elapsed).await
}

async fn sleep_or_cancel(token: &CancellationToken, duration: Duration) -> bool {
    tokio::select! {
        _ = token.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Capability, PermissionPatch, Registry};
    use crate::engine::EngineConfig;
    use crate::network::channel;
    use crate::screen::encoder::JPEG_SOI;
    use crate::screen::{PlatformInjector, TestPatternCapture};

    fn engine(registry: Registry) -> ProtocolEngine {
        ProtocolEngine::new(
            registry,
            Arc::new(TestPatternCapture::new(8, 4)),
            Arc::new(PlatformInjector::new()),
            EngineConfig {
                frame_interval: Duration::from_millis(5),
                idle_interval: Duration::from_millis(5),
                ..EngineConfig::default()
            },
        )
    }

    fn activate(registry: &Registry, conn: &ConnectionHandle) -> DeviceId {
        let id = DeviceId::new("dev");
        assert!(registry.admit_pending(&id, "laptop", conn.clone()));
        assert!(registry.accept(&id));
        id
    }

    #[tokio::test]
    async fn streams_frames_until_stopped() {
        let registry = Registry::new();
        let (conn, mut outbox) = channel(2);
        let id = activate(&registry, &conn);

        let task = FrameTask::spawn(engine(registry), id, conn);
        for _ in 0..3 {
            match outbox.next().await {
                Some(ServerMessage::Frame { data }) => {
                    let bytes = STANDARD.decode(data).unwrap();
                    assert_eq!(bytes[..2], JPEG_SOI);
                }
                other => panic!("expected frame, got {other:?}"),
            }
        }
        task.stop().await;
    }

    #[tokio::test]
    async fn exits_when_session_is_released() {
        let registry = Registry::new();
        let (conn, mut outbox) = channel(2);
        let id = activate(&registry, &conn);
        tokio::spawn(async move { while outbox.next().await.is_some() {} });
        let task = FrameTask::spawn(engine(registry.clone()), id, conn.clone());

        registry.release(conn.id());
        tokio::time::timeout(Duration::from_secs(2), async {
            while !task.is_finished() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn no_frames_without_view_permission() {
        let registry = Registry::new();
        let (conn, mut outbox) = channel(2);
        let id = activate(&registry, &conn);
        let off = PermissionPatch::default().with(Capability::ViewScreen, false);
        registry.update_permissions(&id, &off);
        assert!(matches!(
            outbox.try_next(),
            Some(ServerMessage::PermissionUpdate { .. })
        ));

        let task = FrameTask::spawn(engine(registry), id, conn);
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(outbox.try_next(), None);
        task.stop().await;
    }
}
