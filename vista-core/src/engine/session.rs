//! One connection's handshake, message loop and teardown.

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::auth::{DeviceId, UNKNOWN_DEVICE_NAME, Verdict};
use crate::engine::{FrameTask, ProtocolEngine};
use crate::error::VistaError;
use crate::network::ConnectionHandle;
use crate::protocol::{AuthRequest, AuthStatus, ClientMessage, InputPayload, ServerMessage};
use crate::state::ConnectionPhase;

/// Whether the message loop keeps going after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Close,
}

/// Per-connection protocol driver.
///
/// Owns the connection's [`ConnectionPhase`] and, once streaming, its
/// [`FrameTask`]. All replies go through the connection's control lane.
pub struct Session {
    engine: ProtocolEngine,
    handle: ConnectionHandle,
    phase: ConnectionPhase,
    stream: Option<FrameTask>,
}

impl Session {
    pub fn new(engine: ProtocolEngine, handle: ConnectionHandle) -> Self {
        Self {
            engine,
            handle,
            phase: ConnectionPhase::default(),
            stream: None,
        }
    }

    pub fn phase(&self) -> &ConnectionPhase {
        &self.phase
    }

    /// Process inbound text frames until the peer leaves, the connection is
    /// closed from elsewhere, or a terminal auth outcome is reached.
    pub async fn run(mut self, mut inbound: mpsc::Receiver<String>) {
        let conn = self.handle.id();
        debug!(%conn, "connection opened");

        loop {
            let text = tokio::select! {
                biased;
                _ = self.handle.closed() => {
                    debug!(%conn, "connection closed by host");
                    break;
                }
                text = inbound.recv() => match text {
                    Some(text) => text,
                    None => break,
                },
            };

            if self.on_text(&text, &mut inbound).await == Flow::Close {
                break;
            }
        }

        self.teardown().await;
    }

    async fn on_text(&mut self, text: &str, inbound: &mut mpsc::Receiver<String>) -> Flow {
        match ClientMessage::parse(text) {
            Ok(ClientMessage::Auth(request)) => self.on_auth(request, inbound).await,
            Ok(ClientMessage::InputEvent(payload)) => self.on_input(payload).await,
            Err(VistaError::UnknownType(kind)) => {
                debug!(conn = %self.handle.id(), kind = %kind, "unknown message type");
                self.reply(ServerMessage::error("unknown type"))
            }
            Err(e) => {
                debug!(conn = %self.handle.id(), "unparseable message: {e}");
                self.reply(ServerMessage::error("invalid json"))
            }
        }
    }

    // ── Handshake ────────────────────────────────────────────────

    async fn on_auth(
        &mut self,
        request: AuthRequest,
        inbound: &mut mpsc::Receiver<String>,
    ) -> Flow {
        if self.phase.is_streaming() {
            return self.reply(ServerMessage::error("already authenticated"));
        }

        let device_id = DeviceId::from_announced(request.device_id.as_deref());
        let name = request
            .device_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(UNKNOWN_DEVICE_NAME)
            .to_owned();
        let registry = self.engine.registry.clone();

        if registry.is_banned(&device_id) {
            info!(device_id = %device_id, "banned device refused");
            self.reply(ServerMessage::auth_result(AuthStatus::Banned));
            return Flow::Close;
        }

        if !registry.check_code(request.code.as_deref()) {
            info!(device_id = %device_id, "wrong access code");
            return self.reply(ServerMessage::auth_result(AuthStatus::WrongCode));
        }

        if !registry.admit_pending(&device_id, &name, self.handle.clone()) {
            // Banned between the check and the insert.
            self.reply(ServerMessage::auth_result(AuthStatus::Banned));
            return Flow::Close;
        }
        if let Err(e) = self.phase.begin_pending(device_id.clone()) {
            warn!(device_id = %device_id, "unexpected auth: {e}");
            return Flow::Close;
        }
        if self.reply(ServerMessage::auth_result(AuthStatus::Pending)) == Flow::Close {
            return Flow::Close;
        }

        match self.wait_for_verdict(&device_id, inbound).await {
            Some(verdict) => self.on_verdict(device_id, verdict),
            None => {
                debug!(device_id = %device_id, "connection went away while pending");
                Flow::Close
            }
        }
    }

    /// Wait for the administrator while answering stray messages.
    ///
    /// `None` means the connection went away first.
    async fn wait_for_verdict(
        &self,
        device_id: &DeviceId,
        inbound: &mut mpsc::Receiver<String>,
    ) -> Option<Verdict> {
        let registry = self.engine.registry.clone();
        let wait = registry.wait_verdict(device_id, self.engine.config.decision_timeout);
        tokio::pin!(wait);

        loop {
            tokio::select! {
                biased;
                verdict = &mut wait => return Some(verdict),
                _ = self.handle.closed() => return None,
                text = inbound.recv() => {
                    if text.is_none() {
                        return None;
                    }
                    if self.reply(ServerMessage::error("awaiting decision")) == Flow::Close {
                        return None;
                    }
                }
            }
        }
    }

    fn on_verdict(&mut self, device_id: DeviceId, verdict: Verdict) -> Flow {
        let conn = self.handle.id();
        match verdict {
            Verdict::Accepted(session) if session.connection == conn => {
                if let Err(e) = self.phase.accept() {
                    warn!(device_id = %device_id, "cannot start streaming: {e}");
                    return Flow::Close;
                }
                if self.reply(ServerMessage::accepted(session.permissions)) == Flow::Close {
                    return Flow::Close;
                }
                info!(device_id = %device_id, %conn, "streaming started");
                self.stream = Some(FrameTask::spawn(
                    self.engine.clone(),
                    device_id,
                    self.handle.clone(),
                ));
                Flow::Continue
            }
            Verdict::Accepted(session) => {
                info!(
                    device_id = %device_id,
                    %conn,
                    active_conn = %session.connection,
                    "accepted on a newer connection"
                );
                self.reply(ServerMessage::auth_result(AuthStatus::Rejected));
                Flow::Close
            }
            Verdict::Rejected { notified } => {
                if notified != Some(conn) {
                    self.reply(ServerMessage::auth_result(AuthStatus::Rejected));
                }
                Flow::Close
            }
            Verdict::Banned { notified } => {
                if notified != Some(conn) {
                    self.reply(ServerMessage::auth_result(AuthStatus::Banned));
                }
                Flow::Close
            }
            Verdict::TimedOut => {
                info!(device_id = %device_id, "decision timed out");
                self.reply(ServerMessage::auth_result(AuthStatus::Rejected));
                Flow::Close
            }
        }
    }

    // ── Streaming ────────────────────────────────────────────────

    /// Dispatch runs on the blocking pool, like capture.
    async fn on_input(&self, payload: InputPayload) -> Flow {
        let Some((device_id, permissions)) = self.engine.registry.session_for(self.handle.id())
        else {
            return self.reply(ServerMessage::error("not active"));
        };
        let kind = payload.kind.clone();
        let dispatcher = self.engine.dispatcher.clone();
        let ok = tokio::task::spawn_blocking(move || dispatcher.handle(&payload, &permissions))
            .await
            .unwrap_or_else(|e| {
                warn!(device_id = %device_id, "input task failed: {e}");
                false
            });
        debug!(device_id = %device_id, kind = ?kind, ok, "input event");
        self.reply(ServerMessage::InputAck { ok })
    }

    // ── Teardown ─────────────────────────────────────────────────

    async fn teardown(mut self) {
        if let Some(stream) = self.stream.take() {
            stream.stop().await;
        }
        self.engine.registry.release(self.handle.id());

        let streamed = self.phase.streaming_duration();
        let device_id = self.phase.device_id().cloned();
        self.phase.close();
        info!(
            conn = %self.handle.id(),
            device_id = device_id.as_ref().map(DeviceId::as_str).unwrap_or("-"),
            streamed_secs = streamed.map(|d| d.as_secs()).unwrap_or(0),
            "connection closed"
        );
    }

    fn reply(&self, message: ServerMessage) -> Flow {
        match self.handle.send(message) {
            Ok(()) => Flow::Continue,
            Err(e) => {
                debug!(conn = %self.handle.id(), "reply dropped: {e}");
                Flow::Close
            }
        }
    }
}
