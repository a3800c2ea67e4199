//! Administrative HTTP API.
//!
//! | Method | Path                | Registry operation        |
//! |--------|---------------------|---------------------------|
//! | GET    | `/api/session_code` | `current_code`            |
//! | POST   | `/api/regenerate`   | `regenerate_code`         |
//! | GET    | `/api/pending`      | `list_pending`            |
//! | GET    | `/api/active`       | `list_active`             |
//! | POST   | `/api/approve`      | `accept`                  |
//! | POST   | `/api/reject`       | `reject`                  |
//! | POST   | `/api/ban`          | `ban`                     |
//! | POST   | `/api/permissions`  | `update_permissions`      |

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use vista_core::{ActiveSession, DeviceId, PendingRequest, PermissionPatch};

use crate::server::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct CodeResponse {
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct PendingResponse {
    pub pending: Vec<PendingRequest>,
}

#[derive(Debug, Serialize)]
pub struct ActiveResponse {
    pub active: Vec<ActiveSession>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OkResponse {
    pub ok: bool,
}

#[derive(Debug, Deserialize)]
pub struct DeviceRequest {
    pub device_id: DeviceId,
}

#[derive(Debug, Deserialize)]
pub struct PermissionsRequest {
    pub device_id: DeviceId,
    #[serde(default)]
    pub permissions: PermissionPatch,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/session_code", get(session_code))
        .route("/api/regenerate", post(regenerate))
        .route("/api/pending", get(pending))
        .route("/api/active", get(active))
        .route("/api/approve", post(approve))
        .route("/api/reject", post(reject))
        .route("/api/ban", post(ban))
        .route("/api/permissions", post(permissions))
}

async fn session_code(State(state): State<AppState>) -> Json<CodeResponse> {
    Json(CodeResponse {
        code: state.registry.current_code(),
    })
}

async fn regenerate(State(state): State<AppState>) -> Json<CodeResponse> {
    let code = state.registry.regenerate_code();
    info!("access code regenerated by administrator");
    Json(CodeResponse { code })
}

async fn pending(State(state): State<AppState>) -> Json<PendingResponse> {
    Json(PendingResponse {
        pending: state.registry.list_pending(),
    })
}

async fn active(State(state): State<AppState>) -> Json<ActiveResponse> {
    Json(ActiveResponse {
        active: state.registry.list_active(),
    })
}

async fn approve(
    State(state): State<AppState>,
    Json(req): Json<DeviceRequest>,
) -> Json<OkResponse> {
    Json(OkResponse {
        ok: state.registry.accept(&req.device_id),
    })
}

async fn reject(
    State(state): State<AppState>,
    Json(req): Json<DeviceRequest>,
) -> Json<OkResponse> {
    Json(OkResponse {
        ok: state.registry.reject(&req.device_id),
    })
}

async fn ban(
    State(state): State<AppState>,
    Json(req): Json<DeviceRequest>,
) -> Json<OkResponse> {
    Json(OkResponse {
        ok: state.registry.ban(&req.device_id),
    })
}

/// An edit naming no capability is refused rather than reported as a
/// successful no-op.
async fn permissions(
    State(state): State<AppState>,
    Json(req): Json<PermissionsRequest>,
) -> Json<OkResponse> {
    if req.permissions.is_empty() {
        debug!(device_id = %req.device_id, "empty permission edit refused");
        return Json(OkResponse { ok: false });
    }
    Json(OkResponse {
        ok: state
            .registry
            .update_permissions(&req.device_id, &req.permissions),
    })
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{self, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use tower::util::ServiceExt;
    use vista_core::{
        EngineConfig, PlatformInjector, ProtocolEngine, Registry, TestPatternCapture, channel,
    };

    use super::*;
    use crate::server::router;

    fn state() -> AppState {
        let engine = ProtocolEngine::new(
            Registry::new(),
            Arc::new(TestPatternCapture::new(64, 32)),
            Arc::new(PlatformInjector::new()),
            EngineConfig::default(),
        );
        AppState::new(engine)
    }

    async fn call(state: &AppState, method: &str, uri: &str, body: Option<Value>) -> Value {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(value) => {
                builder = builder.header("content-type", "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        let response = router(state.clone())
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_and_code_routes() {
        let state = state();
        assert_eq!(call(&state, "GET", "/healthz", None).await, json!({"status":"ok"}));

        let code = call(&state, "GET", "/api/session_code", None).await;
        assert_eq!(code["code"], json!(state.registry.current_code()));

        let fresh = call(&state, "POST", "/api/regenerate", None).await;
        assert_eq!(fresh["code"], json!(state.registry.current_code()));
        assert_eq!(fresh["code"].as_str().unwrap().len(), 6);
    }

    #[tokio::test]
    async fn approve_moves_pending_to_active() {
        let state = state();
        let (conn, _outbox) = channel(1);
        let id = DeviceId::new("dev1");
        assert!(state.registry.admit_pending(&id, "laptop", conn));

        let pending = call(&state, "GET", "/api/pending", None).await;
        assert_eq!(pending["pending"][0]["device_id"], json!("dev1"));
        assert_eq!(pending["pending"][0]["name"], json!("laptop"));

        let ok = call(&state, "POST", "/api/approve", Some(json!({"device_id":"dev1"}))).await;
        assert_eq!(ok, json!({"ok": true}));
        let again = call(&state, "POST", "/api/approve", Some(json!({"device_id":"dev1"}))).await;
        assert_eq!(again, json!({"ok": false}));

        let active = call(&state, "GET", "/api/active", None).await;
        assert_eq!(active["active"][0]["device_id"], json!("dev1"));
        assert_eq!(active["active"][0]["permissions"]["view_screen"], json!(true));
    }

    #[tokio::test]
    async fn partial_permission_update() {
        let state = state();
        let (conn, mut outbox) = channel(1);
        let id = DeviceId::new("dev1");
        state.registry.admit_pending(&id, "laptop", conn);
        state.registry.accept(&id);

        let ok = call(
            &state,
            "POST",
            "/api/permissions",
            Some(json!({"device_id":"dev1","permissions":{"control_mouse":true}})),
        )
        .await;
        assert_eq!(ok, json!({"ok": true}));

        let perms = state.registry.list_active()[0].permissions;
        assert!(perms.view_screen);
        assert!(perms.control_mouse);
        assert!(!perms.control_keyboard);
        assert!(outbox.try_next().is_some());

        let unknown = call(
            &state,
            "POST",
            "/api/permissions",
            Some(json!({"device_id":"ghost","permissions":{"view_screen":false}})),
        )
        .await;
        assert_eq!(unknown, json!({"ok": false}));
    }

    #[tokio::test]
    async fn empty_permission_edit_is_refused() {
        let state = state();
        let (conn, mut outbox) = channel(1);
        let id = DeviceId::new("dev1");
        state.registry.admit_pending(&id, "laptop", conn);
        state.registry.accept(&id);

        for body in [
            json!({"device_id":"dev1"}),
            json!({"device_id":"dev1","permissions":{}}),
            json!({"device_id":"dev1","permissions":{"teleport":true}}),
        ] {
            let reply = call(&state, "POST", "/api/permissions", Some(body)).await;
            assert_eq!(reply, json!({"ok": false}));
        }
        assert!(outbox.try_next().is_none());
        assert_eq!(
            state.registry.list_active()[0].permissions,
            vista_core::Permissions::default()
        );
    }

    #[tokio::test]
    async fn reject_and_ban_routes() {
        let state = state();
        let (conn, _outbox) = channel(1);
        state
            .registry
            .admit_pending(&DeviceId::new("dev1"), "laptop", conn);

        let rejected = call(&state, "POST", "/api/reject", Some(json!({"device_id":"dev1"}))).await;
        assert_eq!(rejected, json!({"ok": true}));
        let missing = call(&state, "POST", "/api/reject", Some(json!({"device_id":"dev1"}))).await;
        assert_eq!(missing, json!({"ok": false}));

        let banned = call(&state, "POST", "/api/ban", Some(json!({"device_id":"dev2"}))).await;
        assert_eq!(banned, json!({"ok": true}));
        assert!(state.registry.is_banned(&DeviceId::new("dev2")));
    }

    #[tokio::test]
    async fn malformed_body_is_a_client_error() {
        let response = router(state())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/approve")
                    .header("content-type", "application/json")
                    .body(Body::from("{"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response.status().is_client_error());
    }
}
