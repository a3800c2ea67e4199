//! JSON messages exchanged over a viewer connection.
//!
//! # Client → Server
//! ```text
//! {"type":"auth", "device_id"?, "device_name"?, "code"}
//! {"type":"input_event", "payload":{"type":"mouse_click"|"type_text", "x"?, "y"?, "text"?}}
//! ```
//!
//! # Server → Client
//! ```text
//! {"type":"auth_result", "status":…, "permissions"?}
//! {"type":"input_ack", "ok":bool}
//! {"type":"frame", "data":<base64>}
//! {"type":"permission_update", "permissions":{…}}
//! {"type":"error", "msg":…}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::Permissions;
use crate::error::VistaError;

// ── Client messages ──────────────────────────────────────────────

/// Body of an `auth` message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct AuthRequest {
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub device_name: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

/// Body of an `input_event` payload. Every field is optional on the wire;
/// validation happens when the payload is turned into an
/// [`InputAction`](crate::protocol::InputAction).
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct InputPayload {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    #[serde(default)]
    pub text: Option<String>,
}

/// A parsed inbound message.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    Auth(AuthRequest),
    InputEvent(InputPayload),
}

impl ClientMessage {
    /// Parse one text frame.
    ///
    /// Only a syntax error yields [`VistaError::InvalidJson`]; a
    /// well-formed message with an unrecognised `type` yields
    /// [`VistaError::UnknownType`]. Fields of the wrong JSON type are
    /// read as absent, so they fail later as a wrong code or a
    /// negative input ack.
    pub fn parse(text: &str) -> Result<Self, VistaError> {
        let value: Value = serde_json::from_str(text)?;
        let kind = string_field(&value, "type").unwrap_or_default();

        match kind.as_str() {
            "auth" => Ok(ClientMessage::Auth(AuthRequest::from_value(&value))),
            "input_event" => {
                let payload = value
                    .get("payload")
                    .map(InputPayload::from_value)
                    .unwrap_or_default();
                Ok(ClientMessage::InputEvent(payload))
            }
            _ => Err(VistaError::UnknownType(kind)),
        }
    }
}

impl AuthRequest {
    fn from_value(value: &Value) -> Self {
        Self {
            device_id: string_field(value, "device_id"),
            device_name: string_field(value, "device_name"),
            code: string_field(value, "code"),
        }
    }
}

impl InputPayload {
    fn from_value(value: &Value) -> Self {
        Self {
            kind: string_field(value, "type"),
            x: value.get("x").and_then(Value::as_f64),
            y: value.get("y").and_then(Value::as_f64),
            text: string_field(value, "text"),
        }
    }
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_owned)
}

// ── Server messages ──────────────────────────────────────────────

/// Outcome reported in `auth_result`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthStatus {
    Pending,
    WrongCode,
    Banned,
    Rejected,
    Accepted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    AuthResult {
        status: AuthStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        permissions: Option<Permissions>,
    },
    InputAck {
        ok: bool,
    },
    Frame {
        data: String,
    },
    PermissionUpdate {
        permissions: Permissions,
    },
    Error {
        msg: String,
    },
}

impl ServerMessage {
    /// `auth_result` without permissions.
    pub fn auth_result(status: AuthStatus) -> Self {
        ServerMessage::AuthResult {
            status,
            permissions: None,
        }
    }

    /// `auth_result{status:"accepted"}` carrying the granted set.
    pub fn accepted(permissions: Permissions) -> Self {
        ServerMessage::AuthResult {
            status: AuthStatus::Accepted,
            permissions: Some(permissions),
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        ServerMessage::Error { msg: msg.into() }
    }

    /// Serialise to a JSON text frame.
    pub fn to_json(&self) -> Result<String, VistaError> {
        Ok(serde_json::to_string(self)?)
    }
}

// ── Tests ────────────────────────────────────────────────────────
