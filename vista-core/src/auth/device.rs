//! Device identity.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Display name used when a client does not announce one.
pub const UNKNOWN_DEVICE_NAME: &str = "unknown";

/// Opaque, client-chosen identity of a remote device.
///
/// Stable across reconnects only if the client resends the same string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceId(String);

impl DeviceId {
    /// Wrap a client-supplied identity.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random identity for clients that did not send one.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Use `announced` when it is present and non-empty, otherwise generate.
    pub fn from_announced(announced: Option<&str>) -> Self {
        match announced {
            Some(id) if !id.is_empty() => Self::new(id),
            _ => Self::generate(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for DeviceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn announced_identity_is_kept() {
        assert_eq!(DeviceId::from_announced(Some("dev1")).as_str(), "dev1");
    }

    #[test]
    fn missing_or_empty_identity_is_generated() {
        let a = DeviceId::from_announced(None);
        let b = DeviceId::from_announced(Some(""));
        assert!(Uuid::parse_str(a.as_str()).is_ok());
        assert!(Uuid::parse_str(b.as_str()).is_ok());
        assert_ne!(a, b);
    }
}
