//! Configuration for the host service.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use vista_core::{CaptureProvider, DesktopCapture, EngineConfig, TestPatternCapture};

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Network settings.
    pub network: NetworkConfig,
    /// Approval workflow settings.
    pub session: SessionConfig,
    /// Screen streaming settings.
    pub screen: ScreenConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Network configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Address serving both `/ws` and the admin API.
    pub listen: SocketAddr,
}

/// Approval workflow configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// How long a pending device waits for an administrator, in seconds.
    pub decision_timeout_secs: u64,
    /// Number of digits in the access code.
    pub code_length: usize,
}

/// Where frames come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureSource {
    /// The primary display, falling back to the test pattern where desktop
    /// duplication is unavailable.
    Desktop,
    /// Always the synthetic test pattern.
    TestPattern,
}

/// Screen streaming configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenConfig {
    /// Capture backend.
    pub source: CaptureSource,
    /// Target frames per second while viewing is allowed.
    pub fps: u8,
    /// Permission re-check interval while viewing is denied, in milliseconds.
    pub idle_poll_ms: u64,
    /// JPEG quality (0..=100).
    pub quality: u8,
    /// Size of the synthetic capture surface.
    pub width: u32,
    pub height: u32,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from(([0, 0, 0, 0], 8765)),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            decision_timeout_secs: 3600,
            code_length: vista_core::auth::DEFAULT_CODE_LENGTH,
        }
    }
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            source: CaptureSource::Desktop,
            fps: 8,
            idle_poll_ms: 500,
            quality: 50,
            width: 1280,
            height: 720,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl HostConfig {
    /// Load configuration from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("invalid config {}: {e}; using defaults", path.display());
                Self::default()
            }),
            Err(_) => {
                tracing::info!("no config at {}; using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Convert session and screen settings into an `EngineConfig`.
    pub fn to_engine_config(&self) -> EngineConfig {
        let fps = self.screen.fps.clamp(1, 60);
        EngineConfig {
            decision_timeout: Duration::from_secs(self.session.decision_timeout_secs.max(1)),
            frame_interval: Duration::from_secs_f64(1.0 / f64::from(fps)),
            idle_interval: Duration::from_millis(self.screen.idle_poll_ms.clamp(10, 10_000)),
            capture_quality: self.screen.quality.min(100),
        }
    }

    /// Open the configured capture backend.
    pub fn open_capture(&self) -> Arc<dyn CaptureProvider> {
        let screen = &self.screen;
        if screen.source == CaptureSource::Desktop {
            match DesktopCapture::new() {
                Ok(desktop) => return Arc::new(desktop),
                Err(e) => tracing::warn!("desktop capture unavailable ({e}); using test pattern"),
            }
        }
        Arc::new(TestPatternCapture::new(screen.width, screen.height))
    }

    /// Access code length, never below one digit.
    pub fn code_length(&self) -> usize {
        self.session.code_length.clamp(1, 32)
    }
}

// ── Tests ────────────────────────────────────────────────────────
