//! Input injection seam.
//!
//! [`InputInjector`] is what the engine calls once an action has passed
//! its capability check. [`PlatformInjector`] is the OS-backed
//! implementation: Win32 `SendInput` on Windows, an always-failing stub
//! elsewhere.

use crate::error::VistaError;

/// Replays remote input on the host.
pub trait InputInjector: Send + Sync + 'static {
    /// Move the pointer to absolute pixel `(x, y)` and left-click.
    fn click(&self, x: u32, y: u32) -> Result<(), VistaError>;

    /// Type `text` as keyboard input.
    fn type_text(&self, text: &str) -> Result<(), VistaError>;
}

// ── PlatformInjector ─────────────────────────────────────────────

/// Injects mouse and keyboard events into the OS input stream.
///
/// On Windows this uses `SendInput`, which requires the process to run
/// in the interactive desktop session.
#[derive(Debug, Default)]
pub struct PlatformInjector;

impl PlatformInjector {
    pub fn new() -> Self {
        Self
    }
}

// ── Windows implementation ───────────────────────────────────────

#[cfg(target_os = "windows")]
mod platform {
    use super::*;
    use windows::Win32::UI::Input::KeyboardAndMouse::*;
    use windows::Win32::UI::WindowsAndMessaging::{GetSystemMetrics, SM_CXSCREEN, SM_CYSCREEN};

    fn send(inputs: &[INPUT]) -> Result<(), VistaError> {
        let sent = unsafe { SendInput(inputs, std::mem::size_of::<INPUT>() as i32) };
        if sent as usize != inputs.len() {
            return Err(VistaError::Injection(format!(
                "SendInput accepted {sent} of {} events",
                inputs.len()
            )));
        }
        Ok(())
    }

    fn mouse(dx: i32, dy: i32, flags: MOUSE_EVENT_FLAGS) -> INPUT {
        INPUT {
            r#type: INPUT_MOUSE,
            Anonymous: INPUT_0 {
                mi: MOUSEINPUT {
                    dx,
                    dy,
                    mouseData: 0,
                    dwFlags: flags,
                    time: 0,
                    dwExtraInfo: 0,
                },
            },
        }
    }

    fn unicode_key(unit: u16, up: bool) -> INPUT {
        let mut flags = KEYEVENTF_UNICODE;
        if up {
            flags |= KEYEVENTF_KEYUP;
        }
        INPUT {
            r#type: INPUT_KEYBOARD,
            Anonymous: INPUT_0 {
                ki: KEYBDINPUT {
                    wVk: VIRTUAL_KEY(0),
                    wScan: unit,
                    dwFlags: flags,
                    time: 0,
                    dwExtraInfo: 0,
                },
            },
        }
    }

    impl InputInjector for PlatformInjector {
        fn click(&self, x: u32, y: u32) -> Result<(), VistaError> {
            let (screen_w, screen_h) =
                unsafe { (GetSystemMetrics(SM_CXSCREEN), GetSystemMetrics(SM_CYSCREEN)) };
            if screen_w <= 0 || screen_h <= 0 {
                return Err(VistaError::Injection("GetSystemMetrics returned 0".into()));
            }

            // Absolute coordinates are expressed in 0..=65535.
            let abs_x = (i64::from(x) * 65535 / i64::from(screen_w)) as i32;
            let abs_y = (i64::from(y) * 65535 / i64::from(screen_h)) as i32;

            send(&[
                mouse(abs_x, abs_y, MOUSEEVENTF_MOVE | MOUSEEVENTF_ABSOLUTE),
                mouse(abs_x, abs_y, MOUSEEVENTF_LEFTDOWN | MOUSEEVENTF_ABSOLUTE),
                mouse(abs_x, abs_y, MOUSEEVENTF_LEFTUP | MOUSEEVENTF_ABSOLUTE),
            ])
        }

        fn type_text(&self, text: &str) -> Result<(), VistaError> {
            let inputs: Vec<INPUT> = text
                .encode_utf16()
                .flat_map(|unit| [unicode_key(unit, false), unicode_key(unit, true)])
                .collect();
            if inputs.is_empty() {
                return Ok(());
            }
            send(&inputs)
        }
    }
}

// ── Non-Windows stub ─────────────────────────────────────────────

#[cfg(not(target_os = "windows"))]
mod platform {
    use super::*;

    impl InputInjector for PlatformInjector {
        fn click(&self, _x: u32, _y: u32) -> Result<(), VistaError> {
            Err(VistaError::Injection(
                "input injection is only available on Windows".into(),
            ))
        }

        fn type_text(&self, _text: &str) -> Result<(), VistaError> {
            Err(VistaError::Injection(
                "input injection is only available on Windows".into(),
            ))
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn injector_creates_without_error() {
        let _inj = PlatformInjector::new();
    }

    #[cfg(not(target_os = "windows"))]
    #[test]
    fn stub_reports_injection_error() {
        let inj = PlatformInjector::new();
        assert!(matches!(inj.click(1, 1), Err(VistaError::Injection(_))));
        assert!(matches!(inj.type_text("hi"), Err(VistaError::Injection(_))));
    }
}
