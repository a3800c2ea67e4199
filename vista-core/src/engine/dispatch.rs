//! Capability-checked dispatch of remote input actions.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::auth::Permissions;
use crate::error::VistaError;
use crate::protocol::{InputAction, InputPayload};
use crate::screen::{CaptureProvider, InputInjector};

/// Routes validated input actions to the injector.
///
/// Every failure mode (unknown kind, missing capability, bad coordinates,
/// injector error) collapses into `false`; nothing here can fail the
/// connection.
#[derive(Clone)]
pub struct InputDispatcher {
    injector: Arc<dyn InputInjector>,
    surface: Arc<dyn CaptureProvider>,
}

impl InputDispatcher {
    pub fn new(injector: Arc<dyn InputInjector>, surface: Arc<dyn CaptureProvider>) -> Self {
        Self { injector, surface }
    }

    /// Handle one `input_event` payload under `permissions`.
    pub fn handle(&self, payload: &InputPayload, permissions: &Permissions) -> bool {
        let Some(action) = InputAction::from_payload(payload) else {
            debug!(kind = ?payload.kind, "unsupported input payload");
            return false;
        };

        let required = action.required_capability();
        if !permissions.allows(required) {
            debug!(capability = %required, "input denied");
            return false;
        }

        match self.execute(&action) {
            Ok(()) => true,
            Err(e) => {
                warn!(kind = action.kind().wire_name(), "input injection failed: {e}");
                false
            }
        }
    }

    fn execute(&self, action: &InputAction) -> Result<(), VistaError> {
        match action {
            InputAction::MouseClick { x, y } => {
                let (width, height) = self.surface.surface_size()?;
                let (px, py) = scale_to_surface(*x, *y, width, height)?;
                self.injector.click(px, py)
            }
            InputAction::TypeText { text } => self.injector.type_text(text),
        }
    }
}

/// Map normalized `[0, 1]` coordinates onto a `width × height` surface.
///
/// `1.0` lands on the last pixel rather than one past it.
pub fn scale_to_surface(x: f64, y: f64, width: u32, height: u32) -> Result<(u32, u32), VistaError> {
    if width == 0 || height == 0 {
        return Err(VistaError::InvalidScale("surface has no pixels"));
    }
    let in_range = |v: f64| v.is_finite() && (0.0..=1.0).contains(&v);
    if !in_range(x) || !in_range(y) {
        return Err(VistaError::InvalidScale("coordinates outside [0, 1]"));
    }
    let px = ((x * f64::from(width)) as u32).min(width - 1);
    let py = ((y * f64::from(height)) as u32).min(height - 1);
    Ok((px, py))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::screen::TestPatternCapture;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
        fail: bool,
    }

    impl InputInjector for Recorder {
        fn click(&self, x: u32, y: u32) -> Result<(), VistaError> {
            self.calls.lock().unwrap().push(format!("click {x} {y}"));
            if self.fail {
                return Err(VistaError::Injection("boom".into()));
            }
            Ok(())
        }

        fn type_text(&self, text: &str) -> Result<(), VistaError> {
            self.calls.lock().unwrap().push(format!("type {text}"));
            Ok(())
        }
    }

    fn dispatcher(recorder: Arc<Recorder>) -> InputDispatcher {
        InputDispatcher::new(recorder, Arc::new(TestPatternCapture::new(1920, 1080)))
    }

    fn click(x: f64, y: f64) -> InputPayload {
        InputPayload {
            kind: Some("mouse_click".into()),
            x: Some(x),
            y: Some(y),
            text: None,
        }
    }

    fn all_allowed() -> Permissions {
        Permissions {
            control_mouse: true,
            control_keyboard: true,
            ..Permissions::default()
        }
    }

    #[test]
    fn click_is_scaled_and_injected() {
        let rec = Arc::new(Recorder::default());
        assert!(dispatcher(rec.clone()).handle(&click(0.5, 0.25), &all_allowed()));
        assert_eq!(*rec.calls.lock().unwrap(), vec!["click 960 270".to_string()]);
    }

    #[test]
    fn denied_click_never_reaches_injector() {
        let rec = Arc::new(Recorder::default());
        assert!(!dispatcher(rec.clone()).handle(&click(0.5, 0.5), &Permissions::default()));
        assert!(rec.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn keyboard_needs_keyboard_capability() {
        let rec = Arc::new(Recorder::default());
        let payload = InputPayload {
            kind: Some("type_text".into()),
            text: Some("hello".into()),
            ..Default::default()
        };
        let mouse_only = Permissions {
            control_mouse: true,
            ..Permissions::default()
        };
        let d = dispatcher(rec.clone());
        assert!(!d.handle(&payload, &mouse_only));
        assert!(d.handle(&payload, &all_allowed()));
        assert_eq!(*rec.calls.lock().unwrap(), vec!["type hello".to_string()]);
    }

    #[test]
    fn injector_failure_is_a_negative_ack() {
        let rec = Arc::new(Recorder {
            fail: true,
            ..Default::default()
        });
        assert!(!dispatcher(rec).handle(&click(0.1, 0.1), &all_allowed()));
    }

    #[test]
    fn out_of_range_click_is_rejected_before_injection() {
        let rec = Arc::new(Recorder::default());
        let d = dispatcher(rec.clone());
        assert!(!d.handle(&click(1.5, 0.5), &all_allowed()));
        assert!(!d.handle(&click(f64::NAN, 0.5), &all_allowed()));
        assert!(rec.calls.lock().unwrap().is_empty());
    }

    #[test]
    fn scale_edges() {
        assert_eq!(scale_to_surface(0.0, 0.0, 100, 50).unwrap(), (0, 0));
        assert_eq!(scale_to_surface(1.0, 1.0, 100, 50).unwrap(), (99, 49));
        assert!(scale_to_surface(0.5, 0.5, 0, 50).is_err());
        assert!(scale_to_surface(-0.1, 0.5, 100, 50).is_err());
    }
}
