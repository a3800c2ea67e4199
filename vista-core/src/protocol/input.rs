//! Remote input actions and the capability each one requires.
//!
//! The set of actions is closed. [`ACTION_TABLE`] is the single place
//! that says which wire kind maps to which action and which capability
//! gates it; the engine never branches on capabilities elsewhere.

use crate::auth::Capability;
use crate::protocol::message::InputPayload;

/// Kind of remote input action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    MouseClick,
    TypeText,
}

/// `(wire name, kind, required capability)`.
pub const ACTION_TABLE: &[(&str, ActionKind, Capability)] = &[
    ("mouse_click", ActionKind::MouseClick, Capability::ControlMouse),
    ("type_text", ActionKind::TypeText, Capability::ControlKeyboard),
];

impl ActionKind {
    pub fn from_wire(name: &str) -> Option<Self> {
        ACTION_TABLE
            .iter()
            .find(|(wire, _, _)| *wire == name)
            .map(|(_, kind, _)| *kind)
    }

    pub fn wire_name(self) -> &'static str {
        Self::entry(self).0
    }

    /// Capability that must be granted before the action is executed.
    pub fn required_capability(self) -> Capability {
        Self::entry(self).2
    }

    fn entry(kind: Self) -> &'static (&'static str, ActionKind, Capability) {
        ACTION_TABLE
            .iter()
            .find(|(_, k, _)| *k == kind)
            .unwrap_or_else(|| unreachable!("every ActionKind has a table entry"))
    }
}

/// A validated input action.
#[derive(Debug, Clone, PartialEq)]
pub enum InputAction {
    /// Click at normalized coordinates in `[0, 1]`.
    MouseClick { x: f64, y: f64 },
    /// Type a string of text.
    TypeText { text: String },
}

impl InputAction {
    /// Build an action from a wire payload.
    ///
    /// Returns `None` for unknown kinds and clicks without coordinates. A
    /// `type_text` without `text` types the empty string.
    pub fn from_payload(payload: &InputPayload) -> Option<Self> {
        match ActionKind::from_wire(payload.kind.as_deref()?)? {
            ActionKind::MouseClick => Some(InputAction::MouseClick {
                x: payload.x?,
                y: payload.y?,
            }),
            ActionKind::TypeText => Some(InputAction::TypeText {
                text: payload.text.clone().unwrap_or_default(),
            }),
        }
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            InputAction::MouseClick { .. } => ActionKind::MouseClick,
            InputAction::TypeText { .. } => ActionKind::TypeText,
        }
    }

    pub fn required_capability(&self) -> Capability {
        self.kind().required_capability()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(kind: &str) -> InputPayload {
        InputPayload {
            kind: Some(kind.into()),
            ..Default::default()
        }
    }

    #[test]
    fn table_covers_every_kind() {
        for kind in [ActionKind::MouseClick, ActionKind::TypeText] {
            assert_eq!(ActionKind::from_wire(kind.wire_name()), Some(kind));
        }
    }

    #[test]
    fn required_capabilities() {
        assert_eq!(
            ActionKind::MouseClick.required_capability(),
            Capability::ControlMouse
        );
        assert_eq!(
            ActionKind::TypeText.required_capability(),
            Capability::ControlKeyboard
        );
    }

    #[test]
    fn click_needs_both_coordinates() {
        let mut p = payload("mouse_click");
        p.x = Some(0.1);
        assert_eq!(InputAction::from_payload(&p), None);
        p.y = Some(0.9);
        assert_eq!(
            InputAction::from_payload(&p),
            Some(InputAction::MouseClick { x: 0.1, y: 0.9 })
        );
    }

    #[test]
    fn type_text_defaults_to_empty() {
        assert_eq!(
            InputAction::from_payload(&payload("type_text")),
            Some(InputAction::TypeText {
                text: String::new()
            })
        );
    }

    #[test]
    fn unknown_or_missing_kind() {
        assert_eq!(InputAction::from_payload(&payload("scroll")), None);
        assert_eq!(InputAction::from_payload(&InputPayload::default()), None);
    }
}
