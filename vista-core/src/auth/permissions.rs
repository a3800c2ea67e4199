//! Per-device capability set.
//!
//! Five independent flags govern which remote actions the engine honors.
//! `open_programs` and `delete_files` are reserved: they are stored,
//! edited and reported like the others, but no action consumes them yet.

use std::fmt;

use serde::{Deserialize, Serialize};

// ── Capability ───────────────────────────────────────────────────

/// A single named capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ViewScreen,
    ControlMouse,
    ControlKeyboard,
    OpenPrograms,
    DeleteFiles,
}

impl Capability {
    pub const ALL: [Capability; 5] = [
        Capability::ViewScreen,
        Capability::ControlMouse,
        Capability::ControlKeyboard,
        Capability::OpenPrograms,
        Capability::DeleteFiles,
    ];

    /// Wire name of the capability.
    pub const fn as_str(self) -> &'static str {
        match self {
            Capability::ViewScreen => "view_screen",
            Capability::ControlMouse => "control_mouse",
            Capability::ControlKeyboard => "control_keyboard",
            Capability::OpenPrograms => "open_programs",
            Capability::DeleteFiles => "delete_files",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Permissions ──────────────────────────────────────────────────

/// The complete capability set of an active session.
///
/// `Default` is the default-safe set granted on acceptance: the screen
/// may be viewed, nothing else is allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Permissions {
    pub view_screen: bool,
    pub control_mouse: bool,
    pub control_keyboard: bool,
    pub open_programs: bool,
    pub delete_files: bool,
}

impl Default for Permissions {
    fn default() -> Self {
        Self {
            view_screen: true,
            control_mouse: false,
            control_keyboard: false,
            open_programs: false,
            delete_files: false,
        }
    }
}

impl Permissions {
    pub fn allows(&self, capability: Capability) -> bool {
        match capability {
            Capability::ViewScreen => self.view_screen,
            Capability::ControlMouse => self.control_mouse,
            Capability::ControlKeyboard => self.control_keyboard,
            Capability::OpenPrograms => self.open_programs,
            Capability::DeleteFiles => self.delete_files,
        }
    }

    pub fn set(&mut self, capability: Capability, allowed: bool) {
        let flag = match capability {
            Capability::ViewScreen => &mut self.view_screen,
            Capability::ControlMouse => &mut self.control_mouse,
            Capability::ControlKeyboard => &mut self.control_keyboard,
            Capability::OpenPrograms => &mut self.open_programs,
            Capability::DeleteFiles => &mut self.delete_files,
        };
        *flag = allowed;
    }

    /// Merge a partial update; keys absent from `patch` are left untouched.
    pub fn apply(&mut self, patch: &PermissionPatch) {
        for capability in Capability::ALL {
            if let Some(allowed) = patch.get(capability) {
                self.set(capability, allowed);
            }
        }
    }
}

// ── PermissionPatch ──────────────────────────────────────────────

/// A partial permission edit as sent by the admin surface.
///
/// Unknown keys are ignored on deserialisation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub view_screen: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_mouse: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub control_keyboard: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_programs: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_files: Option<bool>,
}

impl PermissionPatch {
    /// Builder-style: set one capability in the patch.
    pub fn with(mut self, capability: Capability, allowed: bool) -> Self {
        let slot = match capability {
            Capability::ViewScreen => &mut self.view_screen,
            Capability::ControlMouse => &mut self.control_mouse,
            Capability::ControlKeyboard => &mut self.control_keyboard,
            Capability::OpenPrograms => &mut self.open_programs,
            Capability::DeleteFiles => &mut self.delete_files,
        };
        *slot = Some(allowed);
        self
    }

    pub fn get(&self, capability: Capability) -> Option<bool> {
        match capability {
            Capability::ViewScreen => self.view_screen,
            Capability::ControlMouse => self.control_mouse,
            Capability::ControlKeyboard => self.control_keyboard,
            Capability::OpenPrograms => self.open_programs,
            Capability::DeleteFiles => self.delete_files,
        }
    }

    /// True when the patch names no capability at all.
    pub fn is_empty(&self) -> bool {
        Capability::ALL.iter().all(|c| self.get(*c).is_none())
    }
}

// ── Tests ────────────────────────────────────────────────────────
