//! Device authorization: access code, permissions, decision signals and
//! the registry that ties them together.

pub mod code;
pub mod device;
pub mod permissions;
pub mod registry;
pub mod signal;

pub use code::{AccessCode, DEFAULT_CODE_LENGTH};
pub use device::{DeviceId, UNKNOWN_DEVICE_NAME};
pub use permissions::{Capability, PermissionPatch, Permissions};
pub use registry::{ActiveSession, PendingRequest, Registry, Verdict};
pub use signal::{Decision, DecisionSignal};
