//! Display-side collaborators of the engine.
//!
//! | Module    | Purpose                                             |
//! |-----------|-----------------------------------------------------|
//! | `types`   | Raw frame / pixel types                             |
//! | `encoder` | JPEG frame encoder                                  |
//! | `capture` | `CaptureProvider` trait and synthetic test pattern  |
//! | `desktop` | DXGI desktop duplication provider (Windows)         |
//! | `input`   | `InputInjector` trait and platform injector         |

pub mod capture;
pub mod desktop;
pub mod encoder;
pub mod input;
pub mod types;

pub use capture::{CaptureProvider, TestPatternCapture};
pub use desktop::DesktopCapture;
pub use encoder::FrameEncoder;
pub use input::{InputInjector, PlatformInjector};
pub use types::{PixelFormat, RawScreenFrame};
