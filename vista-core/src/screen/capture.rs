//! Screen capture seam.
//!
//! The engine only knows the [`CaptureProvider`] trait. A provider turns
//! the shared display surface into an encoded image and reports the
//! surface's pixel size (needed to scale normalized pointer coordinates).
//!
//! [`TestPatternCapture`] is a synthetic provider: it renders a moving
//! gradient and encodes it with [`FrameEncoder`]. The host falls back to
//! it where [`DesktopCapture`](crate::screen::DesktopCapture) is
//! unavailable, and tests use it everywhere.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::VistaError;
use crate::screen::encoder::FrameEncoder;
use crate::screen::types::{PixelFormat, RawScreenFrame};

/// Source of encoded screen frames.
///
/// Implementations are process-wide singletons shared by every session;
/// calls are made from blocking worker threads.
pub trait CaptureProvider: Send + Sync + 'static {
    /// Pixel dimensions `(width, height)` of the captured surface.
    fn surface_size(&self) -> Result<(u32, u32), VistaError>;

    /// Capture and encode one frame at `quality` (0..=100).
    fn capture(&self, quality: u8) -> Result<Vec<u8>, VistaError>;
}

// ── TestPatternCapture ───────────────────────────────────────────

/// Synthetic capture source producing a scrolling RGB gradient.
#[derive(Debug)]
pub struct TestPatternCapture {
    width: u32,
    height: u32,
    encoder: FrameEncoder,
    frames: AtomicU64,
}

impl TestPatternCapture {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            encoder: FrameEncoder::new(),
            frames: AtomicU64::new(0),
        }
    }

    /// Number of frames produced so far.
    pub fn frame_count(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    fn render(&self, tick: u64) -> RawScreenFrame {
        let mut frame = RawScreenFrame::blank(self.width, self.height, PixelFormat::Rgb8);
        let shift = (tick % 256) as u32;
        for y in 0..self.height {
            let row = frame.row_pixels_mut(y);
            for (x, px) in row.chunks_exact_mut(3).enumerate() {
                let x = x as u32;
                px[0] = ((x + shift) % 256) as u8;
                px[1] = ((y + shift) % 256) as u8;
                px[2] = ((x ^ y) % 256) as u8;
            }
        }
        frame
    }
}

impl CaptureProvider for TestPatternCapture {
    fn surface_size(&self) -> Result<(u32, u32), VistaError> {
        Ok((self.width, self.height))
    }

    fn capture(&self, quality: u8) -> Result<Vec<u8>, VistaError> {
        if self.width == 0 || self.height == 0 {
            return Err(VistaError::Capture("empty capture surface".into()));
        }
        let tick = self.frames.fetch_add(1, Ordering::Relaxed);
        self.encoder.encode(&self.render(tick), quality)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screen::encoder::JPEG_SOI;

    #[test]
    fn produces_encoded_frames() {
        let capture = TestPatternCapture::new(16, 8);
        let frame = capture.capture(60).unwrap();
        assert_eq!(frame[..2], JPEG_SOI);
        assert_eq!(capture.frame_count(), 1);
        assert_eq!(capture.surface_size().unwrap(), (16, 8));
    }

    #[test]
    fn pattern_moves_between_frames() {
        let capture = TestPatternCapture::new(8, 8);
        let a = capture.render(0);
        let b = capture.render(1);
        assert_ne!(a.data, b.data);
    }

    #[test]
    fn empty_surface_fails() {
        let capture = TestPatternCapture::new(0, 10);
        assert!(matches!(capture.capture(50), Err(VistaError::Capture(_))));
    }
}
