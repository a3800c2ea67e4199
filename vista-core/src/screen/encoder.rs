//! JPEG frame encoder.
//!
//! Viewers render `frame.data` as `data:image/jpeg;base64,…`, so every
//! frame leaves the host as a baseline JPEG. Rows are repacked to tight
//! RGB first: capture sources may pad rows and hand out BGRA.
//!
//! The quality knob (0..=100) is the JPEG quality; 0 is raised to 1.

use image::ColorType;
use image::codecs::jpeg::JpegEncoder;

use crate::error::VistaError;
use crate::screen::types::{PixelFormat, RawScreenFrame};

/// Start-of-image marker every encoded frame begins with.
pub const JPEG_SOI: [u8; 2] = [0xFF, 0xD8];

/// Stateless frame encoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameEncoder;

impl FrameEncoder {
    pub fn new() -> Self {
        Self
    }

    /// JPEG quality for a capture quality value.
    pub fn jpeg_quality(quality: u8) -> u8 {
        quality.clamp(1, 100)
    }

    pub fn encode(&self, frame: &RawScreenFrame, quality: u8) -> Result<Vec<u8>, VistaError> {
        let row_len = frame.width as usize * frame.format.bytes_per_pixel();
        if frame.data.len() < frame.byte_len() || (frame.stride as usize) < row_len {
            return Err(VistaError::Encoding(format!(
                "frame buffer too small: {} bytes for {}x{} stride {}",
                frame.data.len(),
                frame.width,
                frame.height,
                frame.stride
            )));
        }

        let rgb = pack_rgb(frame);
        let mut out = Vec::with_capacity(rgb.len() / 8);
        JpegEncoder::new_with_quality(&mut out, Self::jpeg_quality(quality))
            .encode(&rgb, frame.width, frame.height, ColorType::Rgb8)
            .map_err(|e| VistaError::Encoding(format!("jpeg encode failed: {e}")))?;
        Ok(out)
    }
}

/// Tightly packed RGB rows, padding dropped.
fn pack_rgb(frame: &RawScreenFrame) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(frame.width as usize * frame.height as usize * 3);
    for y in 0..frame.height {
        let row = frame.row_pixels(y);
        match frame.format {
            PixelFormat::Rgb8 => rgb.extend_from_slice(row),
            PixelFormat::Bgra8 => {
                for px in row.chunks_exact(4) {
                    rgb.extend_from_slice(&[px[2], px[1], px[0]]);
                }
            }
        }
    }
    rgb
}
