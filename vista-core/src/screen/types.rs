//! Raw frame types handed from a capture source to the encoder.

// ── PixelFormat ──────────────────────────────────────────────────

/// Channel order of a raw frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// B, G, R, A. What desktop capture APIs usually hand out.
    Bgra8,
    /// R, G, B. Used by the synthetic source.
    Rgb8,
}

impl PixelFormat {
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Bgra8 => 4,
            PixelFormat::Rgb8 => 3,
        }
    }
}

// ── RawScreenFrame ───────────────────────────────────────────────

/// One uncompressed frame: `height` rows of `stride` bytes, where a
/// source may pad each row past `width * bytes_per_pixel`.
#[derive(Debug, Clone)]
pub struct RawScreenFrame {
    pub width: u32,
    pub height: u32,
    pub stride: u32,
    pub format: PixelFormat,
    pub data: Vec<u8>,
}

impl RawScreenFrame {
    /// Zero-filled frame without row padding.
    pub fn blank(width: u32, height: u32, format: PixelFormat) -> Self {
        let stride = width * format.bytes_per_pixel() as u32;
        Self {
            width,
            height,
            stride,
            format,
            data: vec![0; stride as usize * height as usize],
        }
    }

    pub fn byte_len(&self) -> usize {
        self.stride as usize * self.height as usize
    }

    /// Pixel bytes of row `y`, padding excluded.
    pub fn row_pixels(&self, y: u32) -> &[u8] {
        let range = self.row_range(y);
        &self.data[range]
    }

    pub fn row_pixels_mut(&mut self, y: u32) -> &mut [u8] {
        let range = self.row_range(y);
        &mut self.data[range]
    }

    fn row_range(&self, y: u32) -> std::ops::Range<usize> {
        let start = y as usize * self.stride as usize;
        start..start + self.width as usize * self.format.bytes_per_pixel()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_frame_is_packed() {
        let frame = RawScreenFrame::blank(4, 3, PixelFormat::Rgb8);
        assert_eq!(frame.stride, 12);
        assert_eq!(frame.byte_len(), 36);
        assert_eq!(frame.data.len(), 36);
    }

    #[test]
    fn rows_exclude_padding() {
        let mut frame = RawScreenFrame {
            width: 2,
            height: 2,
            stride: 8,
            format: PixelFormat::Rgb8,
            data: (0u8..16).collect(),
        };
        assert_eq!(frame.row_pixels(1), &[8, 9, 10, 11, 12, 13]);
        frame.row_pixels_mut(0).fill(0xff);
        assert_eq!(&frame.data[..8], &[0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 6, 7]);
    }
}
