//! Desktop capture through DXGI Desktop Duplication.
//!
//! [`DesktopCapture`] duplicates the primary output, copies each new
//! desktop texture into a CPU-readable staging texture and hands the
//! BGRA rows to the JPEG [`FrameEncoder`].
//!
//! When the desktop has not changed within [`FRAME_WAIT_MS`] the last
//! frame is re-encoded, so a static screen still produces frames. If the
//! duplication is lost (mode change, secure desktop) it is reopened once
//! before the capture fails.
//!
//! # Platform
//!
//! Windows only. Elsewhere [`DesktopCapture::new`] fails and the host
//! falls back to [`TestPatternCapture`](crate::screen::TestPatternCapture).

use crate::error::VistaError;
use crate::screen::capture::CaptureProvider;
use crate::screen::encoder::FrameEncoder;

/// How long one capture waits for the compositor to present a new frame.
pub const FRAME_WAIT_MS: u32 = 100;

/// Output index of the primary monitor.
#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
const PRIMARY_OUTPUT: u32 = 0;

/// Capture provider backed by the host's primary display.
pub struct DesktopCapture {
    #[cfg_attr(not(target_os = "windows"), allow(dead_code))]
    encoder: FrameEncoder,
    #[cfg(target_os = "windows")]
    duplication: parking_lot::Mutex<platform::Duplication>,
}

impl std::fmt::Debug for DesktopCapture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DesktopCapture").finish_non_exhaustive()
    }
}

// ── Windows implementation ───────────────────────────────────────

#[cfg(target_os = "windows")]
mod platform {
    use tracing::debug;
    use windows::Win32::Graphics::Direct3D::D3D_DRIVER_TYPE_HARDWARE;
    use windows::Win32::Graphics::Direct3D11::*;
    use windows::Win32::Graphics::Dxgi::Common::*;
    use windows::Win32::Graphics::Dxgi::*;
    use windows::core::Interface;

    use crate::error::VistaError;
    use crate::screen::types::{PixelFormat, RawScreenFrame};

    fn dxgi(what: &str, e: windows::core::Error) -> VistaError {
        VistaError::Capture(format!("{what} failed: {e}"))
    }

    /// One duplicated output plus the most recent frame taken from it.
    pub(super) struct Duplication {
        _device: ID3D11Device,
        context: ID3D11DeviceContext,
        duplication: IDXGIOutputDuplication,
        staging: ID3D11Texture2D,
        last: RawScreenFrame,
    }

    // The COM objects are created with the default (free-threaded) D3D11
    // device and are only touched while the owning mutex is held.
    unsafe impl Send for Duplication {}

    impl Duplication {
        pub(super) fn open(output: u32) -> Result<Self, VistaError> {
            let mut device = None;
            let mut context = None;
            unsafe {
                D3D11CreateDevice(
                    None,
                    D3D_DRIVER_TYPE_HARDWARE,
                    None,
                    D3D11_CREATE_DEVICE_BGRA_SUPPORT,
                    None,
                    D3D11_SDK_VERSION,
                    Some(&mut device),
                    None,
                    Some(&mut context),
                )
                .map_err(|e| dxgi("D3D11CreateDevice", e))?;
            }
            let device: ID3D11Device =
                device.ok_or_else(|| VistaError::Capture("no D3D11 device".into()))?;
            let context: ID3D11DeviceContext =
                context.ok_or_else(|| VistaError::Capture("no D3D11 context".into()))?;

            let dxgi_device: IDXGIDevice = device.cast().map_err(|e| dxgi("IDXGIDevice", e))?;
            let adapter = unsafe { dxgi_device.GetAdapter() }.map_err(|e| dxgi("GetAdapter", e))?;
            let output: IDXGIOutput =
                unsafe { adapter.EnumOutputs(output) }.map_err(|e| dxgi("EnumOutputs", e))?;
            let output: IDXGIOutput1 = output.cast().map_err(|e| dxgi("IDXGIOutput1", e))?;
            let duplication =
                unsafe { output.DuplicateOutput(&device) }.map_err(|e| dxgi("DuplicateOutput", e))?;

            let mode = unsafe { duplication.GetDesc() }.ModeDesc;
            let (width, height) = (mode.Width, mode.Height);

            let desc = D3D11_TEXTURE2D_DESC {
                Width: width,
                Height: height,
                MipLevels: 1,
                ArraySize: 1,
                Format: DXGI_FORMAT_B8G8R8A8_UNORM,
                SampleDesc: DXGI_SAMPLE_DESC {
                    Count: 1,
                    Quality: 0,
                },
                Usage: D3D11_USAGE_STAGING,
                BindFlags: 0,
                CPUAccessFlags: D3D11_CPU_ACCESS_READ.0 as u32,
                MiscFlags: 0,
            };
            let mut staging = None;
            unsafe { device.CreateTexture2D(&desc, None, Some(&mut staging)) }
                .map_err(|e| dxgi("CreateTexture2D", e))?;
            let staging =
                staging.ok_or_else(|| VistaError::Capture("no staging texture".into()))?;

            debug!(output, width, height, "desktop duplication opened");
            Ok(Self {
                _device: device,
                context,
                duplication,
                staging,
                last: RawScreenFrame::blank(width, height, PixelFormat::Bgra8),
            })
        }

        pub(super) fn size(&self) -> (u32, u32) {
            (self.last.width, self.last.height)
        }

        pub(super) fn frame(&self) -> &RawScreenFrame {
            &self.last
        }

        /// Replace the cached frame with a newer one, if the compositor
        /// presents one within `timeout_ms`.
        pub(super) fn refresh(&mut self, timeout_ms: u32) -> Result<(), VistaError> {
            let mut info = DXGI_OUTDUPL_FRAME_INFO::default();
            let mut resource = None;
            match unsafe {
                self.duplication
                    .AcquireNextFrame(timeout_ms, &mut info, &mut resource)
            } {
                Ok(()) => {}
                Err(e) if e.code() == DXGI_ERROR_WAIT_TIMEOUT => return Ok(()),
                Err(e) => return Err(dxgi("AcquireNextFrame", e)),
            }

            let copied = resource
                .ok_or_else(|| VistaError::Capture("no desktop resource".into()))
                .and_then(|resource| {
                    let texture: ID3D11Texture2D =
                        resource.cast().map_err(|e| dxgi("ID3D11Texture2D", e))?;
                    unsafe { self.context.CopyResource(&self.staging, &texture) };
                    Ok(())
                });
            let _ = unsafe { self.duplication.ReleaseFrame() };
            copied?;

            let mut mapped = D3D11_MAPPED_SUBRESOURCE::default();
            unsafe {
                self.context
                    .Map(&self.staging, 0, D3D11_MAP_READ, 0, Some(&mut mapped))
            }
            .map_err(|e| dxgi("Map", e))?;

            let stride = mapped.RowPitch;
            let len = stride as usize * self.last.height as usize;
            let data = unsafe { std::slice::from_raw_parts(mapped.pData as *const u8, len) };
            self.last.stride = stride;
            self.last.data.clear();
            self.last.data.extend_from_slice(data);
            unsafe { self.context.Unmap(&self.staging, 0) };
            Ok(())
        }
    }
}

#[cfg(target_os = "windows")]
impl DesktopCapture {
    /// Open the primary monitor.
    pub fn new() -> Result<Self, VistaError> {
        Ok(Self {
            encoder: FrameEncoder::new(),
            duplication: parking_lot::Mutex::new(platform::Duplication::open(PRIMARY_OUTPUT)?),
        })
    }
}

#[cfg(target_os = "windows")]
impl CaptureProvider for DesktopCapture {
    fn surface_size(&self) -> Result<(u32, u32), VistaError> {
        Ok(self.duplication.lock().size())
    }

    fn capture(&self, quality: u8) -> Result<Vec<u8>, VistaError> {
        let mut duplication = self.duplication.lock();
        if let Err(e) = duplication.refresh(FRAME_WAIT_MS) {
            tracing::warn!("desktop duplication lost ({e}); reopening");
            *duplication = platform::Duplication::open(PRIMARY_OUTPUT)?;
            duplication.refresh(FRAME_WAIT_MS)?;
        }
        self.encoder.encode(duplication.frame(), quality)
    }
}

// ── Non-Windows stub ─────────────────────────────────────────────

#[cfg(not(target_os = "windows"))]
impl DesktopCapture {
    /// DXGI is only available on Windows.
    pub fn new() -> Result<Self, VistaError> {
        Err(VistaError::Capture(
            "desktop duplication is only available on Windows".into(),
        ))
    }
}

#[cfg(not(target_os = "windows"))]
impl CaptureProvider for DesktopCapture {
    fn surface_size(&self) -> Result<(u32, u32), VistaError> {
        Err(VistaError::Capture("not supported on this platform".into()))
    }

    fn capture(&self, _quality: u8) -> Result<Vec<u8>, VistaError> {
        Err(VistaError::Capture("not supported on this platform".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(target_os = "windows"))]
    #[test]
    fn unavailable_off_windows() {
        assert!(matches!(
            DesktopCapture::new(),
            Err(VistaError::Capture(_))
        ));
    }

    #[test]
    fn waits_less_than_one_default_frame() {
        let interval = crate::engine::EngineConfig::default().frame_interval;
        assert!(u128::from(FRAME_WAIT_MS) < interval.as_millis());
    }
}
