//! Camera frame source.
//!
//! `CameraSource` opens a local V4L2 capture device (feature `camera-v4l2`) or,
//! for `stub://` devices, a synthetic scene used by demos and tests.
//!
//! The source is responsible for:
//! - Opening the device at startup (failure is fatal to the caller)
//! - Negotiating a 3-byte-per-pixel format, falling back to YUYV
//! - Producing one `Frame` per `next_frame` call

use anyhow::Result;
#[cfg(feature = "camera-v4l2")]
use anyhow::{anyhow, Context};
#[cfg(feature = "camera-v4l2")]
use ouroboros::self_referencing;

#[cfg(feature = "camera-v4l2")]
use super::normalize::{normalize_capture, CaptureFormat};
use super::FrameSource;
use crate::frame::Frame;
#[cfg(feature = "camera-v4l2")]
use crate::frame::PixelFormat;

/// Index of the USB camera in the reference rig.
pub const DEFAULT_CAMERA_INDEX: u32 = 2;

/// Configuration for a camera source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CameraConfig {
    /// Device path (e.g., "/dev/video2") or "stub://<name>".
    pub device: String,
    /// Requested frame rate; the driver may pick another.
    pub target_fps: u32,
    /// Preferred frame width.
    pub width: u32,
    /// Preferred frame height.
    pub height: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            device: device_path(&DEFAULT_CAMERA_INDEX.to_string()),
            target_fps: 30,
            width: 640,
            height: 480,
        }
    }
}

/// Expand a bare device index ("2") into a device node path.
pub fn device_path(spec: &str) -> String {
    let trimmed = spec.trim();
    if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
        format!("/dev/video{}", trimmed)
    } else {
        trimmed.to_string()
    }
}

/// Camera frame source.
pub struct CameraSource {
    backend: CameraBackend,
}

enum CameraBackend {
    Synthetic(SyntheticCamera),
    #[cfg(feature = "camera-v4l2")]
    Device(DeviceCamera),
}

impl std::fmt::Debug for CameraSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let backend = match &self.backend {
            CameraBackend::Synthetic(_) => "Synthetic",
            #[cfg(feature = "camera-v4l2")]
            CameraBackend::Device(_) => "Device",
        };
        f.debug_struct("CameraSource")
            .field("backend", &backend)
            .finish()
    }
}

impl CameraSource {
    pub fn new(config: CameraConfig) -> Result<Self> {
        if config.device.starts_with("stub://") {
            Ok(Self {
                backend: CameraBackend::Synthetic(SyntheticCamera::new(config)),
            })
        } else {
            #[cfg(feature = "camera-v4l2")]
            {
                Ok(Self {
                    backend: CameraBackend::Device(DeviceCamera::new(config)),
                })
            }
            #[cfg(not(feature = "camera-v4l2"))]
            {
                anyhow::bail!(
                    "camera {} requires the camera-v4l2 feature (use stub://<name> for a synthetic scene)",
                    config.device
                )
            }
        }
    }

    /// Open the device and start streaming.
    pub fn open(&mut self) -> Result<()> {
        match &mut self.backend {
            CameraBackend::Synthetic(source) => source.open(),
            #[cfg(feature = "camera-v4l2")]
            CameraBackend::Device(source) => source.open(),
        }
    }
}

impl FrameSource for CameraSource {
    fn next_frame(&mut self) -> Result<Frame> {
        match &mut self.backend {
            CameraBackend::Synthetic(source) => source.next_frame(),
            #[cfg(feature = "camera-v4l2")]
            CameraBackend::Device(source) => source.next_frame(),
        }
    }
}

// ----------------------------------------------------------------------------
// Synthetic source (stub://)
// ----------------------------------------------------------------------------

/// Frames per color phase of the synthetic scene.
const SCENE_PHASE_FRAMES: u64 = 90;
const SCENE_SQUARE: u32 = 60;
const SCENE_BACKGROUND: [u8; 3] = [24, 24, 24];
/// Green, red, blue, then an empty phase.
const SCENE_COLORS: [Option<[u8; 3]>; 4] = [
    Some([30, 190, 40]),
    Some([210, 20, 20]),
    Some([20, 40, 210]),
    None,
];

struct SyntheticCamera {
    config: CameraConfig,
    frame_count: u64,
}

impl SyntheticCamera {
    fn new(config: CameraConfig) -> Self {
        Self {
            config,
            frame_count: 0,
        }
    }

    /// Synthetic sources are always available.
    fn open(&mut self) -> Result<()> {
        log::info!(
            "CameraSource: opened {} ({}x{}, synthetic)",
            self.config.device,
            self.config.width,
            self.config.height
        );
        Ok(())
    }

    /// Dark background with a colored square sliding left to right.
    fn next_frame(&mut self) -> Result<Frame> {
        let tick = self.frame_count;
        self.frame_count += 1;

        let mut frame = Frame::filled(self.config.width, self.config.height, SCENE_BACKGROUND)?;
        let phase = ((tick / SCENE_PHASE_FRAMES) % SCENE_COLORS.len() as u64) as usize;
        if let Some(color) = SCENE_COLORS[phase] {
            let travel = self.config.width.saturating_sub(SCENE_SQUARE) as u64;
            let x = (tick % SCENE_PHASE_FRAMES) * travel / SCENE_PHASE_FRAMES;
            let y = self.config.height.saturating_sub(SCENE_SQUARE) / 2;
            frame.fill_rect(x as u32, y, SCENE_SQUARE, SCENE_SQUARE, color);
        }
        Ok(frame)
    }
}

// ----------------------------------------------------------------------------
// V4L2 device source
// ----------------------------------------------------------------------------

#[cfg(feature = "camera-v4l2")]
struct DeviceCamera {
    config: CameraConfig,
    state: Option<DeviceState>,
    capture_format: CaptureFormat,
    active_width: u32,
    active_height: u32,
}

#[cfg(feature = "camera-v4l2")]
#[self_referencing]
struct DeviceState {
    device: v4l::Device,
    #[borrows(mut device)]
    #[covariant]
    stream: v4l::prelude::MmapStream<'this, v4l::Device>,
}

#[cfg(feature = "camera-v4l2")]
impl DeviceCamera {
    fn new(config: CameraConfig) -> Self {
        Self {
            active_width: config.width,
            active_height: config.height,
            config,
            state: None,
            capture_format: CaptureFormat::Rgb24,
        }
    }

    fn open(&mut self) -> Result<()> {
        use v4l::buffer::Type;
        use v4l::video::Capture;

        let mut device = v4l::Device::with_path(&self.config.device)
            .with_context(|| format!("open camera {}", self.config.device))?;
        let mut format = device.format().context("read camera format")?;
        format.width = self.config.width;
        format.height = self.config.height;
        format.fourcc = v4l::FourCC::new(b"RGB3");

        let format = match device.set_format(&format) {
            Ok(format) => format,
            Err(err) => {
                log::warn!(
                    "CameraSource: failed to set RGB3 on {}: {}",
                    self.config.device,
                    err
                );
                format.fourcc = v4l::FourCC::new(b"YUYV");
                device
                    .set_format(&format)
                    .context("set YUYV camera format")?
            }
        };
        self.capture_format = CaptureFormat::from_fourcc(&format.fourcc.repr).ok_or_else(|| {
            anyhow!(
                "camera {} negotiated unsupported format {}",
                self.config.device,
                format.fourcc
            )
        })?;

        if self.config.target_fps > 0 {
            let params = v4l::video::capture::Parameters::with_fps(self.config.target_fps);
            if let Err(err) = device.set_params(&params) {
                log::warn!(
                    "CameraSource: failed to set fps on {}: {}",
                    self.config.device,
                    err
                );
            }
        }

        self.active_width = format.width;
        self.active_height = format.height;

        let state = DeviceStateTryBuilder {
            device,
            stream_builder: |device| {
                v4l::prelude::MmapStream::with_buffers(device, Type::VideoCapture, 4)
                    .map_err(|err| anyhow::Error::new(err).context("create camera buffer stream"))
            },
        }
        .try_build()?;
        self.state = Some(state);

        log::info!(
            "CameraSource: opened {} ({}x{} {:?})",
            self.config.device,
            self.active_width,
            self.active_height,
            self.capture_format
        );
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Frame> {
        use v4l::io::traits::CaptureStream;

        let state = self.state.as_mut().context("camera not opened")?;
        let (width, height, format) = (self.active_width, self.active_height, self.capture_format);
        let pixels = state
            .with_mut(|fields| {
                fields
                    .stream
                    .next()
                    .map(|(buf, _meta)| normalize_capture(buf, width, height, format))
            })
            .map_err(|err| anyhow::Error::new(err).context("capture camera frame"))??;

        let pixel_format = match format {
            CaptureFormat::Bgr24 => PixelFormat::Bgr24,
            CaptureFormat::Rgb24 | CaptureFormat::Yuyv => PixelFormat::Rgb24,
        };
        Frame::new(pixels, width, height, pixel_format)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
