//! Frame acquisition.
//!
//! - Local V4L2 capture devices (feature: camera-v4l2)
//! - Synthetic `stub://` scene (demos and tests)
//!
//! Sources hand each `Frame` to the caller by value and keep no reference
//! to it afterwards.

use anyhow::Result;

use crate::frame::Frame;

pub mod camera;
#[cfg_attr(not(feature = "camera-v4l2"), allow(dead_code))]
mod normalize;

pub use camera::{CameraConfig, CameraSource};

/// Anything that yields frames one at a time.
///
/// An error means acquisition failed; callers treat it as terminal.
pub trait FrameSource {
    fn next_frame(&mut self) -> Result<Frame>;
}
