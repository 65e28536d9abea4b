use anyhow::Result;

use crate::detect::result::DetectionResult;
use crate::frame::Frame;

/// Detector seam used by the control loop.
///
/// Implementations must be pure over the frame: no I/O, no mutation of the
/// frame, and no state carried between calls.
pub trait Detector {
    /// Detector identifier for logs.
    fn name(&self) -> &'static str;

    /// Run detection on a frame.
    fn detect(&self, frame: &Frame) -> Result<DetectionResult>;
}
