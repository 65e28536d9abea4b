use super::contour::{BoundingBox, Contour};
use super::palette::ColorLabel;

/// The single winning region of one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub label: ColorLabel,
    pub contour: Contour,
    /// Enclosed contour area, in square pixels.
    pub area: f64,
}

impl Detection {
    pub fn bounding_box(&self) -> BoundingBox {
        self.contour.bounding_box()
    }
}

/// Per-frame outcome: `None` when no region qualified.
pub type DetectionResult = Option<Detection>;
