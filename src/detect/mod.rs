mod backend;
pub mod color;
pub mod contour;
pub mod hsv;
pub mod palette;
mod result;

pub use backend::Detector;
pub use color::{ColorObjectDetector, MIN_AREA};
pub use contour::{find_external_contours, BoundingBox, Contour, Mask, Point};
pub use hsv::Hsv;
pub use palette::{ColorLabel, ColorRange, Palette};
pub use result::{Detection, DetectionResult};
