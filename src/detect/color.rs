use anyhow::Result;

use crate::detect::backend::Detector;
use crate::detect::contour::{find_external_contours, Mask};
use crate::detect::hsv::Hsv;
use crate::detect::palette::{ColorLabel, Palette};
use crate::detect::result::{Detection, DetectionResult};
use crate::frame::Frame;

/// Regions must enclose strictly more than this many square pixels.
pub const MIN_AREA: f64 = 500.0;

/// Largest-blob color detector.
///
/// For each palette label (in order) the frame is thresholded in HSV, outer
/// contours are extracted, and the contour with the greatest area wins. A
/// candidate replaces the running best only when its area is strictly larger,
/// so on ties the earlier label keeps the detection.
#[derive(Clone, Debug, Default)]
pub struct ColorObjectDetector {
    palette: Palette,
}

impl ColorObjectDetector {
    pub fn new(palette: Palette) -> Self {
        Self { palette }
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Binary mask of pixels that fall in any range tagged `label`.
    pub fn mask_for(&self, hsv: &[Hsv], width: u32, height: u32, label: ColorLabel) -> Mask {
        let bits = hsv
            .iter()
            .map(|px| self.palette.matches(label, *px))
            .collect();
        Mask::from_bits(width, height, bits).unwrap_or_else(|| Mask::new(width, height))
    }
}

impl Detector for ColorObjectDetector {
    fn name(&self) -> &'static str {
        "hsv-color"
    }

    fn detect(&self, frame: &Frame) -> Result<DetectionResult> {
        let hsv: Vec<Hsv> = frame.rgb_pixels().map(Hsv::from_rgb).collect();

        let mut best: Option<Detection> = None;
        let mut best_area = 0.0;

        for label in self.palette.labels() {
            let mask = self.mask_for(&hsv, frame.width, frame.height, label);
            for contour in find_external_contours(&mask) {
                let area = contour.area();
                if area > best_area && area > MIN_AREA {
                    best_area = area;
                    best = Some(Detection {
                        label,
                        contour,
                        area,
                    });
                }
            }
        }

        if let Some(found) = &best {
            log::trace!(
                "detected {} region area={} box={:?}",
                found.label,
                found.area,
                found.bounding_box()
            );
        }
        Ok(best)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BLACK: [u8; 3] = [0, 0, 0];
    const GREEN: [u8; 3] = [0, 200, 0];
    const RED: [u8; 3] = [200, 0, 0];

    #[test]
    fn small_blobs_are_ignored() -> Result<()> {
        let mut frame = Frame::filled(64, 64, BLACK)?;
        frame.fill_rect(5, 5, 10, 10, GREEN);
        assert!(ColorObjectDetector::default().detect(&frame)?.is_none());
        Ok(())
    }

    #[test]
    fn equal_areas_keep_the_earlier_label() -> Result<()> {
        // Both 26x26 -> area 625.
        let mut frame = Frame::filled(100, 60, BLACK)?;
        frame.fill_rect(60, 10, 26, 26, RED);
        frame.fill_rect(10, 10, 26, 26, GREEN);
        let found = ColorObjectDetector::default()
            .detect(&frame)?
            .expect("detection");
        assert_eq!(found.label, ColorLabel::Green);
        assert_eq!(found.area, 625.0);
        Ok(())
    }

    #[test]
    fn high_hue_red_needs_wraparound_palette() -> Result<()> {
        let mut frame = Frame::filled(80, 80, BLACK)?;
        // ~350 degrees, saturated
        frame.fill_rect(10, 10, 40, 40, [220, 0, 40]);

        assert!(ColorObjectDetector::default().detect(&frame)?.is_none());

        let found = ColorObjectDetector::new(Palette::with_red_wraparound())
            .detect(&frame)?
            .expect("detection");
        assert_eq!(found.label, ColorLabel::Red);
        Ok(())
    }

    #[test]
    fn mask_counts_in_range_pixels() -> Result<()> {
        let mut frame = Frame::filled(10, 10, BLACK)?;
        frame.fill_rect(0, 0, 3, 3, GREEN);
        let hsv: Vec<Hsv> = frame.rgb_pixels().map(Hsv::from_rgb).collect();
        let detector = ColorObjectDetector::default();
        assert_eq!(detector.mask_for(&hsv, 10, 10, ColorLabel::Green).count_set(), 9);
        assert_eq!(detector.mask_for(&hsv, 10, 10, ColorLabel::Red).count_set(), 0);
        Ok(())
    }
}
