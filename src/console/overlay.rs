use super::font::{draw_text_line, text_width, GLYPH_HEIGHT};
use crate::detect::Detection;
use crate::frame::Frame;

const LINE_WIDTH: u32 = 2;
/// Distance from the box top to the label's bottom edge.
const LABEL_GAP: u32 = 3;

/// Outline the detection's bounding box in its label color and write the
/// label above it.
pub fn draw_detection(frame: &mut Frame, detection: &Detection) {
    let bbox = detection.bounding_box();
    let color = detection.label.overlay_rgb();
    let line = LINE_WIDTH.min(bbox.w).min(bbox.h);

    frame.fill_rect(bbox.x, bbox.y, bbox.w, line, color);
    frame.fill_rect(bbox.x, (bbox.y + bbox.h).saturating_sub(line), bbox.w, line, color);
    frame.fill_rect(bbox.x, bbox.y, line, bbox.h, color);
    frame.fill_rect((bbox.x + bbox.w).saturating_sub(line), bbox.y, line, bbox.h, color);

    let label = detection.label.as_str();
    let label_left = bbox.x.min(frame.width.saturating_sub(text_width(label, 1)));
    let label_top = bbox.y.saturating_sub(GLYPH_HEIGHT + LABEL_GAP);
    draw_text_line(frame, label_left, label_top, label, color, 1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{ColorObjectDetector, Detector};

    #[test]
    fn outline_leaves_interior_untouched() -> anyhow::Result<()> {
        let mut frame = Frame::filled(60, 60, [0, 0, 0])?;
        frame.fill_rect(10, 10, 30, 30, [0, 200, 0]);
        let detection = ColorObjectDetector::default()
            .detect(&frame)?
            .expect("detection");

        let mut canvas = frame.clone();
        draw_detection(&mut canvas, &detection);

        assert_eq!(canvas.rgb_at(10, 10), Some([0, 255, 0]));
        assert_eq!(canvas.rgb_at(39, 25), Some([0, 255, 0]));
        assert_eq!(canvas.rgb_at(25, 25), Some([0, 200, 0]));
        assert_eq!(canvas.rgb_at(5, 5), Some([0, 0, 0]));
        Ok(())
    }

    #[test]
    fn label_is_written_above_the_box() -> anyhow::Result<()> {
        let mut frame = Frame::filled(80, 80, [0, 0, 0])?;
        frame.fill_rect(20, 30, 40, 30, [0, 0, 230]);
        let detection = ColorObjectDetector::default()
            .detect(&frame)?
            .expect("detection");

        let mut canvas = frame.clone();
        draw_detection(&mut canvas, &detection);

        let color = detection.label.overlay_rgb();
        let mut label_pixels = 0;
        for y in 20..27 {
            for x in 20..60 {
                if canvas.rgb_at(x, y) == Some(color) {
                    label_pixels += 1;
                }
            }
        }
        assert!(label_pixels > 20, "only {} label pixels", label_pixels);
        // 'b' starts with a full-height left stroke.
        assert_eq!(canvas.rgb_at(20, 20), Some(color));
        // Rows between the label and the box stay clear.
        assert!((20..60).all(|x| canvas.rgb_at(x, 28) == Some([0, 0, 0])));
        Ok(())
    }
}
