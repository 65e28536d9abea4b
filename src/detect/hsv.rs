use ::palette::{FromColor, Srgb};

/// 8-bit HSV triple.
///
/// Hue is stored in half-degrees (0..180) so it fits a byte; saturation and
/// value use the full 0..=255 range. This is the encoding the palette bounds
/// are written in.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Hsv {
    pub h: u8,
    pub s: u8,
    pub v: u8,
}

impl Hsv {
    pub const fn new(h: u8, s: u8, v: u8) -> Self {
        Self { h, s, v }
    }

    /// Convert an 8-bit RGB triple, rounding each channel to the nearest step.
    pub fn from_rgb(rgb: [u8; 3]) -> Self {
        let [r, g, b] = rgb;
        let color: ::palette::Hsv =
            ::palette::Hsv::from_color(Srgb::new(r, g, b).into_format::<f32>());

        let half_degrees = (color.hue.into_positive_degrees() / 2.0).round() as u16 % 180;
        Self {
            h: half_degrees as u8,
            s: unit_to_u8(color.saturation),
            v: unit_to_u8(color.value),
        }
    }
}

fn unit_to_u8(value: f32) -> u8 {
    (value * 255.0).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primaries_land_on_expected_hues() {
        assert_eq!(Hsv::from_rgb([255, 0, 0]), Hsv::new(0, 255, 255));
        assert_eq!(Hsv::from_rgb([0, 255, 0]), Hsv::new(60, 255, 255));
        assert_eq!(Hsv::from_rgb([0, 0, 255]), Hsv::new(120, 255, 255));
    }

    #[test]
    fn grays_have_no_hue_or_saturation() {
        assert_eq!(Hsv::from_rgb([0, 0, 0]), Hsv::new(0, 0, 0));
        assert_eq!(Hsv::from_rgb([90, 90, 90]), Hsv::new(0, 0, 90));
    }

    #[test]
    fn magenta_side_of_red_stays_below_180() {
        // 350 degrees -> 175 half-degrees
        let hsv = Hsv::from_rgb([255, 0, 43]);
        assert!(hsv.h >= 170 && hsv.h < 180, "hue was {}", hsv.h);
    }

    #[test]
    fn saturation_scales_with_chroma() {
        let hsv = Hsv::from_rgb([200, 100, 100]);
        assert_eq!(hsv.h, 0);
        assert!((127..=128).contains(&hsv.s), "saturation was {}", hsv.s);
        assert_eq!(hsv.v, 200);
    }
}
