use std::fmt;

use serde::Serialize;

use super::hsv::Hsv;

/// Color labels the detector can report.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorLabel {
    Green,
    Red,
    Blue,
}

impl ColorLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            ColorLabel::Green => "green",
            ColorLabel::Red => "red",
            ColorLabel::Blue => "blue",
        }
    }

    /// Display color used when drawing this label's overlay.
    pub fn overlay_rgb(self) -> [u8; 3] {
        match self {
            ColorLabel::Green => [0, 255, 0],
            ColorLabel::Red => [255, 0, 0],
            ColorLabel::Blue => [0, 128, 255],
        }
    }
}

impl fmt::Display for ColorLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive HSV bounds tagged with a label.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorRange {
    pub label: ColorLabel,
    pub lower: Hsv,
    pub upper: Hsv,
}

impl ColorRange {
    pub const fn new(label: ColorLabel, lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self {
            label,
            lower: Hsv::new(lower[0], lower[1], lower[2]),
            upper: Hsv::new(upper[0], upper[1], upper[2]),
        }
    }

    pub fn contains(&self, hsv: Hsv) -> bool {
        (self.lower.h..=self.upper.h).contains(&hsv.h)
            && (self.lower.s..=self.upper.s).contains(&hsv.s)
            && (self.lower.v..=self.upper.v).contains(&hsv.v)
    }
}

pub const GREEN: ColorRange = ColorRange::new(ColorLabel::Green, [40, 40, 40], [70, 255, 255]);
pub const RED: ColorRange = ColorRange::new(ColorLabel::Red, [0, 100, 100], [10, 255, 255]);
pub const BLUE: ColorRange = ColorRange::new(ColorLabel::Blue, [100, 100, 100], [130, 255, 255]);

/// Upper end of the red hue circle, only used when wraparound is enabled.
pub const RED_HIGH: ColorRange =
    ColorRange::new(ColorLabel::Red, [170, 100, 100], [180, 255, 255]);

/// Ordered color-range table.
///
/// Ranges sharing a label are merged into one mask; labels are visited in the
/// order they first appear, which decides ties between equal areas.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Palette {
    ranges: Vec<ColorRange>,
}

impl Palette {
    /// Green, red (low hues only), blue.
    pub fn standard() -> Self {
        Self {
            ranges: vec![GREEN, RED, BLUE],
        }
    }

    /// Standard table plus the 170..=180 red band.
    pub fn with_red_wraparound() -> Self {
        Self {
            ranges: vec![GREEN, RED, RED_HIGH, BLUE],
        }
    }

    pub fn ranges(&self) -> &[ColorRange] {
        &self.ranges
    }

    /// Distinct labels in encounter order.
    pub fn labels(&self) -> Vec<ColorLabel> {
        let mut labels = Vec::new();
        for range in &self.ranges {
            if !labels.contains(&range.label) {
                labels.push(range.label);
            }
        }
        labels
    }

    /// True when any range for `label` contains `hsv`.
    pub fn matches(&self, label: ColorLabel, hsv: Hsv) -> bool {
        self.ranges
            .iter()
            .any(|range| range.label == label && range.contains(hsv))
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_order_is_green_red_blue() {
        assert_eq!(
            Palette::standard().labels(),
            vec![ColorLabel::Green, ColorLabel::Red, ColorLabel::Blue]
        );
    }

    #[test]
    fn bounds_are_inclusive() {
        assert!(GREEN.contains(Hsv::new(40, 40, 40)));
        assert!(GREEN.contains(Hsv::new(70, 255, 255)));
        assert!(!GREEN.contains(Hsv::new(71, 255, 255)));
        assert!(!GREEN.contains(Hsv::new(40, 39, 40)));
    }

    #[test]
    fn high_red_needs_wraparound() {
        let magenta_red = Hsv::new(175, 200, 200);
        assert!(!Palette::standard().matches(ColorLabel::Red, magenta_red));
        assert!(Palette::with_red_wraparound().matches(ColorLabel::Red, magenta_red));
        assert_eq!(Palette::with_red_wraparound().labels().len(), 3);
    }
}
