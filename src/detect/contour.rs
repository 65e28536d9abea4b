//! Binary masks and external contour extraction.
//!
//! Contours come from `imageproc`'s border following (Suzuki-Abe). Only the
//! outer border of each top-level blob is kept: hole borders and blobs sitting
//! inside a hole of another blob are dropped.
//!
//! Area is the polygon area through the border pixel centers, so a filled
//! `w x h` rectangle measures `(w - 1) * (h - 1)`.

use image::{GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType};
use imageproc::geometry::contour_area;

pub use imageproc::point::Point;

const FOREGROUND: u8 = 255;

/// Row-major binary image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mask {
    image: GrayImage,
}

impl Mask {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: GrayImage::new(width, height),
        }
    }

    pub fn from_bits(width: u32, height: u32, bits: Vec<bool>) -> Option<Self> {
        let raw = bits
            .into_iter()
            .map(|on| if on { FOREGROUND } else { 0 })
            .collect();
        GrayImage::from_raw(width, height, raw).map(|image| Self { image })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Out-of-bounds coordinates read as background.
    pub fn get(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 || x as u32 >= self.width() || y as u32 >= self.height() {
            return false;
        }
        self.image.get_pixel(x as u32, y as u32)[0] != 0
    }

    pub fn set(&mut self, x: u32, y: u32, value: bool) {
        if x < self.width() && y < self.height() {
            let level = if value { FOREGROUND } else { 0 };
            self.image.put_pixel(x, y, Luma([level]));
        }
    }

    pub fn count_set(&self) -> usize {
        self.image.pixels().filter(|px| px[0] != 0).count()
    }

    pub fn as_image(&self) -> &GrayImage {
        &self.image
    }
}

/// Axis-aligned box in pixel units; `w`/`h` count pixels inclusively.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

/// Closed outer border of one blob.
#[derive(Clone, Debug, PartialEq)]
pub struct Contour {
    points: Vec<Point<i32>>,
}

impl Contour {
    pub fn points(&self) -> &[Point<i32>] {
        &self.points
    }

    /// Enclosed polygon area.
    pub fn area(&self) -> f64 {
        if self.points.len() < 3 {
            return 0.0;
        }
        contour_area(&self.points).abs()
    }

    pub fn bounding_box(&self) -> BoundingBox {
        let min_x = self.points.iter().map(|p| p.x).min().unwrap_or(0);
        let max_x = self.points.iter().map(|p| p.x).max().unwrap_or(-1);
        let min_y = self.points.iter().map(|p| p.y).min().unwrap_or(0);
        let max_y = self.points.iter().map(|p| p.y).max().unwrap_or(-1);
        BoundingBox {
            x: min_x.max(0) as u32,
            y: min_y.max(0) as u32,
            w: (max_x - min_x + 1).max(0) as u32,
            h: (max_y - min_y + 1).max(0) as u32,
        }
    }
}

/// Outer contours of every top-level blob, in raster order of their
/// starting pixel.
pub fn find_external_contours(mask: &Mask) -> Vec<Contour> {
    if mask.width() == 0 || mask.height() == 0 {
        return Vec::new();
    }
    find_contours::<i32>(&mask.image)
        .into_iter()
        .filter(|contour| {
            matches!(contour.border_type, BorderType::Outer) && contour.parent.is_none()
        })
        .map(|contour| Contour {
            points: contour.points,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_with_rects(width: u32, height: u32, rects: &[(u32, u32, u32, u32)]) -> Mask {
        let mut mask = Mask::new(width, height);
        for &(x, y, w, h) in rects {
            for yy in y..y + h {
                for xx in x..x + w {
                    mask.set(xx, yy, true);
                }
            }
        }
        mask
    }

    #[test]
    fn empty_mask_has_no_contours() {
        assert!(find_external_contours(&Mask::new(8, 8)).is_empty());
    }

    #[test]
    fn bits_must_match_dimensions() {
        assert!(Mask::from_bits(3, 2, vec![false; 5]).is_none());
        let mask = Mask::from_bits(3, 2, vec![true, false, false, false, false, true])
            .expect("mask");
        assert!(mask.get(0, 0));
        assert!(mask.get(2, 1));
        assert!(!mask.get(-1, 0));
        assert!(!mask.get(3, 1));
        assert_eq!(mask.count_set(), 2);
    }

    #[test]
    fn rectangle_area_spans_pixel_centers() {
        let mask = mask_with_rects(20, 20, &[(3, 4, 5, 4)]);
        let contours = find_external_contours(&mask);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].area(), 12.0);
        assert_eq!(
            contours[0].bounding_box(),
            BoundingBox {
                x: 3,
                y: 4,
                w: 5,
                h: 4
            }
        );
    }

    #[test]
    fn single_pixel_is_a_zero_area_contour() {
        let mask = mask_with_rects(5, 5, &[(2, 2, 1, 1)]);
        let contours = find_external_contours(&mask);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].area(), 0.0);
        assert_eq!(
            contours[0].bounding_box(),
            BoundingBox {
                x: 2,
                y: 2,
                w: 1,
                h: 1
            }
        );
    }

    #[test]
    fn diagonal_pixels_form_one_blob() {
        let mut mask = Mask::new(6, 6);
        mask.set(1, 1, true);
        mask.set(2, 2, true);
        mask.set(3, 3, true);
        assert_eq!(find_external_contours(&mask).len(), 1);
    }

    #[test]
    fn disjoint_blobs_are_reported_separately() {
        let mask = mask_with_rects(30, 10, &[(1, 1, 4, 4), (10, 2, 6, 6)]);
        let areas: Vec<f64> = find_external_contours(&mask)
            .iter()
            .map(Contour::area)
            .collect();
        assert_eq!(areas, vec![9.0, 25.0]);
    }

    #[test]
    fn blob_inside_ring_hole_is_ignored() {
        // 11x11 ring, 1 px thick, with a 3x3 blob in the middle of its hole.
        let mut mask = Mask::new(15, 15);
        for i in 2..13 {
            mask.set(i, 2, true);
            mask.set(i, 12, true);
            mask.set(2, i, true);
            mask.set(12, i, true);
        }
        for y in 6..9 {
            for x in 6..9 {
                mask.set(x, y, true);
            }
        }
        let contours = find_external_contours(&mask);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].area(), 100.0);
    }

    #[test]
    fn blob_touching_image_edge_is_traced() {
        let mask = mask_with_rects(10, 10, &[(0, 0, 10, 3)]);
        let contours = find_external_contours(&mask);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].area(), 18.0);
    }

    #[test]
    fn l_shape_concave_corner_is_cut_diagonally() {
        // Vertical bar 3x6 plus a horizontal foot 6x3 sharing the corner.
        let mask = mask_with_rects(12, 12, &[(1, 1, 3, 6), (1, 4, 6, 3)]);
        let contours = find_external_contours(&mask);
        assert_eq!(contours.len(), 1);
        // Border polygon: (1,1)-(1,6)-(6,6)-(6,4)-(4,4)-(3,3)-(3,1)
        assert_eq!(contours[0].area(), 16.5);
    }
}
