//! Frame container handed from the camera to the detector and console.
//!
//! A `Frame` owns one captured image in the device's native channel order.
//! It is produced once per loop iteration and dropped at the end of it.

use anyhow::{anyhow, Result};

/// Channel order of a packed 3-byte-per-pixel frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PixelFormat {
    #[default]
    Rgb24,
    Bgr24,
}

/// One captured image.
///
/// The pixel buffer length is checked at construction, so every accessor can
/// assume `width * height * 3` bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, format: PixelFormat) -> Result<Self> {
        let expected = packed_len(width, height)?;
        if data.len() != expected {
            return Err(anyhow!(
                "frame length mismatch: expected {} bytes for {}x{}, got {}",
                expected,
                width,
                height,
                data.len()
            ));
        }
        Ok(Self {
            data,
            width,
            height,
            format,
        })
    }

    /// A frame filled with a single RGB color.
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Result<Self> {
        let len = packed_len(width, height)?;
        let mut data = Vec::with_capacity(len);
        for _ in 0..len / 3 {
            data.extend_from_slice(&rgb);
        }
        Self::new(data, width, height, PixelFormat::Rgb24)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn pixel_count(&self) -> usize {
        self.data.len() / 3
    }

    /// Pixel at `(x, y)` as an RGB triple regardless of storage order.
    pub fn rgb_at(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 3;
        let px = &self.data[offset..offset + 3];
        Some(self.format.to_rgb([px[0], px[1], px[2]]))
    }

    /// Iterate pixels in raster order as RGB triples.
    pub fn rgb_pixels(&self) -> impl Iterator<Item = [u8; 3]> + '_ {
        let format = self.format;
        self.data
            .chunks_exact(3)
            .map(move |px| format.to_rgb([px[0], px[1], px[2]]))
    }

    /// Overwrite pixel `(x, y)` with an RGB color, converting to storage order.
    /// Out-of-bounds writes are ignored.
    pub fn put_rgb(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 3;
        let stored = self.format.from_rgb(rgb);
        self.data[offset..offset + 3].copy_from_slice(&stored);
    }

    /// Fill an axis-aligned rectangle, clipped to the frame.
    pub fn fill_rect(&mut self, x: u32, y: u32, w: u32, h: u32, rgb: [u8; 3]) {
        let x_end = x.saturating_add(w).min(self.width);
        let y_end = y.saturating_add(h).min(self.height);
        for yy in y..y_end {
            for xx in x..x_end {
                self.put_rgb(xx, yy, rgb);
            }
        }
    }
}

impl PixelFormat {
    fn to_rgb(self, px: [u8; 3]) -> [u8; 3] {
        match self {
            PixelFormat::Rgb24 => px,
            PixelFormat::Bgr24 => [px[2], px[1], px[0]],
        }
    }

    fn from_rgb(self, rgb: [u8; 3]) -> [u8; 3] {
        // Both orders are their own inverse.
        self.to_rgb(rgb)
    }
}

fn packed_len(width: u32, height: u32) -> Result<usize> {
    width
        .checked_mul(height)
        .and_then(|v| v.checked_mul(3))
        .map(|v| v as usize)
        .ok_or_else(|| anyhow!("frame dimensions overflow: {}x{}", width, height))
}
