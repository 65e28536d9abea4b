use anyhow::{anyhow, Result};

/// Capture formats a device may hand back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CaptureFormat {
    Rgb24,
    Bgr24,
    Yuyv,
}

impl CaptureFormat {
    #[cfg(feature = "camera-v4l2")]
    pub(crate) fn from_fourcc(fourcc: &[u8; 4]) -> Option<Self> {
        match fourcc {
            b"RGB3" => Some(CaptureFormat::Rgb24),
            b"BGR3" => Some(CaptureFormat::Bgr24),
            b"YUYV" => Some(CaptureFormat::Yuyv),
            _ => None,
        }
    }
}

/// Convert a captured buffer into packed 3-byte pixels.
///
/// RGB and BGR buffers pass through (channel order is kept by the `Frame`);
/// YUYV is expanded to RGB. Drivers sometimes pad the final buffer, so only
/// a short buffer is an error.
pub(crate) fn normalize_capture(
    pixels: &[u8],
    width: u32,
    height: u32,
    format: CaptureFormat,
) -> Result<Vec<u8>> {
    let pixel_count = (width as usize)
        .checked_mul(height as usize)
        .ok_or_else(|| anyhow!("capture dimensions overflow"))?;
    match format {
        CaptureFormat::Rgb24 | CaptureFormat::Bgr24 => {
            let expected = pixel_count * 3;
            if pixels.len() < expected {
                return Err(anyhow!(
                    "packed frame too short: expected {}, got {}",
                    expected,
                    pixels.len()
                ));
            }
            Ok(pixels[..expected].to_vec())
        }
        CaptureFormat::Yuyv => yuyv_to_rgb(pixels, width, height),
    }
}

fn yuyv_to_rgb(pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    if width % 2 != 0 {
        return Err(anyhow!("YUYV frames need an even width, got {}", width));
    }
    let pixel_count = width as usize * height as usize;
    let expected = pixel_count * 2;
    if pixels.len() < expected {
        return Err(anyhow!(
            "YUYV frame too short: expected {}, got {}",
            expected,
            pixels.len()
        ));
    }

    let mut rgb = Vec::with_capacity(pixel_count * 3);
    for macro_px in pixels[..expected].chunks_exact(4) {
        let u = macro_px[1] as f32 - 128.0;
        let v = macro_px[3] as f32 - 128.0;
        for y in [macro_px[0], macro_px[2]] {
            let y = y as f32;
            rgb.push(clamp_to_u8(y + 1.402_f32 * v));
            rgb.push(clamp_to_u8(y - 0.344_136_f32 * u - 0.714_136_f32 * v));
            rgb.push(clamp_to_u8(y + 1.772_f32 * u));
        }
    }
    Ok(rgb)
}

fn clamp_to_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yuyv_neutral_chroma_is_gray() -> Result<()> {
        let yuyv = vec![100, 128, 100, 128];
        let rgb = normalize_capture(&yuyv, 2, 1, CaptureFormat::Yuyv)?;
        assert_eq!(rgb, vec![100u8; 6]);
        Ok(())
    }

    #[test]
    fn packed_formats_trim_driver_padding() -> Result<()> {
        let mut pixels = vec![7u8; 12];
        pixels.extend_from_slice(&[0, 0]);
        let rgb = normalize_capture(&pixels, 2, 2, CaptureFormat::Bgr24)?;
        assert_eq!(rgb.len(), 12);
        Ok(())
    }

    #[test]
    fn short_buffers_are_rejected() {
        assert!(normalize_capture(&[0u8; 5], 2, 1, CaptureFormat::Rgb24).is_err());
        assert!(normalize_capture(&[0u8; 3], 2, 1, CaptureFormat::Yuyv).is_err());
        assert!(normalize_capture(&[0u8; 8], 3, 1, CaptureFormat::Yuyv).is_err());
    }
}
