/// Image decoding and grayscale normalization.
///
/// Whatever arrives (PNG/JPEG/BMP/GIF, 8- or 16-bit, with or without alpha) is
/// reduced to a single-channel 8-bit grid:
/// - colour sources are converted with luminance weights on unit-range floats
///   and rescaled to [0, 255] by truncation;
/// - 8-bit grayscale passes through unchanged;
/// - 16-bit grayscale is rescaled by bit depth instead of being reinterpreted.

use image::{DynamicImage, GenericImageView, GrayImage, Luma};
use tracing::debug;

use crate::error::DecodeError;

/// Luminance weights applied to linear R, G, B in [0, 1].
pub const LUMA_WEIGHTS: [f64; 3] = [0.2125, 0.7154, 0.0721];

/// Decodes `bytes` in any supported format and normalizes to 8-bit grayscale.
pub fn decode_grayscale(bytes: &[u8]) -> Result<GrayImage, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }
    let img = image::load_from_memory(bytes)?;
    to_grayscale(&img)
}

/// Normalizes an already-decoded image to 8-bit grayscale.
pub fn to_grayscale(img: &DynamicImage) -> Result<GrayImage, DecodeError> {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(DecodeError::ZeroSize { width, height });
    }

    let gray = match img {
        DynamicImage::ImageLuma8(buf) => buf.clone(),
        DynamicImage::ImageLuma16(buf) => {
            GrayImage::from_fn(width, height, |x, y| {
                Luma([rescale_u16(buf.get_pixel(x, y).0[0])])
            })
        }
        DynamicImage::ImageLumaA8(buf) => {
            GrayImage::from_fn(width, height, |x, y| {
                let [l, a] = buf.get_pixel(x, y).0;
                let unit = over_white(l as f64 / 255.0, a as f64 / 255.0);
                Luma([unit_to_u8(unit)])
            })
        }
        DynamicImage::ImageLumaA16(buf) => {
            GrayImage::from_fn(width, height, |x, y| {
                let [l, a] = buf.get_pixel(x, y).0;
                let unit = over_white(l as f64 / 65535.0, a as f64 / 65535.0);
                Luma([unit_to_u8(unit)])
            })
        }
        DynamicImage::ImageRgb8(buf) => {
            GrayImage::from_fn(width, height, |x, y| {
                let [r, g, b] = buf.get_pixel(x, y).0;
                Luma([unit_to_u8(luminance(
                    r as f64 / 255.0,
                    g as f64 / 255.0,
                    b as f64 / 255.0,
                ))])
            })
        }
        DynamicImage::ImageRgba8(buf) => {
            GrayImage::from_fn(width, height, |x, y| {
                let [r, g, b, a] = buf.get_pixel(x, y).0;
                let a = a as f64 / 255.0;
                Luma([unit_to_u8(luminance(
                    over_white(r as f64 / 255.0, a),
                    over_white(g as f64 / 255.0, a),
                    over_white(b as f64 / 255.0, a),
                ))])
            })
        }
        DynamicImage::ImageRgb16(buf) => {
            GrayImage::from_fn(width, height, |x, y| {
                let [r, g, b] = buf.get_pixel(x, y).0;
                Luma([unit_to_u8(luminance(
                    r as f64 / 65535.0,
                    g as f64 / 65535.0,
                    b as f64 / 65535.0,
                ))])
            })
        }
        // Rgba16 and the float variants all go through the unit-range path.
        other => {
            let rgba = other.to_rgba32f();
            GrayImage::from_fn(width, height, |x, y| {
                let [r, g, b, a] = rgba.get_pixel(x, y).0;
                let a = (a as f64).clamp(0.0, 1.0);
                Luma([unit_to_u8(luminance(
                    over_white(r as f64, a),
                    over_white(g as f64, a),
                    over_white(b as f64, a),
                ))])
            })
        }
    };

    debug!(width, height, source = ?img.color(), "normalized image to 8-bit grayscale");
    Ok(gray)
}

/// Builds a grayscale grid from raw single-channel intensities.
///
/// Every sample must be a finite integer in [0, 255]; anything else is
/// rejected rather than rescaled, since its bit depth is unknown.
pub fn from_intensities(width: u32, height: u32, samples: &[f64]) -> Result<GrayImage, DecodeError> {
    if width == 0 || height == 0 {
        return Err(DecodeError::ZeroSize { width, height });
    }
    let expected = width as usize * height as usize;
    if samples.len() != expected {
        return Err(DecodeError::UnsupportedSampleRange {
            found: format!("{} samples for a {}x{} grid", samples.len(), width, height),
        });
    }
    if let Some(bad) = samples.iter().find(|&&v| !(0.0..=255.0).contains(&v) || v.fract() != 0.0) {
        return Err(DecodeError::UnsupportedSampleRange { found: format!("sample value {}", bad) });
    }
    let raw: Vec<u8> = samples.iter().map(|&v| v as u8).collect();
    GrayImage::from_raw(width, height, raw).ok_or(DecodeError::ZeroSize { width, height })
}

fn luminance(r: f64, g: f64, b: f64) -> f64 {
    LUMA_WEIGHTS[0] * r + LUMA_WEIGHTS[1] * g + LUMA_WEIGHTS[2] * b
}

/// Composites a unit-range channel over a white background.
fn over_white(channel: f64, alpha: f64) -> f64 {
    (1.0 - alpha) + alpha * channel
}

/// Unit float → 8-bit by truncation; out-of-range values saturate.
fn unit_to_u8(unit: f64) -> u8 {
    (unit * 255.0) as u8
}

fn rescale_u16(v: u16) -> u8 {
    ((v as u32 * 255 + 32767) / 65535) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, ImageOutputFormat, Rgb, Rgba};
    use std::io::Cursor;

    fn encode_png(img: &DynamicImage) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageOutputFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn empty_bytes_are_rejected() {
        assert!(matches!(decode_grayscale(&[]), Err(DecodeError::Empty)));
    }

    #[test]
    fn corrupted_bytes_are_rejected() {
        let junk = b"\x89PNG\r\n\x1a\nthis is not really a png";
        assert!(matches!(decode_grayscale(junk), Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn luma8_passes_through_unchanged() {
        let src = GrayImage::from_fn(4, 3, |x, y| Luma([(x * 40 + y * 7) as u8]));
        let bytes = encode_png(&DynamicImage::ImageLuma8(src.clone()));
        let gray = decode_grayscale(&bytes).unwrap();
        assert_eq!(gray, src);
    }

    #[test]
    fn colour_uses_weighted_luminance_not_average() {
        // Pure green: weighted → 0.7154 * 255 = 182; plain average would be 85.
        let src = ImageBuffer::from_pixel(2, 2, Rgb([0u8, 255, 0]));
        let gray = to_grayscale(&DynamicImage::ImageRgb8(src)).unwrap();
        assert_eq!(gray.get_pixel(0, 0).0[0], 182);
    }

    #[test]
    fn colour_black_maps_to_zero() {
        let src = ImageBuffer::from_pixel(3, 3, Rgb([0u8, 0, 0]));
        let gray = to_grayscale(&DynamicImage::ImageRgb8(src)).unwrap();
        assert!(gray.pixels().all(|p| p.0[0] == 0));
    }

    #[test]
    fn transparent_pixels_composite_over_white() {
        let src = ImageBuffer::from_pixel(2, 2, Rgba([0u8, 0, 0, 0]));
        let gray = to_grayscale(&DynamicImage::ImageRgba8(src)).unwrap();
        assert!(gray.get_pixel(0, 0).0[0] >= 254);
    }

    #[test]
    fn luma16_is_rescaled_by_bit_depth() {
        let src = ImageBuffer::from_pixel(2, 2, Luma([65535u16]));
        let gray = to_grayscale(&DynamicImage::ImageLuma16(src)).unwrap();
        assert_eq!(gray.get_pixel(1, 1).0[0], 255);

        let mid = ImageBuffer::from_pixel(1, 1, Luma([32896u16]));
        let gray = to_grayscale(&DynamicImage::ImageLuma16(mid)).unwrap();
        assert_eq!(gray.get_pixel(0, 0).0[0], 128);
    }

    #[test]
    fn intensities_outside_8bit_range_are_rejected() {
        let err = from_intensities(2, 1, &[12.0, 300.0]).unwrap_err();
        assert!(matches!(err, DecodeError::UnsupportedSampleRange { .. }));

        let err = from_intensities(2, 1, &[0.5, 0.25]).unwrap_err();
        assert!(matches!(err, DecodeError::UnsupportedSampleRange { .. }));
    }

    #[test]
    fn intensities_build_grid_row_major() {
        let gray = from_intensities(2, 2, &[0.0, 10.0, 20.0, 255.0]).unwrap();
        assert_eq!(gray.get_pixel(1, 0).0[0], 10);
        assert_eq!(gray.get_pixel(1, 1).0[0], 255);
    }

    #[test]
    fn zero_sized_grid_is_degenerate() {
        assert!(matches!(from_intensities(0, 5, &[]), Err(DecodeError::ZeroSize { .. })));
    }
}
