//! Image normalization: decode raw page bytes and bound their dimensions.
//!
//! Scanned sheets arrive at wildly different sizes — a 600-DPI A0 scan is
//! over 300 megapixels. Everything downstream (complexity scoring, tiling,
//! the vision API payload) assumes a bounded working size, so normalization
//! happens once, up front, and every bbox the tiler emits is relative to the
//! normalized image.

use crate::config::NormalizeLimits;
use crate::error::FragmentError;
use image::imageops::FilterType;
use image::DynamicImage;
use tracing::debug;

/// Decode an encoded-image byte buffer.
///
/// `context` labels the failing buffer in the error (e.g. `"page 3"`).
/// Callers batching over pages treat a failed decode as fatal for that page
/// only: log and skip, never abort the batch.
pub fn decode(bytes: &[u8], context: &str) -> Result<DynamicImage, FragmentError> {
    image::load_from_memory(bytes).map_err(|e| FragmentError::decode(context, e))
}

/// Shrink `image` to fit within `limits`, preserving aspect ratio.
///
/// Identity when both dimensions are already within bounds — the input is
/// returned as-is, no re-sampling, no copy. Otherwise the image is scaled by
/// `min(max_width/width, max_height/height)` with a triangle filter, whose
/// support widens with the downscale ratio and so averages over the source
/// area rather than point-sampling. This function only ever shrinks; the
/// scale factor is never above 1.
pub fn resize_if_needed(image: DynamicImage, limits: &NormalizeLimits) -> DynamicImage {
    let (width, height) = (image.width(), image.height());
    if width <= limits.max_width && height <= limits.max_height {
        return image;
    }

    let scale = f64::min(
        limits.max_width as f64 / width as f64,
        limits.max_height as f64 / height as f64,
    );
    let new_width = ((width as f64 * scale).round() as u32).max(1);
    let new_height = ((height as f64 * scale).round() as u32).max(1);

    debug!(
        width,
        height, new_width, new_height, "resizing oversized page image"
    );
    image.resize_exact(new_width, new_height, FilterType::Triangle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn limits(w: u32, h: u32) -> NormalizeLimits {
        NormalizeLimits {
            max_width: w,
            max_height: h,
        }
    }

    fn solid(w: u32, h: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb([200, 200, 200])))
    }

    #[test]
    fn identity_when_within_bounds() {
        let img = solid(100, 80);
        let out = resize_if_needed(img, &limits(2048, 2048));
        assert_eq!((out.width(), out.height()), (100, 80));
    }

    #[test]
    fn identity_at_exact_bounds() {
        let out = resize_if_needed(solid(2048, 2048), &limits(2048, 2048));
        assert_eq!((out.width(), out.height()), (2048, 2048));
    }

    #[test]
    fn shrinks_oversized_width() {
        let out = resize_if_needed(solid(4096, 1024), &limits(2048, 2048));
        assert_eq!((out.width(), out.height()), (2048, 512));
    }

    #[test]
    fn shrinks_both_dimensions_preserving_aspect() {
        let out = resize_if_needed(solid(4000, 3000), &limits(2000, 2000));
        // scale = 0.5 via the width constraint
        assert_eq!((out.width(), out.height()), (2000, 1500));
        let original_aspect = 4000.0 / 3000.0;
        let new_aspect = out.width() as f64 / out.height() as f64;
        assert!((original_aspect - new_aspect).abs() < 0.01);
    }

    #[test]
    fn never_exceeds_limits() {
        let out = resize_if_needed(solid(3001, 1999), &limits(1000, 1000));
        assert!(out.width() <= 1000);
        assert!(out.height() <= 1000);
    }

    #[test]
    fn decode_rejects_garbage() {
        let err = decode(b"not an image", "page 1");
        assert!(matches!(err, Err(FragmentError::Decode { .. })));
    }

    #[test]
    fn decode_accepts_png() {
        let mut buf = Vec::new();
        solid(4, 4)
            .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        let img = decode(&buf, "test").unwrap();
        assert_eq!((img.width(), img.height()), (4, 4));
    }
}
