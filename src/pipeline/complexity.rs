//! Visual complexity scoring: does a tile contain drawn content?
//!
//! The score is the fraction of pixels whose luminance falls strictly below
//! a fixed near-white cut-off. Blank paper scans a few counts shy of pure
//! white, so the cut-off sits at 240 rather than 255; anything darker is
//! treated as ink. Deliberately a global threshold, not an adaptive one:
//! the same tile must always score the same, because the tiler's keep/drop
//! decisions need to be reproducible across runs and machines.

use image::DynamicImage;

/// Luminance cut-off below which a pixel counts as drawn content.
const NEAR_WHITE: u8 = 240;

/// Score the visual complexity of an image region, in `[0, 1]`.
///
/// `0.0` for blank paper, approaching `1.0` for solid ink coverage. A
/// zero-size region scores exactly `0.0`; this function never panics.
pub fn score(region: &DynamicImage) -> f32 {
    if region.width() == 0 || region.height() == 0 {
        return 0.0;
    }

    let gray = region.to_luma8();
    let total = (gray.width() as u64) * (gray.height() as u64);
    if total == 0 {
        return 0.0;
    }

    let inked = gray.pixels().filter(|p| p[0] < NEAR_WHITE).count();
    inked as f32 / total as f32
}
