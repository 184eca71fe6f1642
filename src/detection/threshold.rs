use image::{GrayImage, Luma};
use imageproc::contrast::otsu_level;

use crate::config::{ThresholdConfig, ThresholdMode};
use crate::detection::preprocessing::ensure_not_empty;
use crate::error::Result;

/// Binary mask plus the cutoff that produced it
#[derive(Debug, Clone)]
pub struct Binarized {
    pub mask: GrayImage,
    /// Cutoff actually applied (the Otsu level in automatic modes)
    pub level: u8,
}

/// Split a grayscale image into {0, 255}.
///
/// `Binary` sets pixels strictly above the level to 255; the inverted modes
/// flip that. The Otsu modes pick the level that minimizes the combined
/// intra-class variance of the histogram.
pub fn binarize(gray: &GrayImage, config: ThresholdConfig) -> Result<Binarized> {
    ensure_not_empty(gray.width(), gray.height())?;

    let level = if config.mode.is_automatic() {
        otsu_level(gray)
    } else {
        config.value
    };

    let (fg, bg) = if config.mode.is_inverted() { (0u8, 255u8) } else { (255u8, 0u8) };

    let mask = GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        if gray.get_pixel(x, y)[0] > level {
            Luma([fg])
        } else {
            Luma([bg])
        }
    });

    Ok(Binarized { mask, level })
}

/// Fixed-threshold shortcut used by the single-image pipeline
pub fn binarize_fixed(gray: &GrayImage, threshold: u8) -> Result<GrayImage> {
    Ok(binarize(gray, ThresholdConfig { value: threshold, mode: ThresholdMode::Binary })?.mask)
}

/// Number of non-zero pixels
pub fn count_nonzero(mask: &GrayImage) -> u64 {
    mask.pixels().filter(|p| p[0] != 0).count() as u64
}

/// Share of non-zero pixels, in percent
pub fn nonzero_percentage(mask: &GrayImage) -> f64 {
    let total = mask.width() as u64 * mask.height() as u64;
    if total == 0 {
        return 0.0;
    }
    count_nonzero(mask) as f64 / total as f64 * 100.0
}
