//! Heuristic confidence model for the single-image detector.
//!
//! Nothing here is a calibrated probability. The weights and penalty
//! multipliers are fixed heuristics with no calibration data behind them.

use image::GrayImage;

use crate::models::{ConfidenceCategory, DefectRegion, ImageQuality};

/// Mean brightness outside this band counts as poor lighting
const BRIGHTNESS_BAND: (f64, f64) = (40.0, 210.0);
const LIGHTING_PENALTY: f64 = 0.95;
/// Standard deviation below this counts as low contrast
const MIN_CONTRAST: f64 = 15.0;
const CONTRAST_PENALTY: f64 = 0.9;

const DETECTION_WEIGHT: f64 = 0.75;
const QUALITY_WEIGHT: f64 = 0.25;
/// Detection term for a board with no defects
const CLEAN_BOARD_SCORE: f64 = 98.0;
const BOOST_ABOVE: f64 = 85.0;
const BOOST: f64 = 8.0;

/// Variance of the 4-neighbour Laplacian (reflect-101 borders)
pub fn laplacian_variance(gray: &GrayImage) -> f64 {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return 0.0;
    }

    let at = |x: i64, y: i64| -> f64 {
        let x = reflect101(x, width as i64);
        let y = reflect101(y, height as i64);
        gray.get_pixel(x as u32, y as u32)[0] as f64
    };

    let n = width as f64 * height as f64;
    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    for y in 0..height as i64 {
        for x in 0..width as i64 {
            let lap = at(x - 1, y) + at(x + 1, y) + at(x, y - 1) + at(x, y + 1) - 4.0 * at(x, y);
            sum += lap;
            sum_sq += lap * lap;
        }
    }

    let mean = sum / n;
    (sum_sq / n - mean * mean).max(0.0)
}

fn reflect101(i: i64, len: i64) -> i64 {
    if len == 1 {
        return 0;
    }
    let mut i = i;
    if i < 0 {
        i = -i;
    }
    if i >= len {
        i = 2 * (len - 1) - i;
    }
    i.clamp(0, len - 1)
}

/// Mean and population standard deviation of the intensities
pub fn brightness_and_contrast(gray: &GrayImage) -> (f64, f64) {
    let n = gray.width() as f64 * gray.height() as f64;
    if n == 0.0 {
        return (0.0, 0.0);
    }

    let (sum, sum_sq) = gray.pixels().fold((0.0, 0.0), |(s, sq), p| {
        let v = p[0] as f64;
        (s + v, sq + v * v)
    });
    let mean = sum / n;
    let var = (sum_sq / n - mean * mean).max(0.0);
    (mean, var.sqrt())
}

/// Sharpness-based quality score with lighting and contrast penalties
pub fn assess_quality(gray: &GrayImage) -> ImageQuality {
    let laplacian_variance = laplacian_variance(gray);
    let (mean_brightness, contrast) = brightness_and_contrast(gray);

    let mut score = (laplacian_variance / 30.0 * 25.0).min(100.0);
    if mean_brightness < BRIGHTNESS_BAND.0 || mean_brightness > BRIGHTNESS_BAND.1 {
        score *= LIGHTING_PENALTY;
    }
    if contrast < MIN_CONTRAST {
        score *= CONTRAST_PENALTY;
    }

    ImageQuality {
        laplacian_variance,
        mean_brightness,
        contrast,
        score: score.clamp(0.0, 100.0),
    }
}

/// Detection-quality term: weighted mean circularity, or the clean-board constant
pub fn detection_term(defects: &[DefectRegion]) -> f64 {
    if defects.is_empty() {
        return CLEAN_BOARD_SCORE;
    }
    let total: f64 = defects.iter().map(|d| (d.circularity * 100.0).min(100.0)).sum();
    total / defects.len() as f64 * DETECTION_WEIGHT
}

/// Overall confidence in [0, 100] and its category
pub fn confidence(defects: &[DefectRegion], quality: &ImageQuality) -> (f64, ConfidenceCategory) {
    let mut score = (detection_term(defects) + quality.score * QUALITY_WEIGHT).clamp(0.0, 100.0);
    if score > BOOST_ABOVE {
        score = (score + BOOST).min(100.0);
    }
    (score, ConfidenceCategory::from_score(score))
}
