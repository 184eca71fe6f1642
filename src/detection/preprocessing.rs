use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, RgbImage};

use crate::config::WorkingSize;
use crate::error::{InspectError, Result};

/// Normalize any channel layout (gray, gray+alpha, RGB, RGBA, 16-bit) to 3-channel RGB.
/// Alpha is dropped, gray is replicated.
pub fn to_rgb(img: &DynamicImage) -> Result<RgbImage> {
    ensure_not_empty(img.width(), img.height())?;
    Ok(img.to_rgb8())
}

/// Resize to the working resolution, ignoring aspect ratio.
/// Bilinear sampling; an image already at the working size is copied as-is.
pub fn resize_to_working(img: &RgbImage, size: WorkingSize) -> Result<RgbImage> {
    ensure_not_empty(img.width(), img.height())?;
    if size.width == 0 || size.height == 0 {
        return Err(InspectError::invalid_config("working size must be non-zero"));
    }

    if img.dimensions() == (size.width, size.height) {
        return Ok(img.clone());
    }

    Ok(image::imageops::resize(img, size.width, size.height, FilterType::Triangle))
}

/// Convert image to grayscale
pub fn to_grayscale(img: &RgbImage) -> GrayImage {
    DynamicImage::ImageRgb8(img.clone()).to_luma8()
}

/// Channel normalization, resize and grayscale in one go.
/// Returns the resized color image too since the detectors draw on it.
pub fn prepare(img: &DynamicImage, size: WorkingSize) -> Result<(RgbImage, GrayImage)> {
    let rgb = to_rgb(img)?;
    let resized = resize_to_working(&rgb, size)?;
    let gray = to_grayscale(&resized);
    Ok((resized, gray))
}

pub(crate) fn ensure_not_empty(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(InspectError::EmptyImage { width, height });
    }
    Ok(())
}
