use image::{GrayImage, Luma};

use crate::config::{KernelShape, MorphOp, MorphologyConfig};
use crate::error::{InspectError, Result};

/// Structuring element as a list of offsets from its anchor (the kernel center).
///
/// imageproc's `Norm`-based erode/dilate only give squares and diamonds, so the
/// ellipse is rasterized here row by row the way OpenCV builds `MORPH_ELLIPSE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuringElement {
    size: u32,
    offsets: Vec<(i32, i32)>,
}

impl StructuringElement {
    pub fn new(shape: KernelShape, size: u32) -> Result<Self> {
        if size == 0 {
            return Err(InspectError::invalid_config("kernel size must be positive"));
        }

        let anchor = (size / 2) as i32;
        let mut offsets = Vec::new();

        for row in 0..size as i32 {
            let (start, end) = match shape {
                KernelShape::Rect => (0, size as i32),
                KernelShape::Ellipse => {
                    let dy = row - anchor;
                    if anchor == 0 {
                        (0, size as i32)
                    } else {
                        let r2 = (anchor * anchor) as f64;
                        let t = ((r2 - (dy * dy) as f64) / r2).max(0.0);
                        let dx = (anchor as f64 * t.sqrt()).round() as i32;
                        ((anchor - dx).max(0), (anchor + dx + 1).min(size as i32))
                    }
                }
            };
            for col in start..end {
                offsets.push((col - anchor, row - anchor));
            }
        }

        Ok(Self { size, offsets })
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Kernel as a 0/1 grid, row-major
    pub fn to_grid(&self) -> Vec<Vec<u8>> {
        let anchor = (self.size / 2) as i32;
        let mut grid = vec![vec![0u8; self.size as usize]; self.size as usize];
        for &(dx, dy) in &self.offsets {
            grid[(dy + anchor) as usize][(dx + anchor) as usize] = 1;
        }
        grid
    }

    /// Min (erode) or max (dilate) over the in-bounds neighbourhood.
    /// Out-of-image pixels are skipped, so borders neither erode nor grow.
    fn apply(&self, img: &GrayImage, take_max: bool) -> GrayImage {
        let (width, height) = img.dimensions();
        GrayImage::from_fn(width, height, |x, y| {
            let mut acc = if take_max { u8::MIN } else { u8::MAX };
            for &(dx, dy) in &self.offsets {
                let nx = x as i64 + dx as i64;
                let ny = y as i64 + dy as i64;
                if nx < 0 || ny < 0 || nx >= width as i64 || ny >= height as i64 {
                    continue;
                }
                let v = img.get_pixel(nx as u32, ny as u32)[0];
                acc = if take_max { acc.max(v) } else { acc.min(v) };
            }
            Luma([acc])
        })
    }
}

pub fn erode(img: &GrayImage, element: &StructuringElement) -> GrayImage {
    element.apply(img, false)
}

pub fn dilate(img: &GrayImage, element: &StructuringElement) -> GrayImage {
    element.apply(img, true)
}

/// Erosion then dilation: removes bright specks smaller than the kernel
pub fn open(img: &GrayImage, element: &StructuringElement) -> GrayImage {
    dilate(&erode(img, element), element)
}

/// Dilation then erosion: fills dark gaps smaller than the kernel
pub fn close(img: &GrayImage, element: &StructuringElement) -> GrayImage {
    erode(&dilate(img, element), element)
}

/// Apply the configured ops in order
pub fn clean(mask: &GrayImage, config: &MorphologyConfig) -> Result<GrayImage> {
    let element = StructuringElement::new(config.shape, config.size)?;
    let mut out = mask.clone();
    for op in &config.ops {
        out = match op {
            MorphOp::Open => open(&out, &element),
            MorphOp::Close => close(&out, &element),
        };
    }
    Ok(out)
}
