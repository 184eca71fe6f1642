use image::{DynamicImage, GrayImage, Luma, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

use crate::config::WorkingSize;
use crate::detection::{contours, draw, preprocessing, threshold};
use crate::error::Result;
use crate::models::{AnnotationBox, BoundingBox};
use crate::pipeline::Artifacts;

/// Shape measurements of one mask contour
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct ContourStats {
    pub bbox: BoundingBox,
    pub area: f64,
    pub perimeter: f64,
}

/// Cropped region for one annotation box
#[derive(Debug, Clone)]
pub struct Roi {
    /// 1-based position of the box in the annotation
    pub number: usize,
    pub bbox: BoundingBox,
    pub image: RgbImage,
}

#[derive(Debug, Clone)]
pub struct Localization {
    /// `(working_w / native_w, working_h / native_h)`
    pub scale: (f64, f64),
    pub scaled_boxes: Vec<AnnotationBox>,
    pub mask: GrayImage,
    pub mask_pixels: u64,
    pub mask_percentage: f64,
    /// Overlapping boxes come back as a single merged contour
    pub contours: Vec<ContourStats>,
    pub annotated: RgbImage,
    pub rois: Vec<Roi>,
    /// 1-based numbers of boxes whose crop was empty
    pub skipped: Vec<usize>,
    pub artifacts: Artifacts,
}

/// Result of a localization call; an annotation with no boxes is not an error
#[derive(Debug, Clone)]
pub enum LocalizeOutcome {
    NoBoxes,
    Localized(Box<Localization>),
}

impl LocalizeOutcome {
    pub fn localization(&self) -> Option<&Localization> {
        match self {
            Self::Localized(loc) => Some(loc.as_ref()),
            Self::NoBoxes => None,
        }
    }
}

/// Scale factors from a native size to the working size
pub fn scale_factors(native: (u32, u32), working: WorkingSize) -> (f64, f64) {
    (
        working.width as f64 / native.0 as f64,
        working.height as f64 / native.1 as f64,
    )
}

/// Fill every box (corners inclusive) as 255 on a zero mask; overlaps just union
pub fn rasterize_boxes(boxes: &[AnnotationBox], width: u32, height: u32) -> GrayImage {
    let mut mask = GrayImage::new(width, height);
    for b in boxes {
        let inclusive = AnnotationBox::new(
            b.x_min,
            b.y_min,
            b.x_max.saturating_add(1),
            b.y_max.saturating_add(1),
        );
        if let Some(area) = inclusive.clamp_to(width, height) {
            let rect = Rect::at(area.x as i32, area.y as i32).of_size(area.width, area.height);
            draw_filled_rect_mut(&mut mask, rect, Luma([255u8]));
        }
    }
    mask
}

/// Crop `[x_min, x_max) x [y_min, y_max)` clamped to the image; `None` if nothing is left
pub fn crop_roi(img: &RgbImage, b: &AnnotationBox) -> Option<(BoundingBox, RgbImage)> {
    let area = b.clamp_to(img.width(), img.height())?;
    let roi = image::imageops::crop_imm(img, area.x, area.y, area.width, area.height).to_image();
    Some((area, roi))
}

/// Localize ground-truth boxes on a working-size copy of `img`.
///
/// `boxes` are in the image's native resolution.
pub fn localize(
    img: &DynamicImage,
    boxes: &[AnnotationBox],
    working: WorkingSize,
) -> Result<LocalizeOutcome> {
    let rgb = preprocessing::to_rgb(img)?;
    if boxes.is_empty() {
        return Ok(LocalizeOutcome::NoBoxes);
    }

    let scale = scale_factors(rgb.dimensions(), working);
    let resized = preprocessing::resize_to_working(&rgb, working)?;

    let scaled_boxes: Vec<AnnotationBox> =
        boxes.iter().map(|b| b.scaled(scale.0, scale.1)).collect();

    let mask = rasterize_boxes(&scaled_boxes, working.width, working.height);
    let mask_pixels = threshold::count_nonzero(&mask);
    let mask_percentage = threshold::nonzero_percentage(&mask);

    let contour_stats = contours::extract_contours(&mask)
        .iter()
        .map(|c| ContourStats {
            bbox: contours::bounding_rect(c),
            area: contours::contour_area(c),
            perimeter: contours::arc_length(c, true),
        })
        .collect();

    let mut annotated = resized.clone();
    let mut rois = Vec::new();
    let mut skipped = Vec::new();

    for (idx, b) in scaled_boxes.iter().enumerate() {
        let number = idx + 1;

        if let Some(visible) = b.clamp_to(working.width, working.height) {
            draw::draw_box(&mut annotated, &visible, draw::BOX_COLOR);
            let label = format!("Defect {}", number);
            draw::draw_label(&mut annotated, &visible, &label, draw::LABEL_COLOR);
        }

        match crop_roi(&resized, b) {
            Some((bbox, image)) => rois.push(Roi { number, bbox, image }),
            None => skipped.push(number),
        }
    }

    let mut artifacts = Artifacts::new();
    artifacts.push_rgb("original_resized", &resized);
    artifacts.push_gray("defect_mask", &mask);
    artifacts.push_rgb("bounding_boxes", &annotated);

    Ok(LocalizeOutcome::Localized(Box::new(Localization {
        scale,
        scaled_boxes,
        mask,
        mask_pixels,
        mask_percentage,
        contours: contour_stats,
        annotated,
        rois,
        skipped,
        artifacts,
    })))
}
