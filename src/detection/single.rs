use image::{DynamicImage, RgbImage};

use crate::config::InspectConfig;
use crate::detection::{contours, draw, morphology, preprocessing, quality, threshold};
use crate::error::Result;
use crate::models::{Contour, DefectRegion, DetectionResult, DetectionStatus};
use crate::pipeline::Artifacts;

/// Everything one single-image detection produces
#[derive(Debug, Clone)]
pub struct SingleImageOutput {
    pub result: DetectionResult,
    /// Working-size copy with boxes and contour outlines drawn on it
    pub annotated: RgbImage,
    pub artifacts: Artifacts,
    /// Contours that passed the area filter but had no usable perimeter
    pub skipped: usize,
}

/// Contours surviving the area filter, measured; degenerate ones are counted, not kept
pub fn measure_regions(contours: &[Contour]) -> (Vec<DefectRegion>, usize) {
    let mut regions = Vec::new();
    let mut skipped = 0;

    for contour in contours {
        let area = contours::contour_area(contour);
        let perimeter = contours::arc_length(contour, true);
        let Some(circularity) = contours::circularity(area, perimeter) else {
            skipped += 1;
            continue;
        };

        regions.push(DefectRegion {
            bbox: contours::bounding_rect(contour),
            area,
            perimeter,
            circularity,
            contour: contour.clone(),
        });
    }

    (regions, skipped)
}

/// Draw every region (box, outline and area label) onto a copy of the working image
pub fn annotate(base: &RgbImage, regions: &[DefectRegion]) -> RgbImage {
    let mut out = base.clone();
    for region in regions {
        draw::draw_box(&mut out, &region.bbox, draw::BOX_COLOR);
        draw::draw_contour(&mut out, &region.contour, draw::CONTOUR_COLOR);
        draw::draw_label(&mut out, &region.bbox, &region.label(), draw::LABEL_COLOR);
    }
    out
}

/// Threshold-and-contour detection on one image.
///
/// The caller's image is never modified; every stage works on its own buffer.
pub fn detect(img: &DynamicImage, config: &InspectConfig) -> Result<SingleImageOutput> {
    config.validate()?;

    let (working, gray) = preprocessing::prepare(img, config.working_size)?;
    let image_quality = quality::assess_quality(&gray);

    let binary = threshold::binarize(&gray, config.threshold)?;
    let cleaned = morphology::clean(&binary.mask, &config.morphology)?;

    let all_contours = contours::extract_contours(&cleaned);
    let kept = contours::filter_by_area(&all_contours, config.min_area);
    let (defects, skipped) = measure_regions(&kept);

    let annotated = annotate(&working, &defects);
    let (confidence_score, confidence) = quality::confidence(&defects, &image_quality);

    let status = if defects.is_empty() {
        DetectionStatus::NoDefect
    } else {
        DetectionStatus::DefectDetected
    };

    let mut artifacts = Artifacts::new();
    artifacts.push_rgb("resized", &working);
    artifacts.push_gray("grayscale", &gray);
    artifacts.push_gray("threshold", &binary.mask);
    artifacts.push_gray("morphology", &cleaned);
    artifacts.push_rgb("detections", &annotated);

    Ok(SingleImageOutput {
        result: DetectionResult {
            status,
            count: defects.len(),
            defects,
            confidence,
            confidence_score,
            quality: image_quality,
        },
        annotated,
        artifacts,
        skipped,
    })
}

