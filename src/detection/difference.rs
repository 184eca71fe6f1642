use image::{DynamicImage, GrayImage, Luma, RgbImage};

use crate::config::{InspectConfig, ThresholdConfig, ThresholdMode};
use crate::detection::{contours, morphology, preprocessing, single, threshold};
use crate::error::Result;
use crate::models::DefectRegion;
use crate::pipeline::Artifacts;

/// Min / max / mean of the raw difference map
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct DiffStats {
    pub min: u8,
    pub max: u8,
    pub mean: f64,
}

#[derive(Debug, Clone)]
pub struct DifferenceOutput {
    pub template_gray: GrayImage,
    pub test_gray: GrayImage,
    /// `|test - template|` per pixel
    pub difference: GrayImage,
    pub threshold_mask: GrayImage,
    pub cleaned_mask: GrayImage,
    pub otsu_level: u8,
    pub diff_stats: DiffStats,
    pub defect_pixels_raw: u64,
    pub defect_pixels: u64,
    /// `nonzero / total * 100` over the cleaned mask
    pub defect_percentage: f64,
    /// Connected regions of the cleaned mask above the area threshold
    pub regions: Vec<DefectRegion>,
    /// Test image with the regions drawn on it
    pub annotated: RgbImage,
    pub artifacts: Artifacts,
}

impl DifferenceOutput {
    pub fn noise_pixels_removed(&self) -> u64 {
        self.defect_pixels_raw.saturating_sub(self.defect_pixels)
    }

    pub fn has_defects(&self) -> bool {
        self.defect_pixels > 0
    }
}

/// Per-pixel absolute difference of two equally sized grayscale images
pub fn absolute_difference(test: &GrayImage, template: &GrayImage) -> GrayImage {
    GrayImage::from_fn(test.width(), test.height(), |x, y| {
        let a = test.get_pixel(x, y)[0];
        let b = template.get_pixel(x, y)[0];
        Luma([a.abs_diff(b)])
    })
}

pub fn diff_stats(diff: &GrayImage) -> DiffStats {
    let mut min = u8::MAX;
    let mut max = u8::MIN;
    let mut sum: u64 = 0;
    for p in diff.pixels() {
        min = min.min(p[0]);
        max = max.max(p[0]);
        sum += p[0] as u64;
    }
    let n = diff.width() as u64 * diff.height() as u64;
    if n == 0 {
        return DiffStats { min: 0, max: 0, mean: 0.0 };
    }
    DiffStats { min, max, mean: sum as f64 / n as f64 }
}

/// Template-vs-test differencing.
///
/// Both images are resized independently to the working size (no feature
/// alignment), converted to grayscale, subtracted, Otsu-binarized and opened.
/// The threshold value and mode in `config` are ignored: the difference map is
/// always split with Otsu.
pub fn detect_difference(
    template: &DynamicImage,
    test: &DynamicImage,
    config: &InspectConfig,
) -> Result<DifferenceOutput> {
    config.validate()?;

    let (_, template_gray) = preprocessing::prepare(template, config.working_size)?;
    let (test_rgb, test_gray) = preprocessing::prepare(test, config.working_size)?;

    let difference = absolute_difference(&test_gray, &template_gray);
    let diff_stats = diff_stats(&difference);

    let binary = threshold::binarize(
        &difference,
        ThresholdConfig { value: 0, mode: ThresholdMode::Otsu },
    )?;
    let cleaned_mask = morphology::clean(&binary.mask, &config.morphology)?;

    let defect_pixels_raw = threshold::count_nonzero(&binary.mask);
    let defect_pixels = threshold::count_nonzero(&cleaned_mask);
    let defect_percentage = threshold::nonzero_percentage(&cleaned_mask);

    let all_contours = contours::extract_contours(&cleaned_mask);
    let kept = contours::filter_by_area(&all_contours, config.min_area);
    let (regions, _) = single::measure_regions(&kept);
    let annotated = single::annotate(&test_rgb, &regions);

    let mut artifacts = Artifacts::new();
    artifacts.push_gray("template_aligned", &template_gray);
    artifacts.push_gray("test_aligned", &test_gray);
    artifacts.push_gray("difference_raw", &difference);
    artifacts.push_gray("threshold_otsu", &binary.mask);
    artifacts.push_gray("noise_removed", &cleaned_mask);
    artifacts.push_rgb("defect_boxes", &annotated);

    Ok(DifferenceOutput {
        template_gray,
        test_gray,
        difference,
        threshold_mask: binary.mask,
        cleaned_mask,
        otsu_level: binary.level,
        diff_stats,
        defect_pixels_raw,
        defect_pixels,
        defect_percentage,
        regions,
        annotated,
        artifacts,
    })
}

/// 3x2 grid of the stages: template, test, difference / threshold, cleaned, boxes
pub fn overview(output: &DifferenceOutput) -> RgbImage {
    let (w, h) = output.test_gray.dimensions();
    let mut canvas = RgbImage::new(w * 3, h * 2);

    let tiles = [
        DynamicImage::ImageLuma8(output.template_gray.clone()).to_rgb8(),
        DynamicImage::ImageLuma8(output.test_gray.clone()).to_rgb8(),
        DynamicImage::ImageLuma8(output.difference.clone()).to_rgb8(),
        DynamicImage::ImageLuma8(output.threshold_mask.clone()).to_rgb8(),
        DynamicImage::ImageLuma8(output.cleaned_mask.clone()).to_rgb8(),
        output.annotated.clone(),
    ];

    for (i, tile) in tiles.iter().enumerate() {
        let col = (i % 3) as i64;
        let row = (i / 3) as i64;
        image::imageops::replace(&mut canvas, tile, col * w as i64, row * h as i64);
    }
    canvas
}
