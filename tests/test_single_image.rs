//! End-to-end tests for the single-image detector.
//!
//! Tests cover:
//! - Working-size normalization for any input size or channel layout
//! - Clean boards (no defects) and boards with an injected dark blob
//! - Confidence clipping on degenerate images
//! - Caller images left untouched

mod common;

use image::{DynamicImage, GrayImage, Luma, Rgba, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use pcbinspect::detection::preprocessing::{prepare, resize_to_working, to_rgb};
use pcbinspect::detection::{quality, single};
use pcbinspect::Inspector;

use common::*;

#[test]
fn test_resize_always_yields_working_size() -> anyhow::Result<()> {
    let size = WorkingSize::default();
    for (w, h) in [(1, 1), (37, 911), (640, 480), (1920, 1080), (300, 300)] {
        let img = DynamicImage::ImageRgb8(image::RgbImage::new(w, h));
        let resized = resize_to_working(&to_rgb(&img)?, size)?;
        assert_eq!(resized.dimensions(), (640, 480), "input {}x{}", w, h);
    }

    let custom = WorkingSize::new(200, 100);
    let (rgb, gray) = prepare(&DynamicImage::ImageLuma8(GrayImage::new(13, 7)), custom)?;
    assert_eq!(rgb.dimensions(), (200, 100));
    assert_eq!(gray.dimensions(), (200, 100));
    Ok(())
}

#[test]
fn test_clean_gray_board_has_no_defects() -> anyhow::Result<()> {
    let board = dynamic(gray_board(100));
    let output = single::detect(&board, &InspectConfig::single_image())?;
    let result = &output.result;

    assert_eq!(result.count, 0);
    assert_eq!(result.status, DetectionStatus::NoDefect);
    assert!(result.defects.is_empty());
    assert!(
        matches!(result.confidence, ConfidenceCategory::High | ConfidenceCategory::VeryHigh),
        "got {:?} ({:.1})",
        result.confidence,
        result.confidence_score
    );
    assert_eq!(result.details(), "No defects");
    Ok(())
}

#[test]
fn test_dark_circle_is_found() -> anyhow::Result<()> {
    let board = dynamic(board_with_circle(100, (320, 240), 30, 50));
    // 127 puts both intensities on the same side, so split between them and mark dark pixels
    let config = InspectConfig::single_image()
        .with_threshold(75)
        .with_threshold_mode(ThresholdMode::BinaryInverted);

    let output = single::detect(&board, &config)?;
    let result = &output.result;

    assert!(result.count >= 1);
    assert_eq!(result.status, DetectionStatus::DefectDetected);

    let expected = std::f64::consts::PI * 30.0 * 30.0;
    let hit = result
        .defects
        .iter()
        .find(|d| d.bbox.contains(320, 240))
        .expect("a defect should cover the circle centre");
    assert!(
        (hit.area - expected).abs() / expected < 0.10,
        "area {:.1} not within 10% of {:.1}",
        hit.area,
        expected
    );
    assert!(hit.circularity > 0.7 && hit.circularity <= 1.0);
    assert_eq!(result.details(), format!("{} defect(s) detected", result.count));
    Ok(())
}

#[test]
fn test_defects_are_listed_in_discovery_order() -> anyhow::Result<()> {
    let mut img = board_with_circle(100, (500, 400), 20, 40);
    imageproc::drawing::draw_filled_circle_mut(&mut img, (100, 80), 20, image::Rgb([40, 40, 40]));
    let config = InspectConfig::single_image()
        .with_threshold(70)
        .with_threshold_mode(ThresholdMode::BinaryInverted);

    let result = single::detect(&dynamic(img), &config)?.result;
    assert_eq!(result.count, 2);
    assert!(result.defects[0].bbox.contains(100, 80));
    assert!(result.defects[1].bbox.contains(500, 400));
    Ok(())
}

#[test]
fn test_small_blobs_are_filtered_by_min_area() -> anyhow::Result<()> {
    // Radius 3 disc has an area well under 50
    let board = dynamic(board_with_circle(100, (320, 240), 3, 200));
    let output = single::detect(&board, &InspectConfig::single_image())?;
    assert_eq!(output.result.count, 0);

    let big = dynamic(board_with_circle(100, (320, 240), 12, 200));
    let output = single::detect(&big, &InspectConfig::single_image())?;
    assert_eq!(output.result.count, 1);
    Ok(())
}

#[test]
fn test_confidence_is_clipped_for_degenerate_images() -> anyhow::Result<()> {
    let checker = image::RgbImage::from_fn(640, 480, |x, y| {
        if (x + y) % 2 == 0 { image::Rgb([255, 255, 255]) } else { image::Rgb([0, 0, 0]) }
    });

    for img in [gray_board(0), gray_board(255), checker] {
        let result = single::detect(&dynamic(img), &InspectConfig::single_image())?.result;
        assert!(
            (0.0..=100.0).contains(&result.confidence_score),
            "score {} out of range",
            result.confidence_score
        );
        assert!((0.0..=100.0).contains(&result.quality.score));
    }
    Ok(())
}

#[test]
fn test_quality_penalties() {
    // Flat mid-gray: no sharpness, low contrast
    let flat = GrayImage::from_pixel(64, 64, Luma([100]));
    let q = quality::assess_quality(&flat);
    assert_eq!(q.laplacian_variance, 0.0);
    assert_eq!(q.score, 0.0);
    assert!((q.mean_brightness - 100.0).abs() < 1e-9);

    // Sharp checkerboard saturates the sharpness term and has high contrast
    let sharp = GrayImage::from_fn(64, 64, |x, y| Luma([if (x + y) % 2 == 0 { 200 } else { 60 }]));
    let q = quality::assess_quality(&sharp);
    assert!(q.laplacian_variance > 1000.0);
    assert!((q.score - 100.0).abs() < 1e-9);

    // Same pattern but very dark: lighting penalty applies
    let dark = GrayImage::from_fn(64, 64, |x, y| Luma([if (x + y) % 2 == 0 { 60 } else { 0 }]));
    let q = quality::assess_quality(&dark);
    assert!((q.score - 95.0).abs() < 1e-9);
}

#[test]
fn test_confidence_boost_and_categories() {
    let q = quality::assess_quality(&GrayImage::from_pixel(8, 8, Luma([100])));
    let (score, category) = quality::confidence(&[], &q);
    // Clean board: 98 plus no quality, boosted past 100 and capped
    assert_eq!(score, 100.0);
    assert_eq!(category, ConfidenceCategory::VeryHigh);

    assert_eq!(ConfidenceCategory::from_score(85.0), ConfidenceCategory::VeryHigh);
    assert_eq!(ConfidenceCategory::from_score(84.9), ConfidenceCategory::High);
    assert_eq!(ConfidenceCategory::from_score(70.0), ConfidenceCategory::High);
    assert_eq!(ConfidenceCategory::from_score(50.0), ConfidenceCategory::Medium);
    assert_eq!(ConfidenceCategory::from_score(49.9), ConfidenceCategory::Low);
}

#[test]
fn test_accepts_rgba_and_grayscale_input() -> anyhow::Result<()> {
    let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(320, 240, Rgba([100, 100, 100, 7])));
    let gray = DynamicImage::ImageLuma8(GrayImage::from_pixel(1280, 960, Luma([100])));

    for img in [rgba, gray] {
        let output = single::detect(&img, &InspectConfig::single_image())?;
        assert_eq!(output.annotated.dimensions(), (640, 480));
        assert_eq!(output.result.status, DetectionStatus::NoDefect);
    }
    Ok(())
}

#[test]
fn test_caller_image_is_not_modified() -> anyhow::Result<()> {
    let original = dynamic(board_with_circle(100, (320, 240), 30, 200));
    let before = original.clone();

    let output = Inspector::new().detect(&original)?;
    assert_eq!(original, before);
    // Annotation goes onto the working copy only
    assert_ne!(output.annotated, before.to_rgb8());
    assert_eq!(
        output.artifacts.names(),
        vec!["resized", "grayscale", "threshold", "morphology", "detections"]
    );
    Ok(())
}

#[test]
fn test_invalid_config_is_reported() {
    let board = dynamic(gray_board(100));
    let err = single::detect(&board, &InspectConfig::single_image().with_threshold(10)).unwrap_err();
    assert!(matches!(err, InspectError::InvalidConfig(_)));

    let err = single::detect(&board, &InspectConfig::single_image().with_min_area(5.0)).unwrap_err();
    assert!(matches!(err, InspectError::InvalidConfig(_)));
}

#[test]
fn test_empty_image_is_an_input_error() {
    let empty = DynamicImage::ImageRgb8(image::RgbImage::new(0, 0));
    let err = single::detect(&empty, &InspectConfig::single_image()).unwrap_err();
    assert!(err.is_input_error());
}

#[test]
fn test_defect_on_the_image_edge_is_found() -> anyhow::Result<()> {
    let mut img = gray_board(100);
    draw_filled_rect_mut(&mut img, Rect::at(0, 100).of_size(40, 40), image::Rgb([220, 220, 220]));

    let result = single::detect(&dynamic(img), &InspectConfig::single_image())?.result;
    assert_eq!(result.count, 1);
    assert_eq!(result.defects[0].bbox.x, 0);
    assert!(result.defects[0].bbox.contains(20, 120));
    Ok(())
}

#[test]
fn test_area_label_is_drawn_above_the_box() -> anyhow::Result<()> {
    let board = board_with_circle(100, (320, 240), 30, 200);
    let output = single::detect(&dynamic(board.clone()), &InspectConfig::single_image())?;
    let bbox = output.result.defects[0].bbox;

    // Strip between the label baseline gap and the box outline
    let changed = (bbox.y - 20..bbox.y - 1)
        .flat_map(|y| (bbox.x..bbox.x + 60).map(move |x| (x, y)))
        .filter(|&(x, y)| output.annotated.get_pixel(x, y) != board.get_pixel(x, y))
        .count();
    assert!(changed > 0, "no label pixels above {:?}", bbox);
    Ok(())
}
