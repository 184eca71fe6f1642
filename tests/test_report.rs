//! Tests for the flat-file result sink and debug artifact export.
//!
//! Tests cover:
//! - Header written once, one record appended per call
//! - Field quoting
//! - Uniquely named result images
//! - Debug directory rules and artifact file names

mod common;

use pcbinspect::detection::single;
use pcbinspect::report::{log_timestamp, save_result_image, LogRecord, ResultLog};
use pcbinspect::DebugConfig;

use common::*;

fn read_lines(path: &std::path::Path) -> anyhow::Result<Vec<String>> {
    Ok(std::fs::read_to_string(path)?.lines().map(str::to_string).collect())
}

#[test]
fn test_header_is_written_once() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let log = ResultLog::new(dir.path().join("logs").join("prediction_log.csv"));

    let clean = single::detect(&dynamic(gray_board(100)), &InspectConfig::single_image())?.result;
    let defective = single::detect(
        &dynamic(board_with_circle(100, (320, 240), 30, 200)),
        &InspectConfig::single_image(),
    )?
    .result;

    log.append_result(&clean)?;
    log.append_result(&defective)?;

    let lines = read_lines(log.path())?;
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "Timestamp,Status,Defect_Count,Details");
    assert!(lines[1].ends_with(",NO DEFECT,0,No defects"), "got {}", lines[1]);
    assert!(lines[2].ends_with(",DEFECT DETECTED,1,1 defect(s) detected"), "got {}", lines[2]);
    Ok(())
}

#[test]
fn test_existing_log_is_appended_to() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let path = dir.path().join("log.csv");
    std::fs::write(&path, "Timestamp,Status,Defect_Count,Details\nold,NO DEFECT,0,No defects\n")?;

    let record = LogRecord {
        timestamp: "2024-01-02 03:04:05".to_string(),
        status: "DEFECT DETECTED".to_string(),
        count: 2,
        details: "2 defect(s) detected".to_string(),
    };
    ResultLog::new(&path).append(&record)?;

    let lines = read_lines(&path)?;
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[2], "2024-01-02 03:04:05,DEFECT DETECTED,2,2 defect(s) detected");
    Ok(())
}

#[test]
fn test_fields_with_delimiters_are_quoted() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let path = dir.path().join("log.csv");

    let record = LogRecord {
        timestamp: "t".to_string(),
        status: "NO DEFECT".to_string(),
        count: 0,
        details: "shorts, \"opens\"".to_string(),
    };
    ResultLog::new(&path).append(&record)?;

    let lines = read_lines(&path)?;
    assert_eq!(lines[1], "t,NO DEFECT,0,\"shorts, \"\"opens\"\"\"");
    Ok(())
}

#[test]
fn test_log_timestamp_format() {
    let at = time::macros::datetime!(2024-03-09 07:05:01 UTC);
    assert_eq!(log_timestamp(at), "2024-03-09 07:05:01");
}

#[test]
fn test_result_images_get_distinct_names() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let img = gray_board(100);

    let first = save_result_image(dir.path(), &img)?;
    let second = save_result_image(dir.path(), &img)?;

    assert_ne!(first, second);
    for path in [&first, &second] {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        assert!(name.starts_with("defect_result_") && name.ends_with(".png"), "{}", name);
        assert!(path.exists());
    }
    Ok(())
}

#[test]
fn test_unwritable_log_reports_persistence_error() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    // A directory where the log file should be
    let path = dir.path().join("taken");
    std::fs::create_dir(&path)?;

    let result = single::detect(&dynamic(gray_board(100)), &InspectConfig::single_image())?.result;
    let err = ResultLog::new(&path).append_result(&result).unwrap_err();
    assert!(matches!(err, InspectError::Persistence { .. }));
    // The detection itself is unaffected
    assert_eq!(result.status, DetectionStatus::NoDefect);
    Ok(())
}

#[test]
fn test_debug_dir_must_be_empty() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    std::fs::write(dir.path().join("leftover.txt"), "x")?;

    let err = DebugConfig::new(dir.path().to_path_buf()).unwrap_err();
    assert!(matches!(err, InspectError::InvalidConfig(_)));
    Ok(())
}

#[test]
fn test_artifacts_are_saved_in_stage_order() -> anyhow::Result<()> {
    let dir = tempfile::TempDir::new()?;
    let debug = DebugConfig::new(dir.path().join("debug"))?;

    let output = single::detect(&dynamic(gray_board(100)), &InspectConfig::single_image())?;
    let paths = debug.save_artifacts(&output.artifacts)?;

    let names: Vec<String> = paths
        .iter()
        .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(str::to_string))
        .collect();
    assert_eq!(
        names,
        vec!["01_resized.png", "02_grayscale.png", "03_threshold.png", "04_morphology.png", "05_detections.png"]
    );
    assert!(paths.iter().all(|p| p.exists()));
    Ok(())
}
