//! Flat-file result sink: an append-only delimited log plus one output image per call.
//!
//! Nothing in here can change a detection outcome; every function returns its
//! own `Result` for the caller to report.

use image::RgbImage;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use time::macros::format_description;

use crate::error::{InspectError, Result};
use crate::models::DetectionResult;

pub const LOG_HEADER: [&str; 4] = ["Timestamp", "Status", "Defect_Count", "Details"];

/// One row of the result log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub timestamp: String,
    pub status: String,
    pub count: usize,
    pub details: String,
}

impl LogRecord {
    pub fn from_result(result: &DetectionResult, at: OffsetDateTime) -> Self {
        Self {
            timestamp: log_timestamp(at),
            status: result.status.to_string(),
            count: result.count,
            details: result.details(),
        }
    }

    fn to_line(&self) -> String {
        let count = self.count.to_string();
        let fields = [
            self.timestamp.as_str(),
            self.status.as_str(),
            count.as_str(),
            self.details.as_str(),
        ];
        join_fields(&fields)
    }
}

/// Append-only log; the header row is written once, when the file is new or empty
#[derive(Debug, Clone)]
pub struct ResultLog {
    path: PathBuf,
}

impl ResultLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, record: &LogRecord) -> Result<()> {
        self.try_append(record)
            .map_err(|e| InspectError::persistence(self.path.display().to_string(), e))
    }

    pub fn append_result(&self, result: &DetectionResult) -> Result<()> {
        self.append(&LogRecord::from_result(result, now()))
    }

    fn try_append(&self, record: &LogRecord) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let needs_header = std::fs::metadata(&self.path).map(|m| m.len() == 0).unwrap_or(true);

        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        if needs_header {
            writeln!(file, "{}", join_fields(&LOG_HEADER))?;
        }
        writeln!(file, "{}", record.to_line())?;
        Ok(())
    }
}

/// Write the annotated image as `defect_result_YYYYMMDD_HHMMSS_xxxxxxxx.png`.
///
/// The random suffix keeps two calls in the same second from overwriting each other.
pub fn save_result_image(dir: &Path, image: &RgbImage) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .map_err(|e| InspectError::persistence(dir.display().to_string(), e))?;

    let stamp = file_timestamp(now());
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    let path = dir.join(format!("defect_result_{}_{}.png", stamp, &suffix[..8]));

    image
        .save(&path)
        .map_err(|e| InspectError::persistence(path.display().to_string(), e))?;
    Ok(path)
}

/// Local time when the offset is known, UTC otherwise
pub fn now() -> OffsetDateTime {
    OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
}

pub fn log_timestamp(at: OffsetDateTime) -> String {
    at.format(format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"))
        .unwrap_or_default()
}

fn file_timestamp(at: OffsetDateTime) -> String {
    at.format(format_description!("[year][month][day]_[hour][minute][second]"))
        .unwrap_or_default()
}

fn join_fields(fields: &[&str]) -> String {
    fields.iter().map(|f| quote_field(f)).collect::<Vec<_>>().join(",")
}

/// Quote a field containing the delimiter, a quote or a line break
fn quote_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
