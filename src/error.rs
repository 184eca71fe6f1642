//! Error types for inspection runs

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for inspection operations
pub type Result<T> = std::result::Result<T, InspectError>;

/// Failures an inspection call can report to its caller.
///
/// Empty outcomes (no defects, no annotation boxes) are not errors; they are
/// carried by the result types instead.
#[derive(Error, Debug)]
pub enum InspectError {
    /// Image could not be read or decoded
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    /// Input/output errors while reading inputs or writing artifacts
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Annotation file could not be parsed
    #[error("invalid annotation{}: {reason}", location(.path))]
    Annotation {
        path: Option<PathBuf>,
        reason: String,
    },

    /// Invalid configuration or parameters
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Image has no pixels
    #[error("image is empty ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    /// Result log or output image could not be written
    #[error("failed to persist {what}: {reason}")]
    Persistence { what: String, reason: String },
}

impl InspectError {
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub fn annotation<S: Into<String>>(reason: S) -> Self {
        Self::Annotation {
            path: None,
            reason: reason.into(),
        }
    }

    /// Attach the file an annotation error came from
    pub fn with_path(self, file: impl Into<PathBuf>) -> Self {
        match self {
            Self::Annotation { reason, .. } => Self::Annotation {
                path: Some(file.into()),
                reason,
            },
            other => other,
        }
    }

    pub fn persistence(what: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Persistence {
            what: what.into(),
            reason: reason.to_string(),
        }
    }

    /// True for failures caused by the caller's inputs rather than by the environment
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::Decode(_) | Self::Annotation { .. } | Self::EmptyImage { .. }
        )
    }
}

fn location(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| format!(" in {}", p.display()))
        .unwrap_or_default()
}
