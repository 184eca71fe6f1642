pub mod annotation;
pub mod config;
pub mod detection;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod report;

pub use config::{
    InspectConfig, KernelShape, MorphOp, MorphologyConfig, ThresholdConfig, ThresholdMode,
    WorkingSize,
};
pub use detection::{DifferenceOutput, Inspector, Localization, LocalizeOutcome, SingleImageOutput};
pub use error::{InspectError, Result};
pub use models::{
    AnnotationBox, BoundingBox, ConfidenceCategory, Contour, DefectRegion, DetectionResult,
    DetectionStatus, ImageQuality, Point,
};
pub use pipeline::{Artifact, Artifacts, DebugConfig};
