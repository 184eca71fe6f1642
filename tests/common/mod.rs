mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from pcbinspect for tests
pub use pcbinspect::{
    AnnotationBox, BoundingBox, ConfidenceCategory, Contour, DetectionStatus, InspectConfig,
    InspectError, LocalizeOutcome, MorphologyConfig, Point, ThresholdMode, WorkingSize,
};
