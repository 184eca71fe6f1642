use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{InspectError, Result};

/// Documented range for a fixed binarization threshold
pub const THRESHOLD_RANGE: std::ops::RangeInclusive<u8> = 50..=200;

/// Documented range for the minimum defect area
pub const MIN_AREA_RANGE: std::ops::RangeInclusive<f64> = 10.0..=500.0;

/// Canonical size every image is resized to before pixel comparisons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingSize {
    pub width: u32,
    pub height: u32,
}

impl WorkingSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for WorkingSize {
    fn default() -> Self {
        Self { width: 640, height: 480 }
    }
}

/// How a grayscale image is split into foreground/background
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdMode {
    /// Pixels above the threshold become foreground
    Binary,
    /// Pixels at or below the threshold become foreground (dark defects)
    BinaryInverted,
    /// Threshold picked from the histogram, then `Binary`
    Otsu,
    /// Threshold picked from the histogram, then `BinaryInverted`
    OtsuInverted,
}

impl ThresholdMode {
    pub fn is_automatic(self) -> bool {
        matches!(self, Self::Otsu | Self::OtsuInverted)
    }

    pub fn is_inverted(self) -> bool {
        matches!(self, Self::BinaryInverted | Self::OtsuInverted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Fixed cutoff; ignored by the Otsu modes
    pub value: u8,
    pub mode: ThresholdMode,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            value: 127,
            mode: ThresholdMode::Binary,
        }
    }
}

/// Structuring element shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum KernelShape {
    Rect,
    Ellipse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MorphOp {
    /// Erosion then dilation
    Open,
    /// Dilation then erosion
    Close,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MorphologyConfig {
    pub shape: KernelShape,
    /// Kernel width and height in pixels
    pub size: u32,
    /// Applied in order
    pub ops: Vec<MorphOp>,
}

impl MorphologyConfig {
    /// Close-then-open with a 5x5 ellipse
    pub fn single_image() -> Self {
        Self {
            shape: KernelShape::Ellipse,
            size: 5,
            ops: vec![MorphOp::Close, MorphOp::Open],
        }
    }

    /// Open only, 3x3 rectangle; the difference map is already sparse
    pub fn template_difference() -> Self {
        Self {
            shape: KernelShape::Rect,
            size: 3,
            ops: vec![MorphOp::Open],
        }
    }
}

/// Parameters for one inspection call.
///
/// Passed by value into every detector; there is no global state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectConfig {
    pub working_size: WorkingSize,
    pub threshold: ThresholdConfig,
    /// Contours must be strictly larger than this to count as defects
    pub min_area: f64,
    pub morphology: MorphologyConfig,
}

impl Default for InspectConfig {
    fn default() -> Self {
        Self::single_image()
    }
}

impl InspectConfig {
    pub fn single_image() -> Self {
        Self {
            working_size: WorkingSize::default(),
            threshold: ThresholdConfig::default(),
            min_area: 50.0,
            morphology: MorphologyConfig::single_image(),
        }
    }

    pub fn template_difference() -> Self {
        Self {
            working_size: WorkingSize::default(),
            threshold: ThresholdConfig {
                value: 0,
                mode: ThresholdMode::Otsu,
            },
            min_area: 50.0,
            morphology: MorphologyConfig::template_difference(),
        }
    }

    pub fn with_working_size(mut self, width: u32, height: u32) -> Self {
        self.working_size = WorkingSize::new(width, height);
        self
    }

    pub fn with_threshold(mut self, value: u8) -> Self {
        self.threshold.value = value;
        self
    }

    pub fn with_threshold_mode(mut self, mode: ThresholdMode) -> Self {
        self.threshold.mode = mode;
        self
    }

    pub fn with_min_area(mut self, min_area: f64) -> Self {
        self.min_area = min_area;
        self
    }

    pub fn with_morphology(mut self, morphology: MorphologyConfig) -> Self {
        self.morphology = morphology;
        self
    }

    /// Load a JSON config; missing fields fall back to the single-image defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|e| {
            InspectError::invalid_config(format!("{}: {}", path.display(), e))
        })
    }

    /// Check every value against its documented range
    pub fn validate(&self) -> Result<()> {
        if self.working_size.width == 0 || self.working_size.height == 0 {
            return Err(InspectError::invalid_config(format!(
                "working size must be non-zero, got {}x{}",
                self.working_size.width, self.working_size.height
            )));
        }

        let fixed = !self.threshold.mode.is_automatic();
        if fixed && !THRESHOLD_RANGE.contains(&self.threshold.value) {
            return Err(InspectError::invalid_config(format!(
                "threshold {} outside {}..={}",
                self.threshold.value,
                THRESHOLD_RANGE.start(),
                THRESHOLD_RANGE.end()
            )));
        }

        if !MIN_AREA_RANGE.contains(&self.min_area) {
            return Err(InspectError::invalid_config(format!(
                "min area {} outside {}..={}",
                self.min_area,
                MIN_AREA_RANGE.start(),
                MIN_AREA_RANGE.end()
            )));
        }

        if self.morphology.size == 0 {
            return Err(InspectError::invalid_config("kernel size must be positive"));
        }

        if self.morphology.ops.is_empty() {
            return Err(InspectError::invalid_config("at least one morphological op is required"));
        }

        Ok(())
    }
}
