use serde::Serialize;
use std::fmt;

/// Axis-aligned box in working-resolution pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn contains(&self, px: u32, py: u32) -> bool {
        px >= self.x && py >= self.y && px < self.x + self.width && py < self.y + self.height
    }
}

/// A 2D contour point; signed so polygon maths can go negative
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

/// Closed outer boundary of one connected foreground region
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contour {
    pub points: Vec<Point>,
}

/// One candidate defect found by contour filtering
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DefectRegion {
    pub bbox: BoundingBox,
    /// Polygon area of the contour, not the box area
    pub area: f64,
    pub perimeter: f64,
    /// `4π·area / perimeter²`, clamped to [0, 1]
    pub circularity: f64,
    #[serde(skip)]
    pub contour: Contour,
}

impl DefectRegion {
    /// Short label for reports, e.g. `Area:1131px`
    pub fn label(&self) -> String {
        format!("Area:{}px", self.area as i64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DetectionStatus {
    NoDefect,
    DefectDetected,
}

impl fmt::Display for DetectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoDefect => write!(f, "NO DEFECT"),
            Self::DefectDetected => write!(f, "DEFECT DETECTED"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfidenceCategory {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl ConfidenceCategory {
    pub fn from_score(score: f64) -> Self {
        if score >= 85.0 {
            Self::VeryHigh
        } else if score >= 70.0 {
            Self::High
        } else if score >= 50.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

impl fmt::Display for ConfidenceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
            Self::VeryHigh => "VERY HIGH",
        };
        f.write_str(text)
    }
}

/// Image-quality measurements feeding the confidence score
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ImageQuality {
    pub laplacian_variance: f64,
    pub mean_brightness: f64,
    pub contrast: f64,
    /// Sharpness score after lighting/contrast penalties, in [0, 100]
    pub score: f64,
}

/// Outcome of the single-image detector
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionResult {
    pub status: DetectionStatus,
    pub count: usize,
    /// In contour discovery order; defect N is `defects[N - 1]`
    pub defects: Vec<DefectRegion>,
    pub confidence: ConfidenceCategory,
    /// Heuristic score in [0, 100], not a probability
    pub confidence_score: f64,
    pub quality: ImageQuality,
}

impl DetectionResult {
    pub fn has_defects(&self) -> bool {
        self.status == DetectionStatus::DefectDetected
    }

    /// Free-text summary written to the result log
    pub fn details(&self) -> String {
        if self.count > 0 {
            format!("{} defect(s) detected", self.count)
        } else {
            "No defects".to_string()
        }
    }
}

/// Ground-truth rectangle in the annotated image's native resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AnnotationBox {
    pub x_min: i32,
    pub y_min: i32,
    pub x_max: i32,
    pub y_max: i32,
}

impl AnnotationBox {
    pub fn new(x_min: i32, y_min: i32, x_max: i32, y_max: i32) -> Self {
        Self { x_min, y_min, x_max, y_max }
    }

    /// Scale every coordinate, rounding to the nearest pixel
    pub fn scaled(&self, sx: f64, sy: f64) -> Self {
        Self {
            x_min: (self.x_min as f64 * sx).round() as i32,
            y_min: (self.y_min as f64 * sy).round() as i32,
            x_max: (self.x_max as f64 * sx).round() as i32,
            y_max: (self.y_max as f64 * sy).round() as i32,
        }
    }

    /// Part of the box inside a `width` x `height` image, if any
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<BoundingBox> {
        let x0 = self.x_min.max(0) as i64;
        let y0 = self.y_min.max(0) as i64;
        let x1 = (self.x_max as i64).min(width as i64);
        let y1 = (self.y_max as i64).min(height as i64);

        if x1 <= x0 || y1 <= y0 {
            return None;
        }

        Some(BoundingBox {
            x: x0 as u32,
            y: y0 as u32,
            width: (x1 - x0) as u32,
            height: (y1 - y0) as u32,
        })
    }
}
