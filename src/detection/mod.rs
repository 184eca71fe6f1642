pub mod preprocessing;
pub mod threshold;
pub mod morphology;
pub mod contours;
pub mod quality;
pub mod draw;
pub mod single;
pub mod difference;
pub mod localize;

use image::DynamicImage;

use crate::config::InspectConfig;
use crate::error::Result;
use crate::models::AnnotationBox;

pub use difference::DifferenceOutput;
pub use localize::{Localization, LocalizeOutcome, Roi};
pub use single::SingleImageOutput;

/// Entry point bundling the configuration for each detection strategy.
///
/// Holds no per-call state: every method is a pure function of its inputs, so
/// one inspector can be shared across threads.
#[derive(Debug, Clone)]
pub struct Inspector {
    pub single: InspectConfig,
    pub difference: InspectConfig,
}

impl Inspector {
    pub fn new() -> Self {
        Self {
            single: InspectConfig::single_image(),
            difference: InspectConfig::template_difference(),
        }
    }

    pub fn with_single_config(mut self, config: InspectConfig) -> Self {
        self.single = config;
        self
    }

    pub fn with_difference_config(mut self, config: InspectConfig) -> Self {
        self.difference = config;
        self
    }

    /// Threshold-and-contour detection on one board image
    pub fn detect(&self, img: &DynamicImage) -> Result<SingleImageOutput> {
        single::detect(img, &self.single)
    }

    /// Golden-template differencing
    pub fn compare(
        &self,
        template: &DynamicImage,
        test: &DynamicImage,
    ) -> Result<DifferenceOutput> {
        difference::detect_difference(template, test, &self.difference)
    }

    /// Ground-truth box localization at the single-image working size
    pub fn localize(&self, img: &DynamicImage, boxes: &[AnnotationBox]) -> Result<LocalizeOutcome> {
        localize::localize(img, boxes, self.single.working_size)
    }
}

impl Default for Inspector {
    fn default() -> Self {
        Self::new()
    }
}
