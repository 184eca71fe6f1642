use image::{DynamicImage, GrayImage, RgbImage};
use std::path::{Path, PathBuf};

use crate::error::{InspectError, Result};

/// A named intermediate image kept for inspection or export.
///
/// Artifacts are never fed back into a pipeline.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub name: String,
    pub image: DynamicImage,
}

/// Ordered collection of stage outputs
#[derive(Debug, Clone, Default)]
pub struct Artifacts {
    items: Vec<Artifact>,
}

impl Artifacts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, image: DynamicImage) {
        self.items.push(Artifact {
            name: name.into(),
            image,
        });
    }

    pub fn push_gray(&mut self, name: impl Into<String>, image: &GrayImage) {
        self.push(name, DynamicImage::ImageLuma8(image.clone()));
    }

    pub fn push_rgb(&mut self, name: impl Into<String>, image: &RgbImage) {
        self.push(name, DynamicImage::ImageRgb8(image.clone()));
    }

    pub fn get(&self, name: &str) -> Option<&DynamicImage> {
        self.items.iter().find(|a| a.name == name).map(|a| &a.image)
    }

    pub fn names(&self) -> Vec<&str> {
        self.items.iter().map(|a| a.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Artifact> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Debug export target for pipeline artifacts
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Root directory for debug outputs
    pub output_dir: PathBuf,
}

impl DebugConfig {
    /// The directory must be empty or non-existent; it is created if missing.
    pub fn new(output_dir: PathBuf) -> Result<Self> {
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir)?;
            if entries.count() > 0 {
                return Err(InspectError::invalid_config(format!(
                    "debug directory is not empty: {}",
                    output_dir.display()
                )));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }

        Ok(Self { output_dir })
    }

    /// Save artifacts as `NN_name.png` in stage order
    pub fn save_artifacts(&self, artifacts: &Artifacts) -> Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(artifacts.len());
        for (idx, artifact) in artifacts.iter().enumerate() {
            let filename = format!("{:02}_{}.png", idx + 1, file_stem(&artifact.name));
            written.push(save_png(&self.output_dir, &filename, &artifact.image)?);
        }
        Ok(written)
    }

    /// Save cropped regions as `roi_NN.png`, numbered from 1
    pub fn save_rois<'a>(
        &self,
        rois: impl IntoIterator<Item = (usize, &'a RgbImage)>,
    ) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        for (number, roi) in rois {
            let filename = format!("roi_{:02}.png", number);
            let image = DynamicImage::ImageRgb8(roi.clone());
            written.push(save_png(&self.output_dir, &filename, &image)?);
        }
        Ok(written)
    }
}

fn file_stem(name: &str) -> String {
    name.to_lowercase().replace([' ', '/'], "_")
}

fn save_png(dir: &Path, filename: &str, image: &DynamicImage) -> Result<PathBuf> {
    let path = dir.join(filename);
    image
        .save(&path)
        .map_err(|e| InspectError::persistence(path.display().to_string(), e))?;
    Ok(path)
}
