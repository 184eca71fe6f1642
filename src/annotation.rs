//! Pascal-VOC style annotation files.
//!
//! Each `<object>` carries a `<bndbox>` with integer `xmin`, `ymin`, `xmax`,
//! `ymax` in the annotated image's native pixel grid.

use std::path::Path;

use crate::error::{InspectError, Result};
use crate::models::AnnotationBox;

/// Parse all boxes in document order.
///
/// Any malformed object fails the whole file. A well-formed file with no
/// objects returns an empty list.
pub fn parse_annotation_xml(xml: &str) -> Result<Vec<AnnotationBox>> {
    let doc = roxmltree::Document::parse(xml).map_err(|e| InspectError::annotation(e.to_string()))?;

    let mut boxes = Vec::new();
    for (idx, object) in doc
        .root_element()
        .children()
        .filter(|n| n.has_tag_name("object"))
        .enumerate()
    {
        let bndbox = object
            .children()
            .find(|n| n.has_tag_name("bndbox"))
            .ok_or_else(|| InspectError::annotation(format!("object {} has no bndbox", idx + 1)))?;

        let coord = |tag: &str| -> Result<i32> {
            let text = bndbox
                .children()
                .find(|n| n.has_tag_name(tag))
                .and_then(|n| n.text())
                .ok_or_else(|| {
                    InspectError::annotation(format!("object {} is missing {}", idx + 1, tag))
                })?;
            parse_coordinate(text.trim()).ok_or_else(|| {
                InspectError::annotation(format!(
                    "object {}: {} is not a number: {:?}",
                    idx + 1,
                    tag,
                    text
                ))
            })
        };

        boxes.push(AnnotationBox::new(
            coord("xmin")?,
            coord("ymin")?,
            coord("xmax")?,
            coord("ymax")?,
        ));
    }

    Ok(boxes)
}

/// Some exporters write coordinates as "123.0"
fn parse_coordinate(text: &str) -> Option<i32> {
    text.parse::<i32>()
        .ok()
        .or_else(|| text.parse::<f64>().ok().filter(|v| v.is_finite()).map(|v| v.round() as i32))
}

/// Read and parse an annotation file
pub fn load_annotation(path: &Path) -> Result<Vec<AnnotationBox>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| InspectError::annotation(e.to_string()).with_path(path))?;
    parse_annotation_xml(&text).map_err(|e| e.with_path(path))
}
