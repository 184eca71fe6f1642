use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};

use crate::models::{BoundingBox, Contour, Point};

/// Outer contours of the foreground (non-zero) regions.
///
/// Only top-level outer borders are kept: holes and anything nested inside a
/// hole are dropped. The order is the raster scan order in which borders are
/// found, which is stable for a given image.
///
/// Regions touching the image edge are traced too: the mask gets a one-pixel
/// background frame before tracing and points are shifted back afterwards.
pub fn extract_contours(binary: &GrayImage) -> Vec<Contour> {
    let padded = with_background_frame(binary);
    find_contours::<i32>(&padded)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| Contour {
            points: c.points.iter().map(|p| Point { x: p.x - 1, y: p.y - 1 }).collect(),
        })
        .collect()
}

fn with_background_frame(binary: &GrayImage) -> GrayImage {
    let mut padded = GrayImage::new(binary.width() + 2, binary.height() + 2);
    image::imageops::replace(&mut padded, binary, 1, 1);
    padded
}

/// Smallest axis-aligned rectangle holding every point
pub fn bounding_rect(contour: &Contour) -> BoundingBox {
    let Some(first) = contour.points.first() else {
        return BoundingBox { x: 0, y: 0, width: 0, height: 0 };
    };

    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in &contour.points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }

    BoundingBox {
        x: min_x.max(0) as u32,
        y: min_y.max(0) as u32,
        width: (max_x - min_x + 1) as u32,
        height: (max_y - min_y + 1) as u32,
    }
}

/// Polygon area by the shoelace formula (absolute value)
pub fn contour_area(contour: &Contour) -> f64 {
    let pts = &contour.points;
    if pts.len() < 3 {
        return 0.0;
    }

    let mut twice_area: i64 = 0;
    for (i, p) in pts.iter().enumerate() {
        let q = &pts[(i + 1) % pts.len()];
        twice_area += p.x as i64 * q.y as i64 - q.x as i64 * p.y as i64;
    }
    (twice_area as f64 / 2.0).abs()
}

/// Perimeter as the sum of edge lengths; `closed` adds the last-to-first edge
pub fn arc_length(contour: &Contour, closed: bool) -> f64 {
    let pts = &contour.points;
    if pts.len() < 2 {
        return 0.0;
    }

    let mut length: f64 = pts
        .windows(2)
        .map(|w| distance(w[0], w[1]))
        .sum();

    if closed {
        length += distance(pts[pts.len() - 1], pts[0]);
    }
    length
}

fn distance(a: Point, b: Point) -> f64 {
    let dx = (a.x - b.x) as f64;
    let dy = (a.y - b.y) as f64;
    dx.hypot(dy)
}

/// `4π·area / perimeter²` clamped to [0, 1]; `None` for a zero perimeter
pub fn circularity(area: f64, perimeter: f64) -> Option<f64> {
    if perimeter <= 0.0 {
        return None;
    }
    Some((4.0 * std::f64::consts::PI * area / (perimeter * perimeter)).clamp(0.0, 1.0))
}

/// Keep contours whose area is strictly greater than `min_area`
pub fn filter_by_area(contours: &[Contour], min_area: f64) -> Vec<Contour> {
    contours
        .iter()
        .filter(|c| contour_area(c) > min_area)
        .cloned()
        .collect()
}
