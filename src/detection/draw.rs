use ab_glyph::{FontRef, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;

use crate::models::{BoundingBox, Contour};

pub const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
pub const CONTOUR_COLOR: Rgb<u8> = Rgb([255, 165, 0]);
pub const LABEL_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// Label height in pixels
const LABEL_SCALE: f32 = 14.0;
/// Gap between the label baseline and the box top
const LABEL_GAP: i32 = 4;

static LABEL_FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSansMono.ttf");

fn label_font() -> Option<FontRef<'static>> {
    FontRef::try_from_slice(LABEL_FONT).ok()
}

/// Two-pixel wide box outline, inclusive of the far corner
pub fn draw_box(img: &mut RgbImage, bbox: &BoundingBox, color: Rgb<u8>) {
    for inset in 0..2u32 {
        let w = (bbox.width + 1).saturating_sub(2 * inset);
        let h = (bbox.height + 1).saturating_sub(2 * inset);
        if w == 0 || h == 0 {
            break;
        }
        let rect = Rect::at((bbox.x + inset) as i32, (bbox.y + inset) as i32).of_size(w, h);
        draw_hollow_rect_mut(img, rect, color);
    }
}

/// Closed polyline through the contour points
pub fn draw_contour(img: &mut RgbImage, contour: &Contour, color: Rgb<u8>) {
    let pts = &contour.points;
    if pts.is_empty() {
        return;
    }
    for (i, p) in pts.iter().enumerate() {
        let q = pts[(i + 1) % pts.len()];
        draw_line_segment_mut(
            img,
            (p.x as f32, p.y as f32),
            (q.x as f32, q.y as f32),
            color,
        );
    }
}

/// Text just above the box's top-left corner, or inside the box when it
/// touches the top edge.
pub fn draw_label(img: &mut RgbImage, bbox: &BoundingBox, text: &str, color: Rgb<u8>) {
    let Some(font) = label_font() else {
        return;
    };
    let scale = PxScale::from(LABEL_SCALE);
    let (_, text_h) = text_size(scale, &font, text);

    let above = bbox.y as i32 - text_h as i32 - LABEL_GAP;
    let y = if above >= 0 { above } else { bbox.y as i32 + LABEL_GAP };
    draw_text_mut(img, color, bbox.x as i32, y, scale, &font, text);
}
