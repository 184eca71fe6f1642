use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_filled_rect_mut};
use imageproc::rect::Rect;
use pcbinspect::{Contour, Point};

pub const WIDTH: u32 = 640;
pub const HEIGHT: u32 = 480;

/// Uniform gray RGB board at the working size
pub fn gray_board(value: u8) -> RgbImage {
    RgbImage::from_pixel(WIDTH, HEIGHT, Rgb([value, value, value]))
}

/// Gray board with a filled circle of another intensity
pub fn board_with_circle(background: u8, center: (i32, i32), radius: i32, value: u8) -> RgbImage {
    let mut img = gray_board(background);
    draw_filled_circle_mut(&mut img, center, radius, Rgb([value, value, value]));
    img
}

pub fn dynamic(img: RgbImage) -> DynamicImage {
    DynamicImage::ImageRgb8(img)
}

/// Binary image with a filled white rectangle, corners inclusive
pub fn mask_with_rect(width: u32, height: u32, x: u32, y: u32, w: u32, h: u32) -> GrayImage {
    let mut mask = GrayImage::new(width, height);
    draw_filled_rect_mut(&mut mask, Rect::at(x as i32, y as i32).of_size(w, h), Luma([255u8]));
    mask
}

/// 8x8-cell checkerboard sprinkled with isolated single-pixel flips.
/// Deterministic so failures are reproducible.
pub fn noisy_checkerboard(width: u32, height: u32) -> GrayImage {
    let mut state: u32 = 0x2545_f491;
    GrayImage::from_fn(width, height, |x, y| {
        let cell = ((x / 8) + (y / 8)) % 2 == 0;
        // xorshift
        state ^= state << 13;
        state ^= state >> 17;
        state ^= state << 5;
        let flip = state % 23 == 0;
        let on = cell ^ flip;
        Luma([if on { 255 } else { 0 }])
    })
}

pub fn contour_from(points: &[(i32, i32)]) -> Contour {
    Contour {
        points: points.iter().map(|&(x, y)| Point { x, y }).collect(),
    }
}

pub fn voc_xml(boxes: &[(i32, i32, i32, i32)]) -> String {
    let mut xml = String::from("<annotation>\n  <filename>board.jpg</filename>\n");
    for (x1, y1, x2, y2) in boxes {
        xml.push_str(&format!(
            "  <object>\n    <name>missing_hole</name>\n    <bndbox>\n      <xmin>{x1}</xmin>\n      <ymin>{y1}</ymin>\n      <xmax>{x2}</xmax>\n      <ymax>{y2}</ymax>\n    </bndbox>\n  </object>\n"
        ));
    }
    xml.push_str("</annotation>\n");
    xml
}
