//! Built-in placeholder image.

use image::{Rgba, RgbaImage};

/// Name the placeholder is shown under.
pub const DEFAULT_IMAGE_NAME: &str = "default-circle.png";

const SIZE: u32 = 200;
const BACKGROUND: Rgba<u8> = Rgba([0xf0, 0xf0, 0xf0, 255]);
const CIRCLE: Rgba<u8> = Rgba([0x00, 0x7a, 0xcc, 255]);
const CORNER_DOT: Rgba<u8> = Rgba([0xff, 0x44, 0x44, 255]);
const FRAME: Rgba<u8> = Rgba([0x33, 0x33, 0x33, 255]);

/// A 200x200 test card: a large centre circle, a dot near each corner and a
/// thin frame. The corner dots make corner-stretch modes easy to read.
pub fn default_circle_image() -> RgbaImage {
    const DOTS: [(f32, f32); 4] = [(30.0, 30.0), (170.0, 30.0), (30.0, 170.0), (170.0, 170.0)];

    RgbaImage::from_fn(SIZE, SIZE, |x, y| {
        let (px, py) = (x as f32 + 0.5, y as f32 + 0.5);
        let within = |cx: f32, cy: f32, r: f32| (px - cx).powi(2) + (py - cy).powi(2) <= r * r;

        if (on_frame(x) && (4..=195).contains(&y)) || (on_frame(y) && (4..=195).contains(&x)) {
            FRAME
        } else if DOTS.iter().any(|&(cx, cy)| within(cx, cy, 15.0)) {
            CORNER_DOT
        } else if within(100.0, 100.0, 60.0) {
            CIRCLE
        } else {
            BACKGROUND
        }
    })
}

// 3 px stroke centred on the rectangle (5, 5, 190, 190).
fn on_frame(v: u32) -> bool {
    (4..=6).contains(&v) || (193..=195).contains(&v)
}
