//! Four-corner stretch of an image.
//!
//! The source is split at its midpoint into four quadrants. Drawn into a
//! cell, each quadrant fills a fixed-size box in its corner, one-pixel
//! strips taken next to the split lines are tiled along the edges between
//! the corners, and the remaining centre is flooded with the colour of the
//! midpoint pixel. This approximates a 9-slice with only four real slices.

use image::imageops;
use image::{Rgba, RgbaImage};

use crate::compositor::RESAMPLE_FILTER;

/// Pieces cut from a source image for corner-stretch drawing.
#[derive(Debug, Clone)]
pub struct CornerStretch {
    top_left: RgbaImage,
    top_right: RgbaImage,
    bottom_left: RgbaImage,
    bottom_right: RgbaImage,
    /// `qw x 1` row at the vertical split, tiled down the left edge.
    left_edge: RgbaImage,
    /// `qw x 1` row at the vertical split, tiled down the right edge.
    right_edge: RgbaImage,
    /// `1 x qh` column at the horizontal split, tiled along the top edge.
    top_edge: RgbaImage,
    /// `1 x qh` column at the horizontal split, tiled along the bottom edge.
    bottom_edge: RgbaImage,
    center: Rgba<u8>,
}

impl CornerStretch {
    /// Cut the pieces from `image`.
    ///
    /// Returns `None` for images smaller than 2x2, which have no quadrants.
    pub fn from_image(image: &RgbaImage) -> Option<Self> {
        let (width, height) = image.dimensions();
        if width < 2 || height < 2 {
            return None;
        }
        let qw = width / 2;
        let qh = height / 2;
        let crop = |x, y, w, h| imageops::crop_imm(image, x, y, w, h).to_image();

        Some(Self {
            top_left: crop(0, 0, qw, qh),
            top_right: crop(qw, 0, qw, qh),
            bottom_left: crop(0, qh, qw, qh),
            bottom_right: crop(qw, qh, qw, qh),
            left_edge: crop(0, qh, qw, 1),
            right_edge: crop(qw, qh, qw, 1),
            top_edge: crop(qw - 1, 0, 1, qh),
            bottom_edge: crop(qw - 1, qh, 1, qh),
            center: *image.get_pixel(qw, qh),
        })
    }

    /// Colour used to fill the centre.
    pub fn center(&self) -> Rgba<u8> {
        self.center
    }

    /// Size of each quadrant in source pixels.
    pub fn quadrant_size(&self) -> (u32, u32) {
        self.top_left.dimensions()
    }

    /// Quadrants in `[top-left, top-right, bottom-left, bottom-right]` order.
    pub fn quadrants(&self) -> [&RgbaImage; 4] {
        [
            &self.top_left,
            &self.top_right,
            &self.bottom_left,
            &self.bottom_right,
        ]
    }

    /// Draw into a `width` x `height` image with corner boxes of
    /// `corner_px`, capped at half the output on each axis.
    pub fn render(&self, width: u32, height: u32, corner_px: u32) -> RgbaImage {
        let mut out = RgbaImage::from_pixel(width, height, self.center);
        let cw = corner_px.min(width / 2);
        let ch = corner_px.min(height / 2);
        if cw == 0 || ch == 0 {
            return out;
        }

        let middle_h = height - 2 * ch;
        let middle_w = width - 2 * cw;

        if middle_h > 0 {
            tile_rows(&mut out, &self.left_edge, 0, ch, cw, middle_h);
            tile_rows(&mut out, &self.right_edge, width - cw, ch, cw, middle_h);
        }
        if middle_w > 0 {
            tile_columns(&mut out, &self.top_edge, cw, 0, middle_w, ch);
            tile_columns(&mut out, &self.bottom_edge, cw, height - ch, middle_w, ch);
        }

        let boxes = [
            (&self.top_left, 0, 0),
            (&self.top_right, width - cw, 0),
            (&self.bottom_left, 0, height - ch),
            (&self.bottom_right, width - cw, height - ch),
        ];
        for (quadrant, x, y) in boxes {
            let scaled = imageops::resize(quadrant, cw, ch, RESAMPLE_FILTER);
            imageops::replace(&mut out, &scaled, x as i64, y as i64);
        }

        out
    }
}

/// Repeat a one-row strip, scaled to `w`, over `h` rows starting at `(x, y)`.
fn tile_rows(out: &mut RgbaImage, strip: &RgbaImage, x: u32, y: u32, w: u32, h: u32) {
    let row = imageops::resize(strip, w, 1, RESAMPLE_FILTER);
    for dy in 0..h {
        imageops::replace(out, &row, x as i64, (y + dy) as i64);
    }
}

/// Repeat a one-column strip, scaled to `h`, over `w` columns starting at `(x, y)`.
fn tile_columns(out: &mut RgbaImage, strip: &RgbaImage, x: u32, y: u32, w: u32, h: u32) {
    let column = imageops::resize(strip, 1, h, RESAMPLE_FILTER);
    for dx in 0..w {
        imageops::replace(out, &column, (x + dx) as i64, y as i64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 4x4 image whose quadrants are solid red, green, blue and white.
    fn quadrant_image() -> RgbaImage {
        RgbaImage::from_fn(4, 4, |x, y| match (x < 2, y < 2) {
            (true, true) => Rgba([255, 0, 0, 255]),
            (false, true) => Rgba([0, 255, 0, 255]),
            (true, false) => Rgba([0, 0, 255, 255]),
            (false, false) => Rgba([255, 255, 255, 255]),
        })
    }

    #[test]
    fn test_rejects_tiny_images() {
        assert!(CornerStretch::from_image(&RgbaImage::new(1, 5)).is_none());
        assert!(CornerStretch::from_image(&RgbaImage::new(5, 1)).is_none());
        assert!(CornerStretch::from_image(&RgbaImage::new(2, 2)).is_some());
    }

    #[test]
    fn test_split_geometry() {
        let corners = CornerStretch::from_image(&RgbaImage::new(9, 7)).unwrap();
        assert_eq!(corners.quadrant_size(), (4, 3));
        assert_eq!(corners.left_edge.dimensions(), (4, 1));
        assert_eq!(corners.top_edge.dimensions(), (1, 3));
    }

    #[test]
    fn test_center_is_midpoint_pixel() {
        let corners = CornerStretch::from_image(&quadrant_image()).unwrap();
        assert_eq!(corners.center(), Rgba([255, 255, 255, 255]));
        assert_eq!(corners.quadrants()[1].get_pixel(0, 0), &Rgba([0, 255, 0, 255]));
    }

    #[test]
    fn test_render_places_corners() {
        let corners = CornerStretch::from_image(&quadrant_image()).unwrap();
        let out = corners.render(40, 30, 10);
        assert_eq!(out.dimensions(), (40, 30));
        assert_eq!(out.get_pixel(0, 0), &Rgba([255, 0, 0, 255]));
        assert_eq!(out.get_pixel(39, 0), &Rgba([0, 255, 0, 255]));
        assert_eq!(out.get_pixel(0, 29), &Rgba([0, 0, 255, 255]));
        assert_eq!(out.get_pixel(39, 29), &Rgba([255, 255, 255, 255]));
        // Centre area.
        assert_eq!(out.get_pixel(20, 15), &Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_render_tiles_edges() {
        // Left edge strip is the row at y = 2: blue on the left half.
        let corners = CornerStretch::from_image(&quadrant_image()).unwrap();
        let out = corners.render(40, 40, 10);
        assert_eq!(out.get_pixel(0, 20), &Rgba([0, 0, 255, 255]));
        // Top edge strip is the column at x = 1: red in the top half.
        assert_eq!(out.get_pixel(20, 0), &Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn test_render_caps_corners_at_half() {
        let corners = CornerStretch::from_image(&quadrant_image()).unwrap();
        let out = corners.render(8, 6, 50);
        assert_eq!(out.get_pixel(3, 2), &Rgba([255, 0, 0, 255]));
        assert_eq!(out.get_pixel(4, 3), &Rgba([255, 255, 255, 255]));
    }
}
