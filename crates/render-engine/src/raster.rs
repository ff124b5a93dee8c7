//! Frame rasterizer.
//!
//! Draws a [`GridComposition`] into an RGBA frame: container background,
//! one filled cell per partition rectangle with its content on top, cell
//! borders, number badges on empty cells and, optionally, splitter lines.
//! Sizes given in logical pixels (border, badge, corner boxes, splitters)
//! are multiplied by the render scale.

use cellgrid_common::StyleConfig;
use cellgrid_grid_model::{CanvasSize, CellRect, GridPartition};
use image::imageops;
use image::{Pixel, Rgba, RgbaImage};

use crate::compositor::{
    column_boundaries, compute_cell_rects, contain_rect, cover_crop, row_boundaries, CellContent,
    GridComposition, Placement, RESAMPLE_FILTER,
};

/// Logical width of a splitter line.
const SPLITTER_PX: u32 = 2;

/// Badge box relative to the cell origin: x, y, width, height.
const BADGE_BOX: (u32, u32, u32, u32) = (6, 6, 20, 12);

/// Badge text origin relative to the cell origin.
const BADGE_TEXT: (u32, u32) = (8, 8);

/// 3x5 bitmap digits, one row per byte, high three bits used.
const DIGITS: [[u8; 5]; 10] = [
    [0b111, 0b101, 0b101, 0b101, 0b111],
    [0b010, 0b110, 0b010, 0b010, 0b111],
    [0b111, 0b001, 0b111, 0b100, 0b111],
    [0b111, 0b001, 0b111, 0b001, 0b111],
    [0b101, 0b101, 0b111, 0b001, 0b001],
    [0b111, 0b100, 0b111, 0b001, 0b111],
    [0b111, 0b100, 0b111, 0b101, 0b111],
    [0b111, 0b001, 0b010, 0b010, 0b010],
    [0b111, 0b101, 0b111, 0b101, 0b111],
    [0b111, 0b101, 0b111, 0b001, 0b111],
];

/// Colours and sizes used when drawing a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderStyle {
    pub container: Rgba<u8>,
    pub cell: Rgba<u8>,
    pub border: Rgba<u8>,
    pub splitter: Rgba<u8>,
    pub badge: Rgba<u8>,
    pub badge_text: Rgba<u8>,
    /// Logical size of corner-stretch boxes.
    pub corner_px: u32,
    pub show_splitters: bool,
}

impl From<&StyleConfig> for RenderStyle {
    fn from(config: &StyleConfig) -> Self {
        Self {
            container: Rgba(config.container_color),
            cell: Rgba(config.cell_color),
            border: Rgba(config.border_color),
            splitter: Rgba(config.splitter_color),
            badge: Rgba(config.badge_color),
            badge_text: Rgba(config.badge_text_color),
            corner_px: config.corner_px,
            show_splitters: true,
        }
    }
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self::from(&StyleConfig::default())
    }
}

impl RenderStyle {
    pub fn with_splitters(mut self, show: bool) -> Self {
        self.show_splitters = show;
        self
    }
}

/// Draw the grid into a `width` x `height` frame.
///
/// `composition` of `None`, or one whose cell count does not match the
/// partition, draws every cell empty with its number badge.
pub fn render_grid(
    composition: Option<&GridComposition>,
    partition: &GridPartition,
    width: u32,
    height: u32,
    scale: u32,
    style: &RenderStyle,
) -> RgbaImage {
    let scale = scale.max(1);
    let mut frame = RgbaImage::from_pixel(width, height, style.container);

    let inset = (CanvasSize::BORDER_PX * scale).min(width / 2).min(height / 2);
    let inner_w = width - 2 * inset;
    let inner_h = height - 2 * inset;
    if inner_w == 0 || inner_h == 0 {
        return frame;
    }

    let composition = composition.filter(|c| c.len() == partition.cell_count());
    let rects = compute_cell_rects(partition, inner_w, inner_h);

    for (i, local) in rects.iter().enumerate() {
        let rect = CellRect::new(local.left + inset, local.top + inset, local.width, local.height);
        if rect.is_empty() {
            continue;
        }

        fill_rect(&mut frame, rect, style.cell);
        stroke_rect(&mut frame, rect, style.border);

        let content = composition
            .and_then(|c| c.cells().get(i))
            .unwrap_or(&CellContent::Empty);
        match content {
            CellContent::Empty => draw_badge(&mut frame, rect, i + 1, scale, style),
            CellContent::Image { image, placement } => {
                draw_placed(&mut frame, image, *placement, rect)
            }
            CellContent::Slice(slice) => draw_placed(&mut frame, slice, Placement::Stretch, rect),
            CellContent::Corners(corners) => {
                let cell = corners.render(rect.width, rect.height, style.corner_px * scale);
                imageops::overlay(&mut frame, &cell, rect.left as i64, rect.top as i64);
            }
        }
    }

    if style.show_splitters {
        draw_splitters(&mut frame, partition, inset, inner_w, inner_h, scale, style.splitter);
    }

    frame
}

fn draw_placed(frame: &mut RgbaImage, image: &RgbaImage, placement: Placement, rect: CellRect) {
    let (src_w, src_h) = image.dimensions();
    if src_w == 0 || src_h == 0 {
        return;
    }

    let (scaled, x, y) = match placement {
        Placement::Stretch => (
            imageops::resize(image, rect.width, rect.height, RESAMPLE_FILTER),
            rect.left,
            rect.top,
        ),
        Placement::Contain => {
            let fit = contain_rect(src_w, src_h, rect.width, rect.height);
            (
                imageops::resize(image, fit.width, fit.height, RESAMPLE_FILTER),
                rect.left + fit.left,
                rect.top + fit.top,
            )
        }
        Placement::Cover => {
            let crop = cover_crop(src_w, src_h, rect.width, rect.height);
            let visible =
                imageops::crop_imm(image, crop.left, crop.top, crop.width, crop.height).to_image();
            (
                imageops::resize(&visible, rect.width, rect.height, RESAMPLE_FILTER),
                rect.left,
                rect.top,
            )
        }
    };

    imageops::overlay(frame, &scaled, x as i64, y as i64);
}

fn draw_badge(frame: &mut RgbaImage, cell: CellRect, number: usize, scale: u32, style: &RenderStyle) {
    let (bx, by, bw, bh) = BADGE_BOX;
    let badge = CellRect::new(
        cell.left + bx * scale,
        cell.top + by * scale,
        bw * scale,
        bh * scale,
    );
    blend_rect(frame, clip(badge, cell), style.badge);

    // Glyph dots are 2 logical pixels so a 5-row digit fills the badge.
    let dot = 2 * scale;
    let mut x = cell.left + BADGE_TEXT.0 * scale;
    let y = cell.top + BADGE_TEXT.1 * scale;
    for digit in number.to_string().bytes().map(|b| (b - b'0') as usize) {
        for (row, bits) in DIGITS[digit].iter().enumerate() {
            for col in 0..3u32 {
                if bits & (0b100 >> col) != 0 {
                    let dot_rect = CellRect::new(x + col * dot, y + row as u32 * dot, dot, dot);
                    fill_rect(frame, clip(dot_rect, cell), style.badge_text);
                }
            }
        }
        x += 4 * dot;
    }
}

fn draw_splitters(
    frame: &mut RgbaImage,
    partition: &GridPartition,
    inset: u32,
    inner_w: u32,
    inner_h: u32,
    scale: u32,
    color: Rgba<u8>,
) {
    let thickness = SPLITTER_PX * scale;
    let bounds = CellRect::new(inset, inset, inner_w, inner_h);

    let columns = column_boundaries(partition, inner_w);
    for &x in &columns[1..columns.len() - 1] {
        let left = (inset + x).saturating_sub(thickness / 2);
        fill_rect(frame, clip(CellRect::new(left, inset, thickness, inner_h), bounds), color);
    }

    let rows = row_boundaries(partition, inner_h);
    for &y in &rows[1..rows.len() - 1] {
        let top = (inset + y).saturating_sub(thickness / 2);
        fill_rect(frame, clip(CellRect::new(inset, top, inner_w, thickness), bounds), color);
    }
}

/// Intersection of `rect` with `bounds` (empty if disjoint).
fn clip(rect: CellRect, bounds: CellRect) -> CellRect {
    let left = rect.left.max(bounds.left);
    let top = rect.top.max(bounds.top);
    let right = rect.right().min(bounds.right());
    let bottom = rect.bottom().min(bounds.bottom());
    CellRect::new(
        left,
        top,
        right.saturating_sub(left),
        bottom.saturating_sub(top),
    )
}

fn fill_rect(frame: &mut RgbaImage, rect: CellRect, color: Rgba<u8>) {
    for y in rect.top..rect.bottom().min(frame.height()) {
        for x in rect.left..rect.right().min(frame.width()) {
            frame.put_pixel(x, y, color);
        }
    }
}

fn blend_rect(frame: &mut RgbaImage, rect: CellRect, color: Rgba<u8>) {
    for y in rect.top..rect.bottom().min(frame.height()) {
        for x in rect.left..rect.right().min(frame.width()) {
            frame.get_pixel_mut(x, y).blend(&color);
        }
    }
}

/// One-pixel outline just inside `rect`.
fn stroke_rect(frame: &mut RgbaImage, rect: CellRect, color: Rgba<u8>) {
    let (right, bottom) = (rect.right() - 1, rect.bottom() - 1);
    fill_rect(frame, CellRect::new(rect.left, rect.top, rect.width, 1), color);
    fill_rect(frame, CellRect::new(rect.left, bottom, rect.width, 1), color);
    fill_rect(frame, CellRect::new(rect.left, rect.top, 1, rect.height), color);
    fill_rect(frame, CellRect::new(right, rect.top, 1, rect.height), color);
}
