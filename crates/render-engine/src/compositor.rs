//! Grid image compositor: cell rectangles and fit-mode composition.
//!
//! A [`GridComposition`] holds, for every cell in row-major order, what that
//! cell should display. It is rebuilt from the source image on every call to
//! [`compose`], so switching fit modes never leaves anything behind from the
//! previous mode.

use std::sync::Arc;

use cellgrid_grid_model::{CellRect, FitMode, GridPartition};
use image::imageops::{self, FilterType};
use image::RgbaImage;

use crate::corners::CornerStretch;

/// Filter used whenever a source image is rescaled.
pub(crate) const RESAMPLE_FILTER: FilterType = FilterType::Triangle;

/// How a whole image is placed in a cell box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Stretch to the full cell box.
    Stretch,
    /// Scale to fit inside the box, centred, letterboxed.
    Contain,
    /// Scale to cover the box, centred, cropped.
    Cover,
}

/// What a single cell displays.
#[derive(Debug, Clone)]
pub enum CellContent {
    /// No image; the cell shows its number badge.
    Empty,
    /// The whole source image.
    Image {
        image: Arc<RgbaImage>,
        placement: Placement,
    },
    /// This cell's own piece of the container-sized image, stretched to the cell.
    Slice(Arc<RgbaImage>),
    /// Four-corner stretch.
    Corners(Arc<CornerStretch>),
}

impl CellContent {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellContent::Empty)
    }
}

/// Per-cell contents for one fit mode.
#[derive(Debug, Clone)]
pub struct GridComposition {
    mode: Option<FitMode>,
    cells: Vec<CellContent>,
}

impl GridComposition {
    /// A grid with no image: every cell shows its badge.
    pub fn empty(cell_count: usize) -> Self {
        Self {
            mode: None,
            cells: vec![CellContent::Empty; cell_count],
        }
    }

    /// The fit mode that produced this composition, `None` if empty.
    pub fn mode(&self) -> Option<FitMode> {
        self.mode
    }

    pub fn cells(&self) -> &[CellContent] {
        &self.cells
    }

    /// Content of a 1-based cell index.
    pub fn cell(&self, index: usize) -> Option<&CellContent> {
        index.checked_sub(1).and_then(|i| self.cells.get(i))
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Cumulative pixel boundaries of a weight list over `extent` pixels.
///
/// Each boundary is rounded independently from the exact cumulative
/// position, so rounding error never accumulates across tracks. The result
/// has `weights.len() + 1` entries, starts at 0, ends at `extent`, and is
/// non-decreasing.
pub fn boundaries(weights: &[f64], extent: u32) -> Vec<u32> {
    let total: f64 = weights.iter().sum();
    let mut result = Vec::with_capacity(weights.len() + 1);
    result.push(0);

    let mut cumulative = 0.0;
    let mut previous = 0u32;
    for (i, weight) in weights.iter().enumerate() {
        cumulative += weight;
        let boundary = if i + 1 == weights.len() || total <= 0.0 {
            extent
        } else {
            (cumulative / total * extent as f64).round() as u32
        };
        let boundary = boundary.clamp(previous, extent);
        result.push(boundary);
        previous = boundary;
    }

    result
}

/// Column boundaries of `partition` over `width` pixels.
pub fn column_boundaries(partition: &GridPartition, width: u32) -> Vec<u32> {
    boundaries(partition.column_weights(), width)
}

/// Row boundaries of `partition` over `height` pixels.
pub fn row_boundaries(partition: &GridPartition, height: u32) -> Vec<u32> {
    boundaries(partition.row_weights(), height)
}

/// Pixel rectangle of every cell, in row-major order.
pub fn compute_cell_rects(partition: &GridPartition, width: u32, height: u32) -> Vec<CellRect> {
    let columns = column_boundaries(partition, width);
    let rows = row_boundaries(partition, height);

    let mut rects = Vec::with_capacity(partition.cell_count());
    for row in rows.windows(2) {
        for column in columns.windows(2) {
            rects.push(CellRect::new(
                column[0],
                row[0],
                column[1] - column[0],
                row[1] - row[0],
            ));
        }
    }
    rects
}

/// Where a `src_w` x `src_h` image lands inside a `box_w` x `box_h` box
/// when contained: aspect preserved, centred. Coordinates are relative to
/// the box.
pub fn contain_rect(src_w: u32, src_h: u32, box_w: u32, box_h: u32) -> CellRect {
    if src_w == 0 || src_h == 0 || box_w == 0 || box_h == 0 {
        return CellRect::new(0, 0, 0, 0);
    }
    let scale = (box_w as f64 / src_w as f64).min(box_h as f64 / src_h as f64);
    let width = ((src_w as f64 * scale).round() as u32).clamp(1, box_w);
    let height = ((src_h as f64 * scale).round() as u32).clamp(1, box_h);
    CellRect::new((box_w - width) / 2, (box_h - height) / 2, width, height)
}

/// The region of a `src_w` x `src_h` image that stays visible when it
/// covers a `box_w` x `box_h` box: aspect preserved, centred. Coordinates
/// are in source pixels.
pub fn cover_crop(src_w: u32, src_h: u32, box_w: u32, box_h: u32) -> CellRect {
    if src_w == 0 || src_h == 0 || box_w == 0 || box_h == 0 {
        return CellRect::new(0, 0, src_w, src_h);
    }
    let scale = (box_w as f64 / src_w as f64).max(box_h as f64 / src_h as f64);
    let width = ((box_w as f64 / scale).round() as u32).clamp(1, src_w);
    let height = ((box_h as f64 / scale).round() as u32).clamp(1, src_h);
    CellRect::new((src_w - width) / 2, (src_h - height) / 2, width, height)
}

/// Resize `image` to the container box and cut it along the partition.
///
/// Returns one slice per cell in row-major order.
pub fn background_slices(
    image: &RgbaImage,
    partition: &GridPartition,
    container_width: u32,
    container_height: u32,
) -> Vec<RgbaImage> {
    let fitted;
    let source = if image.dimensions() == (container_width, container_height) {
        image
    } else {
        fitted = imageops::resize(image, container_width, container_height, RESAMPLE_FILTER);
        &fitted
    };

    compute_cell_rects(partition, container_width, container_height)
        .into_iter()
        .map(|rect| imageops::crop_imm(source, rect.left, rect.top, rect.width, rect.height).to_image())
        .collect()
}

/// Cut an image along the partition at its native size.
pub fn slice_image(image: &RgbaImage, partition: &GridPartition) -> Vec<RgbaImage> {
    let (width, height) = image.dimensions();
    background_slices(image, partition, width, height)
}

/// Build the grid's cell contents for `mode`.
///
/// `container` is the pixel box the grid occupies; background modes slice
/// the image against it. Returns `None` when there is no decoded image yet.
/// The partition is never changed here: SingleCornerStretch expects the
/// caller to have made it uniform when the mode was applied.
pub fn compose(
    mode: FitMode,
    image: Option<&Arc<RgbaImage>>,
    partition: &GridPartition,
    container: (u32, u32),
) -> Option<GridComposition> {
    let image = image.filter(|img| img.width() > 0 && img.height() > 0)?;
    let cell_count = partition.cell_count();

    let whole = |placement| {
        vec![
            CellContent::Image {
                image: Arc::clone(image),
                placement,
            };
            cell_count
        ]
    };

    let cells = match mode {
        FitMode::Fill => whole(Placement::Stretch),
        FitMode::Contain => whole(Placement::Contain),
        FitMode::Cover => whole(Placement::Cover),
        FitMode::DebugCorners => match CornerStretch::from_image(image) {
            Some(corners) => vec![CellContent::Corners(Arc::new(corners)); cell_count],
            None => whole(Placement::Stretch),
        },
        FitMode::Background => background_slices(image, partition, container.0, container.1)
            .into_iter()
            .map(|slice| CellContent::Slice(Arc::new(slice)))
            .collect(),
        FitMode::SingleCornerStretch => {
            background_slices(image, partition, container.0, container.1)
                .into_iter()
                .map(|slice| match CornerStretch::from_image(&slice) {
                    Some(corners) => CellContent::Corners(Arc::new(corners)),
                    None => CellContent::Slice(Arc::new(slice)),
                })
                .collect()
        }
    };

    tracing::debug!(
        mode = %mode,
        cells = cell_count,
        image_width = image.width(),
        image_height = image.height(),
        "Composed grid"
    );

    Some(GridComposition {
        mode: Some(mode),
        cells,
    })
}
