//! Editor state.

use std::sync::Arc;

use cellgrid_grid_model::{CanvasSize, FitMode, GridPartition, SequencePattern};
use cellgrid_render_engine::GridComposition;
use image::RgbaImage;

/// The decoded image currently mapped onto the grid.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub name: String,
    pub image: Arc<RgbaImage>,
}

/// The sequence currently playing.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedSequence {
    pub pattern: SequencePattern,
    /// File names in frame order.
    pub names: Vec<String>,
}

/// Everything the grid shows.
#[derive(Debug, Clone)]
pub struct EditorState {
    pub canvas: CanvasSize,
    pub partition: GridPartition,
    pub fit_mode: FitMode,
    pub show_splitters: bool,
    pub image: Option<LoadedImage>,
    pub sequence: Option<LoadedSequence>,
    /// Per-cell contents for the current image and fit mode.
    pub composition: Option<GridComposition>,
    pub status: String,
}

impl EditorState {
    pub fn new(canvas: CanvasSize, partition: GridPartition, fit_mode: FitMode) -> Self {
        Self {
            canvas,
            partition,
            fit_mode,
            show_splitters: true,
            image: None,
            sequence: None,
            composition: None,
            status: String::new(),
        }
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }

    pub fn is_playing_sequence(&self) -> bool {
        self.sequence.is_some()
    }
}

impl Default for EditorState {
    fn default() -> Self {
        Self::new(CanvasSize::default(), GridPartition::default(), FitMode::default())
    }
}
