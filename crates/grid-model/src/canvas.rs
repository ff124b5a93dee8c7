//! Grid container dimensions.

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Size of the grid container in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    /// Smallest accepted edge length.
    pub const MIN_EDGE: u32 = 64;

    /// Largest accepted edge length.
    pub const MAX_EDGE: u32 = 4096;

    /// Border drawn around the container on each side; excluded from the
    /// box that background slicing maps the image onto.
    pub const BORDER_PX: u32 = 2;

    /// Create a canvas size, rejecting edges outside `MIN_EDGE..=MAX_EDGE`.
    pub fn new(width: u32, height: u32) -> Result<Self, ModelError> {
        let range = Self::MIN_EDGE..=Self::MAX_EDGE;
        if !range.contains(&width) || !range.contains(&height) {
            return Err(ModelError::CanvasOutOfRange {
                width,
                height,
                min: Self::MIN_EDGE,
                max: Self::MAX_EDGE,
            });
        }
        Ok(Self { width, height })
    }

    /// The container's inner box, excluding the border.
    pub fn inner(&self) -> (u32, u32) {
        (
            self.width.saturating_sub(2 * Self::BORDER_PX).max(1),
            self.height.saturating_sub(2 * Self::BORDER_PX).max(1),
        )
    }

    /// Dimensions scaled by an integer factor, rounded up to even values
    /// as required by 4:2:0 video encoders.
    pub fn scaled_even(&self, factor: u32) -> (u32, u32) {
        let factor = factor.max(1);
        (
            round_up_even(self.width * factor),
            round_up_even(self.height * factor),
        )
    }
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
        }
    }
}

fn round_up_even(value: u32) -> u32 {
    value + (value & 1)
}
