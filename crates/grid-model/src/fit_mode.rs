//! Fit modes: how a source image is mapped onto grid cells.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Policy for placing the current image into the grid.
///
/// Modes are mutually exclusive. Selecting one rebuilds every cell from the
/// source image, so nothing from the previous mode survives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FitMode {
    /// Stretch the whole image to each cell box.
    #[default]
    Fill,
    /// Scale to fit inside each cell, preserving aspect ratio (letterbox).
    Contain,
    /// Scale to cover each cell, preserving aspect ratio (crop).
    Cover,
    /// Four-quadrant corner stretch of the whole image in every cell.
    DebugCorners,
    /// One image spread across the grid, each cell showing its slice.
    Background,
    /// Uniform grid, background slices, then corner stretch per slice.
    SingleCornerStretch,
}

impl FitMode {
    pub const ALL: [FitMode; 6] = [
        FitMode::Fill,
        FitMode::Contain,
        FitMode::Cover,
        FitMode::DebugCorners,
        FitMode::Background,
        FitMode::SingleCornerStretch,
    ];

    /// Stable kebab-case name.
    pub fn as_str(self) -> &'static str {
        match self {
            FitMode::Fill => "fill",
            FitMode::Contain => "contain",
            FitMode::Cover => "cover",
            FitMode::DebugCorners => "debug-corners",
            FitMode::Background => "background",
            FitMode::SingleCornerStretch => "single-corner-stretch",
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            FitMode::Fill => "Stretch to Fill Cell",
            FitMode::Contain => "Fit Within Cell",
            FitMode::Cover => "Fill Cell Completely",
            FitMode::DebugCorners => "Debug 4 Corners",
            FitMode::Background => "Single Image Background",
            FitMode::SingleCornerStretch => "Single Corner Stretch",
        }
    }

    /// Whether the mode slices one image across the container instead of
    /// showing the whole image in every cell.
    pub fn slices_container(self) -> bool {
        matches!(self, FitMode::Background | FitMode::SingleCornerStretch)
    }
}

impl fmt::Display for FitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FitMode {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        FitMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == normalized)
            .ok_or_else(|| ModelError::UnknownFitMode(s.to_string()))
    }
}
