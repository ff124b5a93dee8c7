//! Cellgrid Grid Model
//!
//! Defines the core data contracts shared by the detector, compositor and
//! editor:
//! - **Partition:** Weighted columns and rows, and the pixel rectangles derived from them
//! - **Fit mode:** How one source image maps onto the grid's cells
//! - **Sequence:** Candidate files and the numbered sequences detected among them
//!
//! Everything here is plain data. Pixel buffers and decoding live in the
//! render engine and editor crates.

pub mod canvas;
pub mod fit_mode;
pub mod partition;
pub mod sequence;

pub use canvas::*;
pub use fit_mode::*;
pub use partition::*;
pub use sequence::*;

/// Errors raised when model values violate their invariants.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("grid needs at least one {axis}")]
    EmptyAxis { axis: &'static str },

    #[error("{axis} weight {value} at index {index} must be finite and greater than zero")]
    InvalidWeight {
        axis: &'static str,
        index: usize,
        value: f64,
    },

    #[error("expected {expected} {axis} weights, got {actual}")]
    WeightCountMismatch {
        axis: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("unknown fit mode '{0}'")]
    UnknownFitMode(String),

    #[error("invalid sequence: {reason}")]
    InvalidSequence { reason: String },

    #[error("canvas {width}x{height} is outside {min}..={max} pixels per axis")]
    CanvasOutOfRange {
        width: u32,
        height: u32,
        min: u32,
        max: u32,
    },
}
