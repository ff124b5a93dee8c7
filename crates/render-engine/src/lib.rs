//! Cellgrid Render Engine
//!
//! Maps a source image onto the cells of a weighted grid, rasterizes the
//! grid into RGBA frames, and records those frames as video.
//!
//! # Pipeline Architecture
//!
//! ```text
//! source image ──┐
//!                ├── compose (fit mode) ── GridComposition
//! partition ─────┘                                │
//!                                                 ├── render_grid ── RgbaImage
//! style ──────────────────────────────────────────┘         │
//!                                                            ├── FrameSink
//!                                                            ▼
//!                                               ffmpeg (H.264 / VP9)
//!                                                            │
//!                                                            ▼
//!                                          grid-recording-<ms>.mp4
//! ```

pub mod compositor;
pub mod corners;
pub mod export;
pub mod raster;

pub use compositor::{
    background_slices, boundaries, column_boundaries, compose, compute_cell_rects, contain_rect,
    cover_crop, row_boundaries, slice_image, CellContent, GridComposition, Placement,
};
pub use corners::CornerStretch;
pub use export::*;
pub use raster::{render_grid, RenderStyle};
