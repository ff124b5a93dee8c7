//! Cellgrid Common Utilities
//!
//! Shared infrastructure for all Cellgrid crates:
//! - Error types and result aliases
//! - Clock and frame-rate utilities for playback and recording
//! - Tracing/logging initialization
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
