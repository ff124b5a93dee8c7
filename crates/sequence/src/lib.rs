//! Cellgrid Sequence Detection
//!
//! Finds numbered image sequences (`frame_001.png` ... `frame_045.png`) in an
//! arbitrary set of files:
//! - **Pattern:** Structured filename parser deriving prefix, suffix and numbering
//! - **Detect:** Grouping, numeric ordering, and claiming so no file is in two sequences
//!
//! This crate is pure computation: it only looks at file names.

pub mod detect;
pub mod pattern;

pub use detect::{detect, select_primary};
pub use pattern::{
    derive_pattern, natural_index, parse_file_name, sequence_index, ParsedName, PatternRule,
};
