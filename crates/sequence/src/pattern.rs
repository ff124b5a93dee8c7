//! Filename pattern parsing.
//!
//! A file name is split into three parts by scanning it once from the end:
//!
//! ```text
//! frame_0042.png
//! └─head─┘└run┘└suffix┘
//! ```
//!
//! - `suffix`: the extension from the last `.`, which must be non-empty and
//!   contain no further dot.
//! - `run`: the maximal run of ASCII digits ending the stem.
//! - `head`: everything in the stem before the run.
//!
//! Padded patterns are then derived by three rules tried in order:
//!
//! | Rule          | Shape                      | Prefix       |
//! |---------------|----------------------------|--------------|
//! | `Underscored` | `<text>_<2-4 digits><ext>` | `<text>_`    |
//! | `Bare`        | `<text><2-4 digits><ext>`  | `<text>`     |
//! | `NumericOnly` | `<2-4 digits><ext>`        | empty        |
//!
//! Runs shorter than two or longer than four digits never form a padded
//! pattern, so stray single digits and long numeric ids are left alone.
//!
//! Frame numbers are read by separate functions, [`sequence_index`] and
//! [`natural_index`], which do not depend on which rule matched.

use cellgrid_grid_model::SequencePattern;

const MIN_PADDED_DIGITS: usize = 2;
const MAX_DIGITS: usize = 4;

/// Which derivation rule produced a padded pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternRule {
    /// `name_001.png`
    Underscored,
    /// `name001.png`
    Bare,
    /// `0001.png`
    NumericOnly,
}

/// A file name split into head, trailing digit run, and extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedName<'a> {
    head: &'a str,
    run: &'a str,
    suffix: &'a str,
}

impl<'a> ParsedName<'a> {
    /// Stem text before the digit run.
    pub fn head(&self) -> &'a str {
        self.head
    }

    /// Trailing digit run of the stem (may be empty).
    pub fn digits(&self) -> &'a str {
        self.run
    }

    /// Extension including the dot.
    pub fn suffix(&self) -> &'a str {
        self.suffix
    }

    /// Derive the padded pattern for this name, if any rule matches.
    pub fn padded_pattern(&self) -> Option<(SequencePattern, PatternRule)> {
        let width = self.run.len();
        if !(MIN_PADDED_DIGITS..=MAX_DIGITS).contains(&width) {
            return None;
        }

        let rule = if self.head.is_empty() {
            PatternRule::NumericOnly
        } else if self.head.len() > 1 && self.head.ends_with('_') {
            PatternRule::Underscored
        } else {
            PatternRule::Bare
        };

        Some((
            SequencePattern::padded(self.head, width, self.suffix),
            rule,
        ))
    }

    /// The `(prefix, suffix)` key for unpadded counting, if the run is a
    /// 1 to 4 digit number written without leading zeros.
    pub fn natural_key(&self) -> Option<(&'a str, &'a str)> {
        let run = self.run;
        if run.is_empty() || run.len() > MAX_DIGITS {
            return None;
        }
        if run.len() > 1 && run.starts_with('0') {
            return None;
        }
        Some((self.head, self.suffix))
    }
}

/// Split a file name into head, digit run and extension.
///
/// Returns `None` when the name has no usable extension.
pub fn parse_file_name(name: &str) -> Option<ParsedName<'_>> {
    let (stem, suffix) = split_extension(name)?;
    let run_start = trailing_digits_start(stem);
    Some(ParsedName {
        head: &stem[..run_start],
        run: &stem[run_start..],
        suffix,
    })
}

/// Derive the padded sequence pattern of a file name.
pub fn derive_pattern(name: &str) -> Option<(SequencePattern, PatternRule)> {
    parse_file_name(name)?.padded_pattern()
}

/// Frame number of a padded-sequence file.
///
/// Reads the trailing digit run before the extension (or at the end of the
/// name if there is none). Runs of 2 to 4 digits parse as-is; longer runs
/// use their last four digits; shorter or missing runs give 0.
pub fn sequence_index(name: &str) -> u32 {
    let stem = split_extension(name).map_or(name, |(stem, _)| stem);
    let run = &stem[trailing_digits_start(stem)..];
    if run.len() < MIN_PADDED_DIGITS {
        return 0;
    }
    let last = &run[run.len().saturating_sub(MAX_DIGITS)..];
    last.parse().unwrap_or(0)
}

/// Frame number of a natural-sequence file (1 to 4 digits).
pub fn natural_index(name: &str) -> Option<u32> {
    let parsed = parse_file_name(name)?;
    parsed.natural_key()?;
    parsed.digits().parse().ok()
}

fn split_extension(name: &str) -> Option<(&str, &str)> {
    let dot = name.rfind('.')?;
    if dot + 1 >= name.len() {
        return None;
    }
    Some((&name[..dot], &name[dot..]))
}

fn trailing_digits_start(stem: &str) -> usize {
    let bytes = stem.as_bytes();
    let mut start = bytes.len();
    while start > 0 && bytes[start - 1].is_ascii_digit() {
        start -= 1;
    }
    start
}
