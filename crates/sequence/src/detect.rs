//! Sequence grouping and ordering.
//!
//! # Algorithm
//!
//! 1. **Natural keys:** files numbered without padding (`img1`, `img2`,
//!    `img10`) are grouped by `(prefix, suffix)`. Such a group counts as a
//!    natural sequence only if its members' digit counts differ and at
//!    least one number is a single digit, which is the evidence that the
//!    numbers are unpadded. `a_10`, `a_100` stay two padded patterns.
//! 2. **Padded patterns:** every other file derives a padded pattern
//!    (see [`crate::pattern`]).
//! 3. **Grouping:** walking the input in order, each unclaimed file pulls in
//!    every unclaimed file with the same key or pattern.
//! 4. **Ordering:** members are sorted by frame number; repeated numbers keep
//!    only their first occurrence. Groups of fewer than two are dropped.
//! 5. **Claiming:** all members of a group are claimed, so no file can end up
//!    in two sequences.

use std::collections::HashMap;

use cellgrid_grid_model::{NamedFile, Sequence, SequencePattern};

use crate::pattern::{natural_index, parse_file_name, sequence_index};

/// How a file takes part in grouping.
#[derive(Debug, Clone, PartialEq, Eq)]
enum GroupKey {
    Natural(SequencePattern),
    Padded(SequencePattern),
}

impl GroupKey {
    fn pattern(&self) -> &SequencePattern {
        match self {
            GroupKey::Natural(pattern) | GroupKey::Padded(pattern) => pattern,
        }
    }

    fn index_of(&self, name: &str) -> u32 {
        match self {
            GroupKey::Natural(_) => natural_index(name).unwrap_or(0),
            GroupKey::Padded(_) => sequence_index(name),
        }
    }
}

/// Detect all numbered sequences among `files`.
///
/// Sequences are returned in the order their first member appears in the
/// input. Files that match no pattern, or whose group is too small, are not
/// part of any sequence.
pub fn detect<F: NamedFile + Clone>(files: &[F]) -> Vec<Sequence<F>> {
    let keys = group_keys(files);
    let mut claimed = vec![false; files.len()];
    let mut sequences = Vec::new();

    for (i, key) in keys.iter().enumerate() {
        let Some(key) = key else { continue };
        if claimed[i] {
            continue;
        }

        let mut members: Vec<(u32, usize)> = keys
            .iter()
            .enumerate()
            .filter(|(j, other)| !claimed[*j] && other.as_ref() == Some(key))
            .map(|(j, _)| (key.index_of(files[j].file_name()), j))
            .collect();

        for &(_, j) in &members {
            claimed[j] = true;
        }

        // Stable sort keeps discovery order among equal frame numbers.
        members.sort_by_key(|&(index, _)| index);
        let before_dedup = members.len();
        members.dedup_by_key(|&mut (index, _)| index);
        if members.len() < before_dedup {
            tracing::debug!(
                pattern = %key.pattern(),
                dropped = before_dedup - members.len(),
                "Dropped files repeating a frame number"
            );
        }

        if members.len() < 2 {
            continue;
        }

        let (indices, positions): (Vec<u32>, Vec<usize>) = members.into_iter().unzip();
        let group: Vec<F> = positions.iter().map(|&j| files[j].clone()).collect();

        match Sequence::new(key.pattern().clone(), group, indices) {
            Ok(sequence) => {
                tracing::debug!(
                    pattern = %sequence.pattern(),
                    frames = sequence.len(),
                    "Detected image sequence"
                );
                sequences.push(sequence);
            }
            Err(e) => {
                tracing::warn!(pattern = %key.pattern(), error = %e, "Rejected sequence group");
            }
        }
    }

    sequences
}

/// Pick the sequence to play: the one with the most files, ties going to
/// the first discovered.
pub fn select_primary<F>(sequences: &[Sequence<F>]) -> Option<&Sequence<F>> {
    sequences.iter().fold(None, |best, candidate| match best {
        Some(current) if current.len() >= candidate.len() => Some(current),
        _ => Some(candidate),
    })
}

fn group_keys<F: NamedFile>(files: &[F]) -> Vec<Option<GroupKey>> {
    // Digit counts seen per natural (prefix, suffix) key.
    let mut natural_widths: HashMap<(&str, &str), Vec<usize>> = HashMap::new();
    for file in files {
        if let Some(parsed) = parse_file_name(file.file_name()) {
            if let Some(key) = parsed.natural_key() {
                natural_widths
                    .entry(key)
                    .or_default()
                    .push(parsed.digits().len());
            }
        }
    }

    files
        .iter()
        .map(|file| {
            let parsed = parse_file_name(file.file_name())?;
            if let Some(key @ (prefix, suffix)) = parsed.natural_key() {
                let widths = &natural_widths[&key];
                let mixed = widths.iter().any(|&w| w != widths[0]);
                let unpadded = widths.contains(&1);
                if widths.len() >= 2 && mixed && unpadded {
                    return Some(GroupKey::Natural(SequencePattern::natural(prefix, suffix)));
                }
            }
            parsed
                .padded_pattern()
                .map(|(pattern, _)| GroupKey::Padded(pattern))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellgrid_grid_model::Numbering;

    #[test]
    fn test_simple_padded_sequence() {
        let sequences = detect(&["a_001.png", "a_002.png", "b.png"]);
        assert_eq!(sequences.len(), 1);
        assert_eq!(sequences[0].names(), vec!["a_001.png", "a_002.png"]);
        assert_eq!(sequences[0].pattern().to_string(), "a_000.png");
    }

    #[test]
    fn test_natural_numbering_sorts_numerically() {
        let sequences = detect(&["img10.jpg", "img1.jpg", "img2.jpg"]);
        assert_eq!(sequences.len(), 1);
        assert_eq!(sequences[0].names(), vec!["img1.jpg", "img2.jpg", "img10.jpg"]);
        assert_eq!(sequences[0].pattern().numbering, Numbering::Natural);
        assert_eq!(sequences[0].indices(), &[1, 2, 10]);
    }

    #[test]
    fn test_equal_width_unpadded_numbers_stay_padded() {
        let sequences = detect(&["frame_11.png", "frame_10.png"]);
        assert_eq!(sequences.len(), 1);
        assert_eq!(sequences[0].pattern().digit_width(), Some(2));
        assert_eq!(sequences[0].names(), vec!["frame_10.png", "frame_11.png"]);
    }

    #[test]
    fn test_mixed_widths_without_single_digits_stay_padded() {
        let sequences = detect(&["a_10.png", "a_11.png", "a_100.png", "a_101.png"]);
        assert_eq!(sequences.len(), 2);
        assert_eq!(sequences[0].pattern().digit_width(), Some(2));
        assert_eq!(sequences[0].names(), vec!["a_10.png", "a_11.png"]);
        assert_eq!(sequences[1].pattern().digit_width(), Some(3));
        assert_eq!(sequences[1].names(), vec!["a_100.png", "a_101.png"]);
    }

    #[test]
    fn test_single_digit_names_alone_are_not_sequences() {
        assert!(detect(&["shot1.png", "shot2.png", "shot3.png"]).is_empty());
    }

    #[test]
    fn test_different_widths_are_different_sequences() {
        let sequences = detect(&["x_01.png", "x_02.png", "x_001.png", "x_002.png", "x_003.png"]);
        assert_eq!(sequences.len(), 2);
        assert_eq!(sequences[0].len(), 2);
        assert_eq!(sequences[1].len(), 3);
        assert_eq!(select_primary(&sequences).unwrap().pattern().digit_width(), Some(3));
    }

    #[test]
    fn test_different_extensions_are_different_sequences() {
        let sequences = detect(&["f_01.png", "f_02.jpg", "f_03.png"]);
        assert_eq!(sequences.len(), 1);
        assert_eq!(sequences[0].names(), vec!["f_01.png", "f_03.png"]);
    }

    #[test]
    fn test_duplicate_frame_numbers_keep_first() {
        let sequences = detect(&["a_01.png", "a_02.png", "a_01.png"]);
        assert_eq!(sequences.len(), 1);
        assert_eq!(sequences[0].indices(), &[1, 2]);
    }

    #[test]
    fn test_select_primary_tie_goes_to_first() {
        let sequences = detect(&["b_01.png", "a_01.png", "a_02.png", "b_02.png"]);
        assert_eq!(sequences.len(), 2);
        let primary = select_primary(&sequences).unwrap();
        assert_eq!(primary.pattern().prefix, "b_");
    }

    #[test]
    fn test_select_primary_empty() {
        let sequences: Vec<Sequence<&str>> = Vec::new();
        assert!(select_primary(&sequences).is_none());
    }

    #[test]
    fn test_no_patterns() {
        assert!(detect(&["readme.txt", "cover.png", "notes"]).is_empty());
    }
}
