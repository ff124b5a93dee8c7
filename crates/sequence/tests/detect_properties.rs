use std::collections::HashSet;

use cellgrid_grid_model::{CandidateFile, NamedFile, Numbering};
use cellgrid_sequence::{detect, select_primary};
use proptest::prelude::*;

#[derive(Debug, Clone)]
struct Tagged {
    id: usize,
    name: String,
}

impl NamedFile for Tagged {
    fn file_name(&self) -> &str {
        &self.name
    }
}

/// File names drawn from a small alphabet so that collisions, shared
/// prefixes and mixed digit widths are common.
fn file_name() -> impl Strategy<Value = String> {
    (
        prop::sample::select(vec!["", "a", "a_", "img", "frame_", "x1_", "0"]),
        0u32..1500,
        1usize..6,
        prop::sample::select(vec![".png", ".jpg", "", ".tar.gz"]),
    )
        .prop_map(|(prefix, number, width, ext)| {
            format!("{prefix}{number:0width$}{ext}")
        })
}

proptest! {
    #[test]
    fn sequences_are_ordered_and_long_enough(names in prop::collection::vec(file_name(), 0..40)) {
        let sequences = detect(&names);
        for sequence in &sequences {
            prop_assert!(sequence.len() >= 2);
            prop_assert!(sequence.indices().windows(2).all(|pair| pair[0] < pair[1]));
        }
    }

    #[test]
    fn no_file_is_in_two_sequences(names in prop::collection::vec(file_name(), 0..40)) {
        let tagged: Vec<Tagged> = names
            .into_iter()
            .enumerate()
            .map(|(id, name)| Tagged { id, name })
            .collect();

        let mut seen = HashSet::new();
        for sequence in detect(&tagged) {
            for file in sequence.files() {
                prop_assert!(seen.insert(file.id), "file {} appears twice", file.name);
            }
        }
    }

    #[test]
    fn members_share_the_sequence_pattern(names in prop::collection::vec(file_name(), 0..40)) {
        for sequence in detect(&names) {
            let pattern = sequence.pattern();
            for name in sequence.names() {
                prop_assert!(name.starts_with(&pattern.prefix));
                prop_assert!(name.ends_with(&pattern.suffix));
            }
        }
    }

    #[test]
    fn primary_is_longest(names in prop::collection::vec(file_name(), 0..40)) {
        let sequences = detect(&names);
        match select_primary(&sequences) {
            Some(primary) => prop_assert!(sequences.iter().all(|s| s.len() <= primary.len())),
            None => prop_assert!(sequences.is_empty()),
        }
    }
}

#[test]
fn detects_sequence_among_candidate_files() {
    let files: Vec<CandidateFile> = ["frame_002.png", "notes.png", "frame_001.png", "frame_003.png"]
        .iter()
        .map(|name| CandidateFile::from_bytes(*name, Vec::new()))
        .collect();

    let sequences = detect(&files);
    assert_eq!(sequences.len(), 1);
    assert_eq!(
        sequences[0].names(),
        vec!["frame_001.png", "frame_002.png", "frame_003.png"]
    );
}

#[test]
fn numeric_order_is_not_lexicographic() {
    let names = ["img1.jpg", "img2.jpg", "img10.jpg"];
    let sequences = detect(&names);
    assert_eq!(sequences.len(), 1);
    assert_eq!(sequences[0].names(), vec!["img1.jpg", "img2.jpg", "img10.jpg"]);
}

#[test]
fn two_and_three_digit_runs_are_separate_sequences() {
    let sequences = detect(&["a_10.png", "a_11.png", "a_100.png", "a_101.png"]);
    assert_eq!(sequences.len(), 2);
    assert!(sequences
        .iter()
        .all(|s| s.pattern().numbering != Numbering::Natural));
    assert_eq!(sequences[0].indices(), &[10, 11]);
    assert_eq!(sequences[1].indices(), &[100, 101]);
}

#[test]
fn longest_sequence_wins_in_a_mixed_folder() {
    let mut names: Vec<String> = (1..=45).map(|i| format!("frame_{i:03}.png")).collect();
    names.extend((1..=3).map(|i| format!("thumb{i:02}.jpg")));
    names.push("cover.png".to_string());

    let sequences = detect(&names);
    assert_eq!(sequences.len(), 2);
    let primary = select_primary(&sequences).unwrap();
    assert_eq!(primary.len(), 45);
    assert_eq!(primary.names()[0], "frame_001.png");
    assert_eq!(primary.names()[44], "frame_045.png");
}
