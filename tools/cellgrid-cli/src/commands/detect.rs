//! List the image sequences in a folder.

use std::path::PathBuf;

use cellgrid_editor::loader::scan_folder;
use cellgrid_grid_model::SequencePattern;
use cellgrid_sequence::{detect, select_primary};
use serde::Serialize;

#[derive(Serialize)]
struct SequenceSummary<'a> {
    pattern: &'a SequencePattern,
    display: String,
    frames: usize,
    first: &'a str,
    last: &'a str,
    primary: bool,
}

pub fn run(dir: PathBuf, json: bool) -> anyhow::Result<()> {
    let files = scan_folder(&dir)?;
    let sequences = detect(&files);
    let primary = select_primary(&sequences).map(|s| s.pattern());

    let summaries: Vec<SequenceSummary> = sequences
        .iter()
        .map(|sequence| {
            let names = sequence.names();
            SequenceSummary {
                pattern: sequence.pattern(),
                display: sequence.pattern().to_string(),
                frames: sequence.len(),
                first: names.first().copied().unwrap_or_default(),
                last: names.last().copied().unwrap_or_default(),
                primary: primary == Some(sequence.pattern()),
            }
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    println!("Folder: {}", dir.display());
    println!("  Images: {}", files.len());
    if summaries.is_empty() {
        println!("  No sequences detected");
        return Ok(());
    }

    println!("  Sequences: {}", summaries.len());
    for summary in &summaries {
        println!(
            "  {} {:<24} {:>5} frames  {} .. {}",
            if summary.primary { "*" } else { " " },
            summary.display,
            summary.frames,
            summary.first,
            summary.last
        );
    }

    Ok(())
}
