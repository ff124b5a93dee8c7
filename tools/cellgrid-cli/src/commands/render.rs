//! Render one grid frame.

use std::path::PathBuf;

use cellgrid_common::config::AppConfig;
use image::ImageFormat;

use super::{build_editor, load_input, GridArgs};

pub async fn run(
    config: &AppConfig,
    input: Option<PathBuf>,
    grid: GridArgs,
    scale: u32,
    output: PathBuf,
) -> anyhow::Result<()> {
    let mut editor = build_editor(config, &grid)?;
    match input {
        Some(input) => load_input(&mut editor, &input).await?,
        None => {
            editor.load_default_content();
            println!("Image: built-in test card");
        }
    }

    let state = editor.state();
    println!(
        "  Grid: {}x{} cells, mode {}, canvas {}x{}",
        state.partition.column_count(),
        state.partition.row_count(),
        state.fit_mode.label(),
        state.canvas.width,
        state.canvas.height
    );

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let frame = editor.render_scaled(scale.max(1));
    frame.save_with_format(&output, ImageFormat::Png)?;
    println!(
        "Rendered {}x{} frame: {}",
        frame.width(),
        frame.height(),
        output.display()
    );

    Ok(())
}
