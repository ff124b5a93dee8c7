//! Cut an image into grid cells.

use std::path::PathBuf;

use cellgrid_editor::loader::{decode_image_blocking, read_file};
use cellgrid_grid_model::GridPartition;
use cellgrid_render_engine::slice_image;
use image::ImageFormat;

pub fn run(
    image: PathBuf,
    columns: usize,
    rows: usize,
    column_weights: Option<Vec<f64>>,
    row_weights: Option<Vec<f64>>,
    output: PathBuf,
) -> anyhow::Result<()> {
    let column_weights = column_weights.unwrap_or_else(|| vec![1.0; columns.max(1)]);
    let row_weights = row_weights.unwrap_or_else(|| vec![1.0; rows.max(1)]);
    let partition = GridPartition::from_weights(column_weights, row_weights)
        .map_err(|e| anyhow::anyhow!("Invalid grid: {e}"))?;

    let file = read_file(&image)?;
    let decoded = decode_image_blocking(file.name(), file.bytes())?;
    println!(
        "Slicing {} ({}x{}) into {}x{} cells",
        image.display(),
        decoded.width(),
        decoded.height(),
        partition.column_count(),
        partition.row_count()
    );

    std::fs::create_dir_all(&output)?;
    let slices = slice_image(&decoded, &partition);
    let width = slices.len().to_string().len();
    for (i, slice) in slices.iter().enumerate() {
        if slice.width() == 0 || slice.height() == 0 {
            tracing::warn!(cell = i + 1, "Skipping empty cell");
            continue;
        }
        let path = output.join(format!("cell_{:0width$}.png", i + 1));
        slice.save_with_format(&path, ImageFormat::Png)?;
        println!("  {} ({}x{})", path.display(), slice.width(), slice.height());
    }

    Ok(())
}
