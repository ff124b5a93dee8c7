pub mod check;
pub mod detect;
pub mod record;
pub mod render;
pub mod slice;

use std::path::Path;

use cellgrid_common::config::AppConfig;
use cellgrid_editor::{Editor, FolderLoad};
use cellgrid_grid_model::FitMode;

/// Grid overrides shared by `render` and `record`.
#[derive(Debug, Clone, Default)]
pub struct GridArgs {
    pub mode: Option<FitMode>,
    pub columns: Option<usize>,
    pub rows: Option<usize>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Create an editor from the config with command-line overrides applied.
pub fn build_editor(config: &AppConfig, grid: &GridArgs) -> anyhow::Result<Editor> {
    let mut config = config.clone();
    if let Some(mode) = grid.mode {
        config.grid.fit_mode = mode.as_str().to_string();
    }
    if let Some(columns) = grid.columns {
        config.grid.columns = columns;
    }
    if let Some(rows) = grid.rows {
        config.grid.rows = rows;
    }
    if let Some(width) = grid.width {
        config.canvas.width = width;
    }
    if let Some(height) = grid.height {
        config.canvas.height = height;
    }
    Ok(Editor::new(&config)?)
}

/// Load an image file, or the longest sequence in a folder.
pub async fn load_input(editor: &mut Editor, input: &Path) -> anyhow::Result<()> {
    if input.is_dir() {
        match editor.load_folder(input).await? {
            FolderLoad::Sequence {
                pattern,
                frames,
                sequences_found,
            } => {
                println!("Sequence: {pattern} ({frames} frames, {sequences_found} found)");
            }
            FolderLoad::NoSequence { scanned } => {
                anyhow::bail!(
                    "No sequences detected in {} ({scanned} images scanned)",
                    input.display()
                );
            }
            FolderLoad::Superseded => anyhow::bail!("Folder load was superseded"),
        }
    } else {
        editor.load_path(input).await?;
        println!("Image: {}", input.display());
    }
    Ok(())
}
