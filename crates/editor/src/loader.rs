//! Reading and decoding image files.

use std::path::Path;
use std::sync::Arc;

use cellgrid_common::error::{CellgridError, CellgridResult};
use cellgrid_grid_model::CandidateFile;
use image::{ImageFormat, RgbaImage};
use walkdir::WalkDir;

/// Whether the path's extension names an image format we can decode.
pub fn is_image_path(path: &Path) -> bool {
    ImageFormat::from_path(path).is_ok()
}

/// Read a single image file.
pub fn read_file(path: &Path) -> CellgridResult<CandidateFile> {
    if !path.is_file() {
        return Err(CellgridError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    Ok(CandidateFile::read(path)?)
}

/// Read every image file under `dir`, recursively, in file-name order.
///
/// Files that are not images by extension are skipped; unreadable entries
/// are logged and skipped.
pub fn scan_folder(dir: &Path) -> CellgridResult<Vec<CandidateFile>> {
    if !dir.is_dir() {
        return Err(CellgridError::FileNotFound {
            path: dir.to_path_buf(),
        });
    }

    let mut files = Vec::new();
    let mut skipped = 0usize;
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(error = %err, "Skipping unreadable folder entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if !is_image_path(entry.path()) {
            skipped += 1;
            continue;
        }
        match CandidateFile::read(entry.path()) {
            Ok(file) => files.push(file),
            Err(err) => {
                tracing::warn!(path = %entry.path().display(), error = %err, "Failed to read image file");
            }
        }
    }

    tracing::debug!(
        dir = %dir.display(),
        images = files.len(),
        skipped,
        "Scanned folder"
    );
    Ok(files)
}

/// Decode encoded image bytes to RGBA8 on the calling thread.
pub fn decode_image_blocking(name: &str, bytes: &[u8]) -> CellgridResult<RgbaImage> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| CellgridError::decode(format!("{name}: {e}")))?;
    Ok(decoded.to_rgba8())
}

/// Decode on the blocking thread pool.
pub async fn decode_image(name: String, bytes: Arc<[u8]>) -> CellgridResult<RgbaImage> {
    tokio::task::spawn_blocking(move || decode_image_blocking(&name, &bytes))
        .await
        .map_err(|e| CellgridError::decode(format!("Decoder task failed: {e}")))?
}

/// Decode every file concurrently, keeping input order.
///
/// Each entry is the decode result for the file at the same position.
pub async fn decode_all(files: &[CandidateFile]) -> Vec<CellgridResult<RgbaImage>> {
    let mut tasks = tokio::task::JoinSet::new();
    for (i, file) in files.iter().enumerate() {
        let name = file.name().to_string();
        let bytes = file.shared_bytes();
        tasks.spawn_blocking(move || (i, decode_image_blocking(&name, &bytes)));
    }

    let mut results: Vec<Option<CellgridResult<RgbaImage>>> = files.iter().map(|_| None).collect();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((i, result)) => results[i] = Some(result),
            Err(err) => tracing::error!(error = %err, "Decoder task failed"),
        }
    }

    results
        .into_iter()
        .map(|r| r.unwrap_or_else(|| Err(CellgridError::decode("Decoder task failed"))))
        .collect()
}
