//! Editor controller.
//!
//! The [`Editor`] owns the [`EditorState`] and is the only thing that
//! mutates it. Loads are split into a ticket, an async read/decode that does
//! not borrow the editor, and a completion step. Completing with a ticket
//! older than the latest one is ignored, so a newer load always supersedes
//! an older one regardless of which finishes first.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use cellgrid_common::config::AppConfig;
use cellgrid_common::error::{CellgridError, CellgridResult};
use cellgrid_grid_model::{CandidateFile, CanvasSize, CellRect, FitMode, GridPartition, SequencePattern};
use cellgrid_render_engine::{
    compose, compute_cell_rects, record_grid, render_grid, CodecCandidate, FrameSink, FrameSource,
    ProgressCallback, Recorder, RecordingOutcome, RecordingPlan, RecordingSettings, RenderStyle,
};
use image::RgbaImage;

use crate::default_content::{default_circle_image, DEFAULT_IMAGE_NAME};
use crate::loader::{decode_all, decode_image, read_file, scan_folder};
use crate::playback::SequencePlayer;
use crate::state::{EditorState, LoadedImage, LoadedSequence};

/// Identifies one load request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct LoadTicket(u64);

/// A folder read and decoded off the editor.
#[derive(Debug, Clone)]
pub struct FolderScan {
    /// Image files found.
    pub scanned: usize,
    pub sequences_found: usize,
    /// The longest sequence, decoded.
    pub primary: Option<DecodedSequence>,
}

/// Decoded frames of a sequence, in frame order.
#[derive(Debug, Clone)]
pub struct DecodedSequence {
    pub pattern: SequencePattern,
    pub names: Vec<String>,
    pub frames: Vec<Arc<RgbaImage>>,
}

/// Result of a folder load.
#[derive(Debug, Clone, PartialEq)]
pub enum FolderLoad {
    /// A sequence was found and is now playing.
    Sequence {
        pattern: SequencePattern,
        frames: usize,
        sequences_found: usize,
    },
    /// No sequence found; the grid was left as it was.
    NoSequence { scanned: usize },
    /// A newer load was started before this one completed.
    Superseded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FrameKey {
    revision: u64,
    width: u32,
    height: u32,
    scale: u32,
}

#[derive(Debug)]
struct CachedFrame {
    key: FrameKey,
    frame: RgbaImage,
}

/// Grid editor controller.
#[derive(Debug)]
pub struct Editor {
    state: EditorState,
    style: RenderStyle,
    playback_fps: u32,
    player: Option<SequencePlayer>,
    latest_ticket: u64,
    /// Bumped on every change that affects rendered output.
    revision: u64,
    cache: Option<CachedFrame>,
}

impl Editor {
    /// Create an editor from configuration.
    pub fn new(config: &AppConfig) -> CellgridResult<Self> {
        let canvas = CanvasSize::new(config.canvas.width, config.canvas.height)
            .map_err(|e| CellgridError::config(e.to_string()))?;
        let fit_mode: FitMode = config
            .grid
            .fit_mode
            .parse()
            .map_err(|e: cellgrid_grid_model::ModelError| CellgridError::config(e.to_string()))?;
        let partition = GridPartition::uniform(config.grid.columns, config.grid.rows);

        let mut state = EditorState::new(canvas, partition, fit_mode);
        state.show_splitters = config.grid.show_splitters;

        Ok(Self {
            state,
            style: RenderStyle::from(&config.style),
            playback_fps: config.playback.fps,
            player: None,
            latest_ticket: 0,
            revision: 0,
            cache: None,
        })
    }

    /// Create an editor showing the built-in test card.
    pub fn with_default_content(config: &AppConfig) -> CellgridResult<Self> {
        let mut editor = Self::new(config)?;
        editor.load_default_content();
        Ok(editor)
    }

    /// Show the built-in test card, replacing any image or sequence.
    pub fn load_default_content(&mut self) {
        self.begin_load();
        self.install_image(DEFAULT_IMAGE_NAME, default_circle_image());
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn status(&self) -> &str {
        &self.state.status
    }

    pub fn style(&self) -> &RenderStyle {
        &self.style
    }

    pub fn player(&self) -> Option<&SequencePlayer> {
        self.player.as_ref()
    }

    /// Pixel rectangles of the cells inside the container border.
    pub fn cell_rects(&self) -> Vec<CellRect> {
        let (width, height) = self.state.canvas.inner();
        compute_cell_rects(&self.state.partition, width, height)
    }

    /// Start a load; any earlier load that has not completed is superseded.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.latest_ticket += 1;
        LoadTicket(self.latest_ticket)
    }

    fn is_current(&self, ticket: LoadTicket) -> bool {
        ticket.0 == self.latest_ticket
    }

    /// Install a decoded single image.
    ///
    /// Returns `Ok(false)` when the ticket was superseded and nothing
    /// changed. A decode error is reported through the status and returned.
    pub fn complete_image_load(
        &mut self,
        ticket: LoadTicket,
        name: &str,
        decoded: CellgridResult<RgbaImage>,
    ) -> CellgridResult<bool> {
        if !self.is_current(ticket) {
            tracing::debug!(name, "Discarding superseded image load");
            return Ok(false);
        }

        let image = match decoded {
            Ok(image) => image,
            Err(e) => {
                tracing::warn!(name, error = %e, "Image failed to load");
                self.state.status = format!("Failed to load {name}");
                return Err(e);
            }
        };

        self.install_image(name, image);
        Ok(true)
    }

    fn install_image(&mut self, name: &str, image: RgbaImage) {
        self.stop_sequence();
        tracing::info!(
            name,
            width = image.width(),
            height = image.height(),
            "Loaded image"
        );
        self.state.image = Some(LoadedImage {
            name: name.to_string(),
            image: Arc::new(image),
        });
        self.state.status = format!("Loaded {name}");
        self.apply_mode_layout();
        self.recompose();
    }

    /// Decode and install a single image file.
    pub async fn load_image(&mut self, file: CandidateFile) -> CellgridResult<bool> {
        let ticket = self.begin_load();
        let name = file.name().to_string();
        let decoded = decode_image(name.clone(), file.shared_bytes()).await;
        self.complete_image_load(ticket, &name, decoded)
    }

    /// Read, decode and install a single image from disk.
    pub async fn load_path(&mut self, path: &Path) -> CellgridResult<bool> {
        let file = read_file(path)?;
        self.load_image(file).await
    }

    /// Install the result of [`read_folder`].
    pub fn complete_folder_load(&mut self, ticket: LoadTicket, scan: FolderScan) -> FolderLoad {
        if !self.is_current(ticket) {
            tracing::debug!("Discarding superseded folder load");
            return FolderLoad::Superseded;
        }

        let Some(sequence) = scan.primary else {
            tracing::info!(scanned = scan.scanned, "No sequences detected");
            self.state.status = "No sequences detected".to_string();
            return FolderLoad::NoSequence {
                scanned: scan.scanned,
            };
        };

        self.stop_sequence();
        let frames = sequence.frames.len();
        let player = SequencePlayer::new(sequence.frames, self.playback_fps);
        self.state.image = player.current_frame().map(|frame| LoadedImage {
            name: sequence.names.first().cloned().unwrap_or_default(),
            image: Arc::clone(frame),
        });
        self.player = Some(player);
        self.state.sequence = Some(LoadedSequence {
            pattern: sequence.pattern.clone(),
            names: sequence.names,
        });
        self.state.status = format!("Playing {} ({frames} frames)", sequence.pattern);
        tracing::info!(
            pattern = %sequence.pattern,
            frames,
            fps = self.playback_fps,
            "Started sequence playback"
        );
        self.apply_mode_layout();
        self.recompose();

        FolderLoad::Sequence {
            pattern: sequence.pattern,
            frames,
            sequences_found: scan.sequences_found,
        }
    }

    /// Scan a folder, detect sequences and play the longest one.
    pub async fn load_folder(&mut self, dir: &Path) -> CellgridResult<FolderLoad> {
        let ticket = self.begin_load();
        match read_folder(dir).await {
            Ok(scan) => Ok(self.complete_folder_load(ticket, scan)),
            Err(e) => {
                if self.is_current(ticket) {
                    self.state.status = format!("Failed to load {}", dir.display());
                }
                Err(e)
            }
        }
    }

    /// Change the fit mode. Without an image only the mode is remembered.
    ///
    /// Applying SingleCornerStretch to an image evens out the grid; weights
    /// set afterwards are kept.
    pub fn set_fit_mode(&mut self, mode: FitMode) {
        self.state.fit_mode = mode;
        tracing::debug!(mode = %mode, "Fit mode changed");
        self.apply_mode_layout();
        self.recompose();
    }

    /// Drop the container slicing and show the whole image stretched in
    /// every cell. The selected mode is kept and is applied again by the
    /// next grid or mode change.
    pub fn clear_background(&mut self) {
        if !self.state.fit_mode.slices_container() {
            return;
        }
        let image = self.state.image.as_ref().map(|loaded| &loaded.image);
        if let Some(composition) = compose(
            FitMode::Fill,
            image,
            &self.state.partition,
            self.state.canvas.inner(),
        ) {
            self.state.composition = Some(composition);
            self.revision += 1;
        }
    }

    pub fn add_column(&mut self) {
        self.state.partition.add_column();
        self.recompose();
    }

    /// Returns false if only one column is left.
    pub fn remove_column(&mut self) -> bool {
        let removed = self.state.partition.remove_column();
        if removed {
            self.recompose();
        }
        removed
    }

    pub fn add_row(&mut self) {
        self.state.partition.add_row();
        self.recompose();
    }

    /// Returns false if only one row is left.
    pub fn remove_row(&mut self) -> bool {
        let removed = self.state.partition.remove_row();
        if removed {
            self.recompose();
        }
        removed
    }

    /// Replace the column weights, as after a splitter drag.
    pub fn set_column_weights(&mut self, weights: Vec<f64>) -> CellgridResult<()> {
        self.state
            .partition
            .set_column_weights(weights)
            .map_err(|e| CellgridError::validation(e.to_string()))?;
        self.recompose();
        Ok(())
    }

    /// Replace the row weights, as after a splitter drag.
    pub fn set_row_weights(&mut self, weights: Vec<f64>) -> CellgridResult<()> {
        self.state
            .partition
            .set_row_weights(weights)
            .map_err(|e| CellgridError::validation(e.to_string()))?;
        self.recompose();
        Ok(())
    }

    /// Resize the grid container.
    pub fn set_canvas_size(&mut self, width: u32, height: u32) -> CellgridResult<()> {
        self.state.canvas =
            CanvasSize::new(width, height).map_err(|e| CellgridError::config(e.to_string()))?;
        self.recompose();
        Ok(())
    }

    pub fn set_show_splitters(&mut self, show: bool) {
        self.state.show_splitters = show;
        self.revision += 1;
    }

    /// Stop sequence playback, keeping the current frame on the grid.
    pub fn stop_playback(&mut self) {
        if let Some(player) = &mut self.player {
            player.stop();
        }
    }

    /// Drop the image and sequence and supersede any pending load. The grid
    /// layout is kept.
    pub fn clear_all(&mut self) {
        self.latest_ticket += 1;
        self.stop_sequence();
        self.state.image = None;
        self.state.composition = None;
        self.state.status = "Cleared".to_string();
        self.revision += 1;
        tracing::info!("Cleared editor");
    }

    /// Advance playback to `now_ns`. Returns true if the shown frame changed.
    pub fn tick(&mut self, now_ns: u64) -> bool {
        let Some(player) = &mut self.player else {
            return false;
        };
        if !player.advance(now_ns) {
            return false;
        }
        let index = player.current_index();
        let Some(frame) = player.current_frame().cloned() else {
            return false;
        };
        let name = self
            .state
            .sequence
            .as_ref()
            .and_then(|s| s.names.get(index).cloned())
            .unwrap_or_default();
        self.state.image = Some(LoadedImage { name, image: frame });
        self.recompose();
        true
    }

    /// Render the grid into a `width` x `height` frame.
    ///
    /// The frame is cached until the state next changes.
    pub fn render(&mut self, width: u32, height: u32, scale: u32) -> &RgbaImage {
        let key = FrameKey {
            revision: self.revision,
            width,
            height,
            scale,
        };
        if self.cache.as_ref().map_or(true, |cached| cached.key != key) {
            self.cache = None;
        }

        let state = &self.state;
        let style = &self.style;
        &self
            .cache
            .get_or_insert_with(|| {
                let style = style.clone().with_splitters(state.show_splitters);
                CachedFrame {
                    key,
                    frame: render_grid(
                        state.composition.as_ref(),
                        &state.partition,
                        width,
                        height,
                        scale,
                        &style,
                    ),
                }
            })
            .frame
    }

    /// Render at the canvas size times `scale` (rounded up to even).
    pub fn render_scaled(&mut self, scale: u32) -> &RgbaImage {
        let (width, height) = self.state.canvas.scaled_even(scale);
        self.render(width, height, scale)
    }

    /// Plan a recording of the current canvas.
    pub fn recording_plan(
        &self,
        settings: &RecordingSettings,
        duration: Duration,
        codec: &'static CodecCandidate,
    ) -> RecordingPlan {
        RecordingPlan::new(
            settings,
            self.state.canvas,
            duration,
            codec,
            chrono::Utc::now().timestamp_millis(),
        )
    }

    /// Record the grid. Playback, if any, follows recording time.
    pub async fn record<F>(
        &mut self,
        recorder: &mut Recorder,
        plan: RecordingPlan,
        open_sink: F,
        progress: Option<ProgressCallback>,
    ) -> CellgridResult<RecordingOutcome>
    where
        F: FnOnce(&RecordingPlan) -> CellgridResult<Box<dyn FrameSink>>,
    {
        record_grid(recorder, plan, self, open_sink, progress).await
    }

    fn stop_sequence(&mut self) {
        if let Some(mut player) = self.player.take() {
            player.stop();
        }
        self.state.sequence = None;
    }

    /// Grid changes a mode makes when it is applied to an image.
    fn apply_mode_layout(&mut self) {
        if self.state.fit_mode == FitMode::SingleCornerStretch && self.state.has_image() {
            self.state.partition.reset_uniform();
        }
    }

    /// Rebuild every cell from the source image for the current mode.
    fn recompose(&mut self) {
        let image = self.state.image.as_ref().map(|loaded| &loaded.image);
        self.state.composition = compose(
            self.state.fit_mode,
            image,
            &self.state.partition,
            self.state.canvas.inner(),
        );
        self.revision += 1;
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self {
            state: EditorState::default(),
            style: RenderStyle::default(),
            playback_fps: 30,
            player: None,
            latest_ticket: 0,
            revision: 0,
            cache: None,
        }
    }
}

impl FrameSource for Editor {
    fn render_frame(
        &mut self,
        frame_time_ns: u64,
        width: u32,
        height: u32,
        scale: u32,
    ) -> CellgridResult<&RgbaImage> {
        self.tick(frame_time_ns);
        Ok(self.render(width, height, scale))
    }
}

/// Scan `dir`, detect sequences, and decode the longest one.
///
/// Frames that fail to decode are skipped with a warning; a sequence left
/// with fewer than two frames is an error.
pub async fn read_folder(dir: &Path) -> CellgridResult<FolderScan> {
    let files = scan_folder(dir)?;
    let scanned = files.len();
    let sequences = cellgrid_sequence::detect(&files);
    let sequences_found = sequences.len();

    let Some(primary) = cellgrid_sequence::select_primary(&sequences) else {
        return Ok(FolderScan {
            scanned,
            sequences_found,
            primary: None,
        });
    };

    let decoded = decode_all(primary.files()).await;
    let mut names = Vec::with_capacity(primary.len());
    let mut frames = Vec::with_capacity(primary.len());
    for (file, result) in primary.files().iter().zip(decoded) {
        match result {
            Ok(frame) => {
                names.push(file.name().to_string());
                frames.push(Arc::new(frame));
            }
            Err(e) => tracing::warn!(name = file.name(), error = %e, "Skipping undecodable frame"),
        }
    }

    if frames.len() < 2 {
        return Err(CellgridError::sequence(format!(
            "Sequence {} has fewer than two decodable frames",
            primary.pattern()
        )));
    }

    tracing::debug!(
        pattern = %primary.pattern(),
        frames = frames.len(),
        sequences_found,
        "Decoded primary sequence"
    );

    Ok(FolderScan {
        scanned,
        sequences_found,
        primary: Some(DecodedSequence {
            pattern: primary.pattern().clone(),
            names,
            frames,
        }),
    })
}
