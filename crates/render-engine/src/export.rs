//! Grid recording and video export.
//!
//! A recording renders the grid at a fixed frame rate from an upscaled
//! surface and streams raw RGBA frames to an encoder sink. The default sink
//! pipes them into an `ffmpeg` child process.

use std::collections::HashSet;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::time::Duration;

use anyhow::Context;
use cellgrid_common::config::RecordingDefaults;
use cellgrid_common::error::{CellgridError, CellgridResult};
use cellgrid_common::RecordingClock;
use cellgrid_grid_model::CanvasSize;
use image::RgbaImage;
use serde::Serialize;

/// Longest accepted recording.
pub const MAX_RECORDING_SECS: f64 = 60.0;

/// Parse a user-entered recording duration in seconds.
///
/// Rejects anything that is not a finite number in `(0, 60]`.
pub fn parse_duration(input: &str) -> CellgridResult<Duration> {
    let secs: f64 = input.trim().parse().map_err(|_| {
        CellgridError::validation(format!("Duration must be a number of seconds, got '{input}'"))
    })?;
    validate_duration(secs)
}

/// Check a duration in seconds against the accepted range.
pub fn validate_duration(secs: f64) -> CellgridResult<Duration> {
    if !secs.is_finite() || secs <= 0.0 || secs > MAX_RECORDING_SECS {
        return Err(CellgridError::validation(format!(
            "Duration must be between 0 and {MAX_RECORDING_SECS} seconds, got {secs}"
        )));
    }
    Ok(Duration::from_secs_f64(secs))
}

/// Output container format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    Mp4,
    Webm,
}

impl Container {
    pub fn extension(&self) -> &'static str {
        match self {
            Container::Mp4 => "mp4",
            Container::Webm => "webm",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Container::Mp4 => "video/mp4",
            Container::Webm => "video/webm",
        }
    }
}

/// One entry of the codec priority list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecCandidate {
    /// MIME type the candidate stands for.
    pub mime_type: &'static str,
    pub container: Container,
    /// ffmpeg encoder name.
    pub encoder: &'static str,
    /// Extra encoder arguments.
    pub encoder_args: &'static [&'static str],
}

/// Candidates in preference order: MP4/H.264 first, then WebM.
pub static CODEC_PRIORITY: [CodecCandidate; 10] = [
    CodecCandidate {
        mime_type: "video/mp4;codecs=avc1.42E01E",
        container: Container::Mp4,
        encoder: "libx264",
        encoder_args: &["-profile:v", "baseline", "-level", "3.0"],
    },
    CodecCandidate {
        mime_type: "video/mp4;codecs=avc1.42001E",
        container: Container::Mp4,
        encoder: "libopenh264",
        encoder_args: &["-profile:v", "constrained_baseline"],
    },
    CodecCandidate {
        mime_type: "video/mp4;codecs=h264,aac",
        container: Container::Mp4,
        encoder: "libx264",
        encoder_args: &[],
    },
    CodecCandidate {
        mime_type: "video/mp4;codecs=h264",
        container: Container::Mp4,
        encoder: "libopenh264",
        encoder_args: &[],
    },
    CodecCandidate {
        mime_type: "video/mp4",
        container: Container::Mp4,
        encoder: "mpeg4",
        encoder_args: &[],
    },
    CodecCandidate {
        mime_type: "video/webm;codecs=vp9,opus",
        container: Container::Webm,
        encoder: "libvpx-vp9",
        encoder_args: &["-row-mt", "1"],
    },
    CodecCandidate {
        mime_type: "video/webm;codecs=vp8,opus",
        container: Container::Webm,
        encoder: "libvpx",
        encoder_args: &[],
    },
    CodecCandidate {
        mime_type: "video/webm;codecs=vp9",
        container: Container::Webm,
        encoder: "libvpx-vp9",
        encoder_args: &[],
    },
    CodecCandidate {
        mime_type: "video/webm;codecs=vp8",
        container: Container::Webm,
        encoder: "libvpx",
        encoder_args: &[],
    },
    CodecCandidate {
        mime_type: "video/webm",
        container: Container::Webm,
        encoder: "libvpx",
        encoder_args: &[],
    },
];

/// Decides whether an encoder is usable.
pub trait EncoderSupport {
    fn supports(&self, encoder: &str) -> bool;
}

impl EncoderSupport for HashSet<String> {
    fn supports(&self, encoder: &str) -> bool {
        self.contains(encoder)
    }
}

/// Encoder support backed by the list of the local `ffmpeg` binary.
#[derive(Debug, Clone, Default)]
pub struct FfmpegEncoders {
    encoders: HashSet<String>,
}

impl FfmpegEncoders {
    /// Run `ffmpeg -hide_banner -encoders` once and keep the result.
    pub fn detect() -> CellgridResult<Self> {
        let output = Command::new("ffmpeg")
            .args(["-hide_banner", "-encoders"])
            .stdin(Stdio::null())
            .output()
            .map_err(|e| CellgridError::unsupported(format!("ffmpeg is not available: {e}")))?;

        if !output.status.success() {
            return Err(CellgridError::unsupported(format!(
                "ffmpeg -encoders failed (status {})",
                output.status
            )));
        }

        let encoders = parse_encoder_list(&String::from_utf8_lossy(&output.stdout));
        tracing::debug!(count = encoders.len(), "Listed ffmpeg encoders");
        Ok(Self { encoders })
    }

    pub fn encoders(&self) -> &HashSet<String> {
        &self.encoders
    }
}

impl EncoderSupport for FfmpegEncoders {
    fn supports(&self, encoder: &str) -> bool {
        self.encoders.supports(encoder)
    }
}

/// Extract encoder names from `ffmpeg -encoders` output.
///
/// Entries follow a `------` separator line and look like
/// `V....D libx264   libx264 H.264 / AVC ...`.
pub fn parse_encoder_list(output: &str) -> HashSet<String> {
    output
        .lines()
        .skip_while(|line| line.trim() != "------")
        .skip(1)
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let flags = fields.next()?;
            let name = fields.next()?;
            (flags.len() == 6).then(|| name.to_string())
        })
        .collect()
}

/// Pick the first candidate in [`CODEC_PRIORITY`] `support` accepts.
pub fn negotiate_codec(support: &impl EncoderSupport) -> CellgridResult<&'static CodecCandidate> {
    let chosen = CODEC_PRIORITY
        .iter()
        .find(|candidate| support.supports(candidate.encoder))
        .ok_or_else(|| CellgridError::unsupported("No supported recording format found"))?;

    tracing::info!(
        mime_type = chosen.mime_type,
        encoder = chosen.encoder,
        "Negotiated recording codec"
    );
    Ok(chosen)
}

/// Whether `ffmpeg` is on the PATH.
pub fn ffmpeg_available() -> bool {
    Command::new("sh")
        .arg("-c")
        .arg("command -v ffmpeg >/dev/null 2>&1")
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Recording parameters that do not depend on the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingSettings {
    pub fps: u32,
    pub scale_factor: u32,
    pub video_bitrate_bps: u64,
    pub output_dir: PathBuf,
}

impl RecordingSettings {
    pub fn from_config(config: &RecordingDefaults) -> Self {
        Self {
            fps: config.fps.max(1),
            scale_factor: config.scale_factor.max(1),
            video_bitrate_bps: config.video_bitrate_bps,
            output_dir: config.output_dir.clone(),
        }
    }
}

impl Default for RecordingSettings {
    fn default() -> Self {
        Self::from_config(&RecordingDefaults::default())
    }
}

/// Everything needed to run one recording.
#[derive(Debug, Clone)]
pub struct RecordingPlan {
    pub canvas: CanvasSize,
    /// Encoded frame width (canvas x scale, even).
    pub width: u32,
    /// Encoded frame height (canvas x scale, even).
    pub height: u32,
    pub scale: u32,
    pub fps: u32,
    pub video_bitrate_bps: u64,
    pub duration: Duration,
    pub total_frames: u64,
    pub codec: &'static CodecCandidate,
    pub output_path: PathBuf,
}

impl RecordingPlan {
    /// Plan a recording of `canvas` for `duration`, naming the output after
    /// `started_unix_ms`.
    pub fn new(
        settings: &RecordingSettings,
        canvas: CanvasSize,
        duration: Duration,
        codec: &'static CodecCandidate,
        started_unix_ms: i64,
    ) -> Self {
        let (width, height) = canvas.scaled_even(settings.scale_factor);
        let total_frames = (duration.as_secs_f64() * settings.fps as f64).ceil() as u64;
        let output_path = settings
            .output_dir
            .join(output_file_name(started_unix_ms, codec.container));

        Self {
            canvas,
            width,
            height,
            scale: settings.scale_factor,
            fps: settings.fps,
            video_bitrate_bps: settings.video_bitrate_bps,
            duration,
            total_frames,
            codec,
            output_path,
        }
    }

    /// Presentation time of frame `index` in nanoseconds.
    pub fn frame_time_ns(&self, index: u64) -> u64 {
        index * 1_000_000_000 / self.fps as u64
    }

    /// Arguments for an ffmpeg process reading raw RGBA frames on stdin.
    pub fn ffmpeg_args(&self) -> Vec<String> {
        let mut args: Vec<String> = [
            "-hide_banner",
            "-loglevel",
            "error",
            "-y",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        args.extend([
            "-s".to_string(),
            format!("{}x{}", self.width, self.height),
            "-r".to_string(),
            self.fps.to_string(),
            "-i".to_string(),
            "-".to_string(),
            "-an".to_string(),
            "-c:v".to_string(),
            self.codec.encoder.to_string(),
        ]);
        args.extend(self.codec.encoder_args.iter().map(|s| s.to_string()));
        args.extend([
            "-b:v".to_string(),
            self.video_bitrate_bps.to_string(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
        ]);
        if self.codec.container == Container::Mp4 {
            args.extend(["-movflags".to_string(), "+faststart".to_string()]);
        }
        args.push(self.output_path.to_string_lossy().into_owned());
        args
    }
}

/// `grid-recording-<unix ms>.<ext>`
pub fn output_file_name(started_unix_ms: i64, container: Container) -> String {
    format!("grid-recording-{started_unix_ms}.{}", container.extension())
}

/// Receives encoded-size RGBA frames.
pub trait FrameSink: Send {
    fn write_frame(&mut self, frame: &RgbaImage) -> CellgridResult<()>;

    /// Flush and close the output.
    fn finish(self: Box<Self>) -> CellgridResult<()>;

    fn name(&self) -> &str;
}

/// Produces the grid frame shown at a given recording time.
pub trait FrameSource {
    /// Render the `width` x `height` frame for `frame_time_ns` after the
    /// recording started. `scale` multiplies logical sizes.
    fn render_frame(
        &mut self,
        frame_time_ns: u64,
        width: u32,
        height: u32,
        scale: u32,
    ) -> CellgridResult<&RgbaImage>;
}

/// Streams frames into an `ffmpeg` child process.
pub struct FfmpegSink {
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_task: Option<std::thread::JoinHandle<String>>,
    frame_size: (u32, u32),
    frames_written: u64,
}

impl FfmpegSink {
    /// Start ffmpeg with the plan's arguments.
    pub fn spawn(plan: &RecordingPlan) -> CellgridResult<Self> {
        if let Some(parent) = plan.output_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let args = plan.ffmpeg_args();
        tracing::debug!(args = ?args, "Running ffmpeg");
        let mut child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .context("Failed to start ffmpeg")?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| CellgridError::recording("Failed to capture ffmpeg stdin"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| CellgridError::recording("Failed to capture ffmpeg stderr"))?;

        // Drain stderr concurrently so ffmpeg never blocks on a full pipe.
        let stderr_task = std::thread::spawn(move || -> String {
            let mut reader = BufReader::new(stderr);
            let mut output = String::new();
            match reader.read_to_string(&mut output) {
                Ok(_) => output,
                Err(err) => format!("<failed to read ffmpeg stderr: {err}>"),
            }
        });

        tracing::info!(
            pid = child.id(),
            output = %plan.output_path.display(),
            encoder = plan.codec.encoder,
            "ffmpeg process started"
        );

        Ok(Self {
            child: Some(child),
            stdin: Some(stdin),
            stderr_task: Some(stderr_task),
            frame_size: (plan.width, plan.height),
            frames_written: 0,
        })
    }

    fn collect_stderr(&mut self) -> String {
        self.stderr_task
            .take()
            .map(|task| {
                task.join()
                    .unwrap_or_else(|_| "<failed to join stderr reader>".to_string())
            })
            .unwrap_or_default()
    }
}

impl FrameSink for FfmpegSink {
    fn write_frame(&mut self, frame: &RgbaImage) -> CellgridResult<()> {
        if frame.dimensions() != self.frame_size {
            return Err(CellgridError::recording(format!(
                "Frame is {}x{}, encoder expects {}x{}",
                frame.width(),
                frame.height(),
                self.frame_size.0,
                self.frame_size.1
            )));
        }
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| CellgridError::recording("ffmpeg input already closed"))?;
        stdin.write_all(frame.as_raw()).map_err(|e| {
            CellgridError::recording(format!(
                "Failed writing frame {} to ffmpeg: {e}",
                self.frames_written
            ))
        })?;
        self.frames_written += 1;
        Ok(())
    }

    fn finish(mut self: Box<Self>) -> CellgridResult<()> {
        // Closing stdin signals end of stream.
        drop(self.stdin.take());

        let mut child = self
            .child
            .take()
            .ok_or_else(|| CellgridError::recording("ffmpeg process already finished"))?;
        let status = child
            .wait()
            .map_err(|e| CellgridError::recording(format!("Failed to wait on ffmpeg: {e}")))?;
        let stderr_output = self.collect_stderr();

        if !status.success() {
            return Err(CellgridError::recording(format!(
                "ffmpeg failed (status {}): {}",
                status,
                stderr_output.trim()
            )));
        }

        tracing::debug!(frames = self.frames_written, "ffmpeg finished");
        Ok(())
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            if let Err(err) = child.kill() {
                tracing::debug!(error = %err, "ffmpeg already exited");
            }
            if let Err(err) = child.wait() {
                tracing::warn!(error = %err, "Failed to reap ffmpeg process");
            }
            let stderr_output = self.collect_stderr();
            if !stderr_output.trim().is_empty() {
                tracing::warn!(stderr = %stderr_output.trim(), "Aborted ffmpeg recording");
            }
        }
    }
}

/// Whether a recording is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecorderState {
    Idle,
    Recording,
}

/// The recording currently in progress.
#[derive(Debug, Clone)]
pub struct ActiveRecording {
    pub plan: RecordingPlan,
    pub clock: RecordingClock,
}

/// Allows at most one recording at a time.
#[derive(Debug, Default)]
pub struct Recorder {
    active: Option<ActiveRecording>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RecorderState {
        if self.active.is_some() {
            RecorderState::Recording
        } else {
            RecorderState::Idle
        }
    }

    pub fn is_recording(&self) -> bool {
        self.active.is_some()
    }

    pub fn active(&self) -> Option<&ActiveRecording> {
        self.active.as_ref()
    }

    /// Move to `Recording`. Fails without touching the active recording if
    /// one is already running.
    pub fn begin(&mut self, plan: RecordingPlan) -> CellgridResult<&ActiveRecording> {
        if let Some(active) = &self.active {
            tracing::warn!(
                output = %active.plan.output_path.display(),
                "Recording already in progress"
            );
            return Err(CellgridError::AlreadyRecording);
        }

        tracing::info!(
            output = %plan.output_path.display(),
            width = plan.width,
            height = plan.height,
            fps = plan.fps,
            total_frames = plan.total_frames,
            "Recording started"
        );
        Ok(&*self.active.insert(ActiveRecording {
            plan,
            clock: RecordingClock::start(),
        }))
    }

    /// Return to `Idle` after a completed recording.
    pub fn finish(&mut self) -> Option<ActiveRecording> {
        self.active.take()
    }

    /// Return to `Idle` after a failed recording.
    pub fn abort(&mut self) {
        if let Some(active) = self.active.take() {
            tracing::warn!(output = %active.plan.output_path.display(), "Recording aborted");
        }
    }
}

/// Progress callback for recordings.
pub type ProgressCallback = Box<dyn Fn(RecordingProgress) + Send>;

/// Recording progress report.
#[derive(Debug, Clone)]
pub struct RecordingProgress {
    /// Current progress [0.0, 1.0].
    pub progress: f64,

    pub frames_written: u64,

    pub total_frames: u64,

    pub stage: RecordingStage,
}

/// Stages of a recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingStage {
    Preparing,
    Capturing,
    Finalizing,
    Complete,
    Failed,
}

/// Summary of a finished recording.
#[derive(Debug, Clone, Serialize)]
pub struct RecordingOutcome {
    pub output_path: PathBuf,
    pub mime_type: &'static str,
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub frames_written: u64,
    /// Frames repeated at the end because capture fell behind wall-clock time.
    pub padded_frames: u64,
    pub started_at: String,
    pub elapsed_secs: f64,
}

/// Record `source` for the planned duration.
///
/// Frames are captured on a fixed-rate interval and stamped with their
/// ideal presentation time. If wall-clock time runs out before all frames
/// are captured, the remaining frames repeat the last one so the file still
/// has the planned length. Any failure after `begin` aborts the recording
/// and leaves `recorder` idle.
pub async fn record_grid<S, F>(
    recorder: &mut Recorder,
    plan: RecordingPlan,
    source: &mut S,
    open_sink: F,
    progress: Option<ProgressCallback>,
) -> CellgridResult<RecordingOutcome>
where
    S: FrameSource + ?Sized,
    F: FnOnce(&RecordingPlan) -> CellgridResult<Box<dyn FrameSink>>,
{
    let active = recorder.begin(plan)?.clone();
    let report = |frames_written: u64, stage: RecordingStage| {
        if let Some(cb) = &progress {
            let total = active.plan.total_frames;
            cb(RecordingProgress {
                progress: if total == 0 {
                    1.0
                } else {
                    (frames_written as f64 / total as f64).min(1.0)
                },
                frames_written,
                total_frames: total,
                stage,
            });
        }
    };
    report(0, RecordingStage::Preparing);

    let result = match open_sink(&active.plan) {
        Ok(sink) => capture(&active, source, sink, &report).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(padded_frames) => {
            recorder.finish();
            report(active.plan.total_frames, RecordingStage::Complete);
            let outcome = RecordingOutcome {
                output_path: active.plan.output_path.clone(),
                mime_type: active.plan.codec.mime_type,
                width: active.plan.width,
                height: active.plan.height,
                fps: active.plan.fps,
                frames_written: active.plan.total_frames,
                padded_frames,
                started_at: active.clock.epoch_wall(),
                elapsed_secs: active.clock.elapsed_secs(),
            };
            tracing::info!(
                output = %outcome.output_path.display(),
                frames = outcome.frames_written,
                padded = outcome.padded_frames,
                elapsed_secs = outcome.elapsed_secs,
                "Recording finished"
            );
            Ok(outcome)
        }
        Err(e) => {
            tracing::error!(error = %e, "Recording failed");
            recorder.abort();
            report(0, RecordingStage::Failed);
            Err(e)
        }
    }
}

/// Capture loop. Returns the number of padded frames.
///
/// Rendering borrows `source` and stays on the tick loop. Sink writes and
/// `finish` block on the encoder pipe, so they run on the blocking pool.
async fn capture<S>(
    active: &ActiveRecording,
    source: &mut S,
    mut sink: Box<dyn FrameSink>,
    report: &dyn Fn(u64, RecordingStage),
) -> CellgridResult<u64>
where
    S: FrameSource + ?Sized,
{
    let plan = &active.plan;
    let mut interval = tokio::time::interval(Duration::from_nanos(plan.frame_time_ns(1)));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let mut written = 0u64;
    while written < plan.total_frames {
        interval.tick().await;
        if active.clock.has_elapsed(plan.duration) {
            break;
        }

        let frame = source.render_frame(plan.frame_time_ns(written), plan.width, plan.height, plan.scale)?;
        sink = write_blocking(sink, frame.clone(), 1).await?;
        written += 1;

        if written % plan.fps as u64 == 0 {
            report(written, RecordingStage::Capturing);
        }
    }

    let padded = plan.total_frames - written;
    if padded > 0 {
        tracing::warn!(
            captured = written,
            padded,
            sink = sink.name(),
            "Capture fell behind; repeating the last frame"
        );
        let last_time = plan.frame_time_ns(written.saturating_sub(1));
        let frame = source.render_frame(last_time, plan.width, plan.height, plan.scale)?;
        sink = write_blocking(sink, frame.clone(), padded).await?;
    }

    report(plan.total_frames, RecordingStage::Finalizing);
    tokio::task::spawn_blocking(move || sink.finish())
        .await
        .map_err(writer_failed)??;
    Ok(padded)
}

/// Write `frame` to `sink` `count` times on the blocking pool and hand the
/// sink back.
async fn write_blocking(
    mut sink: Box<dyn FrameSink>,
    frame: RgbaImage,
    count: u64,
) -> CellgridResult<Box<dyn FrameSink>> {
    tokio::task::spawn_blocking(move || -> CellgridResult<Box<dyn FrameSink>> {
        for _ in 0..count {
            sink.write_frame(&frame)?;
        }
        Ok(sink)
    })
    .await
    .map_err(writer_failed)?
}

fn writer_failed(err: tokio::task::JoinError) -> CellgridError {
    CellgridError::recording(format!("Frame writer task failed: {err}"))
}

/// Default sink factory for [`record_grid`].
pub fn open_ffmpeg_sink(plan: &RecordingPlan) -> CellgridResult<Box<dyn FrameSink>> {
    Ok(Box::new(FfmpegSink::spawn(plan)?))
}

/// Write a recording summary next to the video as `<name>.json`.
pub fn write_outcome_report(outcome: &RecordingOutcome) -> CellgridResult<PathBuf> {
    let path = report_path(&outcome.output_path);
    std::fs::write(&path, serde_json::to_string_pretty(outcome)?)?;
    tracing::info!(report = %path.display(), "Wrote recording report");
    Ok(path)
}

fn report_path(output: &Path) -> PathBuf {
    output.with_extension("json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Sink that counts frames into shared state.
    struct MemorySink {
        frames: Arc<Mutex<Vec<u8>>>,
        finished: Arc<Mutex<bool>>,
    }

    impl FrameSink for MemorySink {
        fn write_frame(&mut self, frame: &RgbaImage) -> CellgridResult<()> {
            self.frames.lock().unwrap().push(frame.get_pixel(0, 0).0[0]);
            Ok(())
        }

        fn finish(self: Box<Self>) -> CellgridResult<()> {
            *self.finished.lock().unwrap() = true;
            Ok(())
        }

        fn name(&self) -> &str {
            "memory"
        }
    }

    /// Source whose red channel encodes the 60 fps frame number of the
    /// requested time.
    struct CountingSource {
        frame: RgbaImage,
        calls: Vec<u64>,
        delay: Option<std::time::Duration>,
    }

    impl CountingSource {
        fn new() -> Self {
            Self {
                frame: RgbaImage::new(1, 1),
                calls: Vec::new(),
                delay: None,
            }
        }
    }

    impl FrameSource for CountingSource {
        fn render_frame(
            &mut self,
            frame_time_ns: u64,
            width: u32,
            height: u32,
            _scale: u32,
        ) -> CellgridResult<&RgbaImage> {
            if let Some(delay) = self.delay {
                std::thread::sleep(delay);
            }
            self.calls.push(frame_time_ns);
            let value = (frame_time_ns / 16_666_666) as u8;
            self.frame = RgbaImage::from_pixel(width, height, image::Rgba([value, 0, 0, 255]));
            Ok(&self.frame)
        }
    }

    fn mp4() -> &'static CodecCandidate {
        &CODEC_PRIORITY[0]
    }

    fn plan(secs: f64) -> RecordingPlan {
        let settings = RecordingSettings {
            output_dir: PathBuf::from("/tmp/out"),
            ..RecordingSettings::default()
        };
        let canvas = CanvasSize::new(401, 300).unwrap();
        RecordingPlan::new(&settings, canvas, Duration::from_secs_f64(secs), mp4(), 1_700_000_000_000)
    }

    #[allow(clippy::type_complexity)]
    fn memory_sink() -> (
        Arc<Mutex<Vec<u8>>>,
        Arc<Mutex<bool>>,
        impl FnOnce(&RecordingPlan) -> CellgridResult<Box<dyn FrameSink>>,
    ) {
        let frames = Arc::new(Mutex::new(Vec::new()));
        let finished = Arc::new(Mutex::new(false));
        let sink = MemorySink {
            frames: Arc::clone(&frames),
            finished: Arc::clone(&finished),
        };
        (frames, finished, move |_: &RecordingPlan| {
            Ok(Box::new(sink) as Box<dyn FrameSink>)
        })
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("5").unwrap(), Duration::from_secs(5));
        assert_eq!(parse_duration(" 0.5 ").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("60").unwrap(), Duration::from_secs(60));
        for bad in ["", "abc", "0", "-1", "60.5", "NaN", "inf"] {
            assert!(
                matches!(parse_duration(bad), Err(CellgridError::Validation { .. })),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_negotiate_prefers_mp4() {
        let encoders: HashSet<String> = ["libvpx", "libx264"].iter().map(|s| s.to_string()).collect();
        let codec = negotiate_codec(&encoders).unwrap();
        assert_eq!(codec.mime_type, "video/mp4;codecs=avc1.42E01E");
        assert_eq!(codec.container, Container::Mp4);
    }

    #[test]
    fn test_negotiate_falls_back_to_webm() {
        let encoders: HashSet<String> = ["libvpx-vp9"].iter().map(|s| s.to_string()).collect();
        let codec = negotiate_codec(&encoders).unwrap();
        assert_eq!(codec.mime_type, "video/webm;codecs=vp9,opus");
        assert_eq!(codec.container.extension(), "webm");
    }

    #[test]
    fn test_negotiate_without_encoders_fails() {
        let encoders: HashSet<String> = HashSet::new();
        assert!(matches!(
            negotiate_codec(&encoders),
            Err(CellgridError::Unsupported { .. })
        ));
    }

    #[test]
    fn test_parse_encoder_list() {
        let output = "Encoders:\n V..... = Video\n ------\n V....D libx264              libx264 H.264\n V....D mpeg4                MPEG-4 part 2\n A....D aac                  AAC\n";
        let encoders = parse_encoder_list(output);
        assert!(encoders.contains("libx264"));
        assert!(encoders.contains("mpeg4"));
        assert!(encoders.contains("aac"));
        assert!(!encoders.contains("V....."));
        assert_eq!(encoders.len(), 3);
    }

    #[test]
    fn test_plan_geometry_and_naming() {
        let plan = plan(5.0);
        assert_eq!((plan.width, plan.height), (802, 600));
        assert_eq!(plan.total_frames, 300);
        assert_eq!(
            plan.output_path,
            PathBuf::from("/tmp/out/grid-recording-1700000000000.mp4")
        );
        assert_eq!(plan.frame_time_ns(60), 1_000_000_000);
    }

    #[test]
    fn test_total_frames_round_up() {
        assert_eq!(plan(0.01).total_frames, 1);
        assert_eq!(plan(1.01).total_frames, 61);
    }

    #[test]
    fn test_ffmpeg_args() {
        let args = plan(1.0).ffmpeg_args();
        let joined = args.join(" ");
        assert!(joined.contains("-f rawvideo -pix_fmt rgba -s 802x600 -r 60 -i -"));
        assert!(joined.contains("-c:v libx264 -profile:v baseline"));
        assert!(joined.contains("-b:v 6000000"));
        assert!(joined.contains("-movflags +faststart"));
        assert_eq!(args.last().unwrap(), "/tmp/out/grid-recording-1700000000000.mp4");
    }

    #[test]
    fn test_second_begin_is_rejected() {
        let mut recorder = Recorder::new();
        let first = plan(1.0);
        recorder.begin(first.clone()).unwrap();
        assert_eq!(recorder.state(), RecorderState::Recording);

        let mut second = plan(2.0);
        second.output_path = PathBuf::from("/tmp/other.mp4");
        assert!(matches!(
            recorder.begin(second),
            Err(CellgridError::AlreadyRecording)
        ));
        let active = recorder.active().unwrap();
        assert_eq!(active.plan.output_path, first.output_path);
        assert_eq!(active.plan.duration, Duration::from_secs(1));

        recorder.abort();
        assert_eq!(recorder.state(), RecorderState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_record_grid_writes_every_frame() {
        let mut recorder = Recorder::new();
        let mut source = CountingSource::new();
        let (frames, finished, open) = memory_sink();

        let stages = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&stages);
        let progress: ProgressCallback = Box::new(move |p| seen.lock().unwrap().push(p.stage));

        let outcome = record_grid(&mut recorder, plan(0.5), &mut source, open, Some(progress))
            .await
            .unwrap();

        assert_eq!(outcome.frames_written, 30);
        assert_eq!(outcome.padded_frames, 0);
        assert_eq!(frames.lock().unwrap().len(), 30);
        assert!(*finished.lock().unwrap());
        assert_eq!(source.calls[1], 16_666_666);
        assert!(!recorder.is_recording());

        let stages = stages.lock().unwrap();
        assert_eq!(stages.first(), Some(&RecordingStage::Preparing));
        assert_eq!(stages.last(), Some(&RecordingStage::Complete));
    }

    #[tokio::test(start_paused = true)]
    async fn test_record_grid_pads_when_wall_clock_runs_out() {
        let mut recorder = Recorder::new();
        let mut source = CountingSource::new();
        source.delay = Some(Duration::from_millis(30));
        let (frames, _, open) = memory_sink();

        // 0.05 s at 60 fps is three frames; two slow renders exhaust the clock.
        let outcome = record_grid(&mut recorder, plan(0.05), &mut source, open, None)
            .await
            .unwrap();

        let frames = frames.lock().unwrap();
        assert_eq!(frames.len(), 3);
        assert!(outcome.padded_frames >= 1);
        let captured = 3 - outcome.padded_frames as usize;
        assert!(frames[captured..]
            .iter()
            .all(|frame| *frame == frames[captured - 1]));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sink_setup_failure_reverts_to_idle() {
        let mut recorder = Recorder::new();
        let mut source = CountingSource::new();
        let result = record_grid(
            &mut recorder,
            plan(1.0),
            &mut source,
            |_: &RecordingPlan| Err(CellgridError::recording("no encoder")),
            None,
        )
        .await;

        assert!(matches!(result, Err(CellgridError::Recording { .. })));
        assert_eq!(recorder.state(), RecorderState::Idle);
        assert!(source.calls.is_empty());
    }

    /// Sink that remembers which thread each call ran on and fails after
    /// `fail_after` frames.
    struct ThreadSink {
        threads: Arc<Mutex<Vec<std::thread::ThreadId>>>,
        fail_after: Option<usize>,
    }

    impl FrameSink for ThreadSink {
        fn write_frame(&mut self, _frame: &RgbaImage) -> CellgridResult<()> {
            let mut threads = self.threads.lock().unwrap();
            if Some(threads.len()) == self.fail_after {
                return Err(CellgridError::recording("broken pipe"));
            }
            threads.push(std::thread::current().id());
            Ok(())
        }

        fn finish(self: Box<Self>) -> CellgridResult<()> {
            self.threads.lock().unwrap().push(std::thread::current().id());
            Ok(())
        }

        fn name(&self) -> &str {
            "thread"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_sink_writes_run_off_the_tick_loop() {
        let mut recorder = Recorder::new();
        let mut source = CountingSource::new();
        let threads = Arc::new(Mutex::new(Vec::new()));
        let sink = ThreadSink {
            threads: Arc::clone(&threads),
            fail_after: None,
        };

        record_grid(
            &mut recorder,
            plan(0.1),
            &mut source,
            move |_: &RecordingPlan| Ok(Box::new(sink) as Box<dyn FrameSink>),
            None,
        )
        .await
        .unwrap();

        let loop_thread = std::thread::current().id();
        let threads = threads.lock().unwrap();
        // Six frames plus finish.
        assert_eq!(threads.len(), 7);
        assert!(threads.iter().all(|id| *id != loop_thread));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sink_write_failure_reverts_to_idle() {
        let mut recorder = Recorder::new();
        let mut source = CountingSource::new();
        let threads = Arc::new(Mutex::new(Vec::new()));
        let sink = ThreadSink {
            threads: Arc::clone(&threads),
            fail_after: Some(2),
        };

        let result = record_grid(
            &mut recorder,
            plan(1.0),
            &mut source,
            move |_: &RecordingPlan| Ok(Box::new(sink) as Box<dyn FrameSink>),
            None,
        )
        .await;

        assert!(matches!(result, Err(CellgridError::Recording { .. })));
        assert_eq!(recorder.state(), RecorderState::Idle);
        assert_eq!(threads.lock().unwrap().len(), 2);
        assert_eq!(source.calls.len(), 3);
    }

    #[test]
    fn test_report_path() {
        assert_eq!(
            report_path(Path::new("/tmp/grid-recording-1.mp4")),
            PathBuf::from("/tmp/grid-recording-1.json")
        );
    }
}
