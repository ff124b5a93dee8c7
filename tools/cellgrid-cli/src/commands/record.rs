//! Record the grid to video.

use std::path::PathBuf;

use cellgrid_common::config::AppConfig;
use cellgrid_render_engine::{
    negotiate_codec, open_ffmpeg_sink, parse_duration, validate_duration, write_outcome_report,
    FfmpegEncoders, ProgressCallback, Recorder, RecordingSettings,
};

use super::{build_editor, load_input, GridArgs};

pub async fn run(
    config: &AppConfig,
    input: PathBuf,
    duration: Option<String>,
    grid: GridArgs,
    output: Option<PathBuf>,
    report: bool,
) -> anyhow::Result<()> {
    // Validate the duration before touching inputs or ffmpeg.
    let duration = match duration {
        Some(text) => parse_duration(&text)?,
        None => validate_duration(config.recording.default_duration_secs)?,
    };

    let encoders = FfmpegEncoders::detect()?;
    let codec = negotiate_codec(&encoders)?;

    let mut editor = build_editor(config, &grid)?;
    load_input(&mut editor, &input).await?;

    let mut settings = RecordingSettings::from_config(&config.recording);
    if let Some(dir) = output {
        settings.output_dir = dir;
    }
    let plan = editor.recording_plan(&settings, duration, codec);

    println!("Recording {:.1}s", duration.as_secs_f64());
    println!("  Format: {}", codec.mime_type);
    println!("  Resolution: {}x{} @ {}fps", plan.width, plan.height, plan.fps);
    println!("  Output: {}", plan.output_path.display());

    let progress_cb: ProgressCallback = Box::new(|p| {
        print!(
            "\r  Progress: {:.1}% ({}/{} frames)  ",
            p.progress * 100.0,
            p.frames_written,
            p.total_frames,
        );
    });

    let mut recorder = Recorder::new();
    match editor
        .record(&mut recorder, plan, open_ffmpeg_sink, Some(progress_cb))
        .await
    {
        Ok(outcome) => {
            println!("\nRecording complete: {}", outcome.output_path.display());
            if outcome.padded_frames > 0 {
                println!(
                    "  Note: {} frames repeated because capture fell behind",
                    outcome.padded_frames
                );
            }
            if report {
                let path = write_outcome_report(&outcome)?;
                println!("  Report: {}", path.display());
            }
            Ok(())
        }
        Err(e) => {
            println!("\nRecording failed: {e}");
            Err(e.into())
        }
    }
}
