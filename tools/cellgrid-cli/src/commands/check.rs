//! Check recording capabilities.

use cellgrid_common::config::{config_file_path, AppConfig};
use cellgrid_render_engine::{ffmpeg_available, negotiate_codec, FfmpegEncoders};

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    println!("Cellgrid System Check");
    println!("{}", "=".repeat(50));

    let path = config_file_path();
    if path.exists() {
        println!("[OK] Config: {}", path.display());
    } else {
        println!("[OK] Config: defaults ({} not found)", path.display());
    }
    println!(
        "     Canvas {}x{}, grid {}x{}, mode {}",
        config.canvas.width,
        config.canvas.height,
        config.grid.columns,
        config.grid.rows,
        config.grid.fit_mode
    );

    if !ffmpeg_available() {
        println!("[FAIL] ffmpeg: not found in PATH");
        println!();
        println!("Recording needs ffmpeg. Rendering and slicing still work.");
        return Ok(());
    }
    println!("[OK] ffmpeg: found");

    let encoders = FfmpegEncoders::detect()?;
    println!("[OK] Encoders available: {}", encoders.encoders().len());

    println!();
    match negotiate_codec(&encoders) {
        Ok(codec) => {
            println!(
                "Recording format: {} (encoder {})",
                codec.mime_type, codec.encoder
            );
            println!("Cellgrid is ready to record.");
        }
        Err(e) => println!("Recording unavailable: {e}"),
    }

    Ok(())
}
