//! Cellgrid CLI: sequence detection, grid slicing, rendering and recording.
//!
//! Usage:
//!   cellgrid detect <DIR>          List image sequences in a folder
//!   cellgrid slice <IMAGE>         Cut an image into grid cells
//!   cellgrid render [INPUT]        Render one grid frame to PNG
//!   cellgrid record <INPUT>        Record the grid to video
//!   cellgrid check                 Check recording capabilities

use std::path::PathBuf;

use cellgrid_grid_model::FitMode;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "cellgrid",
    about = "Grid-layout image compositor with sequence playback and recording",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the numbered image sequences in a folder
    Detect {
        /// Folder to scan (recursively)
        dir: PathBuf,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Cut an image into one PNG per grid cell at native resolution
    Slice {
        /// Image to slice
        image: PathBuf,

        /// Number of columns
        #[arg(long, default_value = "2")]
        columns: usize,

        /// Number of rows
        #[arg(long, default_value = "2")]
        rows: usize,

        /// Comma-separated column weights (overrides --columns)
        #[arg(long, value_delimiter = ',')]
        column_weights: Option<Vec<f64>>,

        /// Comma-separated row weights (overrides --rows)
        #[arg(long, value_delimiter = ',')]
        row_weights: Option<Vec<f64>>,

        /// Output directory
        #[arg(short, long, default_value = "cells")]
        output: PathBuf,
    },

    /// Render one grid frame to a PNG file
    Render {
        /// Image file or image-sequence folder (default: built-in test card)
        input: Option<PathBuf>,

        /// Fit mode: fill|contain|cover|debug-corners|background|single-corner-stretch
        #[arg(short, long)]
        mode: Option<FitMode>,

        /// Number of columns
        #[arg(long)]
        columns: Option<usize>,

        /// Number of rows
        #[arg(long)]
        rows: Option<usize>,

        /// Canvas width in logical pixels
        #[arg(long)]
        width: Option<u32>,

        /// Canvas height in logical pixels
        #[arg(long)]
        height: Option<u32>,

        /// Output scale factor
        #[arg(long, default_value = "1")]
        scale: u32,

        /// Output PNG path
        #[arg(short, long, default_value = "grid.png")]
        output: PathBuf,
    },

    /// Record the grid to a video file
    Record {
        /// Image file or image-sequence folder
        input: PathBuf,

        /// Recording length in seconds (at most 60)
        #[arg(short, long)]
        duration: Option<String>,

        /// Fit mode: fill|contain|cover|debug-corners|background|single-corner-stretch
        #[arg(short, long)]
        mode: Option<FitMode>,

        /// Number of columns
        #[arg(long)]
        columns: Option<usize>,

        /// Number of rows
        #[arg(long)]
        rows: Option<usize>,

        /// Output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write a JSON summary next to the video
        #[arg(long)]
        report: bool,
    },

    /// Check ffmpeg availability and the recording format
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cellgrid_common::config::AppConfig::load();

    // Initialize logging
    let mut logging = config.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    cellgrid_common::logging::init_logging(&logging);

    match cli.command {
        Commands::Detect { dir, json } => commands::detect::run(dir, json),
        Commands::Slice {
            image,
            columns,
            rows,
            column_weights,
            row_weights,
            output,
        } => commands::slice::run(image, columns, rows, column_weights, row_weights, output),
        Commands::Render {
            input,
            mode,
            columns,
            rows,
            width,
            height,
            scale,
            output,
        } => {
            let grid = commands::GridArgs {
                mode,
                columns,
                rows,
                width,
                height,
            };
            commands::render::run(&config, input, grid, scale, output).await
        }
        Commands::Record {
            input,
            duration,
            mode,
            columns,
            rows,
            output,
            report,
        } => {
            let grid = commands::GridArgs {
                mode,
                columns,
                rows,
                width: None,
                height: None,
            };
            commands::record::run(&config, input, duration, grid, output, report).await
        }
        Commands::Check => commands::check::run(&config),
    }
}
