//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Grid container size.
    pub canvas: CanvasDefaults,

    /// Initial grid layout.
    pub grid: GridDefaults,

    /// Image sequence playback.
    pub playback: PlaybackDefaults,

    /// Video recording parameters.
    pub recording: RecordingDefaults,

    /// Colours and sizes used when rasterizing the grid.
    pub style: StyleConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Container size in logical pixels.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasDefaults {
    pub width: u32,
    pub height: u32,
}

/// Initial grid layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GridDefaults {
    pub columns: usize,
    pub rows: usize,

    /// Fit mode name (e.g. "fill", "debug-corners").
    pub fit_mode: String,

    /// Whether splitter lines are drawn.
    pub show_splitters: bool,
}

/// Sequence playback parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackDefaults {
    pub fps: u32,
}

/// Default recording parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingDefaults {
    /// Capture rate of the render surface.
    pub fps: u32,

    /// Render surface scale relative to the canvas.
    pub scale_factor: u32,

    /// Target video bitrate in bits per second.
    pub video_bitrate_bps: u64,

    /// Duration used when none is given.
    pub default_duration_secs: f64,

    /// Directory recordings are written to.
    pub output_dir: PathBuf,
}

/// Rasterizer colours (RGBA) and sizes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    pub container_color: [u8; 4],
    pub cell_color: [u8; 4],
    pub border_color: [u8; 4],
    pub splitter_color: [u8; 4],
    pub badge_color: [u8; 4],
    pub badge_text_color: [u8; 4],

    /// Edge length of a corner box in corner-stretch modes (logical pixels).
    pub corner_px: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "cellgrid=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            canvas: CanvasDefaults::default(),
            grid: GridDefaults::default(),
            playback: PlaybackDefaults::default(),
            recording: RecordingDefaults::default(),
            style: StyleConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for CanvasDefaults {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
        }
    }
}

impl Default for GridDefaults {
    fn default() -> Self {
        Self {
            columns: 2,
            rows: 2,
            fit_mode: "fill".to_string(),
            show_splitters: true,
        }
    }
}

impl Default for PlaybackDefaults {
    fn default() -> Self {
        Self { fps: 30 }
    }
}

impl Default for RecordingDefaults {
    fn default() -> Self {
        Self {
            fps: 60,
            scale_factor: 2,
            video_bitrate_bps: 6_000_000,
            default_duration_secs: 5.0,
            output_dir: PathBuf::from("."),
        }
    }
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            container_color: [0x18, 0x18, 0x18, 0xff],
            cell_color: [0x16, 0x16, 0x16, 0xff],
            border_color: [0x2a, 0x2a, 0x2a, 0xff],
            splitter_color: [0x3c, 0x3c, 0x3c, 0xff],
            badge_color: [0, 0, 0, 204],
            badge_text_color: [0xff, 0xff, 0xff, 0xff],
            corner_px: 50,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        Self::load_from(&config_file_path())
    }

    /// Load config from an explicit path, falling back to defaults.
    pub fn load_from(config_path: &Path) -> Self {
        if config_path.exists() {
            match std::fs::read_to_string(config_path) {
                Ok(content) => match serde_json::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        tracing::warn!("Failed to parse config at {:?}: {}", config_path, e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config at {:?}: {}", config_path, e);
                }
            }
        }
        Self::default()
    }

    /// Save config to the standard location.
    pub fn save(&self) -> Result<(), std::io::Error> {
        self.save_to(&config_file_path())
    }

    /// Save config to an explicit path.
    pub fn save_to(&self, config_path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(config_path, json)
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("cellgrid").join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_editor_page() {
        let config = AppConfig::default();
        assert_eq!(config.canvas.width, 800);
        assert_eq!(config.canvas.height, 600);
        assert_eq!(config.playback.fps, 30);
        assert_eq!(config.recording.fps, 60);
        assert_eq!(config.recording.scale_factor, 2);
        assert_eq!(config.recording.video_bitrate_bps, 6_000_000);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let raw = r#"{ "canvas": { "width": 1024 }, "grid": { "fit_mode": "cover" } }"#;
        let config: AppConfig = serde_json::from_str(raw).unwrap();
        assert_eq!(config.canvas.width, 1024);
        assert_eq!(config.canvas.height, 600);
        assert_eq!(config.grid.fit_mode, "cover");
        assert_eq!(config.grid.columns, 2);
        assert_eq!(config.style.corner_px, 50);
    }

    #[test]
    fn test_save_and_load_from_path() {
        let dir = std::env::temp_dir().join(format!("cellgrid-config-{}", std::process::id()));
        let path = dir.join("config.json");

        let mut config = AppConfig::default();
        config.grid.rows = 5;
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path);
        assert_eq!(loaded.grid.rows, 5);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_malformed_config_falls_back_to_defaults() {
        let dir = std::env::temp_dir().join(format!("cellgrid-bad-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");
        std::fs::write(&path, "{ not json").unwrap();

        let loaded = AppConfig::load_from(&path);
        assert_eq!(loaded.grid.columns, 2);

        std::fs::remove_dir_all(&dir).ok();
    }
}
