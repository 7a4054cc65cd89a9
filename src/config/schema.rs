use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::player::{PlaybackPolicy, RepeatMode};

/// Top-level application configuration loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/allegro/config.toml` or `~/.config/allegro/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `ALLEGRO__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
///
/// This is read-only. User preferences that change at runtime (volume, last
/// directory) live in [`crate::settings::Settings`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub ui: UiConfig,
    pub controls: ControlsConfig,
    pub playback: PlaybackConfig,
    pub library: LibraryConfig,
    pub log: LogConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Fade-out duration when quitting (milliseconds).
    /// Set to 0 to stop immediately.
    pub quit_fade_out_ms: u64,
    /// Upper bound on how long a blocking engine call (track load) may take.
    pub engine_timeout_ms: u64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            quit_fade_out_ms: 500,
            engine_timeout_ms: 2000,
        }
    }
}

impl AudioConfig {
    pub fn engine_timeout(&self) -> Duration {
        Duration::from_millis(self.engine_timeout_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Whether the cursor starts in "follow playback" mode.
    pub follow_playback: bool,

    /// The text rendered inside the top header box.
    pub header_text: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            follow_playback: true,
            header_text: " ~ allegro ~ local files, no fuss ~ ".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ControlsConfig {
    /// Number of seconds to scrub when pressing `H` / `L`.
    pub scrub_seconds: u64,
    /// Volume change per `+` / `-` key press.
    pub volume_step: u8,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            scrub_seconds: 5,
            volume_step: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Whether shuffle starts enabled.
    pub shuffle: bool,
    /// Repeat mode at startup.
    pub repeat_mode: RepeatMode,
    /// Past this elapsed position, "previous" restarts the current track.
    pub restart_threshold_ms: u64,
    /// Seeks closer than this to the current position are ignored.
    pub seek_tolerance_ms: u64,
    /// Progress synchronizer tick interval.
    pub tick_ms: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            shuffle: false,
            repeat_mode: RepeatMode::None,
            restart_threshold_ms: 3000,
            seek_tolerance_ms: 1000,
            tick_ms: 100,
        }
    }
}

impl PlaybackConfig {
    pub fn policy(&self) -> PlaybackPolicy {
        PlaybackPolicy {
            restart_threshold_ms: self.restart_threshold_ms,
            seek_tolerance_ms: self.seek_tolerance_ms,
        }
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// File extensions to treat as audio (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Whether to follow symlinks during scanning.
    pub follow_links: bool,
    /// Whether to include hidden files/directories (dotfiles).
    pub include_hidden: bool,
    /// Whether to recurse into subdirectories.
    pub recursive: bool,
    /// Optional cap on directory recursion depth.
    pub max_depth: Option<usize>,
    /// Walk each directory in file-name order, making the catalog order stable
    /// across platforms. When false the filesystem's own order is used.
    pub sort_by_name: bool,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            extensions: crate::library::SUPPORTED_EXTENSIONS
                .iter()
                .map(|e| e.to_string())
                .collect(),
            follow_links: true,
            include_hidden: true,
            recursive: true,
            max_depth: None,
            sort_by_name: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default filter when `ALLEGRO_LOG` is not set.
    pub level: String,
    /// Log file; defaults to `$XDG_STATE_HOME/allegro/allegro.log`.
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Where the persisted settings record lives.
    pub settings_path: Option<PathBuf>,
}
