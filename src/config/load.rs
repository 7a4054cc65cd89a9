use std::{env, path::PathBuf};

use super::schema::Config;

/// Configuration loading helpers.
///
/// `Config::load` tries environment variables first (prefix `ALLEGRO__`), then an
/// optional config file and falls back to struct defaults.
impl Config {
    /// Load configuration from environment and optional config file.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let config_path = resolve_config_path();

        let mut builder = ::config::Config::builder();

        if let Some(path) = &config_path {
            builder = builder.add_source(::config::File::from(path.as_path()).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("ALLEGRO")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;
        let config: Config = cfg.try_deserialize()?;
        Ok(config)
    }

    /// Perform basic validation checks on loaded configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.playback.tick_ms == 0 {
            return Err("playback.tick_ms must be >= 1".to_string());
        }
        if self.controls.volume_step == 0 || self.controls.volume_step > 100 {
            return Err("controls.volume_step must be within 1..=100".to_string());
        }
        if self.library.extensions.iter().all(|e| e.trim().is_empty()) {
            return Err("library.extensions must name at least one extension".to_string());
        }
        Ok(())
    }
}

/// Resolve the config path from `ALLEGRO_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("ALLEGRO_CONFIG_PATH") {
        return Some(PathBuf::from(p));
    }
    config_home().map(|d| d.join("allegro").join("config.toml"))
}

/// Resolve where the persisted settings record lives: `ALLEGRO_SETTINGS_PATH`,
/// else `settings.json` next to the default config file.
pub fn resolve_settings_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("ALLEGRO_SETTINGS_PATH") {
        return Some(PathBuf::from(p));
    }
    config_home().map(|d| d.join("allegro").join("settings.json"))
}

/// Default log file under `$XDG_STATE_HOME/allegro/` or `~/.local/state/allegro/`.
pub fn default_log_path() -> Option<PathBuf> {
    let state_home = if let Some(xdg) = env::var_os("XDG_STATE_HOME") {
        Some(PathBuf::from(xdg))
    } else {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(".local").join("state"))
    };

    state_home.map(|d| d.join("allegro").join("allegro.log"))
}

/// `$XDG_CONFIG_HOME`, or `~/.config` when it is not set.
fn config_home() -> Option<PathBuf> {
    if let Some(xdg) = env::var_os("XDG_CONFIG_HOME") {
        Some(PathBuf::from(xdg))
    } else {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(".config"))
    }
}
