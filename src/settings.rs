//! Persisted user preferences: the volume and the last opened directory.
//!
//! This is the only record the player writes. It is stored as pretty JSON and
//! every failure around it is recoverable: a missing or corrupt file reads as
//! defaults, a failed write is reported and playback carries on.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info, warn};

use crate::config::{StorageConfig, resolve_settings_path};
use crate::error::SettingsError;

pub const DEFAULT_VOLUME: u8 = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// 0..=100. Out-of-range stored values are clamped on load.
    #[serde(deserialize_with = "clamped_volume")]
    pub volume: u8,
    #[serde(deserialize_with = "non_empty_path")]
    pub last_directory: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            volume: DEFAULT_VOLUME,
            last_directory: None,
        }
    }
}

fn clamped_volume<'de, D: Deserializer<'de>>(d: D) -> Result<u8, D::Error> {
    let raw = i64::deserialize(d)?;
    Ok(raw.clamp(0, 100) as u8)
}

fn non_empty_path<'de, D: Deserializer<'de>>(d: D) -> Result<Option<PathBuf>, D::Error> {
    let raw = Option::<String>::deserialize(d)?;
    Ok(raw.filter(|s| !s.trim().is_empty()).map(PathBuf::from))
}

/// Reads and writes [`Settings`] at a fixed location.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `[storage] settings_path`, else `ALLEGRO_SETTINGS_PATH`, else the XDG default.
    pub fn locate(storage: &StorageConfig) -> Option<Self> {
        storage
            .settings_path
            .clone()
            .or_else(resolve_settings_path)
            .map(Self::new)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the record. A missing file is not an error and yields defaults.
    pub fn try_load(&self) -> Result<Settings, SettingsError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no settings file yet");
                return Ok(Settings::default());
            }
            Err(source) => {
                return Err(SettingsError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        serde_json::from_str(&raw).map_err(|source| SettingsError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Like [`try_load`](Self::try_load), falling back to defaults on any error.
    pub fn load(&self) -> Settings {
        match self.try_load() {
            Ok(s) => {
                info!(volume = s.volume, last_directory = ?s.last_directory, "settings loaded");
                s
            }
            Err(e) => {
                warn!(error = %e, "settings unreadable, using defaults");
                Settings::default()
            }
        }
    }

    /// Overwrite the record. Writes a sibling temp file and renames it into place.
    pub fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(settings)?;

        let write_err = |source| SettingsError::Write {
            path: self.path.clone(),
            source,
        };
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(write_err)?;
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, json).map_err(write_err)?;
        fs::rename(&tmp, &self.path).map_err(write_err)?;
        debug!(path = %self.path.display(), "settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> SettingsStore {
        SettingsStore::new(dir.path().join("settings.json"))
    }

    #[test]
    fn missing_file_reads_as_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert_eq!(store.try_load().unwrap(), Settings::default());
        assert_eq!(store.load().volume, 50);
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), "{ not json").unwrap();

        assert!(matches!(store.try_load(), Err(SettingsError::Parse { .. })));
        assert_eq!(store.load(), Settings::default());
    }

    #[test]
    fn save_then_load_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        let loaded = store.load();
        store.save(&loaded).unwrap();
        let first = fs::read_to_string(store.path()).unwrap();
        store.save(&store.load()).unwrap();
        let second = fs::read_to_string(store.path()).unwrap();

        assert_eq!(first, second);
        assert_eq!(store.load(), loaded);
    }

    #[test]
    fn volume_and_directory_survive_a_restart() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store
            .save(&Settings {
                volume: 70,
                last_directory: Some(PathBuf::from("/music/jazz")),
            })
            .unwrap();

        let reopened = store_in(&dir).load();
        assert_eq!(reopened.volume, 70);
        assert_eq!(reopened.last_directory, Some(PathBuf::from("/music/jazz")));
    }

    #[test]
    fn out_of_range_volume_is_clamped_and_blank_directory_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        fs::write(store.path(), r#"{"volume": 250, "last_directory": "  "}"#).unwrap();
        assert_eq!(
            store.try_load().unwrap(),
            Settings {
                volume: 100,
                last_directory: None
            }
        );

        fs::write(store.path(), r#"{"volume": -3}"#).unwrap();
        assert_eq!(store.try_load().unwrap().volume, 0);
    }

    #[test]
    fn save_creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("a").join("b").join("settings.json"));
        store.save(&Settings::default()).unwrap();
        assert!(store.path().is_file());
        assert!(!dir.path().join("a").join("b").join("settings.json.tmp").exists());
    }

    #[test]
    fn locate_prefers_configured_path() {
        let storage = StorageConfig {
            settings_path: Some(PathBuf::from("/tmp/custom-settings.json")),
        };
        let store = SettingsStore::locate(&storage).unwrap();
        assert_eq!(store.path(), Path::new("/tmp/custom-settings.json"));
    }
}
