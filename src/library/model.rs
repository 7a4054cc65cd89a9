use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use crate::error::PlaybackError;

use super::metadata::MetadataReader;

/// A playable file found by the scanner. Immutable once catalogued, except
/// for the duration which is resolved from file metadata on first use.
#[derive(Debug, Clone)]
pub struct Track {
    pub path: PathBuf,
    /// File basename, shown in the track list.
    pub display: String,
    /// Name of the directory holding the file.
    pub folder: Option<String>,
    pub size_bytes: Option<u64>,
    duration: OnceLock<Duration>,
}

impl Track {
    pub fn new(path: PathBuf, size_bytes: Option<u64>) -> Self {
        let display = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "UNKNOWN".to_string());
        let folder = path
            .parent()
            .and_then(Path::file_name)
            .map(|s| s.to_string_lossy().into_owned());

        Self {
            path,
            display,
            folder,
            size_bytes,
            duration: OnceLock::new(),
        }
    }

    /// The duration, if it has been resolved already.
    pub fn duration(&self) -> Option<Duration> {
        self.duration.get().copied()
    }

    /// Resolve (and cache) the duration through `reader`.
    pub fn resolve_duration(&self, reader: &dyn MetadataReader) -> Result<Duration, PlaybackError> {
        if let Some(d) = self.duration.get() {
            return Ok(*d);
        }
        let d = reader.duration(&self.path)?;
        let _ = self.duration.set(d);
        Ok(d)
    }
}

/// The ordered list of tracks discovered in one directory load.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tracks: Vec<Track>,
}

impl Catalog {
    pub fn new(tracks: Vec<Track>) -> Self {
        Self { tracks }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }
}
