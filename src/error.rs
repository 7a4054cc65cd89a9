//! Error types shared by the catalog, playback and settings layers.
//!
//! None of these are fatal: they are caught where they occur, logged, and
//! surfaced to the presentation layer as a message.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// An entry the directory walk could not read. The walk skips it and continues.
#[derive(Debug, Error)]
#[error("skipped unreadable path {path}: {source}")]
pub struct CatalogScanError {
    pub path: String,
    #[source]
    pub source: walkdir::Error,
}

impl From<walkdir::Error> for CatalogScanError {
    fn from(source: walkdir::Error) -> Self {
        let path = source
            .path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<unknown>".to_string());
        Self { path, source }
    }
}

/// Failures reported by the audio engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no audio output device available")]
    NoOutputDevice,

    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: rodio::decoder::DecoderError,
    },

    #[error("load of {} was abandoned", path.display())]
    Abandoned { path: PathBuf },

    #[error("audio engine did not answer within {0:?}")]
    Timeout(Duration),

    #[error("audio engine is not running")]
    Disconnected,
}

/// Errors raised by playback operations.
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("track index {index} out of range (catalog has {len} tracks)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("cannot read metadata for {}: {source}", path.display())]
    Metadata {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// Errors reading or writing the persisted settings record.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings from {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed settings in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode settings: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to write settings to {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
