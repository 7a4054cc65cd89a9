//! Utilities for creating `rodio` sinks from track files.
//!
//! The helper here encapsulates opening/decoding a file and preparing a
//! paused `Sink` at the requested start position.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

use rodio::{Decoder, OutputStream, Sink, Source};

use crate::error::EngineError;

/// Create a paused `Sink` for the file at `path` that starts playback at `start_at`.
pub(super) fn create_sink_at(
    handle: &OutputStream,
    path: &Path,
    start_at: Duration,
    gain: f32,
) -> Result<Sink, EngineError> {
    let file = File::open(path).map_err(|source| EngineError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let source = Decoder::new(BufReader::new(file))
        .map_err(|source| EngineError::Decode {
            path: path.to_path_buf(),
            source,
        })?
        // `skip_duration` is the fallback seeking primitive; even Duration::ZERO is fine.
        .skip_duration(start_at);

    let sink = Sink::connect_new(handle.mixer());
    sink.set_volume(gain);
    sink.append(source);
    sink.pause();
    Ok(sink)
}
