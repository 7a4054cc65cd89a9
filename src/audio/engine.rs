use std::path::Path;

use crate::error::EngineError;

use super::types::EngineEvent;

/// The operations the playback controller needs from an audio backend.
///
/// Every call is expected to return promptly; implementations that can block
/// (decoding a file on `load`) must bound the wait.
pub trait AudioEngine: Send {
    /// Load `path` as the current track. On failure the previously loaded
    /// track, if any, is left as it was.
    fn load(&mut self, path: &Path) -> Result<(), EngineError>;
    fn play(&mut self);
    fn pause(&mut self);
    fn resume(&mut self);
    fn stop(&mut self);
    /// Linear gain, 0.0 to 1.0.
    fn set_volume(&mut self, gain: f32);
    /// Position in the current track, or a negative value when nothing is loaded.
    fn current_position_ms(&self) -> i64;
    /// Jump to `seconds` from the start of the current track.
    fn set_position(&mut self, seconds: f64);
    /// Drain pending engine signals.
    fn poll_events(&mut self) -> Vec<EngineEvent>;
    /// Whether `set_position` seeks in place, without a reload.
    fn supports_seek(&self) -> bool {
        false
    }
    /// Release the output at session end.
    fn shutdown(&mut self) {
        self.stop();
    }
}
