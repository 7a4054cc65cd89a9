use std::path::Path;

use tracing::{debug, info, warn};

use crate::audio::{AudioEngine, EngineEvent};
use crate::error::PlaybackError;
use crate::library::{Catalog, MetadataReader, Track};

use super::listener::PlayerListener;
use super::state::{PlayerState, RepeatMode};

/// Picks an index in `0..len` for shuffled advance.
pub type IndexPicker = Box<dyn FnMut(usize) -> usize + Send>;

/// Uniform random pick. May return the current index again: shuffle is a
/// random walk over the catalog, not a shuffled queue.
pub fn random_index(len: usize) -> usize {
    rand::random_range(0..len)
}

/// Tunables of the transition rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackPolicy {
    /// `previous` restarts the current track once playback is past this point.
    pub restart_threshold_ms: u64,
    /// Seeks landing within this distance of the current position are ignored.
    pub seek_tolerance_ms: u64,
}

impl Default for PlaybackPolicy {
    fn default() -> Self {
        Self {
            restart_threshold_ms: 3000,
            seek_tolerance_ms: 1000,
        }
    }
}

/// Owns the catalog and the [`PlayerState`] and is the only thing that
/// mutates them. Callers share it behind one mutex, which serializes user
/// actions and synchronizer dispatches.
///
/// Every public operation that can fail reports the error to the listener
/// before returning it, so callers may drop the `Result`.
pub struct PlaybackController {
    engine: Box<dyn AudioEngine>,
    metadata: Box<dyn MetadataReader>,
    listener: Box<dyn PlayerListener>,
    catalog: Catalog,
    state: PlayerState,
    policy: PlaybackPolicy,
    picker: IndexPicker,
    /// The engine has nothing left to play for the current selection (end of
    /// catalog or explicit stop). Resuming then replays from the start.
    drained: bool,
}

impl PlaybackController {
    pub fn new(
        engine: Box<dyn AudioEngine>,
        metadata: Box<dyn MetadataReader>,
        listener: Box<dyn PlayerListener>,
        policy: PlaybackPolicy,
    ) -> Self {
        Self {
            engine,
            metadata,
            listener,
            catalog: Catalog::default(),
            state: PlayerState::default(),
            policy,
            picker: Box::new(random_index),
            drained: false,
        }
    }

    /// Replace the shuffle picker (deterministic picks in tests).
    pub fn with_index_picker(mut self, picker: IndexPicker) -> Self {
        self.picker = picker;
        self
    }

    pub fn state(&self) -> &PlayerState {
        &self.state
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.state.current_index.and_then(|i| self.catalog.get(i))
    }

    /// Stop whatever is playing and swap in a freshly scanned catalog.
    /// Nothing is selected afterwards.
    pub fn replace_catalog(&mut self, catalog: Catalog, directory: Option<&Path>) {
        self.engine.stop();
        self.catalog = catalog;
        self.state.current_index = None;
        self.state.position_ms = 0;
        self.state.duration_ms = 0;
        self.drained = false;

        info!(tracks = self.catalog.len(), "catalog replaced");
        self.listener
            .on_catalog_loaded(self.catalog.tracks(), directory);
        self.set_playing(false);
        self.listener.on_progress(0, 0);
    }

    pub fn play_track(&mut self, index: usize) -> Result<(), PlaybackError> {
        let result = self.start_track(index);
        self.surface(result)
    }

    pub fn toggle_play_pause(&mut self) -> Result<(), PlaybackError> {
        let result = match self.state.current_index {
            None if self.catalog.is_empty() => Ok(()),
            None => self.start_track(0),
            Some(index) if self.drained => self.start_track(index),
            Some(_) if self.state.is_playing => {
                self.engine.pause();
                self.set_playing(false);
                Ok(())
            }
            Some(_) => {
                self.engine.resume();
                self.set_playing(true);
                Ok(())
            }
        };
        self.surface(result)
    }

    /// Stop the engine but keep the selection; the next play restarts it.
    pub fn stop(&mut self) {
        self.engine.stop();
        if self.state.current_index.is_some() {
            self.drained = true;
        }
        self.state.position_ms = 0;
        self.set_playing(false);
        self.listener.on_progress(0, self.state.duration_ms);
    }

    pub fn next(&mut self) -> Result<(), PlaybackError> {
        let result = self.advance();
        self.surface(result)
    }

    /// Go back one track, or restart the current one when playback is past
    /// the restart threshold.
    pub fn previous(&mut self) -> Result<(), PlaybackError> {
        let result = match self.state.current_index {
            Some(index) if self.elapsed_ms() > self.policy.restart_threshold_ms => {
                debug!(index, "previous: restarting current track");
                self.start_track(index)
            }
            _ => match self.pick_index(false) {
                Some(index) => self.start_track(index),
                None => Ok(()),
            },
        };
        self.surface(result)
    }

    pub fn set_shuffled(&mut self, shuffled: bool) {
        self.state.is_shuffled = shuffled;
        self.listener.on_shuffle_changed(shuffled);
    }

    pub fn toggle_shuffle(&mut self) {
        self.set_shuffled(!self.state.is_shuffled);
    }

    /// `None -> Track -> Playlist -> None`. Takes effect at the next transition.
    pub fn cycle_repeat_mode(&mut self) -> RepeatMode {
        let mode = self.state.repeat_mode.cycle();
        self.set_repeat_mode(mode);
        mode
    }

    pub fn set_repeat_mode(&mut self, mode: RepeatMode) {
        self.state.repeat_mode = mode;
        self.listener.on_repeat_mode_changed(mode);
    }

    /// Clamp to `0..=100` and apply as a linear gain. Returns the stored value.
    pub fn set_volume(&mut self, volume: i32) -> u8 {
        let volume = volume.clamp(0, 100) as u8;
        self.state.volume = volume;
        self.engine.set_volume(f32::from(volume) / 100.0);
        self.listener.on_volume_changed(volume);
        volume
    }

    /// Move playback to `target_ms`.
    ///
    /// Requests within the seek tolerance of the engine position are ignored.
    /// Engines with native seek are repositioned in place; otherwise the track
    /// is reloaded from the start and told to resume at the target, which
    /// costs a short audible gap.
    pub fn seek(&mut self, target_ms: u64) -> Result<(), PlaybackError> {
        let result = self.reposition(target_ms);
        self.surface(result)
    }

    /// Seek relative to the current position.
    pub fn seek_by(&mut self, delta_ms: i64) -> Result<(), PlaybackError> {
        let target = (self.elapsed_ms() as i64).saturating_add(delta_ms).max(0) as u64;
        self.seek(target)
    }

    /// End-of-track policy. Only the progress synchronizer calls this, once per
    /// finished-track signal.
    pub fn handle_track_end(&mut self) -> Result<(), PlaybackError> {
        let Some(index) = self.state.current_index else {
            return Ok(());
        };
        // The engine only finishes a playing track. A signal that arrives
        // after a stop or pause was queued before it and is void.
        if !self.state.is_playing {
            debug!(index, "track end after stop or pause ignored");
            return Ok(());
        }

        let result = match self.state.repeat_mode {
            RepeatMode::Track => self.start_track(index),
            RepeatMode::Playlist => self.advance(),
            RepeatMode::None if index + 1 < self.catalog.len() => self.advance(),
            RepeatMode::None => {
                info!(index, "end of catalog reached");
                self.drained = true;
                self.state.position_ms = self.state.duration_ms;
                self.set_playing(false);
                Ok(())
            }
        };

        if result.is_err() {
            // The finished track has nothing left to play and the follow-up
            // failed; do not pretend to still be playing.
            self.drained = true;
            self.set_playing(false);
        }
        self.surface(result)
    }

    pub fn drain_engine_events(&mut self) -> Vec<EngineEvent> {
        self.engine.poll_events()
    }

    /// Pull the engine position into the state while playing. Negative
    /// samples (nothing loaded) are ignored.
    pub fn refresh_position(&mut self) {
        if !self.state.is_playing {
            return;
        }
        let pos = self.engine.current_position_ms();
        if pos < 0 {
            return;
        }
        self.state.position_ms = pos as u64;
        self.listener
            .on_progress(self.state.position_ms, self.state.duration_ms);
    }

    /// Surface a failure from outside the controller (settings, scanning).
    pub fn report_error(&self, message: &str) {
        warn!(%message, "reported to presentation");
        self.listener.on_error(message);
    }

    pub fn shutdown(&mut self) {
        self.engine.shutdown();
        self.state.is_playing = false;
    }

    fn start_track(&mut self, index: usize) -> Result<(), PlaybackError> {
        let len = self.catalog.len();
        let track = self
            .catalog
            .get(index)
            .ok_or(PlaybackError::IndexOutOfRange { index, len })?;

        // Metadata first: it must not fail after the engine already switched.
        let duration = track.resolve_duration(self.metadata.as_ref())?;
        self.engine.load(&track.path)?;
        self.engine.play();

        self.state.current_index = Some(index);
        self.state.is_playing = true;
        self.state.position_ms = 0;
        self.state.duration_ms = duration.as_millis() as u64;
        self.drained = false;

        info!(index, track = %track.display, "playing");
        self.listener.on_track_changed(track, index);
        self.listener.on_play_state_changed(true);
        self.listener.on_progress(0, self.state.duration_ms);
        Ok(())
    }

    fn advance(&mut self) -> Result<(), PlaybackError> {
        match self.pick_index(true) {
            Some(index) => self.start_track(index),
            None => Ok(()),
        }
    }

    fn pick_index(&mut self, forward: bool) -> Option<usize> {
        let len = self.catalog.len();
        if len == 0 {
            return None;
        }
        if self.state.is_shuffled {
            return Some((self.picker)(len) % len);
        }
        Some(match (self.state.current_index, forward) {
            (Some(i), true) => (i + 1) % len,
            (Some(i), false) => (i + len - 1) % len,
            (None, true) => 0,
            (None, false) => len - 1,
        })
    }

    fn reposition(&mut self, target_ms: u64) -> Result<(), PlaybackError> {
        let Some(index) = self.state.current_index else {
            return Ok(());
        };
        let target_ms = if self.state.duration_ms > 0 {
            target_ms.min(self.state.duration_ms)
        } else {
            target_ms
        };

        let current = self.engine.current_position_ms().max(0) as u64;
        if target_ms.abs_diff(current) <= self.policy.seek_tolerance_ms {
            return Ok(());
        }

        let seconds = target_ms as f64 / 1000.0;
        if self.engine.supports_seek() && !self.drained {
            self.engine.set_position(seconds);
        } else {
            let len = self.catalog.len();
            let track = self
                .catalog
                .get(index)
                .ok_or(PlaybackError::IndexOutOfRange { index, len })?;
            self.engine.load(&track.path)?;
            self.engine.play();
            self.engine.set_position(seconds);
            if !self.state.is_playing {
                self.engine.pause();
            }
        }

        debug!(from = current, to = target_ms, "seek");
        self.drained = false;
        self.state.position_ms = target_ms;
        self.listener
            .on_progress(target_ms, self.state.duration_ms);
        Ok(())
    }

    fn elapsed_ms(&self) -> u64 {
        let pos = self.engine.current_position_ms();
        if pos >= 0 {
            pos as u64
        } else {
            self.state.position_ms
        }
    }

    fn set_playing(&mut self, playing: bool) {
        self.state.is_playing = playing;
        self.listener.on_play_state_changed(playing);
    }

    fn surface<T>(&self, result: Result<T, PlaybackError>) -> Result<T, PlaybackError> {
        if let Err(e) = &result {
            warn!(error = %e, "playback error");
            self.listener.on_error(&e.to_string());
        }
        result
    }
}
