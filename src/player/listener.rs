use std::path::Path;

use crate::library::Track;

use super::state::RepeatMode;

/// Change notifications sent from the playback core to the presentation layer.
///
/// Calls happen while the controller is locked, on whichever thread made the
/// change (control path or progress synchronizer). Implementations should hand
/// the data off and return; they must not call back into the controller.
pub trait PlayerListener: Send {
    fn on_track_changed(&self, track: &Track, index: usize);
    fn on_play_state_changed(&self, playing: bool);
    fn on_progress(&self, position_ms: u64, duration_ms: u64);
    fn on_shuffle_changed(&self, shuffled: bool);
    fn on_repeat_mode_changed(&self, mode: RepeatMode);
    fn on_error(&self, message: &str);

    fn on_volume_changed(&self, _volume: u8) {}
    fn on_catalog_loaded(&self, _tracks: &[Track], _directory: Option<&Path>) {}
}

/// Fans every notification out to several listeners.
#[derive(Default)]
pub struct Listeners(Vec<Box<dyn PlayerListener>>);

impl Listeners {
    pub fn new(listeners: Vec<Box<dyn PlayerListener>>) -> Self {
        Self(listeners)
    }
}

impl PlayerListener for Listeners {
    fn on_track_changed(&self, track: &Track, index: usize) {
        self.0.iter().for_each(|l| l.on_track_changed(track, index));
    }

    fn on_play_state_changed(&self, playing: bool) {
        self.0.iter().for_each(|l| l.on_play_state_changed(playing));
    }

    fn on_progress(&self, position_ms: u64, duration_ms: u64) {
        self.0
            .iter()
            .for_each(|l| l.on_progress(position_ms, duration_ms));
    }

    fn on_shuffle_changed(&self, shuffled: bool) {
        self.0.iter().for_each(|l| l.on_shuffle_changed(shuffled));
    }

    fn on_repeat_mode_changed(&self, mode: RepeatMode) {
        self.0.iter().for_each(|l| l.on_repeat_mode_changed(mode));
    }

    fn on_error(&self, message: &str) {
        self.0.iter().for_each(|l| l.on_error(message));
    }

    fn on_volume_changed(&self, volume: u8) {
        self.0.iter().for_each(|l| l.on_volume_changed(volume));
    }

    fn on_catalog_loaded(&self, tracks: &[Track], directory: Option<&Path>) {
        self.0
            .iter()
            .for_each(|l| l.on_catalog_loaded(tracks, directory));
    }
}
