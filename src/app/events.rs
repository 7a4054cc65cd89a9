use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::time::Duration;

use crate::library::Track;
use crate::player::{PlayerListener, RepeatMode};

/// A player notification, as delivered to the UI thread.
#[derive(Debug, Clone)]
pub enum UiEvent {
    TrackChanged {
        index: usize,
        duration: Option<Duration>,
    },
    PlayState(bool),
    Progress { position_ms: u64, duration_ms: u64 },
    Shuffle(bool),
    Repeat(RepeatMode),
    Volume(u8),
    CatalogLoaded {
        tracks: Vec<Track>,
        directory: Option<PathBuf>,
    },
    Error(String),
}

/// `PlayerListener` that forwards every notification over a channel, so the
/// controller never waits on rendering.
pub struct ChannelListener {
    tx: Sender<UiEvent>,
}

impl ChannelListener {
    pub fn new(tx: Sender<UiEvent>) -> Self {
        Self { tx }
    }

    fn send(&self, event: UiEvent) {
        // The UI may already be gone during shutdown.
        let _ = self.tx.send(event);
    }
}

impl PlayerListener for ChannelListener {
    fn on_track_changed(&self, track: &Track, index: usize) {
        self.send(UiEvent::TrackChanged {
            index,
            duration: track.duration(),
        });
    }

    fn on_play_state_changed(&self, playing: bool) {
        self.send(UiEvent::PlayState(playing));
    }

    fn on_progress(&self, position_ms: u64, duration_ms: u64) {
        self.send(UiEvent::Progress {
            position_ms,
            duration_ms,
        });
    }

    fn on_shuffle_changed(&self, shuffled: bool) {
        self.send(UiEvent::Shuffle(shuffled));
    }

    fn on_repeat_mode_changed(&self, mode: RepeatMode) {
        self.send(UiEvent::Repeat(mode));
    }

    fn on_error(&self, message: &str) {
        self.send(UiEvent::Error(message.to_string()));
    }

    fn on_volume_changed(&self, volume: u8) {
        self.send(UiEvent::Volume(volume));
    }

    fn on_catalog_loaded(&self, tracks: &[Track], directory: Option<&Path>) {
        self.send(UiEvent::CatalogLoaded {
            tracks: tracks.to_vec(),
            directory: directory.map(Path::to_path_buf),
        });
    }
}
