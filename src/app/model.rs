//! Application model type: `App`.
//!
//! `App` is a read-side mirror of the player, rebuilt from `UiEvent`s, plus
//! the purely visual state (cursor, popups, the open-directory prompt).

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::library::Track;
use crate::player::RepeatMode;

use super::events::UiEvent;

/// The main application model.
pub struct App {
    pub tracks: Vec<Track>,
    pub selected: usize,

    pub now_playing: Option<usize>,
    pub playing: bool,
    pub shuffle: bool,
    pub repeat: RepeatMode,
    pub volume: u8,
    pub position_ms: u64,
    pub duration_ms: u64,

    pub current_dir: Option<PathBuf>,
    pub last_error: Option<String>,

    pub follow_playback: bool,
    pub details_window: bool,
    /// Open-directory input while the prompt is shown.
    pub prompt: Option<String>,

    // The UI holds its own copies of the tracks; durations learned from the
    // player are kept here.
    durations: HashMap<usize, Duration>,
}

impl App {
    pub fn new(follow_playback: bool) -> Self {
        Self {
            tracks: Vec::new(),
            selected: 0,
            now_playing: None,
            playing: false,
            shuffle: false,
            repeat: RepeatMode::None,
            volume: crate::settings::DEFAULT_VOLUME,
            position_ms: 0,
            duration_ms: 0,
            current_dir: None,
            last_error: None,
            follow_playback,
            details_window: false,
            prompt: None,
            durations: HashMap::new(),
        }
    }

    /// Fold one player notification into the model.
    pub fn apply(&mut self, event: UiEvent) {
        match event {
            UiEvent::TrackChanged { index, duration } => {
                self.now_playing = Some(index);
                if let Some(d) = duration {
                    self.durations.insert(index, d);
                }
                self.last_error = None;
                if self.follow_playback {
                    self.selected = index;
                }
            }
            UiEvent::PlayState(playing) => self.playing = playing,
            UiEvent::Progress {
                position_ms,
                duration_ms,
            } => {
                self.position_ms = position_ms;
                self.duration_ms = duration_ms;
            }
            UiEvent::Shuffle(on) => self.shuffle = on,
            UiEvent::Repeat(mode) => self.repeat = mode,
            UiEvent::Volume(v) => self.volume = v,
            UiEvent::CatalogLoaded { tracks, directory } => {
                self.tracks = tracks;
                self.selected = 0;
                self.now_playing = None;
                self.durations.clear();
                self.details_window = false;
                if directory.is_some() {
                    self.current_dir = directory;
                }
            }
            UiEvent::Error(message) => self.last_error = Some(message),
        }
    }

    /// Return true if the library contains any tracks.
    pub fn has_tracks(&self) -> bool {
        !self.tracks.is_empty()
    }

    pub fn duration_of(&self, index: usize) -> Option<Duration> {
        self.durations
            .get(&index)
            .copied()
            .or_else(|| self.tracks.get(index).and_then(Track::duration))
    }

    pub fn status_label(&self) -> &'static str {
        match (self.now_playing, self.playing) {
            (_, true) => "Playing",
            (Some(_), false) => "Paused",
            (None, false) => "Stopped",
        }
    }

    /// Enable following playback (cursor follows currently playing track).
    pub fn follow_playback_on(&mut self) {
        self.follow_playback = true;
    }

    pub fn follow_playback_off(&mut self) {
        self.follow_playback = false;
    }

    /// Move the cursor down, wrapping to the top.
    pub fn next(&mut self) {
        if self.has_tracks() {
            self.selected = (self.selected + 1) % self.tracks.len();
        }
    }

    /// Move the cursor up, wrapping to the bottom.
    pub fn prev(&mut self) {
        if self.has_tracks() {
            let len = self.tracks.len();
            self.selected = (self.selected + len - 1) % len;
        }
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.tracks.len().saturating_sub(1);
    }

    /// Put the cursor back on the playing track and follow it again.
    pub fn jump_to_now_playing(&mut self) {
        self.follow_playback_on();
        if let Some(i) = self.now_playing {
            self.selected = i;
        }
    }

    pub fn toggle_details_window(&mut self) {
        self.details_window = !self.details_window;
    }

    /// Show the open-directory prompt, pre-filled with the current directory.
    pub fn open_prompt(&mut self) {
        let initial = self
            .current_dir
            .as_ref()
            .map(|d| d.display().to_string())
            .unwrap_or_default();
        self.prompt = Some(initial);
    }

    pub fn prompt_push(&mut self, c: char) {
        if let Some(p) = self.prompt.as_mut() {
            p.push(c);
        }
    }

    pub fn prompt_pop(&mut self) {
        if let Some(p) = self.prompt.as_mut() {
            p.pop();
        }
    }

    pub fn cancel_prompt(&mut self) {
        self.prompt = None;
    }

    /// Close the prompt and return the entered directory, with a leading `~`
    /// expanded. Blank input yields `None`.
    pub fn submit_prompt(&mut self) -> Option<PathBuf> {
        let raw = self.prompt.take()?;
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }
        if let Some(rest) = raw.strip_prefix('~') {
            if rest.is_empty() || rest.starts_with('/') {
                if let Some(home) = std::env::var_os("HOME") {
                    return Some(PathBuf::from(home).join(rest.trim_start_matches('/')));
                }
            }
        }
        Some(PathBuf::from(raw))
    }
}
