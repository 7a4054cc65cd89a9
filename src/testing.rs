//! Test doubles shared by the unit tests.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use std::time::Duration;

use crate::audio::{AudioEngine, EngineEvent};
use crate::error::{EngineError, PlaybackError};
use crate::library::{Catalog, MetadataReader, Track};
use crate::player::{PlaybackController, PlaybackPolicy, PlayerListener, RepeatMode};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

/// Serializes tests that touch process environment variables.
pub fn env_lock() -> MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct EnvGuard {
    key: &'static str,
    old: Option<std::ffi::OsString>,
}

impl EnvGuard {
    pub fn set(key: &'static str, val: &str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::set_var(key, val);
        }
        Self { key, old }
    }

    pub fn remove(key: &'static str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::remove_var(key);
        }
        Self { key, old }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match self.old.take() {
            Some(v) => unsafe {
                std::env::set_var(self.key, v);
            },
            None => unsafe {
                std::env::remove_var(self.key);
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Load(PathBuf),
    Play,
    Pause,
    Resume,
    Stop,
    SetVolume(f32),
    SetPosition(f64),
    Shutdown,
}

struct EngineScript {
    calls: Vec<EngineCall>,
    position_ms: i64,
    pending: Vec<EngineEvent>,
    failing: HashSet<PathBuf>,
}

/// Scriptable engine. Clones share state, so a test keeps one handle while
/// the controller owns another.
#[derive(Clone)]
pub struct FakeEngine {
    script: Arc<Mutex<EngineScript>>,
    native_seek: bool,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(EngineScript {
                calls: Vec::new(),
                position_ms: -1,
                pending: Vec::new(),
                failing: HashSet::new(),
            })),
            native_seek: false,
        }
    }

    pub fn with_native_seek(mut self) -> Self {
        self.native_seek = true;
        self
    }

    pub fn fail_on(&self, path: impl Into<PathBuf>) {
        self.script().failing.insert(path.into());
    }

    /// Pretend playback advanced to `ms`.
    pub fn set_position_ms(&self, ms: i64) {
        self.script().position_ms = ms;
    }

    /// Queue an end-of-track signal for the next poll.
    pub fn finish_track(&self) {
        self.script().pending.push(EngineEvent::TrackFinished);
    }

    pub fn calls(&self) -> Vec<EngineCall> {
        self.script().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.script().calls.clear();
    }

    pub fn loads(&self) -> Vec<PathBuf> {
        self.script()
            .calls
            .iter()
            .filter_map(|c| match c {
                EngineCall::Load(p) => Some(p.clone()),
                _ => None,
            })
            .collect()
    }

    fn script(&self) -> MutexGuard<'_, EngineScript> {
        self.script.lock().unwrap()
    }
}

impl AudioEngine for FakeEngine {
    fn load(&mut self, path: &Path) -> Result<(), EngineError> {
        let mut p = self.script();
        p.calls.push(EngineCall::Load(path.to_path_buf()));
        if p.failing.contains(path) {
            return Err(EngineError::Open {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
            });
        }
        p.position_ms = 0;
        Ok(())
    }

    fn play(&mut self) {
        self.script().calls.push(EngineCall::Play);
    }

    fn pause(&mut self) {
        self.script().calls.push(EngineCall::Pause);
    }

    fn resume(&mut self) {
        self.script().calls.push(EngineCall::Resume);
    }

    fn stop(&mut self) {
        let mut p = self.script();
        p.calls.push(EngineCall::Stop);
        p.position_ms = -1;
    }

    fn set_volume(&mut self, gain: f32) {
        self.script().calls.push(EngineCall::SetVolume(gain));
    }

    fn current_position_ms(&self) -> i64 {
        self.script().position_ms
    }

    fn set_position(&mut self, seconds: f64) {
        let mut p = self.script();
        p.calls.push(EngineCall::SetPosition(seconds));
        p.position_ms = (seconds * 1000.0).round() as i64;
    }

    fn poll_events(&mut self) -> Vec<EngineEvent> {
        std::mem::take(&mut self.script().pending)
    }

    fn supports_seek(&self) -> bool {
        self.native_seek
    }

    fn shutdown(&mut self) {
        let mut p = self.script();
        p.calls.push(EngineCall::Shutdown);
        p.position_ms = -1;
    }
}

/// Metadata reader with canned durations. Unknown paths get three minutes.
#[derive(Clone, Default)]
pub struct FakeMetadata {
    durations: HashMap<PathBuf, Duration>,
    failing: HashSet<PathBuf>,
    lookups: Arc<AtomicUsize>,
}

impl FakeMetadata {
    pub fn with_duration(mut self, path: impl Into<PathBuf>, duration: Duration) -> Self {
        self.durations.insert(path.into(), duration);
        self
    }

    pub fn failing(mut self, path: impl Into<PathBuf>) -> Self {
        self.failing.insert(path.into());
        self
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl MetadataReader for FakeMetadata {
    fn duration(&self, path: &Path) -> Result<Duration, PlaybackError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(path) {
            return Err(PlaybackError::Metadata {
                path: path.to_path_buf(),
                source: "unreadable tags".into(),
            });
        }
        Ok(self
            .durations
            .get(path)
            .copied()
            .unwrap_or(Duration::from_secs(180)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Note {
    TrackChanged(usize),
    PlayState(bool),
    Progress(u64, u64),
    Shuffle(bool),
    Repeat(RepeatMode),
    Error(String),
    Volume(u8),
    CatalogLoaded(usize),
}

/// Listener that records every notification in order.
#[derive(Clone, Default)]
pub struct RecordingListener {
    notes: Arc<Mutex<Vec<Note>>>,
}

impl RecordingListener {
    pub fn notes(&self) -> Vec<Note> {
        self.notes.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.notes()
            .into_iter()
            .filter_map(|n| match n {
                Note::Error(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.notes.lock().unwrap().clear();
    }

    fn push(&self, note: Note) {
        self.notes.lock().unwrap().push(note);
    }
}

impl PlayerListener for RecordingListener {
    fn on_track_changed(&self, _track: &Track, index: usize) {
        self.push(Note::TrackChanged(index));
    }

    fn on_play_state_changed(&self, playing: bool) {
        self.push(Note::PlayState(playing));
    }

    fn on_progress(&self, position_ms: u64, duration_ms: u64) {
        self.push(Note::Progress(position_ms, duration_ms));
    }

    fn on_shuffle_changed(&self, shuffled: bool) {
        self.push(Note::Shuffle(shuffled));
    }

    fn on_repeat_mode_changed(&self, mode: RepeatMode) {
        self.push(Note::Repeat(mode));
    }

    fn on_error(&self, message: &str) {
        self.push(Note::Error(message.to_string()));
    }

    fn on_volume_changed(&self, volume: u8) {
        self.push(Note::Volume(volume));
    }

    fn on_catalog_loaded(&self, tracks: &[Track], _directory: Option<&Path>) {
        self.push(Note::CatalogLoaded(tracks.len()));
    }
}

pub fn track_path(i: usize) -> PathBuf {
    PathBuf::from(format!("/music/track{i}.mp3"))
}

pub fn catalog_of(len: usize) -> Catalog {
    Catalog::new((0..len).map(|i| Track::new(track_path(i), None)).collect())
}

/// A controller over `len` fake tracks, plus handles on its engine and listener.
pub struct Rig {
    pub controller: PlaybackController,
    pub engine: FakeEngine,
    pub listener: RecordingListener,
}

impl Rig {
    pub fn new(len: usize) -> Self {
        Self::with_engine(len, FakeEngine::new(), FakeMetadata::default())
    }

    pub fn with_engine(len: usize, engine: FakeEngine, metadata: FakeMetadata) -> Self {
        let listener = RecordingListener::default();
        let mut controller = PlaybackController::new(
            Box::new(engine.clone()),
            Box::new(metadata),
            Box::new(listener.clone()),
            PlaybackPolicy::default(),
        );
        controller.replace_catalog(catalog_of(len), None);
        engine.clear_calls();
        listener.clear();
        Self {
            controller,
            engine,
            listener,
        }
    }
}
