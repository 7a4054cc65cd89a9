//! Audio-related small types and handles.
//!
//! This module defines the engine-facing events, the commands the audio
//! thread understands, and the shared status handle it publishes.

use std::path::PathBuf;
use std::sync::mpsc::SyncSender;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::error::EngineError;

/// Signals the engine raises asynchronously, drained by the progress synchronizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    /// The loaded track played to its end.
    TrackFinished,
}

#[derive(Debug)]
pub(super) enum AudioCmd {
    /// Open and decode `path`, replacing the current sink on success. The
    /// new sink starts paused.
    Load {
        path: PathBuf,
        generation: u64,
        reply: SyncSender<Result<(), EngineError>>,
    },
    /// Start (or restart) playback of the loaded sink.
    Play,
    Pause,
    Resume,
    /// Drop the loaded sink.
    Stop,
    /// Linear gain, 0.0 to 1.0.
    SetVolume(f32),
    /// Move to an absolute position in the loaded track.
    Seek(Duration),
    /// Quit the audio thread, fading out over `fade_out_ms` milliseconds.
    Quit { fade_out_ms: u64 },
}

/// A finished-track signal tagged with the load it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct TaggedEvent {
    pub generation: u64,
    pub event: EngineEvent,
}

/// Keep only events raised for the current load; anything older belongs to a
/// track that has already been replaced.
pub(super) fn current_events(
    events: impl IntoIterator<Item = TaggedEvent>,
    generation: u64,
) -> Vec<EngineEvent> {
    events
        .into_iter()
        .filter(|e| e.generation == generation)
        .map(|e| e.event)
        .collect()
}

#[derive(Debug, Clone, Default)]
/// Runtime engine status published by the audio thread.
pub struct EngineStatus {
    /// Whether a sink is loaded.
    pub loaded: bool,
    /// Whether the loaded sink is producing sound.
    pub playing: bool,
    /// Position inside the loaded track.
    pub position: Duration,
}

pub type StatusHandle = Arc<Mutex<EngineStatus>>;

/// Agreement between the engine handle and the audio thread on which load may
/// still replace the current sink. A load the handle gave up on (timeout)
/// must never take over after the controller has already reported it failed.
#[derive(Debug, Default)]
pub(super) struct LoadGate {
    wanted: Option<u64>,
    committed: u64,
}

impl LoadGate {
    /// The handle is about to send the load for `generation`.
    pub fn request(&mut self, generation: u64) {
        self.wanted = Some(generation);
    }

    /// The audio thread decoded `generation`. Returns whether it may swap
    /// sinks; if so the load counts as done from here on.
    pub fn commit(&mut self, generation: u64) -> bool {
        if self.wanted != Some(generation) {
            return false;
        }
        self.committed = generation;
        true
    }

    /// The handle stopped waiting for `generation`. Returns true when the
    /// thread had committed it already; otherwise the request is withdrawn.
    pub fn abandon(&mut self, generation: u64) -> bool {
        if self.committed == generation {
            return true;
        }
        if self.wanted == Some(generation) {
            self.wanted = None;
        }
        false
    }
}

pub(super) type SharedGate = Arc<Mutex<LoadGate>>;

pub(super) fn lock_gate(gate: &SharedGate) -> MutexGuard<'_, LoadGate> {
    gate.lock().unwrap_or_else(PoisonError::into_inner)
}
