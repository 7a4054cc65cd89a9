use std::path::Path;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::config::AudioConfig;
use crate::error::EngineError;

use super::engine::AudioEngine;
use super::thread::spawn_audio_thread;
use super::types::{
    AudioCmd, EngineEvent, EngineStatus, LoadGate, SharedGate, StatusHandle, TaggedEvent,
    current_events, lock_gate,
};

/// `AudioEngine` backed by rodio, running on its own audio thread.
pub struct AudioPlayer {
    tx: Sender<AudioCmd>,
    status: StatusHandle,
    events: Receiver<TaggedEvent>,
    gate: SharedGate,
    generation: u64,
    timeout: Duration,
    fade_out: Duration,
    join: Option<JoinHandle<()>>,
}

impl AudioPlayer {
    pub fn new(audio: &AudioConfig) -> Self {
        let (tx, rx) = mpsc::channel::<AudioCmd>();
        let (events_tx, events_rx) = mpsc::channel::<TaggedEvent>();
        let status: StatusHandle = Arc::new(Mutex::new(EngineStatus::default()));
        let gate: SharedGate = Arc::new(Mutex::new(LoadGate::default()));

        let audio_handle = spawn_audio_thread(rx, status.clone(), events_tx, gate.clone());

        Self {
            tx,
            status,
            events: events_rx,
            gate,
            generation: 0,
            timeout: audio.engine_timeout(),
            fade_out: Duration::from_millis(audio.quit_fade_out_ms),
            join: Some(audio_handle),
        }
    }

    fn send(&self, cmd: AudioCmd) -> Result<(), mpsc::SendError<AudioCmd>> {
        self.tx.send(cmd)
    }

    /// Fade out, stop the audio thread and wait for it to exit.
    pub fn quit_softly(&mut self, fade_out: Duration) {
        let _ = self.send(AudioCmd::Quit {
            fade_out_ms: fade_out.as_millis() as u64,
        });

        if let Some(h) = self.join.take() {
            let _ = h.join();
        }
    }
}

impl AudioEngine for AudioPlayer {
    fn load(&mut self, path: &Path) -> Result<(), EngineError> {
        let previous = self.generation;
        let generation = previous + 1;
        self.generation = generation;
        lock_gate(&self.gate).request(generation);

        let (reply_tx, reply_rx) = mpsc::sync_channel(1);
        let result = self
            .send(AudioCmd::Load {
                path: path.to_path_buf(),
                generation,
                reply: reply_tx,
            })
            .map_err(|_| EngineError::Disconnected)
            .and_then(|()| match reply_rx.recv_timeout(self.timeout) {
                Ok(reply) => reply,
                Err(RecvTimeoutError::Timeout) => Err(EngineError::Timeout(self.timeout)),
                Err(RecvTimeoutError::Disconnected) => Err(EngineError::Disconnected),
            });

        match result {
            Ok(()) => Ok(()),
            // The thread swapped sinks just as the wait ran out.
            Err(_) if lock_gate(&self.gate).abandon(generation) => Ok(()),
            Err(e) => {
                // The old sink is still loaded; keep listening to its signals.
                self.generation = previous;
                Err(e)
            }
        }
    }

    fn play(&mut self) {
        let _ = self.send(AudioCmd::Play);
    }

    fn pause(&mut self) {
        let _ = self.send(AudioCmd::Pause);
    }

    fn resume(&mut self) {
        let _ = self.send(AudioCmd::Resume);
    }

    fn stop(&mut self) {
        let _ = self.send(AudioCmd::Stop);
    }

    fn set_volume(&mut self, gain: f32) {
        let _ = self.send(AudioCmd::SetVolume(gain));
    }

    fn current_position_ms(&self) -> i64 {
        self.status
            .lock()
            .ok()
            .filter(|info| info.loaded)
            .map(|info| info.position.as_millis() as i64)
            .unwrap_or(-1)
    }

    fn set_position(&mut self, seconds: f64) {
        if seconds.is_finite() && seconds >= 0.0 {
            let _ = self.send(AudioCmd::Seek(Duration::from_secs_f64(seconds)));
        }
    }

    fn poll_events(&mut self) -> Vec<EngineEvent> {
        current_events(self.events.try_iter(), self.generation)
    }

    fn supports_seek(&self) -> bool {
        true
    }

    fn shutdown(&mut self) {
        self.quit_softly(self.fade_out);
    }
}

impl Drop for AudioPlayer {
    fn drop(&mut self) {
        if self.join.is_some() {
            self.quit_softly(Duration::ZERO);
        }
    }
}
