use std::path::PathBuf;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::thread::JoinHandle;
use std::time::Duration;

use rodio::{OutputStream, OutputStreamBuilder, Sink};
use tracing::{debug, warn};

use crate::error::EngineError;

use super::sink::create_sink_at;
use super::types::{AudioCmd, EngineEvent, SharedGate, StatusHandle, TaggedEvent, lock_gate};

/// How often the audio thread samples its sink when no command arrives.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// The audio thread's view of the loaded track.
struct Deck {
    sink: Option<Sink>,
    path: Option<PathBuf>,
    generation: u64,
    paused: bool,
    /// Offset added to `Sink::get_pos` after a skip-based seek.
    seek_base: Duration,
    gain: f32,
    finished_reported: bool,
}

impl Deck {
    fn new() -> Self {
        Self {
            sink: None,
            path: None,
            generation: 0,
            paused: true,
            seek_base: Duration::ZERO,
            gain: 1.0,
            finished_reported: false,
        }
    }

    fn load(
        &mut self,
        stream: Option<&OutputStream>,
        gate: &SharedGate,
        path: PathBuf,
        generation: u64,
    ) -> Result<(), EngineError> {
        let stream = stream.ok_or(EngineError::NoOutputDevice)?;
        // Build the new sink before touching the old one so a bad file leaves
        // the current track playing.
        let new_sink = create_sink_at(stream, &path, Duration::ZERO, self.gain)?;

        // Swap under the gate: the handle may have given up on this load
        // while it was decoding.
        let mut gate = lock_gate(gate);
        if !gate.commit(generation) {
            debug!(path = %path.display(), generation, "audio: dropping abandoned load");
            new_sink.stop();
            return Err(EngineError::Abandoned { path });
        }
        if let Some(old) = self.sink.take() {
            old.stop();
        }
        drop(gate);
        debug!(path = %path.display(), generation, "audio: loaded");
        self.sink = Some(new_sink);
        self.path = Some(path);
        self.generation = generation;
        self.paused = true;
        self.seek_base = Duration::ZERO;
        self.finished_reported = false;
        Ok(())
    }

    fn play(&mut self) {
        if let Some(s) = self.sink.as_ref() {
            s.play();
            self.paused = false;
        }
    }

    fn pause(&mut self) {
        if let Some(s) = self.sink.as_ref() {
            s.pause();
            self.paused = true;
        }
    }

    fn stop(&mut self) {
        if let Some(s) = self.sink.take() {
            s.stop();
        }
        self.path = None;
        self.paused = true;
        self.seek_base = Duration::ZERO;
    }

    fn set_volume(&mut self, gain: f32) {
        self.gain = gain.clamp(0.0, 1.0);
        if let Some(s) = self.sink.as_ref() {
            s.set_volume(self.gain);
        }
    }

    fn seek(&mut self, stream: Option<&OutputStream>, target: Duration) {
        let Some(sink) = self.sink.as_ref() else {
            return;
        };

        // Native seek first. A paused sink is rebuilt instead so the call
        // never waits on the mixer.
        if !self.paused && sink.try_seek(target).is_ok() {
            self.seek_base = Duration::ZERO;
            self.finished_reported = false;
            return;
        }

        let (Some(stream), Some(path)) = (stream, self.path.as_ref()) else {
            return;
        };
        match create_sink_at(stream, path, target, self.gain) {
            Ok(new_sink) => {
                sink.stop();
                if !self.paused {
                    new_sink.play();
                }
                self.sink = Some(new_sink);
                self.seek_base = target;
                self.finished_reported = false;
            }
            Err(e) => warn!(error = %e, "audio: seek by reload failed"),
        }
    }

    fn fade_out(&self, fade_out_ms: u64) {
        let Some(sink) = self.sink.as_ref() else {
            return;
        };
        if fade_out_ms == 0 || self.paused {
            sink.set_volume(0.0);
            return;
        }
        let steps: u64 = 20;
        let step_ms = (fade_out_ms / steps).max(1);
        for step in 1..=steps {
            let t = step as f32 / steps as f32;
            sink.set_volume(self.gain * (1.0 - t));
            thread::sleep(Duration::from_millis(step_ms));
        }
        sink.set_volume(0.0);
    }

    /// Publish position/state and raise the end-of-track signal once per load.
    fn publish(&mut self, status: &StatusHandle, events: &Sender<TaggedEvent>) {
        let (loaded, playing, position) = match self.sink.as_ref() {
            Some(s) => {
                let drained = s.empty();
                if drained && !self.paused && !self.finished_reported {
                    self.finished_reported = true;
                    let _ = events.send(TaggedEvent {
                        generation: self.generation,
                        event: EngineEvent::TrackFinished,
                    });
                }
                (true, !self.paused && !drained, self.seek_base + s.get_pos())
            }
            None => (false, false, Duration::ZERO),
        };

        if let Ok(mut info) = status.lock() {
            info.loaded = loaded;
            info.playing = playing;
            info.position = position;
        }
    }
}

pub(super) fn spawn_audio_thread(
    rx: Receiver<AudioCmd>,
    status: StatusHandle,
    events: Sender<TaggedEvent>,
    gate: SharedGate,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let stream = match OutputStreamBuilder::open_default_stream() {
            Ok(mut stream) => {
                // rodio logs to stderr when OutputStream is dropped. That's useful in
                // debugging, but noisy for a TUI app.
                stream.log_on_drop(false);
                Some(stream)
            }
            Err(e) => {
                warn!(error = %e, "audio: no output device, playback disabled");
                None
            }
        };

        let mut deck = Deck::new();

        loop {
            match rx.recv_timeout(POLL_INTERVAL) {
                Ok(cmd) => match cmd {
                    AudioCmd::Load {
                        path,
                        generation,
                        reply,
                    } => {
                        let result = deck.load(stream.as_ref(), &gate, path, generation);
                        // Publish before answering so a position read right after
                        // `load` returns sees the new track.
                        deck.publish(&status, &events);
                        let _ = reply.send(result);
                    }
                    AudioCmd::Play | AudioCmd::Resume => deck.play(),
                    AudioCmd::Pause => deck.pause(),
                    AudioCmd::Stop => deck.stop(),
                    AudioCmd::SetVolume(gain) => deck.set_volume(gain),
                    AudioCmd::Seek(target) => deck.seek(stream.as_ref(), target),
                    AudioCmd::Quit { fade_out_ms } => {
                        deck.fade_out(fade_out_ms);
                        deck.stop();
                        // Update shared state so readers don't keep showing Playing.
                        deck.publish(&status, &events);
                        break;
                    }
                },
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }

            deck.publish(&status, &events);
        }
    })
}
