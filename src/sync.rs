//! Progress synchronizer: a background ticker that feeds engine position and
//! end-of-track signals into the controller.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, warn};

use crate::audio::EngineEvent;
use crate::player::{PlaybackController, SharedController};

/// One synchronizer step. End-of-track signals are dispatched before the
/// position is sampled, so a track change is never followed by a stale sample.
pub fn tick(controller: &mut PlaybackController) {
    for event in controller.drain_engine_events() {
        match event {
            // Errors are already reported by the controller.
            EngineEvent::TrackFinished => {
                let _ = controller.handle_track_end();
            }
        }
    }
    controller.refresh_position();
}

/// Handle on the running ticker thread. Dropping it stops the thread.
pub struct ProgressSynchronizer {
    stop: Option<Sender<()>>,
    join: Option<JoinHandle<()>>,
}

impl ProgressSynchronizer {
    pub fn spawn(controller: SharedController, interval: Duration) -> Self {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let join = thread::spawn(move || {
            debug!(interval_ms = interval.as_millis() as u64, "synchronizer started");
            loop {
                // Waiting on the stop channel doubles as the tick timer, so a
                // stop request is seen within one interval.
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {}
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }

                match controller.lock() {
                    Ok(mut c) => tick(&mut c),
                    Err(_) => {
                        warn!("controller lock poisoned, synchronizer exiting");
                        break;
                    }
                }
            }
            debug!("synchronizer stopped");
        });

        Self {
            stop: Some(stop_tx),
            join: Some(join),
        }
    }

    /// Signal the thread and wait for it to finish its current tick.
    pub fn stop(&mut self) {
        if let Some(tx) = self.stop.take() {
            let _ = tx.send(());
        }
        if let Some(h) = self.join.take() {
            let _ = h.join();
        }
    }
}

impl Drop for ProgressSynchronizer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Note, Rig};
    use std::sync::{Arc, Mutex};
    use std::time::Instant;

    #[test]
    fn tick_dispatches_track_end_then_samples_position() {
        let mut rig = Rig::new(2);
        rig.controller.play_track(0).unwrap();
        rig.listener.clear();

        rig.engine.finish_track();
        tick(&mut rig.controller);

        assert_eq!(rig.controller.state().current_index, Some(1));
        assert_eq!(rig.controller.state().position_ms, 0);
        let notes = rig.listener.notes();
        assert_eq!(notes.first(), Some(&Note::TrackChanged(1)));
        assert_eq!(notes.last(), Some(&Note::Progress(0, 180_000)));
    }

    #[test]
    fn tick_only_samples_while_playing() {
        let mut rig = Rig::new(1);
        rig.controller.play_track(0).unwrap();
        rig.engine.set_position_ms(2_500);
        tick(&mut rig.controller);
        assert_eq!(rig.controller.state().position_ms, 2_500);

        rig.controller.toggle_play_pause().unwrap();
        rig.engine.set_position_ms(9_000);
        tick(&mut rig.controller);
        assert_eq!(rig.controller.state().position_ms, 2_500);
    }

    #[test]
    fn one_finish_signal_advances_exactly_once() {
        let mut rig = Rig::new(3);
        rig.controller.play_track(0).unwrap();

        rig.engine.finish_track();
        tick(&mut rig.controller);
        tick(&mut rig.controller);
        tick(&mut rig.controller);
        assert_eq!(rig.controller.state().current_index, Some(1));
    }

    #[test]
    fn finish_queued_before_stop_does_not_restart_playback() {
        let mut rig = Rig::new(3);
        rig.controller.play_track(0).unwrap();

        rig.engine.finish_track();
        rig.controller.stop();
        rig.engine.clear_calls();
        tick(&mut rig.controller);

        let s = rig.controller.state();
        assert_eq!(s.current_index, Some(0));
        assert!(!s.is_playing);
        assert!(rig.engine.loads().is_empty());
    }

    #[test]
    fn finish_queued_before_pause_does_not_advance() {
        let mut rig = Rig::new(3);
        rig.controller.play_track(0).unwrap();

        rig.engine.finish_track();
        rig.controller.toggle_play_pause().unwrap();
        rig.engine.clear_calls();
        tick(&mut rig.controller);

        let s = rig.controller.state();
        assert_eq!(s.current_index, Some(0));
        assert!(!s.is_playing);
        assert!(rig.engine.loads().is_empty());
    }

    #[test]
    fn background_ticker_advances_and_stops_promptly() {
        let Rig {
            controller, engine, ..
        } = Rig::new(2);
        let shared = Arc::new(Mutex::new(controller));
        shared.lock().unwrap().play_track(0).unwrap();

        let interval = Duration::from_millis(10);
        let mut sync = ProgressSynchronizer::spawn(shared.clone(), interval);

        engine.finish_track();
        let deadline = Instant::now() + Duration::from_secs(2);
        while shared.lock().unwrap().state().current_index != Some(1) {
            assert!(Instant::now() < deadline, "synchronizer never advanced");
            thread::sleep(Duration::from_millis(5));
        }

        engine.set_position_ms(7_000);
        let deadline = Instant::now() + Duration::from_secs(2);
        while shared.lock().unwrap().state().position_ms != 7_000 {
            assert!(Instant::now() < deadline, "synchronizer never sampled");
            thread::sleep(Duration::from_millis(5));
        }

        let started = Instant::now();
        sync.stop();
        assert!(started.elapsed() < Duration::from_millis(500));
    }
}
