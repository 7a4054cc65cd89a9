use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::app::{App, UiEvent};
use crate::config::Config;
use crate::mpris::ControlCmd;
use crate::session::Session;
use crate::ui;

/// State tracked by the runtime event loop across iterations.
#[derive(Debug, Default)]
pub struct EventLoopState {
    /// Internal two-key prefix state used for `gg` handling.
    pub pending_gg: bool,
    pending_zz: bool,
}

impl EventLoopState {
    fn clear_prefixes(&mut self) {
        self.pending_gg = false;
        self.pending_zz = false;
    }
}

/// Main terminal event loop: folds player notifications into the view,
/// draws, and dispatches keys and MPRIS commands to the session. Returns
/// `Ok(())` when shutdown is requested.
#[allow(clippy::too_many_arguments)]
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    config: &Config,
    app: &mut App,
    session: &mut Session,
    ui_rx: &mpsc::Receiver<UiEvent>,
    control_tx: &mpsc::Sender<ControlCmd>,
    control_rx: &mpsc::Receiver<ControlCmd>,
    state: &mut EventLoopState,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        for ev in ui_rx.try_iter() {
            app.apply(ev);
        }

        terminal.draw(|f| ui::draw(f, app, &config.ui, &config.controls))?;

        while let Ok(cmd) = control_rx.try_recv() {
            if handle_control_cmd(cmd, session) {
                return Ok(());
            }
        }

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key_event(key, config, app, session, control_tx, state) {
                    break;
                }
            }
        }
    }

    Ok(())
}

/// Apply one external command. Returns true when the app should quit.
/// Playback failures are already reported through the listener.
fn handle_control_cmd(cmd: ControlCmd, session: &mut Session) -> bool {
    match cmd {
        ControlCmd::Quit => return true,
        ControlCmd::Play => session.with_controller(|c| {
            if !c.state().is_playing {
                let _ = c.toggle_play_pause();
            }
        }),
        ControlCmd::Pause => session.with_controller(|c| {
            if c.state().is_playing {
                let _ = c.toggle_play_pause();
            }
        }),
        ControlCmd::PlayPause => session.with_controller(|c| {
            let _ = c.toggle_play_pause();
        }),
        ControlCmd::Stop => session.with_controller(|c| c.stop()),
        ControlCmd::Next => session.with_controller(|c| {
            let _ = c.next();
        }),
        ControlCmd::Prev => session.with_controller(|c| {
            let _ = c.previous();
        }),
        ControlCmd::SeekBy(delta_ms) => session.with_controller(|c| {
            let _ = c.seek_by(delta_ms);
        }),
        ControlCmd::SetShuffle(on) => session.with_controller(|c| c.set_shuffled(on)),
        ControlCmd::SetRepeat(mode) => session.with_controller(|c| c.set_repeat_mode(mode)),
        ControlCmd::SetVolume(v) => {
            session.set_volume(v);
        }
    }

    false
}

fn handle_prompt_key(key: KeyEvent, app: &mut App, session: &mut Session) {
    match key.code {
        KeyCode::Esc => app.cancel_prompt(),
        KeyCode::Backspace => app.prompt_pop(),
        KeyCode::Enter => {
            if let Some(dir) = app.submit_prompt() {
                session.load_directory(&dir);
            }
        }
        KeyCode::Char(c) if !c.is_control() => app.prompt_push(c),
        _ => {}
    }
}

/// Returns true when the app should quit.
fn handle_key_event(
    key: KeyEvent,
    config: &Config,
    app: &mut App,
    session: &mut Session,
    control_tx: &mpsc::Sender<ControlCmd>,
    state: &mut EventLoopState,
) -> bool {
    if app.prompt.is_some() {
        state.clear_prefixes();
        handle_prompt_key(key, app, session);
        return false;
    }

    let scrub_ms = i64::try_from(config.controls.scrub_seconds.saturating_mul(1000)).unwrap_or(i64::MAX);
    let volume_step = i32::from(config.controls.volume_step);

    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('z') => {
            state.pending_gg = false;
            if state.pending_zz {
                state.pending_zz = false;
                app.jump_to_now_playing();
            } else {
                state.pending_zz = true;
            }
        }
        KeyCode::Char('g') => {
            state.pending_zz = false;
            if state.pending_gg {
                state.pending_gg = false;
                app.follow_playback_off();
                app.select_first();
            } else {
                state.pending_gg = true;
            }
        }
        other => {
            state.clear_prefixes();
            match other {
                KeyCode::Char('G') => {
                    app.follow_playback_off();
                    app.select_last();
                }
                KeyCode::Char('j') | KeyCode::Down => {
                    app.follow_playback_off();
                    app.next();
                }
                KeyCode::Char('k') | KeyCode::Up => {
                    app.follow_playback_off();
                    app.prev();
                }
                KeyCode::Enter => {
                    let already_playing = app.playing && app.now_playing == Some(app.selected);
                    if app.has_tracks() && !already_playing {
                        app.follow_playback_on();
                        let index = app.selected;
                        session.with_controller(|c| {
                            let _ = c.play_track(index);
                        });
                    }
                }
                KeyCode::Char('p') | KeyCode::Char(' ') => {
                    // Behave like MPRIS PlayPause.
                    let _ = control_tx.send(ControlCmd::PlayPause);
                }
                KeyCode::Char('l') => {
                    let _ = control_tx.send(ControlCmd::Next);
                }
                KeyCode::Char('h') => {
                    let _ = control_tx.send(ControlCmd::Prev);
                }
                KeyCode::Char('L') => {
                    let _ = control_tx.send(ControlCmd::SeekBy(scrub_ms));
                }
                KeyCode::Char('H') => {
                    let _ = control_tx.send(ControlCmd::SeekBy(-scrub_ms));
                }
                KeyCode::Char('+') | KeyCode::Char('=') => {
                    session.adjust_volume(volume_step);
                }
                KeyCode::Char('-') => {
                    session.adjust_volume(-volume_step);
                }
                KeyCode::Char('s') => session.with_controller(|c| c.toggle_shuffle()),
                KeyCode::Char('r') => {
                    session.with_controller(|c| c.cycle_repeat_mode());
                }
                KeyCode::Char('K') => app.toggle_details_window(),
                KeyCode::Char('o') => app.open_prompt(),
                _ => {}
            }
        }
    }

    false
}
