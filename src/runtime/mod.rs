use std::io::Stdout;
use std::sync::mpsc;

use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::info;

use crate::app::{App, ChannelListener, UiEvent};
use crate::audio::AudioPlayer;
use crate::library::LoftyReader;
use crate::mpris::ControlCmd;
use crate::player::Listeners;
use crate::session::Session;
use crate::settings::SettingsStore;

mod event_loop;
mod startup;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = startup::load_config();
    if let Some(path) = crate::logging::init(&config.log) {
        info!(log = %path.display(), "allegro starting");
    }

    let (ui_tx, ui_rx) = mpsc::channel::<UiEvent>();
    let (control_tx, control_rx) = mpsc::channel::<ControlCmd>();
    let mpris = crate::mpris::spawn_mpris(control_tx.clone());
    let listeners = Listeners::new(vec![
        Box::new(ChannelListener::new(ui_tx)),
        Box::new(mpris),
    ]);

    let session = Session::start(
        &config,
        Box::new(AudioPlayer::new(&config.audio)),
        Box::new(LoftyReader),
        Box::new(listeners),
        SettingsStore::locate(&config.storage),
    );

    let mut app = App::new(config.ui.follow_playback);

    // Shutdown stops the synchronizer, fades out and flushes settings, also
    // when the terminal cannot be set up.
    run_then_shutdown(session, |session| {
        if let Some(dir) = session.initial_directory(startup::cli_directory()) {
            session.load_directory(&dir);
        }

        let mut terminal = setup_terminal()?;
        let mut state = event_loop::EventLoopState::default();
        let run_result = event_loop::run(
            &mut terminal,
            &config,
            &mut app,
            session,
            &ui_rx,
            &control_tx,
            &control_rx,
            &mut state,
        );

        restore_terminal(&mut terminal)?;
        run_result
    })
}

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Run `body` against the session, then shut it down whatever `body` returned.
fn run_then_shutdown<T>(mut session: Session, body: impl FnOnce(&mut Session) -> T) -> T {
    let out = body(&mut session);
    session.shutdown();
    out
}

fn setup_terminal() -> Result<Tui, Box<dyn std::error::Error>> {
    enable_raw_mode()?;
    let attempt = (|| -> std::io::Result<Tui> {
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        Terminal::new(CrosstermBackend::new(stdout))
    })();
    match attempt {
        Ok(terminal) => Ok(terminal),
        Err(e) => {
            let _ = execute!(std::io::stdout(), LeaveAlternateScreen);
            let _ = disable_raw_mode();
            Err(e.into())
        }
    }
}

fn restore_terminal(terminal: &mut Tui) -> Result<(), Box<dyn std::error::Error>> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
