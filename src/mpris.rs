use std::collections::HashMap;
use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_io::{Timer, block_on};
use tracing::{debug, warn};
use zbus::object_server::SignalEmitter;
use zbus::{Connection, ObjectServer, interface};
use zvariant::{ObjectPath, OwnedObjectPath, OwnedValue, Value};

use crate::library::Track;
use crate::player::{PlayerListener, RepeatMode};

const OBJECT_PATH: &str = "/org/mpris/MediaPlayer2";
const BUS_NAME: &str = "org.mpris.MediaPlayer2.allegro";

/// Commands from outside the terminal (desktop media keys, `playerctl`),
/// applied by the runtime through the controller.
#[derive(Clone, Debug, PartialEq)]
pub enum ControlCmd {
    Quit,
    Play,
    Pause,
    PlayPause,
    Stop,
    Next,
    Prev,
    SeekBy(i64),
    SetShuffle(bool),
    SetRepeat(RepeatMode),
    SetVolume(i32),
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
enum Status {
    #[default]
    Stopped,
    Playing,
    Paused,
}

#[derive(Debug)]
struct SharedState {
    status: Status,
    title: Option<String>,
    url: Option<String>,
    length_micros: Option<i64>,
    track_id: Option<OwnedObjectPath>,
    shuffle: bool,
    repeat: RepeatMode,
    volume: u8,
    position_micros: i64,
}

impl Default for SharedState {
    fn default() -> Self {
        Self {
            status: Status::Stopped,
            title: None,
            url: None,
            length_micros: None,
            track_id: None,
            shuffle: false,
            repeat: RepeatMode::None,
            volume: crate::settings::DEFAULT_VOLUME,
            position_micros: 0,
        }
    }
}

impl SharedState {
    fn set_track(&mut self, index: usize, track: &Track) {
        self.title = Some(track.display.clone());
        self.url = Some(file_url(&track.path));
        self.length_micros = track.duration().map(|d| d.as_micros() as i64);
        self.track_id = ObjectPath::try_from(format!("{OBJECT_PATH}/track/{index}"))
            .ok()
            .map(OwnedObjectPath::from);
        self.position_micros = 0;
    }

    fn clear_track(&mut self) {
        self.title = None;
        self.url = None;
        self.length_micros = None;
        self.track_id = None;
        self.position_micros = 0;
        self.status = Status::Stopped;
    }
}

fn file_url(path: &Path) -> String {
    format!("file://{}", path.display())
}

fn loop_status_name(mode: RepeatMode) -> &'static str {
    match mode {
        RepeatMode::None => "None",
        RepeatMode::Track => "Track",
        RepeatMode::Playlist => "Playlist",
    }
}

fn parse_loop_status(name: &str) -> Option<RepeatMode> {
    match name {
        "None" => Some(RepeatMode::None),
        "Track" => Some(RepeatMode::Track),
        "Playlist" => Some(RepeatMode::Playlist),
        _ => None,
    }
}

/// Shared view of the player published on the bus. Registered as a
/// [`PlayerListener`], so it stays current without polling.
pub struct MprisHandle {
    state: Arc<Mutex<SharedState>>,
    notify: Sender<()>,
}

impl MprisHandle {
    fn update(&self, f: impl FnOnce(&mut SharedState)) {
        if let Ok(mut s) = self.state.lock() {
            f(&mut s);
        }
    }

    /// Ask the service thread to emit `PropertiesChanged`.
    fn changed(&self) {
        let _ = self.notify.send(());
    }
}

impl PlayerListener for MprisHandle {
    fn on_track_changed(&self, track: &Track, index: usize) {
        self.update(|s| s.set_track(index, track));
        self.changed();
    }

    fn on_play_state_changed(&self, playing: bool) {
        self.update(|s| {
            s.status = match (playing, s.track_id.is_some()) {
                (true, _) => Status::Playing,
                (false, true) => Status::Paused,
                (false, false) => Status::Stopped,
            };
        });
        self.changed();
    }

    fn on_progress(&self, position_ms: u64, _duration_ms: u64) {
        // Position is polled by clients; no signal.
        self.update(|s| s.position_micros = position_ms as i64 * 1000);
    }

    fn on_shuffle_changed(&self, shuffled: bool) {
        self.update(|s| s.shuffle = shuffled);
        self.changed();
    }

    fn on_repeat_mode_changed(&self, mode: RepeatMode) {
        self.update(|s| s.repeat = mode);
        self.changed();
    }

    fn on_error(&self, _message: &str) {}

    fn on_volume_changed(&self, volume: u8) {
        self.update(|s| s.volume = volume);
        self.changed();
    }

    fn on_catalog_loaded(&self, _tracks: &[Track], _directory: Option<&Path>) {
        self.update(SharedState::clear_track);
        self.changed();
    }
}

struct RootIface {
    tx: Sender<ControlCmd>,
}

#[interface(name = "org.mpris.MediaPlayer2")]
impl RootIface {
    fn raise(&self) {
        // No-op for TUI.
    }

    fn quit(&self) {
        let _ = self.tx.send(ControlCmd::Quit);
    }

    #[zbus(property)]
    fn can_quit(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_raise(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn has_track_list(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn identity(&self) -> &str {
        "allegro"
    }

    #[zbus(property)]
    fn supported_uri_schemes(&self) -> Vec<String> {
        vec!["file".to_string()]
    }

    #[zbus(property)]
    fn supported_mime_types(&self) -> Vec<String> {
        vec![]
    }
}

struct PlayerIface {
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
}

impl PlayerIface {
    fn send(&self, cmd: ControlCmd) {
        let _ = self.tx.send(cmd);
    }
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl PlayerIface {
    fn next(&self) {
        self.send(ControlCmd::Next);
    }

    fn previous(&self) {
        self.send(ControlCmd::Prev);
    }

    fn play(&self) {
        self.send(ControlCmd::Play);
    }

    fn pause(&self) {
        self.send(ControlCmd::Pause);
    }

    fn play_pause(&self) {
        self.send(ControlCmd::PlayPause);
    }

    fn stop(&self) {
        self.send(ControlCmd::Stop);
    }

    /// `offset` is in microseconds.
    fn seek(&self, offset: i64) {
        self.send(ControlCmd::SeekBy(offset / 1000));
    }

    #[zbus(property)]
    fn playback_status(&self) -> &str {
        let Ok(s) = self.state.lock() else {
            return "Stopped";
        };
        match s.status {
            Status::Stopped => "Stopped",
            Status::Playing => "Playing",
            Status::Paused => "Paused",
        }
    }

    #[zbus(property)]
    fn loop_status(&self) -> &str {
        self.state
            .lock()
            .map(|s| loop_status_name(s.repeat))
            .unwrap_or("None")
    }

    #[zbus(property)]
    fn set_loop_status(&mut self, value: String) {
        match parse_loop_status(&value) {
            Some(mode) => self.send(ControlCmd::SetRepeat(mode)),
            None => debug!(%value, "mpris: ignoring unknown loop status"),
        }
    }

    #[zbus(property)]
    fn shuffle(&self) -> bool {
        self.state.lock().map(|s| s.shuffle).unwrap_or(false)
    }

    #[zbus(property)]
    fn set_shuffle(&mut self, value: bool) {
        self.send(ControlCmd::SetShuffle(value));
    }

    #[zbus(property)]
    fn volume(&self) -> f64 {
        self.state
            .lock()
            .map(|s| f64::from(s.volume) / 100.0)
            .unwrap_or(0.0)
    }

    #[zbus(property)]
    fn set_volume(&mut self, value: f64) {
        if value.is_finite() {
            self.send(ControlCmd::SetVolume((value * 100.0).round() as i32));
        }
    }

    #[zbus(property)]
    fn position(&self) -> i64 {
        self.state.lock().map(|s| s.position_micros).unwrap_or(0)
    }

    #[zbus(property)]
    fn rate(&self) -> f64 {
        1.0
    }

    #[zbus(property)]
    fn minimum_rate(&self) -> f64 {
        1.0
    }

    #[zbus(property)]
    fn maximum_rate(&self) -> f64 {
        1.0
    }

    #[zbus(property)]
    fn can_control(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_play(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_pause(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_seek(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_next(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_previous(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn metadata(&self) -> HashMap<String, OwnedValue> {
        let mut map = HashMap::new();
        let Ok(s) = self.state.lock() else {
            return map;
        };

        let mut put = |key: &str, value: Value<'_>| {
            if let Ok(v) = OwnedValue::try_from(value) {
                map.insert(key.to_string(), v);
            }
        };

        if let Some(id) = &s.track_id {
            put("mpris:trackid", Value::from(id.clone().into_inner()));
        }
        if let Some(title) = &s.title {
            put("xesam:title", Value::from(title.as_str()));
        }
        if let Some(url) = &s.url {
            put("xesam:url", Value::from(url.as_str()));
        }
        if let Some(len) = s.length_micros {
            put("mpris:length", Value::from(len));
        }
        map
    }
}

async fn emit_changes(server: &ObjectServer) -> zbus::Result<()> {
    let iface_ref = server.interface::<_, PlayerIface>(OBJECT_PATH).await?;
    let emitter: &SignalEmitter<'_> = iface_ref.signal_emitter();
    let iface = iface_ref.get().await;
    iface.playback_status_changed(emitter).await?;
    iface.metadata_changed(emitter).await?;
    iface.shuffle_changed(emitter).await?;
    iface.loop_status_changed(emitter).await?;
    iface.volume_changed(emitter).await?;
    Ok(())
}

async fn serve(
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
    notify: Receiver<()>,
) -> zbus::Result<()> {
    let connection = Connection::session().await?;
    connection.request_name(BUS_NAME).await?;

    let object_server = connection.object_server();
    object_server
        .at(OBJECT_PATH, RootIface { tx: tx.clone() })
        .await?;
    object_server
        .at(OBJECT_PATH, PlayerIface { tx, state })
        .await?;
    debug!(name = BUS_NAME, "mpris: service registered");

    loop {
        Timer::after(Duration::from_millis(200)).await;

        let mut dirty = false;
        loop {
            match notify.try_recv() {
                Ok(()) => dirty = true,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return Ok(()),
            }
        }
        if dirty {
            if let Err(e) = emit_changes(object_server).await {
                debug!(error = %e, "mpris: failed to emit property changes");
            }
        }
    }
}

/// Start the MPRIS service on its own thread. Without a session bus the
/// handle still works; nothing is published.
pub fn spawn_mpris(tx: Sender<ControlCmd>) -> MprisHandle {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (notify_tx, notify_rx) = mpsc::channel::<()>();

    let state_for_thread = state.clone();
    std::thread::spawn(move || {
        if let Err(e) = block_on(serve(tx, state_for_thread, notify_rx)) {
            warn!(error = %e, "mpris: service unavailable");
        }
    });

    MprisHandle {
        state,
        notify: notify_tx,
    }
}
