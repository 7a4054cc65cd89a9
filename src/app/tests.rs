use super::*;
use crate::library::Track;
use crate::player::{PlayerListener, RepeatMode};
use crate::testing::{EnvGuard, env_lock};
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

fn t(name: &str) -> Track {
    Track::new(PathBuf::from(format!("/music/{name}")), None)
}

fn loaded(names: &[&str]) -> App {
    let mut app = App::new(true);
    app.apply(UiEvent::CatalogLoaded {
        tracks: names.iter().map(|n| t(n)).collect(),
        directory: Some(PathBuf::from("/music")),
    });
    app
}

#[test]
fn catalog_load_resets_cursor_and_selection() {
    let mut app = loaded(&["a.mp3", "b.mp3"]);
    app.selected = 1;
    app.apply(UiEvent::TrackChanged {
        index: 1,
        duration: None,
    });

    app.apply(UiEvent::CatalogLoaded {
        tracks: vec![t("c.mp3")],
        directory: None,
    });
    assert_eq!(app.tracks.len(), 1);
    assert_eq!(app.selected, 0);
    assert_eq!(app.now_playing, None);
    assert_eq!(app.current_dir, Some(PathBuf::from("/music")));
}

#[test]
fn cursor_follows_playback_only_when_following() {
    let mut app = loaded(&["a.mp3", "b.mp3", "c.mp3"]);
    app.apply(UiEvent::TrackChanged {
        index: 2,
        duration: None,
    });
    assert_eq!(app.selected, 2);

    app.follow_playback_off();
    app.apply(UiEvent::TrackChanged {
        index: 0,
        duration: None,
    });
    assert_eq!(app.selected, 2);

    app.jump_to_now_playing();
    assert!(app.follow_playback);
    assert_eq!(app.selected, 0);
}

#[test]
fn cursor_movement_wraps() {
    let mut app = loaded(&["a.mp3", "b.mp3", "c.mp3"]);
    app.prev();
    assert_eq!(app.selected, 2);
    app.next();
    assert_eq!(app.selected, 0);
    app.select_last();
    assert_eq!(app.selected, 2);
    app.select_first();
    assert_eq!(app.selected, 0);

    let mut empty = App::new(true);
    empty.next();
    empty.prev();
    empty.select_last();
    assert_eq!(empty.selected, 0);
}

#[test]
fn status_label_reflects_selection_and_play_state() {
    let mut app = loaded(&["a.mp3"]);
    assert_eq!(app.status_label(), "Stopped");
    app.apply(UiEvent::TrackChanged {
        index: 0,
        duration: Some(Duration::from_secs(3)),
    });
    app.apply(UiEvent::PlayState(true));
    assert_eq!(app.status_label(), "Playing");
    app.apply(UiEvent::PlayState(false));
    assert_eq!(app.status_label(), "Paused");
    assert_eq!(app.duration_of(0), Some(Duration::from_secs(3)));
}

#[test]
fn errors_are_shown_until_the_next_track_starts() {
    let mut app = loaded(&["a.mp3"]);
    app.apply(UiEvent::Error("cannot decode".into()));
    assert_eq!(app.last_error.as_deref(), Some("cannot decode"));
    app.apply(UiEvent::TrackChanged {
        index: 0,
        duration: None,
    });
    assert_eq!(app.last_error, None);
}

#[test]
fn prompt_edits_and_submits_a_directory() {
    let mut app = loaded(&[]);
    app.open_prompt();
    assert_eq!(app.prompt.as_deref(), Some("/music"));

    app.prompt_pop();
    app.prompt_pop();
    app.prompt_push('x');
    assert_eq!(app.submit_prompt(), Some(PathBuf::from("/musx")));
    assert_eq!(app.prompt, None);

    app.open_prompt();
    app.cancel_prompt();
    assert_eq!(app.submit_prompt(), None);
}

#[test]
fn prompt_expands_home() {
    let _lock = env_lock();
    let _g = EnvGuard::set("HOME", "/home/listener");

    let mut app = App::new(true);
    app.prompt = Some("~/Music".into());
    assert_eq!(app.submit_prompt(), Some(PathBuf::from("/home/listener/Music")));

    app.prompt = Some("   ".into());
    assert_eq!(app.submit_prompt(), None);
}

#[test]
fn channel_listener_forwards_notifications_in_order() {
    let (tx, rx) = mpsc::channel();
    let listener = ChannelListener::new(tx);

    listener.on_catalog_loaded(&[t("a.mp3")], None);
    listener.on_track_changed(&t("a.mp3"), 0);
    listener.on_play_state_changed(true);
    listener.on_progress(100, 2_000);
    listener.on_shuffle_changed(true);
    listener.on_repeat_mode_changed(RepeatMode::Track);
    listener.on_volume_changed(30);

    let mut app = App::new(true);
    for event in rx.try_iter() {
        app.apply(event);
    }
    assert_eq!(app.tracks.len(), 1);
    assert_eq!(app.now_playing, Some(0));
    assert!(app.playing);
    assert_eq!((app.position_ms, app.duration_ms), (100, 2_000));
    assert!(app.shuffle);
    assert_eq!(app.repeat, RepeatMode::Track);
    assert_eq!(app.volume, 30);
}

#[test]
fn channel_listener_survives_a_closed_ui() {
    let (tx, rx) = mpsc::channel();
    drop(rx);
    ChannelListener::new(tx).on_error("nobody listening");
}
