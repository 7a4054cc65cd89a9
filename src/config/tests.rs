use super::load::{default_log_path, resolve_config_path, resolve_settings_path};
use super::schema::*;
use crate::player::RepeatMode;
use crate::testing::{EnvGuard, env_lock};

#[test]
fn resolve_config_path_prefers_allegro_config_path() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("ALLEGRO_CONFIG_PATH", "/tmp/allegro-test-config.toml");
    assert_eq!(
        resolve_config_path().unwrap(),
        std::path::PathBuf::from("/tmp/allegro-test-config.toml")
    );
}

#[test]
fn resolve_config_path_prefers_xdg_config_home() {
    let _lock = env_lock();
    let _g0 = EnvGuard::remove("ALLEGRO_CONFIG_PATH");
    let _g1 = EnvGuard::set("XDG_CONFIG_HOME", "/tmp/xdg-config-home");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-should-not-win");

    assert_eq!(
        resolve_config_path().unwrap(),
        std::path::PathBuf::from("/tmp/xdg-config-home")
            .join("allegro")
            .join("config.toml")
    );
}

#[test]
fn settings_path_falls_back_to_home_dot_config() {
    let _lock = env_lock();
    let _g0 = EnvGuard::remove("ALLEGRO_SETTINGS_PATH");
    let _g1 = EnvGuard::remove("XDG_CONFIG_HOME");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-dir");

    assert_eq!(
        resolve_settings_path().unwrap(),
        std::path::PathBuf::from("/tmp/home-dir")
            .join(".config")
            .join("allegro")
            .join("settings.json")
    );
}

#[test]
fn log_path_uses_xdg_state_home() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("XDG_STATE_HOME", "/tmp/xdg-state");

    assert_eq!(
        default_log_path().unwrap(),
        std::path::PathBuf::from("/tmp/xdg-state")
            .join("allegro")
            .join("allegro.log")
    );
}

#[test]
fn defaults_match_player_conventions() {
    let c = Config::default();
    assert_eq!(c.playback.restart_threshold_ms, 3000);
    assert_eq!(c.playback.seek_tolerance_ms, 1000);
    assert_eq!(c.playback.tick_ms, 100);
    assert_eq!(c.playback.repeat_mode, RepeatMode::None);
    assert_eq!(
        c.library.extensions,
        vec!["mp3", "wav", "ogg", "flac", "m4a", "aac"]
    );
    assert!(c.validate().is_ok());
}

#[test]
fn load_from_config_file_and_parse_repeat_mode_aliases() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[playback]
shuffle = true
repeat_mode = "repeat-one"
restart_threshold_ms = 5000
tick_ms = 50

[audio]
quit_fade_out_ms = 123
engine_timeout_ms = 900

[controls]
scrub_seconds = 9
volume_step = 10

[ui]
follow_playback = false
header_text = "hello"

[library]
extensions = ["mp3"]
recursive = false
include_hidden = false
follow_links = false
sort_by_name = false

[storage]
settings_path = "/tmp/elsewhere.json"
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("ALLEGRO_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::remove("ALLEGRO__AUDIO__QUIT_FADE_OUT_MS");

    let c = Config::load().unwrap();
    assert!(c.playback.shuffle);
    assert_eq!(c.playback.repeat_mode, RepeatMode::Track);
    assert_eq!(c.playback.restart_threshold_ms, 5000);
    assert_eq!(c.playback.tick_ms, 50);
    assert_eq!(c.audio.quit_fade_out_ms, 123);
    assert_eq!(c.audio.engine_timeout_ms, 900);
    assert_eq!(c.controls.scrub_seconds, 9);
    assert_eq!(c.controls.volume_step, 10);
    assert!(!c.ui.follow_playback);
    assert_eq!(c.ui.header_text, "hello");
    assert_eq!(c.library.extensions, vec!["mp3".to_string()]);
    assert!(!c.library.recursive);
    assert!(!c.library.include_hidden);
    assert!(!c.library.follow_links);
    assert!(!c.library.sort_by_name);
    assert_eq!(
        c.storage.settings_path,
        Some(std::path::PathBuf::from("/tmp/elsewhere.json"))
    );
}

#[test]
fn env_overrides_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[audio]
quit_fade_out_ms = 250
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("ALLEGRO_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::set("ALLEGRO__AUDIO__QUIT_FADE_OUT_MS", "0");

    let c = Config::load().unwrap();
    assert_eq!(c.audio.quit_fade_out_ms, 0);
}

#[test]
fn validate_rejects_zero_tick_and_bad_volume_step() {
    let mut c = Config::default();
    c.playback.tick_ms = 0;
    assert!(c.validate().is_err());

    let mut c = Config::default();
    c.controls.volume_step = 0;
    assert!(c.validate().is_err());
}
