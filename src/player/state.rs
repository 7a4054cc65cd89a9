use serde::Deserialize;

/// What happens when a track plays to its end.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RepeatMode {
    /// Advance through the catalog, stopping after the last track.
    #[default]
    #[serde(alias = "no-repeat", alias = "no_repeat", alias = "off")]
    None,
    /// Replay the current track.
    #[serde(alias = "repeat-one", alias = "repeat_one", alias = "one")]
    Track,
    /// Advance, wrapping from the last track to the first.
    #[serde(alias = "repeat-all", alias = "repeat_all", alias = "all")]
    Playlist,
}

impl RepeatMode {
    /// `None -> Track -> Playlist -> None`.
    pub fn cycle(self) -> Self {
        match self {
            RepeatMode::None => RepeatMode::Track,
            RepeatMode::Track => RepeatMode::Playlist,
            RepeatMode::Playlist => RepeatMode::None,
        }
    }
}

/// The authoritative record of the playback session.
///
/// Invariants kept by the controller:
/// - `current_index < catalog.len()` whenever it is `Some`
/// - `is_playing` implies `current_index.is_some()`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerState {
    pub current_index: Option<usize>,
    pub is_playing: bool,
    pub is_shuffled: bool,
    pub repeat_mode: RepeatMode,
    /// 0..=100
    pub volume: u8,
    pub position_ms: u64,
    pub duration_ms: u64,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            current_index: None,
            is_playing: false,
            is_shuffled: false,
            repeat_mode: RepeatMode::None,
            volume: crate::settings::DEFAULT_VOLUME,
            position_ms: 0,
            duration_ms: 0,
        }
    }
}
