//! Playback core: the player state, its transition rules and the listener seam.

mod controller;
mod listener;
mod state;

pub use controller::{IndexPicker, PlaybackController, PlaybackPolicy, random_index};
pub use listener::{Listeners, PlayerListener};
pub use state::{PlayerState, RepeatMode};

/// The single serialization point: control path and synchronizer both lock this.
pub type SharedController = std::sync::Arc<std::sync::Mutex<PlaybackController>>;
