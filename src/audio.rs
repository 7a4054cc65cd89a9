//! Audio subsystem: the `AudioEngine` seam and its rodio implementation.

mod engine;
mod player;
mod sink;
mod thread;
mod types;

pub use engine::AudioEngine;
pub use player::AudioPlayer;
pub use types::EngineEvent;
