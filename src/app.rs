//! Application module: the view model drawn by the TUI and the channel that
//! feeds it player notifications.
//!
//! The `App` model lives in `app::model`; `app::events` carries listener
//! callbacks across to the UI thread as `UiEvent`s.

mod events;
mod model;

pub use events::{ChannelListener, UiEvent};
pub use model::*;

#[cfg(test)]
mod tests;
