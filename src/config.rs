//! Configuration loader and schema types.
//!
//! This module exposes the configuration schema used to drive runtime
//! behavior and helpers to locate configuration, settings and log files.

mod load;
mod schema;

pub use load::{default_log_path, resolve_settings_path};
pub use schema::*;

#[cfg(test)]
mod tests;
