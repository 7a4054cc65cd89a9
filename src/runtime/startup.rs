use std::env;
use std::path::PathBuf;

use crate::config::Config;

/// Load the application config, falling back to defaults. Runs before the
/// log file is set up, so problems go to stderr.
pub fn load_config() -> Config {
    match Config::load() {
        Ok(c) => {
            if let Err(msg) = c.validate() {
                eprintln!("allegro: invalid config, using defaults: {msg}");
                Config::default()
            } else {
                c
            }
        }
        Err(e) => {
            // Config is optional; failures should not prevent the app from starting.
            eprintln!("allegro: failed to load config, using defaults: {e}");
            Config::default()
        }
    }
}

/// Directory given on the command line, if any.
pub fn cli_directory() -> Option<PathBuf> {
    env::args_os().nth(1).map(PathBuf::from)
}
