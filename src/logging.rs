//! tracing setup. The terminal belongs to the TUI, so logs go to a file.

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::{LogConfig, default_log_path};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Install the global subscriber. Returns the log file in use, or `None` when
/// logging could not be set up (never fatal).
pub fn init(log: &LogConfig) -> Option<PathBuf> {
    let path = log.file.clone().or_else(default_log_path)?;
    match try_init(&path, &log.level) {
        Ok(()) => Some(path),
        Err(e) => {
            eprintln!("allegro: logging disabled ({}): {e}", path.display());
            None
        }
    }
}

fn try_init(path: &Path, level: &str) -> Result<(), BoxError> {
    let file = open_log_file(path)?;
    // `ALLEGRO_LOG` takes the usual `RUST_LOG` syntax.
    let filter = EnvFilter::try_from_env("ALLEGRO_LOG").or_else(|_| EnvFilter::try_new(level))?;

    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .with_env_filter(filter)
        .try_init()
}

fn open_log_file(path: &Path) -> std::io::Result<File> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_file_and_parents_are_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("allegro").join("allegro.log");
        open_log_file(&path).unwrap();
        assert!(path.is_file());
    }
}
