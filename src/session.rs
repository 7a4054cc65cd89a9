//! Session lifetime: wiring the controller to its engine, the synchronizer and
//! the settings record, from startup to shutdown.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{info, warn};

use crate::audio::AudioEngine;
use crate::config::{Config, LibraryConfig};
use crate::library::{MetadataReader, scan};
use crate::player::{PlaybackController, PlayerListener, SharedController};
use crate::settings::{Settings, SettingsStore};
use crate::sync::ProgressSynchronizer;

pub struct Session {
    controller: SharedController,
    sync: ProgressSynchronizer,
    store: Option<SettingsStore>,
    settings: Settings,
    library: LibraryConfig,
}

impl Session {
    /// Build the controller, apply persisted and configured preferences and
    /// start the progress synchronizer. No directory is loaded yet.
    pub fn start(
        config: &Config,
        engine: Box<dyn AudioEngine>,
        metadata: Box<dyn MetadataReader>,
        listener: Box<dyn PlayerListener>,
        store: Option<SettingsStore>,
    ) -> Self {
        let (settings, load_error) = match store.as_ref().map(SettingsStore::try_load) {
            Some(Ok(settings)) => (settings, None),
            Some(Err(e)) => {
                warn!(error = %e, "settings unreadable, using defaults");
                (Settings::default(), Some(e))
            }
            None => (Settings::default(), None),
        };

        let mut controller =
            PlaybackController::new(engine, metadata, listener, config.playback.policy());
        if let Some(e) = load_error {
            controller.report_error(&e.to_string());
        }
        controller.set_volume(i32::from(settings.volume));
        controller.set_shuffled(config.playback.shuffle);
        controller.set_repeat_mode(config.playback.repeat_mode);

        let controller = Arc::new(Mutex::new(controller));
        let sync = ProgressSynchronizer::spawn(controller.clone(), config.playback.tick());

        Self {
            controller,
            sync,
            store,
            settings,
            library: config.library.clone(),
        }
    }

    /// Run `f` with exclusive access to the controller.
    pub fn with_controller<R>(&self, f: impl FnOnce(&mut PlaybackController) -> R) -> R {
        f(&mut self.lock())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Scan `dir` and make it the catalog. The scan runs without holding the
    /// controller, so the synchronizer keeps ticking meanwhile.
    pub fn load_directory(&mut self, dir: &Path) -> usize {
        let dir = std::path::absolute(dir).unwrap_or_else(|_| dir.to_path_buf());
        let report = scan(&dir, &self.library);
        let count = report.catalog.len();
        info!(dir = %dir.display(), tracks = count, skipped = report.skipped.len(), "directory loaded");

        {
            let mut c = self.lock();
            c.replace_catalog(report.catalog, Some(&dir));
            match report.skipped.as_slice() {
                [] => {}
                [only] => c.report_error(&only.to_string()),
                many => c.report_error(&format!(
                    "skipped {} unreadable entries under {}",
                    many.len(),
                    dir.display()
                )),
            }
        }

        // A directory that could not be opened at all is not remembered.
        if dir.is_dir() {
            self.settings.last_directory = Some(dir);
            self.persist();
        }
        count
    }

    pub fn set_volume(&mut self, volume: i32) -> u8 {
        let volume = self.lock().set_volume(volume);
        self.settings.volume = volume;
        self.persist();
        volume
    }

    pub fn adjust_volume(&mut self, delta: i32) -> u8 {
        let current = i32::from(self.lock().state().volume);
        self.set_volume(current + delta)
    }

    /// Stop the synchronizer, release the engine and flush settings.
    pub fn shutdown(mut self) {
        self.sync.stop();
        let volume = {
            let mut c = self.lock();
            c.shutdown();
            c.state().volume
        };
        self.settings.volume = volume;
        self.persist();
        info!("session closed");
    }

    /// The directory to open at startup: the command line wins over the
    /// persisted one, which wins over the working directory.
    pub fn initial_directory(&self, cli: Option<PathBuf>) -> Option<PathBuf> {
        cli.or_else(|| self.settings.last_directory.clone())
            .or_else(|| std::env::current_dir().ok())
    }

    fn lock(&self) -> MutexGuard<'_, PlaybackController> {
        self.controller
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self) {
        let Some(store) = self.store.as_ref() else {
            return;
        };
        if let Err(e) = store.save(&self.settings) {
            warn!(error = %e, "settings not saved");
            self.lock().report_error(&e.to_string());
        }
    }
}
