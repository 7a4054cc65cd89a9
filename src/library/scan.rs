use std::path::Path;

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::LibraryConfig;
use crate::error::CatalogScanError;

use super::model::{Catalog, Track};

/// Result of a directory load: the new catalog plus every entry that had to be skipped.
#[derive(Debug)]
pub struct ScanReport {
    pub catalog: Catalog,
    pub skipped: Vec<CatalogScanError>,
}

fn is_audio_file(path: &Path, settings: &LibraryConfig) -> bool {
    let exts: Vec<String> = settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect();

    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| e == &ext)
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// Walk `dir` and collect playable tracks in walk order.
///
/// Unreadable entries (including the root itself) are skipped and reported in
/// [`ScanReport::skipped`]; they never abort the walk.
pub fn scan(dir: &Path, settings: &LibraryConfig) -> ScanReport {
    let mut tracks: Vec<Track> = Vec::new();
    let mut skipped: Vec<CatalogScanError> = Vec::new();

    let mut walker = WalkDir::new(dir).follow_links(settings.follow_links);

    // Non-recursive = only the root directory.
    let depth_cap = if settings.recursive {
        settings.max_depth
    } else {
        Some(1)
    };
    if let Some(d) = depth_cap {
        walker = walker.max_depth(d);
    }
    if settings.sort_by_name {
        walker = walker.sort_by_file_name();
    }

    for entry in walker
        .into_iter()
        .filter_entry(|e| settings.include_hidden || e.depth() == 0 || !is_hidden(e.path()))
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let err = CatalogScanError::from(e);
                warn!(error = %err, "catalog scan skipped entry");
                skipped.push(err);
                continue;
            }
        };

        let path = entry.path();
        if entry.file_type().is_dir() || !path.is_file() || !is_audio_file(path, settings) {
            continue;
        }

        let size_bytes = entry.metadata().ok().map(|m| m.len());
        tracks.push(Track::new(path.to_path_buf(), size_bytes));
    }

    debug!(
        dir = %dir.display(),
        tracks = tracks.len(),
        skipped = skipped.len(),
        "catalog scan finished"
    );

    ScanReport {
        catalog: Catalog::new(tracks),
        skipped,
    }
}
