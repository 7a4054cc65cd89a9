use std::path::Path;
use std::time::Duration;

use lofty::prelude::AudioFile;

use crate::error::PlaybackError;

/// Reads track properties from the file itself, so they are known before the
/// engine starts decoding.
pub trait MetadataReader: Send {
    fn duration(&self, path: &Path) -> Result<Duration, PlaybackError>;
}

/// `MetadataReader` backed by `lofty`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoftyReader;

impl MetadataReader for LoftyReader {
    fn duration(&self, path: &Path) -> Result<Duration, PlaybackError> {
        let tagged = lofty::read_from_path(path).map_err(|e| PlaybackError::Metadata {
            path: path.to_path_buf(),
            source: Box::new(e),
        })?;
        Ok(tagged.properties().duration())
    }
}
