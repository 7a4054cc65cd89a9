//! Track catalog: directory scanning, the `Track`/`Catalog` model and
//! file-metadata lookup.

mod display;
mod metadata;
mod model;
mod scan;

pub use display::format_file_size;
pub use metadata::{LoftyReader, MetadataReader};
pub use model::{Catalog, Track};
pub use scan::{ScanReport, scan};

/// Extensions recognized as playable audio (matched case-insensitively).
pub const SUPPORTED_EXTENSIONS: [&str; 6] = ["mp3", "wav", "ogg", "flac", "m4a", "aac"];
