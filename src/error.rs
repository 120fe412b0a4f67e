//! Error taxonomy for the crate.
//!
//! Every expected failure mode (missing file, malformed bytes, mismatched
//! inputs) surfaces as a variant of [`Error`]; panics are reserved for
//! programming errors.

use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// All failure modes of the read/write/pack/unpack operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The `.shp` geometry file does not exist.
    #[error("geometry file not found: {0}")]
    ShpNotFound(PathBuf),

    /// The `.dbf` attribute file does not exist.
    #[error("attribute file not found: {0}")]
    DbfNotFound(PathBuf),

    /// The `.shx` index file does not exist.
    #[error("index file not found: {0}")]
    ShxNotFound(PathBuf),

    /// The ZIP archive does not exist.
    #[error("archive not found: {0}")]
    ZipNotFound(PathBuf),

    /// Structurally invalid binary content: bad header, length mismatch,
    /// unknown shape-type tag, misaligned field layout.
    #[error("malformed file: {0}")]
    Format(String),

    /// A value does not fit its declared field width or type.
    #[error("invalid value: {0}")]
    Value(String),

    /// Attribute record count and geometry record count disagree.
    #[error("count mismatch: {records} attribute records, {geometries} geometries")]
    CountMismatch { records: usize, geometries: usize },

    /// A record declares a different field set than the first record.
    #[error("entry {index}: fields [{found}] do not match [{expected}]")]
    FieldMismatch {
        index: usize,
        expected: String,
        found: String,
    },

    /// A write was requested with zero entries.
    #[error("no entries to write")]
    EmptyInput,

    /// The archive is corrupt or uses an unsupported feature.
    #[error("cannot extract archive: {0}")]
    Extraction(String),

    /// One or more inputs for archiving do not exist. Carries every missing
    /// path, not just the first.
    #[error("missing input files: {}", format_paths(.0))]
    MissingFiles(Vec<PathBuf>),

    /// The archive could not be produced.
    #[error("cannot create archive: {0}")]
    ArchiveCreation(String),

    /// The archive contained no complete .shp/.shx/.dbf group.
    #[error("no complete shapefile triad found in archive")]
    NoValidGroups,

    /// Strict grouping only: base names that are missing one or more of
    /// their triad members.
    #[error("incomplete shapefile groups in archive: {}", .0.join(", "))]
    IncompleteGroups(Vec<String>),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

fn format_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
