//! ZIP packaging and unpackaging of shapefile triads.
//!
//! Shapefiles travel as ZIP archives because a single dataset is three
//! files. This module reads archives (listing, extraction, triad
//! grouping) and writes them (bundling an explicit file list).
//!
//! ## Architecture
//!
//! - [`structures`]: ZIP format elements (EOCD, file headers) and their
//!   byte layouts
//! - [`parser`]: low-level parsing, reading from any [`ReadAt`] source
//! - [`extractor`]: extraction plus the triad-grouping policy
//! - [`builder`]: archive creation
//!
//! ## Supported features
//!
//! Standard ZIP with STORED and DEFLATE entries, read and write, with
//! CRC-32 verification on extraction. Not supported: ZIP64, encryption,
//! multi-disk archives — triad bundles never need them, and an archive
//! using ZIP64 markers is rejected with an explicit error.
//!
//! [`ReadAt`]: crate::io::ReadAt

mod builder;
mod extractor;
mod parser;
mod structures;

pub use builder::create_archive;
pub use extractor::{GroupingPolicy, ZipExtractor, extract_and_group, extract_and_group_with};
pub use parser::ZipParser;
pub use structures::{CompressionMethod, ZipFileEntry};
