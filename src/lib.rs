//! # shapepack
//!
//! A shapefile interchange library and CLI.
//!
//! A shapefile dataset is a triad of files sharing one base name: the
//! geometry file (`.shp`), its record index (`.shx`), and the attribute
//! table (`.dbf`). This library reads and writes all three formats,
//! keeps them consistent with each other, and moves whole datasets in
//! and out of ZIP archives.
//!
//! ## Features
//!
//! - Decode and encode the `.shp`/`.shx` geometry pair for all thirteen
//!   shape types, including measured (M) and three-dimensional (Z) forms
//! - Decode and encode dBASE III (`.dbf`) attribute tables with typed
//!   field values
//! - Read and write complete triads with geometry/record pairing checks
//! - Extract ZIP archives and group their contents into triads
//! - Bundle files into a fresh ZIP archive
//!
//! ## Example
//!
//! ```no_run
//! use shapepack::extract_and_group;
//! use std::path::Path;
//!
//! fn main() -> anyhow::Result<()> {
//!     // Unpack an archive into shapefile triads
//!     let triads = extract_and_group(Path::new("parcels.zip"))?;
//!
//!     for triad in &triads {
//!         let entries = triad.read()?;
//!         println!("{}: {} shapes", triad.base_name, entries.len());
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod cli;
pub mod dbf;
pub mod error;
pub mod geometry;
pub mod io;
pub mod shapefile;
pub mod shp;

pub use archive::{GroupingPolicy, ZipExtractor, create_archive, extract_and_group};
pub use cli::Cli;
pub use error::{Error, Result};
pub use geometry::{Bounds, Geometry, Point, PointM, PointZ, ShapeType};
pub use io::{LocalFileReader, ReadAt};
pub use shapefile::{FileTriad, ShapeEntry};
