//! DBF attribute table codec.
//!
//! The attribute side of a shapefile is a dBASE III table: a 32-byte
//! header, an array of 32-byte field descriptors terminated by `0x0D`, then
//! fixed-width text records each prefixed by a one-byte deletion flag.
//!
//! The module is organized like the archive codec:
//!
//! - [`structures`]: byte-level header and descriptor layouts plus the
//!   [`FieldDef`]/[`Value`]/[`Record`] model
//! - [`parser`]: decoding bytes into field definitions and records
//! - [`writer`]: encoding field definitions and records back into bytes
//!
//! Records flagged as deleted (`0x2A`) occupy space in the file but are
//! skipped during decoding; the flag itself never appears in decoded
//! records.

mod parser;
mod structures;
mod writer;

pub use parser::decode;
pub use structures::{FieldDef, FieldType, Record, Value};
pub use writer::encode;
