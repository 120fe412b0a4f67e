use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::Cursor;

use crate::error::{Error, Result};
use crate::geometry::Bounds;

/// Magic number opening both .shp and .shx files.
pub const FILE_CODE: i32 = 9994;

/// The only version the format ever shipped.
pub const VERSION: i32 = 1000;

/// Shared file header size for .shp and .shx.
pub const HEADER_SIZE: usize = 100;

/// Record number + content length prefix inside the .shp file.
pub const RECORD_HEADER_SIZE: usize = 8;

/// Offset/length pair inside the .shx file.
pub const INDEX_ENTRY_SIZE: usize = 8;

/// The 100-byte file header.
///
/// The file code, padding and length are big-endian; version, shape type
/// and the bounding box are little-endian. Lengths are counted in 16-bit
/// words.
pub struct FileHeader {
    pub file_length_words: i32,
    pub shape_type: i32,
    pub bounds: Bounds,
}

impl FileHeader {
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(Error::Format("file shorter than its 100-byte header".into()));
        }
        let mut cursor = Cursor::new(data);
        let file_code = cursor.read_i32::<BigEndian>()?;
        if file_code != FILE_CODE {
            return Err(Error::Format(format!(
                "bad file code {file_code}, expected {FILE_CODE}"
            )));
        }
        cursor.set_position(24);
        let file_length_words = cursor.read_i32::<BigEndian>()?;
        let version = cursor.read_i32::<LittleEndian>()?;
        if version != VERSION {
            return Err(Error::Format(format!(
                "unsupported version {version}, expected {VERSION}"
            )));
        }
        let shape_type = cursor.read_i32::<LittleEndian>()?;
        let bounds = Bounds {
            x_min: cursor.read_f64::<LittleEndian>()?,
            y_min: cursor.read_f64::<LittleEndian>()?,
            x_max: cursor.read_f64::<LittleEndian>()?,
            y_max: cursor.read_f64::<LittleEndian>()?,
            z_min: cursor.read_f64::<LittleEndian>()?,
            z_max: cursor.read_f64::<LittleEndian>()?,
            m_min: cursor.read_f64::<LittleEndian>()?,
            m_max: cursor.read_f64::<LittleEndian>()?,
        };
        Ok(Self {
            file_length_words,
            shape_type,
            bounds,
        })
    }

    pub fn write_to(&self, buf: &mut Vec<u8>) -> Result<()> {
        buf.write_i32::<BigEndian>(FILE_CODE)?;
        for _ in 0..5 {
            buf.write_i32::<BigEndian>(0)?;
        }
        buf.write_i32::<BigEndian>(self.file_length_words)?;
        buf.write_i32::<LittleEndian>(VERSION)?;
        buf.write_i32::<LittleEndian>(self.shape_type)?;
        buf.write_f64::<LittleEndian>(self.bounds.x_min)?;
        buf.write_f64::<LittleEndian>(self.bounds.y_min)?;
        buf.write_f64::<LittleEndian>(self.bounds.x_max)?;
        buf.write_f64::<LittleEndian>(self.bounds.y_max)?;
        buf.write_f64::<LittleEndian>(self.bounds.z_min)?;
        buf.write_f64::<LittleEndian>(self.bounds.z_max)?;
        buf.write_f64::<LittleEndian>(self.bounds.m_min)?;
        buf.write_f64::<LittleEndian>(self.bounds.m_max)?;
        Ok(())
    }
}

/// Per-record prefix in the geometry file. Record numbers are 1-based.
pub struct RecordHeader {
    pub number: i32,
    pub content_words: i32,
}

impl RecordHeader {
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < RECORD_HEADER_SIZE {
            return Err(Error::Format("truncated record header".into()));
        }
        let mut cursor = Cursor::new(data);
        Ok(Self {
            number: cursor.read_i32::<BigEndian>()?,
            content_words: cursor.read_i32::<BigEndian>()?,
        })
    }

    pub fn write_to(&self, buf: &mut Vec<u8>) -> Result<()> {
        buf.write_i32::<BigEndian>(self.number)?;
        buf.write_i32::<BigEndian>(self.content_words)?;
        Ok(())
    }
}

/// One .shx entry: where record i lives in the .shp file and how long its
/// content is.
pub struct IndexEntry {
    pub offset_words: i32,
    pub content_words: i32,
}

impl IndexEntry {
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < INDEX_ENTRY_SIZE {
            return Err(Error::Format("truncated index entry".into()));
        }
        let mut cursor = Cursor::new(data);
        Ok(Self {
            offset_words: cursor.read_i32::<BigEndian>()?,
            content_words: cursor.read_i32::<BigEndian>()?,
        })
    }

    pub fn write_to(&self, buf: &mut Vec<u8>) -> Result<()> {
        buf.write_i32::<BigEndian>(self.offset_words)?;
        buf.write_i32::<BigEndian>(self.content_words)?;
        Ok(())
    }
}
