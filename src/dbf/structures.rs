use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use chrono::NaiveDate;
use std::io::Cursor;

use crate::error::{Error, Result};

/// dBASE III without memo file.
pub const DBF_VERSION: u8 = 0x03;

/// Fixed table header size; field descriptors follow it.
pub const HEADER_SIZE: usize = 32;

/// One field descriptor block.
pub const DESCRIPTOR_SIZE: usize = 32;

/// Byte closing the field descriptor array.
pub const FIELD_TERMINATOR: u8 = 0x0D;

/// Optional end-of-file marker after the last record.
pub const FILE_TERMINATOR: u8 = 0x1A;

/// Deletion-flag values. Anything else in the flag position is corruption.
pub const RECORD_ACTIVE: u8 = 0x20;
pub const RECORD_DELETED: u8 = 0x2A;

/// Field names are stored in an 11-byte slot, NUL-terminated.
pub const MAX_FIELD_NAME: usize = 10;

/// Fixed table header (32 bytes).
pub struct DbfHeader {
    pub year: u8, // since 1900
    pub month: u8,
    pub day: u8,
    pub record_count: u32,
    pub header_len: u16,
    pub record_len: u16,
}

impl DbfHeader {
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(Error::Format("attribute file shorter than its header".into()));
        }
        let mut cursor = Cursor::new(data);
        let version = cursor.read_u8()?;
        // low nibble carries the dBASE level; memo/encryption variants in
        // the high bits still share this record layout
        if version & 0x07 != DBF_VERSION {
            return Err(Error::Format(format!(
                "unsupported attribute table version 0x{version:02X}"
            )));
        }
        let year = cursor.read_u8()?;
        let month = cursor.read_u8()?;
        let day = cursor.read_u8()?;
        let record_count = cursor.read_u32::<LittleEndian>()?;
        let header_len = cursor.read_u16::<LittleEndian>()?;
        let record_len = cursor.read_u16::<LittleEndian>()?;
        Ok(Self {
            year,
            month,
            day,
            record_count,
            header_len,
            record_len,
        })
    }

    pub fn write_to(&self, buf: &mut Vec<u8>) -> Result<()> {
        buf.write_u8(DBF_VERSION)?;
        buf.write_u8(self.year)?;
        buf.write_u8(self.month)?;
        buf.write_u8(self.day)?;
        buf.write_u32::<LittleEndian>(self.record_count)?;
        buf.write_u16::<LittleEndian>(self.header_len)?;
        buf.write_u16::<LittleEndian>(self.record_len)?;
        // reserved area: transaction, encryption, multi-user and index
        // bytes all zero
        buf.extend_from_slice(&[0u8; 20]);
        Ok(())
    }
}

/// Field type tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Character,
    Numeric,
    Float,
    Date,
    Logical,
}

impl FieldType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            b'C' => Some(FieldType::Character),
            b'N' => Some(FieldType::Numeric),
            b'F' => Some(FieldType::Float),
            b'D' => Some(FieldType::Date),
            b'L' => Some(FieldType::Logical),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            FieldType::Character => b'C',
            FieldType::Numeric => b'N',
            FieldType::Float => b'F',
            FieldType::Date => b'D',
            FieldType::Logical => b'L',
        }
    }
}

/// One column definition. Field order is fixed at table creation and
/// matches record value order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: String,
    pub field_type: FieldType,
    pub length: u8,
    pub decimal_count: u8,
}

impl FieldDef {
    pub fn new(name: &str, field_type: FieldType, length: u8, decimal_count: u8) -> Self {
        Self {
            name: name.to_string(),
            field_type,
            length,
            decimal_count,
        }
    }

    /// The default typing used when a caller supplies records without
    /// explicit definitions: untyped text at the maximum field width.
    pub fn character(name: &str) -> Self {
        Self::new(name, FieldType::Character, 255, 0)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() || self.name.len() > MAX_FIELD_NAME {
            return Err(Error::Value(format!(
                "field name {:?} must be 1-{MAX_FIELD_NAME} bytes",
                self.name
            )));
        }
        if self.length == 0 {
            return Err(Error::Value(format!("field {:?} has zero width", self.name)));
        }
        Ok(())
    }

    /// Parse one 32-byte descriptor block.
    pub fn from_descriptor(data: &[u8]) -> Result<Self> {
        if data.len() < DESCRIPTOR_SIZE {
            return Err(Error::Format("truncated field descriptor".into()));
        }
        let name_end = data[..11].iter().position(|&b| b == 0).unwrap_or(11);
        let name = String::from_utf8_lossy(&data[..name_end]).trim().to_string();
        let field_type = FieldType::from_u8(data[11]).ok_or_else(|| {
            Error::Format(format!(
                "field {name:?} has unsupported type tag {:?}",
                data[11] as char
            ))
        })?;
        let length = data[16];
        let decimal_count = data[17];
        Ok(Self {
            name,
            field_type,
            length,
            decimal_count,
        })
    }

    pub fn write_descriptor(&self, buf: &mut Vec<u8>) {
        let mut name = [0u8; 11];
        let bytes = self.name.as_bytes();
        name[..bytes.len().min(MAX_FIELD_NAME)]
            .copy_from_slice(&bytes[..bytes.len().min(MAX_FIELD_NAME)]);
        buf.extend_from_slice(&name);
        buf.push(self.field_type.as_u8());
        buf.extend_from_slice(&[0u8; 4]);
        buf.push(self.length);
        buf.push(self.decimal_count);
        buf.extend_from_slice(&[0u8; 14]);
    }
}

/// One decoded attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Character(String),
    Numeric(f64),
    Date(NaiveDate),
    Logical(bool),
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => f.write_str(""),
            Value::Character(s) => f.write_str(s),
            Value::Numeric(v) => write!(f, "{v}"),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Value::Logical(b) => f.write_str(if *b { "T" } else { "F" }),
        }
    }
}

/// One attribute record: an ordered mapping from field name to value.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    values: Vec<(String, Value)>,
}

impl Record {
    pub fn new(values: Vec<(String, Value)>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.values.iter().map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Look up a value by field name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }
}
