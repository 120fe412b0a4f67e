//! Decoding of DBF attribute tables.

use chrono::NaiveDate;

use crate::error::{Error, Result};

use super::structures::*;

/// Decode an attribute table into its field definitions and active
/// records. Deleted records (`0x2A` flag) occupy space in the byte stream
/// but are dropped from the output.
pub fn decode(bytes: &[u8]) -> Result<(Vec<FieldDef>, Vec<Record>)> {
    let header = DbfHeader::from_bytes(bytes)?;
    let header_len = header.header_len as usize;
    let record_len = header.record_len as usize;

    if header_len < HEADER_SIZE + 1 || header_len > bytes.len() {
        return Err(Error::Format(format!(
            "header length {header_len} is inconsistent with file size {}",
            bytes.len()
        )));
    }
    let descriptor_area = header_len - HEADER_SIZE - 1;
    if descriptor_area % DESCRIPTOR_SIZE != 0 {
        return Err(Error::Format(format!(
            "header length {header_len} does not align with 32-byte field descriptors"
        )));
    }
    if bytes[header_len - 1] != FIELD_TERMINATOR {
        return Err(Error::Format("field descriptor array is unterminated".into()));
    }

    let field_count = descriptor_area / DESCRIPTOR_SIZE;
    let mut fields = Vec::with_capacity(field_count);
    for i in 0..field_count {
        let start = HEADER_SIZE + i * DESCRIPTOR_SIZE;
        fields.push(FieldDef::from_descriptor(&bytes[start..start + DESCRIPTOR_SIZE])?);
    }

    let layout_len: usize = 1 + fields.iter().map(|f| f.length as usize).sum::<usize>();
    if layout_len != record_len {
        return Err(Error::Format(format!(
            "field widths sum to {layout_len} bytes per record, header declares {record_len}"
        )));
    }

    let record_count = header.record_count as usize;
    let needed = header_len + record_count * record_len;
    if bytes.len() < needed {
        return Err(Error::Format(format!(
            "table declares {record_count} records of {record_len} bytes but only {} bytes follow the header",
            bytes.len() - header_len
        )));
    }

    let mut records = Vec::with_capacity(record_count);
    for i in 0..record_count {
        let start = header_len + i * record_len;
        let raw = &bytes[start..start + record_len];
        match raw[0] {
            RECORD_DELETED => continue,
            RECORD_ACTIVE => {}
            flag => {
                return Err(Error::Format(format!(
                    "record {} has invalid deletion flag 0x{flag:02X}",
                    i + 1
                )));
            }
        }

        let mut values = Vec::with_capacity(fields.len());
        let mut offset = 1;
        for field in &fields {
            let width = field.length as usize;
            let value = parse_value(&raw[offset..offset + width], field)?;
            values.push((field.name.clone(), value));
            offset += width;
        }
        records.push(Record::new(values));
    }

    tracing::debug!(
        fields = fields.len(),
        records = records.len(),
        deleted = record_count - records.len(),
        "decoded attribute table"
    );
    Ok((fields, records))
}

/// Coerce one fixed-width text cell to its typed value. Empty or
/// all-asterisk cells (the dBASE overflow fill) decode as null.
fn parse_value(raw: &[u8], field: &FieldDef) -> Result<Value> {
    let text: String = String::from_utf8_lossy(raw)
        .chars()
        .filter(|&c| c != '\0')
        .collect();
    let text = text.trim();
    if text.is_empty() || text.bytes().all(|b| b == b'*') {
        return Ok(Value::Null);
    }

    match field.field_type {
        FieldType::Character => Ok(Value::Character(text.to_string())),
        FieldType::Numeric | FieldType::Float => text
            .parse::<f64>()
            .map(Value::Numeric)
            .map_err(|_| {
                Error::Format(format!(
                    "field {:?} holds non-numeric content {text:?}",
                    field.name
                ))
            }),
        FieldType::Date => {
            if text.len() != 8 || !text.bytes().all(|b| b.is_ascii_digit()) {
                return Err(Error::Format(format!(
                    "field {:?} holds malformed date {text:?}",
                    field.name
                )));
            }
            let year: i32 = text[0..4].parse().unwrap_or(0);
            let month: u32 = text[4..6].parse().unwrap_or(0);
            let day: u32 = text[6..8].parse().unwrap_or(0);
            NaiveDate::from_ymd_opt(year, month, day)
                .map(Value::Date)
                .ok_or_else(|| {
                    Error::Format(format!(
                        "field {:?} holds impossible date {text:?}",
                        field.name
                    ))
                })
        }
        FieldType::Logical => match text.as_bytes()[0] {
            b'T' | b't' | b'Y' | b'y' => Ok(Value::Logical(true)),
            b'F' | b'f' | b'N' | b'n' => Ok(Value::Logical(false)),
            b'?' => Ok(Value::Null),
            other => Err(Error::Format(format!(
                "field {:?} holds invalid logical {:?}",
                field.name, other as char
            ))),
        },
    }
}
