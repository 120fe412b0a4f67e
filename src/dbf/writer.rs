//! Encoding of DBF attribute tables.

use chrono::{Datelike, Local};

use crate::error::{Error, Result};

use super::structures::*;

/// Encode field definitions and records into a dBASE III table.
///
/// Every record must carry exactly the field names of `fields`, in order.
/// Values are padded (or, for character fields, truncated) to their
/// declared width; a numeric value that cannot be rendered inside its
/// width is an error rather than silent corruption.
pub fn encode(fields: &[FieldDef], records: &[Record]) -> Result<Vec<u8>> {
    if fields.is_empty() {
        return Err(Error::Value("a table needs at least one field".into()));
    }
    for field in fields {
        field.validate()?;
    }
    for (i, field) in fields.iter().enumerate() {
        if fields[..i].iter().any(|f| f.name == field.name) {
            return Err(Error::Value(format!("duplicate field name {:?}", field.name)));
        }
    }

    let record_len: usize = 1 + fields.iter().map(|f| f.length as usize).sum::<usize>();
    let header_len = HEADER_SIZE + fields.len() * DESCRIPTOR_SIZE + 1;
    let record_len = u16::try_from(record_len)
        .map_err(|_| Error::Value("record layout exceeds 65535 bytes".into()))?;
    let header_len = u16::try_from(header_len)
        .map_err(|_| Error::Value("too many fields for one table".into()))?;
    let record_count = u32::try_from(records.len())
        .map_err(|_| Error::Value("too many records for one table".into()))?;

    let today = Local::now().date_naive();
    let header = DbfHeader {
        year: today.year().saturating_sub(1900).clamp(0, 255) as u8,
        month: today.month() as u8,
        day: today.day() as u8,
        record_count,
        header_len,
        record_len,
    };

    let mut buf = Vec::with_capacity(header_len as usize + records.len() * record_len as usize + 1);
    header.write_to(&mut buf)?;
    for field in fields {
        field.write_descriptor(&mut buf);
    }
    buf.push(FIELD_TERMINATOR);

    for (i, record) in records.iter().enumerate() {
        if record.len() != fields.len()
            || !record.field_names().eq(fields.iter().map(|f| f.name.as_str()))
        {
            return Err(Error::FieldMismatch {
                index: i,
                expected: fields
                    .iter()
                    .map(|f| f.name.clone())
                    .collect::<Vec<_>>()
                    .join(", "),
                found: record.field_names().collect::<Vec<_>>().join(", "),
            });
        }
        buf.push(RECORD_ACTIVE);
        for (field, value) in fields.iter().zip(record.values()) {
            write_value(&mut buf, field, value)?;
        }
    }
    buf.push(FILE_TERMINATOR);

    tracing::debug!(
        fields = fields.len(),
        records = records.len(),
        bytes = buf.len(),
        "encoded attribute table"
    );
    Ok(buf)
}

/// Render one value into its fixed-width cell.
fn write_value(buf: &mut Vec<u8>, field: &FieldDef, value: &Value) -> Result<()> {
    let width = field.length as usize;
    let cell = match (field.field_type, value) {
        (_, Value::Null) => " ".repeat(width),
        // character fields take any value as text; this is the lossy
        // default-typing path
        (FieldType::Character, value) => {
            let s = value.to_string();
            let mut end = s.len().min(width);
            // never split a multi-byte character
            while end > 0 && !s.is_char_boundary(end) {
                end -= 1;
            }
            // pad by bytes, not chars; cells are fixed byte widths
            let mut cell = s[..end].to_string();
            cell.push_str(&" ".repeat(width - end));
            cell
        }
        (FieldType::Numeric | FieldType::Float, Value::Numeric(v)) => {
            let prec = field.decimal_count as usize;
            let rendered = format!("{v:>width$.prec$}");
            if rendered.len() > width {
                return Err(Error::Value(format!(
                    "{v} does not fit field {:?} of width {width}",
                    field.name
                )));
            }
            rendered
        }
        (FieldType::Date, Value::Date(d)) => {
            let rendered = d.format("%Y%m%d").to_string();
            if rendered.len() > width {
                return Err(Error::Value(format!(
                    "date does not fit field {:?} of width {width}",
                    field.name
                )));
            }
            format!("{rendered:<width$}")
        }
        (FieldType::Logical, Value::Logical(b)) => {
            format!("{:<width$}", if *b { "T" } else { "F" })
        }
        (_, other) => {
            return Err(Error::Value(format!(
                "field {:?} of type {:?} cannot hold {other:?}",
                field.name, field.field_type
            )));
        }
    };
    debug_assert_eq!(cell.len(), width);
    buf.extend_from_slice(cell.as_bytes());
    Ok(())
}
