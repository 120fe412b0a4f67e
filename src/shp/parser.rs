//! Decoding of geometry records, cross-checked against the offset index.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

use crate::error::{Error, Result};
use crate::geometry::{Geometry, Point, PointM, PointZ, ShapeType};

use super::structures::*;

/// Decode a geometry file together with its index.
///
/// The index drives iteration: each entry supplies the byte offset and
/// content length of one record, and any disagreement between the index
/// and the record actually found there is treated as corruption.
pub fn decode(shp: &[u8], shx: &[u8]) -> Result<Vec<Geometry>> {
    let shp_header = FileHeader::from_bytes(shp)?;
    let shx_header = FileHeader::from_bytes(shx)?;

    check_declared_length("geometry file", shp_header.file_length_words, shp.len())?;
    check_declared_length("index file", shx_header.file_length_words, shx.len())?;
    if (shx.len() - HEADER_SIZE) % INDEX_ENTRY_SIZE != 0 {
        return Err(Error::Format(
            "index payload is not a whole number of 8-byte entries".into(),
        ));
    }

    let record_count = (shx.len() - HEADER_SIZE) / INDEX_ENTRY_SIZE;
    let mut geometries = Vec::with_capacity(record_count);
    for i in 0..record_count {
        let entry = IndexEntry::from_bytes(&shx[HEADER_SIZE + i * INDEX_ENTRY_SIZE..])?;
        let offset = (entry.offset_words as usize) * 2;
        if offset < HEADER_SIZE || offset + RECORD_HEADER_SIZE > shp.len() {
            return Err(Error::Format(format!(
                "index entry {} points outside the geometry file",
                i + 1
            )));
        }
        let header = RecordHeader::from_bytes(&shp[offset..])?;
        if header.content_words != entry.content_words {
            return Err(Error::Format(format!(
                "record {}: index declares {} words of content, record header declares {}",
                i + 1,
                entry.content_words,
                header.content_words
            )));
        }
        let content_len = (header.content_words as usize) * 2;
        let start = offset + RECORD_HEADER_SIZE;
        let content = shp.get(start..start + content_len).ok_or_else(|| {
            Error::Format(format!("record {} is truncated", i + 1))
        })?;
        geometries.push(decode_record(content).map_err(|e| match e {
            Error::Format(msg) => Error::Format(format!("record {}: {msg}", i + 1)),
            other => other,
        })?);
    }

    tracing::debug!(records = geometries.len(), "decoded geometry file");
    Ok(geometries)
}

fn check_declared_length(what: &str, words: i32, actual: usize) -> Result<()> {
    if words < 0 || (words as usize) * 2 != actual {
        return Err(Error::Format(format!(
            "{what} header declares {} bytes but the file holds {actual}",
            (words.max(0) as usize) * 2
        )));
    }
    Ok(())
}

/// Decode one record's content: a shape-type tag followed by the
/// type-specific payload.
fn decode_record(content: &[u8]) -> Result<Geometry> {
    let mut cur = Cursor::new(content);
    let tag = cur.read_i32::<LittleEndian>()?;
    let shape_type = ShapeType::from_i32(tag)
        .ok_or_else(|| Error::Format(format!("unknown shape type tag {tag}")))?;

    let geometry = match shape_type {
        ShapeType::Null => Geometry::Null,
        ShapeType::Point => {
            let (x, y) = read_xy(&mut cur)?;
            Geometry::Point(Point { x, y })
        }
        ShapeType::PointM => {
            let (x, y) = read_xy(&mut cur)?;
            let m = cur.read_f64::<LittleEndian>()?;
            Geometry::PointM(PointM { x, y, m })
        }
        ShapeType::PointZ => {
            let (x, y) = read_xy(&mut cur)?;
            let z = cur.read_f64::<LittleEndian>()?;
            let m = if remaining(&cur) >= 8 {
                cur.read_f64::<LittleEndian>()?
            } else {
                0.0
            };
            Geometry::PointZ(PointZ { x, y, z, m })
        }
        ShapeType::MultiPoint => {
            let points = read_point_set(&mut cur)?;
            Geometry::MultiPoint(points)
        }
        ShapeType::MultiPointM => {
            let points = read_point_set(&mut cur)?;
            let m = read_optional_dimension(&mut cur, points.len())?;
            Geometry::MultiPointM(with_m(points, m))
        }
        ShapeType::MultiPointZ => {
            let points = read_point_set(&mut cur)?;
            let z = read_required_dimension(&mut cur, points.len(), "Z")?;
            let m = read_optional_dimension(&mut cur, points.len())?;
            Geometry::MultiPointZ(with_zm(points, z, m))
        }
        ShapeType::PolyLine | ShapeType::Polygon => {
            let (starts, points) = read_poly_base(&mut cur)?;
            let parts = split_parts(&starts, &points);
            if shape_type == ShapeType::PolyLine {
                Geometry::PolyLine(parts)
            } else {
                Geometry::Polygon(parts)
            }
        }
        ShapeType::PolyLineM | ShapeType::PolygonM => {
            let (starts, points) = read_poly_base(&mut cur)?;
            let m = read_optional_dimension(&mut cur, points.len())?;
            let parts = split_parts(&starts, &with_m(points, m));
            if shape_type == ShapeType::PolyLineM {
                Geometry::PolyLineM(parts)
            } else {
                Geometry::PolygonM(parts)
            }
        }
        ShapeType::PolyLineZ | ShapeType::PolygonZ => {
            let (starts, points) = read_poly_base(&mut cur)?;
            let z = read_required_dimension(&mut cur, points.len(), "Z")?;
            let m = read_optional_dimension(&mut cur, points.len())?;
            let parts = split_parts(&starts, &with_zm(points, z, m));
            if shape_type == ShapeType::PolyLineZ {
                Geometry::PolyLineZ(parts)
            } else {
                Geometry::PolygonZ(parts)
            }
        }
    };

    if remaining(&cur) != 0 {
        return Err(Error::Format(format!(
            "{} bytes of unexpected trailing content",
            remaining(&cur)
        )));
    }
    Ok(geometry)
}

fn remaining(cur: &Cursor<&[u8]>) -> usize {
    (cur.get_ref().len() as u64).saturating_sub(cur.position()) as usize
}

fn read_xy(cur: &mut Cursor<&[u8]>) -> Result<(f64, f64)> {
    let x = cur.read_f64::<LittleEndian>()?;
    let y = cur.read_f64::<LittleEndian>()?;
    Ok((x, y))
}

/// Read a count, then guard it against the bytes actually present before
/// allocating anything.
fn read_count(cur: &mut Cursor<&[u8]>, bytes_each: usize, what: &str) -> Result<usize> {
    let n = cur.read_i32::<LittleEndian>()?;
    if n < 0 {
        return Err(Error::Format(format!("negative {what} count {n}")));
    }
    let n = n as usize;
    if n.checked_mul(bytes_each).is_none_or(|need| need > remaining(cur)) {
        return Err(Error::Format(format!(
            "{what} count {n} exceeds the record's content"
        )));
    }
    Ok(n)
}

/// Bounding box (skipped; bounds are recomputed on write), point count,
/// point array. Shared by the multipoint shapes.
fn read_point_set(cur: &mut Cursor<&[u8]>) -> Result<Vec<Point>> {
    cur.set_position(cur.position() + 32);
    let n = read_count(cur, 16, "point")?;
    let mut points = Vec::with_capacity(n);
    for _ in 0..n {
        let (x, y) = read_xy(cur)?;
        points.push(Point { x, y });
    }
    Ok(points)
}

/// Bounding box, part count, point count, part-start array, point array.
/// Shared by the polyline and polygon shapes.
fn read_poly_base(cur: &mut Cursor<&[u8]>) -> Result<(Vec<usize>, Vec<Point>)> {
    cur.set_position(cur.position() + 32);
    let num_parts = cur.read_i32::<LittleEndian>()?;
    let num_points = cur.read_i32::<LittleEndian>()?;
    if num_parts <= 0 || num_points < 0 {
        return Err(Error::Format(format!(
            "implausible part/point counts {num_parts}/{num_points}"
        )));
    }
    let (num_parts, num_points) = (num_parts as usize, num_points as usize);
    let need = num_parts
        .checked_mul(4)
        .and_then(|p| num_points.checked_mul(16).map(|q| (p, q)))
        .and_then(|(p, q)| p.checked_add(q));
    if need.is_none_or(|need| need > remaining(cur)) {
        return Err(Error::Format(
            "part/point counts exceed the record's content".into(),
        ));
    }

    let mut starts = Vec::with_capacity(num_parts);
    for _ in 0..num_parts {
        let start = cur.read_i32::<LittleEndian>()?;
        if start < 0 || start as usize >= num_points.max(1) {
            return Err(Error::Format(format!("part start {start} out of range")));
        }
        starts.push(start as usize);
    }
    if starts[0] != 0 || starts.windows(2).any(|w| w[0] >= w[1]) {
        return Err(Error::Format("part starts must begin at 0 and increase".into()));
    }

    let mut points = Vec::with_capacity(num_points);
    for _ in 0..num_points {
        let (x, y) = read_xy(cur)?;
        points.push(Point { x, y });
    }
    Ok((starts, points))
}

/// A mandatory min/max pair plus one value per point (the Z section).
fn read_required_dimension(cur: &mut Cursor<&[u8]>, n: usize, what: &str) -> Result<Vec<f64>> {
    if remaining(cur) < 16 + n * 8 {
        return Err(Error::Format(format!("missing {what} section")));
    }
    cur.set_position(cur.position() + 16); // min/max, recomputed on write
    let mut values = Vec::with_capacity(n);
    for _ in 0..n {
        values.push(cur.read_f64::<LittleEndian>()?);
    }
    Ok(values)
}

/// The measure section is optional on M and Z shapes; absent measures
/// decode as zeros.
fn read_optional_dimension(cur: &mut Cursor<&[u8]>, n: usize) -> Result<Vec<f64>> {
    if remaining(cur) < 16 + n * 8 {
        return Ok(vec![0.0; n]);
    }
    cur.set_position(cur.position() + 16);
    let mut values = Vec::with_capacity(n);
    for _ in 0..n {
        values.push(cur.read_f64::<LittleEndian>()?);
    }
    Ok(values)
}

fn with_m(points: Vec<Point>, m: Vec<f64>) -> Vec<PointM> {
    points
        .into_iter()
        .zip(m)
        .map(|(p, m)| PointM { x: p.x, y: p.y, m })
        .collect()
}

fn with_zm(points: Vec<Point>, z: Vec<f64>, m: Vec<f64>) -> Vec<PointZ> {
    points
        .into_iter()
        .zip(z.into_iter().zip(m))
        .map(|(p, (z, m))| PointZ { x: p.x, y: p.y, z, m })
        .collect()
}

fn split_parts<T: Clone>(starts: &[usize], points: &[T]) -> Vec<Vec<T>> {
    let mut parts = Vec::with_capacity(starts.len());
    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(points.len());
        parts.push(points[start..end].to_vec());
    }
    parts
}
