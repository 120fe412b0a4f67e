//! Encoding of geometry records and their offset index.

use byteorder::{LittleEndian, WriteBytesExt};

use crate::error::{Error, Result};
use crate::geometry::{Bounds, Geometry, ShapeType};

use super::structures::*;

/// Encode geometries into a geometry file and its matching index.
///
/// All non-null geometries must share one shape type (null records may be
/// interleaved freely, as the format allows). Record and file bounding
/// boxes are recomputed from the coordinates, never trusted from input.
pub fn encode(geometries: &[Geometry]) -> Result<(Vec<u8>, Vec<u8>)> {
    let mut file_type = ShapeType::Null;
    for g in geometries {
        let t = g.shape_type();
        if t == ShapeType::Null {
            continue;
        }
        if file_type == ShapeType::Null {
            file_type = t;
        } else if t != file_type {
            return Err(Error::Format(format!(
                "cannot mix {t} and {file_type} records in one file"
            )));
        }
    }

    let content_lengths: Vec<usize> = geometries.iter().map(content_length).collect();
    let shp_len = HEADER_SIZE
        + content_lengths
            .iter()
            .map(|len| RECORD_HEADER_SIZE + len)
            .sum::<usize>();
    let shx_len = HEADER_SIZE + geometries.len() * INDEX_ENTRY_SIZE;

    let mut bounds = Bounds::new();
    for g in geometries {
        g.fold_bounds(&mut bounds);
    }
    let header = FileHeader {
        file_length_words: (shp_len / 2) as i32,
        shape_type: file_type.to_i32(),
        bounds: bounds.finish(),
    };

    let mut shp = Vec::with_capacity(shp_len);
    header.write_to(&mut shp)?;
    let mut shx = Vec::with_capacity(shx_len);
    FileHeader {
        file_length_words: (shx_len / 2) as i32,
        ..header
    }
    .write_to(&mut shx)?;

    let mut offset = HEADER_SIZE;
    for (i, (geometry, &content_len)) in geometries.iter().zip(&content_lengths).enumerate() {
        let content_words = (content_len / 2) as i32;
        RecordHeader {
            number: (i + 1) as i32,
            content_words,
        }
        .write_to(&mut shp)?;
        encode_record(&mut shp, geometry)?;

        IndexEntry {
            offset_words: (offset / 2) as i32,
            content_words,
        }
        .write_to(&mut shx)?;
        offset += RECORD_HEADER_SIZE + content_len;
    }
    debug_assert_eq!(shp.len(), shp_len);
    debug_assert_eq!(shx.len(), shx_len);

    tracing::debug!(
        records = geometries.len(),
        shape_type = %file_type,
        bytes = shp.len(),
        "encoded geometry file"
    );
    Ok((shp, shx))
}

/// Content length of one record in bytes, excluding the 8-byte record
/// header. Measures are always written for M and Z shapes.
fn content_length(geometry: &Geometry) -> usize {
    let parts = geometry.part_count();
    let points = geometry.point_count();
    match geometry {
        Geometry::Null => 4,
        Geometry::Point(_) => 4 + 16,
        Geometry::PointM(_) => 4 + 24,
        Geometry::PointZ(_) => 4 + 32,
        Geometry::MultiPoint(_) => 4 + 32 + 4 + 16 * points,
        Geometry::MultiPointM(_) => 4 + 32 + 4 + 16 * points + (16 + 8 * points),
        Geometry::MultiPointZ(_) => 4 + 32 + 4 + 16 * points + 2 * (16 + 8 * points),
        Geometry::PolyLine(_) | Geometry::Polygon(_) => {
            4 + 32 + 8 + 4 * parts + 16 * points
        }
        Geometry::PolyLineM(_) | Geometry::PolygonM(_) => {
            4 + 32 + 8 + 4 * parts + 16 * points + (16 + 8 * points)
        }
        Geometry::PolyLineZ(_) | Geometry::PolygonZ(_) => {
            4 + 32 + 8 + 4 * parts + 16 * points + 2 * (16 + 8 * points)
        }
    }
}

fn encode_record(buf: &mut Vec<u8>, geometry: &Geometry) -> Result<()> {
    buf.write_i32::<LittleEndian>(geometry.shape_type().to_i32())?;
    match geometry {
        Geometry::Null => {}
        Geometry::Point(p) => {
            buf.write_f64::<LittleEndian>(p.x)?;
            buf.write_f64::<LittleEndian>(p.y)?;
        }
        Geometry::PointM(p) => {
            buf.write_f64::<LittleEndian>(p.x)?;
            buf.write_f64::<LittleEndian>(p.y)?;
            buf.write_f64::<LittleEndian>(p.m)?;
        }
        Geometry::PointZ(p) => {
            buf.write_f64::<LittleEndian>(p.x)?;
            buf.write_f64::<LittleEndian>(p.y)?;
            buf.write_f64::<LittleEndian>(p.z)?;
            buf.write_f64::<LittleEndian>(p.m)?;
        }
        Geometry::MultiPoint(pts) => {
            write_bbox(buf, geometry)?;
            buf.write_i32::<LittleEndian>(pts.len() as i32)?;
            for p in pts {
                buf.write_f64::<LittleEndian>(p.x)?;
                buf.write_f64::<LittleEndian>(p.y)?;
            }
        }
        Geometry::MultiPointM(pts) => {
            write_bbox(buf, geometry)?;
            buf.write_i32::<LittleEndian>(pts.len() as i32)?;
            for p in pts {
                buf.write_f64::<LittleEndian>(p.x)?;
                buf.write_f64::<LittleEndian>(p.y)?;
            }
            write_dimension(buf, pts.iter().map(|p| p.m))?;
        }
        Geometry::MultiPointZ(pts) => {
            write_bbox(buf, geometry)?;
            buf.write_i32::<LittleEndian>(pts.len() as i32)?;
            for p in pts {
                buf.write_f64::<LittleEndian>(p.x)?;
                buf.write_f64::<LittleEndian>(p.y)?;
            }
            write_dimension(buf, pts.iter().map(|p| p.z))?;
            write_dimension(buf, pts.iter().map(|p| p.m))?;
        }
        Geometry::PolyLine(parts) => {
            validate_parts(parts, |p| (p.x, p.y), false)?;
            write_poly_base(buf, geometry, parts, |buf, p| {
                buf.write_f64::<LittleEndian>(p.x)?;
                buf.write_f64::<LittleEndian>(p.y)?;
                Ok(())
            })?;
        }
        Geometry::Polygon(parts) => {
            validate_parts(parts, |p| (p.x, p.y), true)?;
            write_poly_base(buf, geometry, parts, |buf, p| {
                buf.write_f64::<LittleEndian>(p.x)?;
                buf.write_f64::<LittleEndian>(p.y)?;
                Ok(())
            })?;
        }
        Geometry::PolyLineM(parts) => {
            validate_parts(parts, |p| (p.x, p.y), false)?;
            write_poly_base(buf, geometry, parts, |buf, p| {
                buf.write_f64::<LittleEndian>(p.x)?;
                buf.write_f64::<LittleEndian>(p.y)?;
                Ok(())
            })?;
            write_dimension(buf, parts.iter().flatten().map(|p| p.m))?;
        }
        Geometry::PolygonM(parts) => {
            validate_parts(parts, |p| (p.x, p.y), true)?;
            write_poly_base(buf, geometry, parts, |buf, p| {
                buf.write_f64::<LittleEndian>(p.x)?;
                buf.write_f64::<LittleEndian>(p.y)?;
                Ok(())
            })?;
            write_dimension(buf, parts.iter().flatten().map(|p| p.m))?;
        }
        Geometry::PolyLineZ(parts) => {
            validate_parts(parts, |p| (p.x, p.y), false)?;
            write_poly_base(buf, geometry, parts, |buf, p| {
                buf.write_f64::<LittleEndian>(p.x)?;
                buf.write_f64::<LittleEndian>(p.y)?;
                Ok(())
            })?;
            write_dimension(buf, parts.iter().flatten().map(|p| p.z))?;
            write_dimension(buf, parts.iter().flatten().map(|p| p.m))?;
        }
        Geometry::PolygonZ(parts) => {
            validate_parts(parts, |p| (p.x, p.y), true)?;
            write_poly_base(buf, geometry, parts, |buf, p| {
                buf.write_f64::<LittleEndian>(p.x)?;
                buf.write_f64::<LittleEndian>(p.y)?;
                Ok(())
            })?;
            write_dimension(buf, parts.iter().flatten().map(|p| p.z))?;
            write_dimension(buf, parts.iter().flatten().map(|p| p.m))?;
        }
    }
    Ok(())
}

/// X/Y bounding box prefix shared by all multi-coordinate shapes.
fn write_bbox(buf: &mut Vec<u8>, geometry: &Geometry) -> Result<()> {
    let b = geometry.bounds().finish();
    buf.write_f64::<LittleEndian>(b.x_min)?;
    buf.write_f64::<LittleEndian>(b.y_min)?;
    buf.write_f64::<LittleEndian>(b.x_max)?;
    buf.write_f64::<LittleEndian>(b.y_max)?;
    Ok(())
}

/// Bounding box, counts, part-start array and point array.
fn write_poly_base<T>(
    buf: &mut Vec<u8>,
    geometry: &Geometry,
    parts: &[Vec<T>],
    write_point: impl Fn(&mut Vec<u8>, &T) -> Result<()>,
) -> Result<()> {
    write_bbox(buf, geometry)?;
    buf.write_i32::<LittleEndian>(parts.len() as i32)?;
    buf.write_i32::<LittleEndian>(geometry.point_count() as i32)?;
    let mut start = 0i32;
    for part in parts {
        buf.write_i32::<LittleEndian>(start)?;
        start += part.len() as i32;
    }
    for point in parts.iter().flatten() {
        write_point(buf, point)?;
    }
    Ok(())
}

/// Min/max pair plus per-point values (the Z or M section).
fn write_dimension(buf: &mut Vec<u8>, values: impl Iterator<Item = f64> + Clone) -> Result<()> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values.clone() {
        min = min.min(v);
        max = max.max(v);
    }
    if !min.is_finite() {
        min = 0.0;
        max = 0.0;
    }
    buf.write_f64::<LittleEndian>(min)?;
    buf.write_f64::<LittleEndian>(max)?;
    for v in values {
        buf.write_f64::<LittleEndian>(v)?;
    }
    Ok(())
}

/// Parts must be non-empty; polyline parts need two points, polygon rings
/// need to close on their first coordinate with at least four points.
fn validate_parts<T>(
    parts: &[Vec<T>],
    xy: impl Fn(&T) -> (f64, f64),
    rings: bool,
) -> Result<()> {
    if parts.is_empty() {
        return Err(Error::Format("a polyline or polygon needs at least one part".into()));
    }
    for part in parts {
        if rings {
            if part.len() < 4 {
                return Err(Error::Format(format!(
                    "polygon ring has {} points, a closed ring needs at least 4",
                    part.len()
                )));
            }
            let first = xy(&part[0]);
            let last = xy(&part[part.len() - 1]);
            if first != last {
                return Err(Error::Format(
                    "polygon ring does not close on its first point".into(),
                ));
            }
        } else if part.len() < 2 {
            return Err(Error::Format(format!(
                "polyline part has {} points, a segment needs at least 2",
                part.len()
            )));
        }
    }
    Ok(())
}
