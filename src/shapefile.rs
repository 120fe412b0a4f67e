//! Composition of the three files into paired (record, geometry) entries.
//!
//! A shapefile is never a single file: the geometry file (.shp), offset
//! index (.shx) and attribute table (.dbf) form one logical dataset, the
//! *triad*, identified by a shared base name. This module reads a triad
//! into [`ShapeEntry`] values and writes entries back out as a fresh
//! triad.

use std::fs;
use std::path::{Path, PathBuf};

use crate::dbf::{self, FieldDef, Record};
use crate::error::{Error, Result};
use crate::geometry::Geometry;
use crate::shp;

/// One shape: an attribute record paired with its geometry. Sequence
/// numbers are 1-based, matching record numbers in the geometry file.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeEntry {
    pub number: usize,
    pub record: Record,
    pub geometry: Geometry,
}

/// The three co-resident files that form one shapefile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileTriad {
    pub base_name: String,
    pub shp: PathBuf,
    pub shx: PathBuf,
    pub dbf: PathBuf,
}

impl FileTriad {
    /// Derive the triad from the geometry file's path; the siblings differ
    /// only in extension.
    pub fn from_shp_path(shp: &Path) -> Self {
        let base_name = shp
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            base_name,
            shp: shp.to_path_buf(),
            shx: shp.with_extension("shx"),
            dbf: shp.with_extension("dbf"),
        }
    }

    /// Read this triad's entries.
    pub fn read(&self) -> Result<Vec<ShapeEntry>> {
        read(&self.shp, &self.dbf, &self.shx)
    }
}

/// Read a shapefile triad into paired entries.
///
/// Missing files are reported per artifact — the geometry file is checked
/// first, then attributes, then the index — so a caller can say precisely
/// which file is absent. Attribute records and geometries are paired
/// positionally; a count disagreement is an error, never a silent
/// truncation.
pub fn read(shp_path: &Path, dbf_path: &Path, shx_path: &Path) -> Result<Vec<ShapeEntry>> {
    if !shp_path.is_file() {
        return Err(Error::ShpNotFound(shp_path.to_path_buf()));
    }
    if !dbf_path.is_file() {
        return Err(Error::DbfNotFound(dbf_path.to_path_buf()));
    }
    if !shx_path.is_file() {
        return Err(Error::ShxNotFound(shx_path.to_path_buf()));
    }

    let shp_bytes = fs::read(shp_path)?;
    let shx_bytes = fs::read(shx_path)?;
    let dbf_bytes = fs::read(dbf_path)?;

    let geometries = shp::decode(&shp_bytes, &shx_bytes)?;
    let (_fields, records) = dbf::decode(&dbf_bytes)?;

    if records.len() != geometries.len() {
        return Err(Error::CountMismatch {
            records: records.len(),
            geometries: geometries.len(),
        });
    }

    tracing::debug!(path = %shp_path.display(), entries = records.len(), "read shapefile");
    Ok(records
        .into_iter()
        .zip(geometries)
        .enumerate()
        .map(|(i, (record, geometry))| ShapeEntry {
            number: i + 1,
            record,
            geometry,
        })
        .collect())
}

/// Write entries as `{base_name}.shp/.shx/.dbf` inside `output_dir`,
/// deriving untyped character fields (width 255) from the first entry's
/// record.
///
/// This is the lossy convenience path: numeric, date and logical values
/// are stored as text at maximum width. Callers that care about attribute
/// fidelity should use [`write_with_fields`].
pub fn write(output_dir: &Path, base_name: &str, entries: &[ShapeEntry]) -> Result<()> {
    let first = entries.first().ok_or(Error::EmptyInput)?;
    let fields: Vec<FieldDef> = first
        .record
        .field_names()
        .map(FieldDef::character)
        .collect();
    write_with_fields(output_dir, base_name, &fields, entries)
}

/// Write entries with explicit field definitions.
///
/// Every entry must declare exactly the field names of `fields`, in the
/// same order. Existing files of the same base name are overwritten
/// without warning. A failure partway through can leave a partial triad
/// on disk; no rollback is attempted.
pub fn write_with_fields(
    output_dir: &Path,
    base_name: &str,
    fields: &[FieldDef],
    entries: &[ShapeEntry],
) -> Result<()> {
    if entries.is_empty() {
        return Err(Error::EmptyInput);
    }
    let expected: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
    for (i, entry) in entries.iter().enumerate() {
        if !entry.record.field_names().eq(expected.iter().copied()) {
            return Err(Error::FieldMismatch {
                index: i,
                expected: expected.join(", "),
                found: entry.record.field_names().collect::<Vec<_>>().join(", "),
            });
        }
    }

    let records: Vec<Record> = entries.iter().map(|e| e.record.clone()).collect();
    let geometries: Vec<Geometry> = entries.iter().map(|e| e.geometry.clone()).collect();

    let dbf_bytes = dbf::encode(fields, &records)?;
    let (shp_bytes, shx_bytes) = shp::encode(&geometries)?;

    fs::create_dir_all(output_dir)?;
    fs::write(output_dir.join(format!("{base_name}.shp")), shp_bytes)?;
    fs::write(output_dir.join(format!("{base_name}.shx")), shx_bytes)?;
    fs::write(output_dir.join(format!("{base_name}.dbf")), dbf_bytes)?;

    tracing::debug!(dir = %output_dir.display(), base_name, entries = entries.len(), "wrote shapefile");
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::dbf::{FieldType, Value};
    use crate::geometry::Point;

    fn entry(number: usize, name: &str, x: f64) -> ShapeEntry {
        ShapeEntry {
            number,
            record: Record::new(vec![
                ("NAME".to_string(), Value::Character(name.to_string())),
                ("X".to_string(), Value::Character(format!("{x}"))),
            ]),
            geometry: Geometry::Point(Point { x, y: -x }),
        }
    }

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempdir().unwrap();
        let entries = vec![entry(1, "alpha", 1.0), entry(2, "beta", 2.0)];
        write(dir.path(), "sites", &entries).unwrap();

        let triad = FileTriad::from_shp_path(&dir.path().join("sites.shp"));
        assert_eq!(triad.base_name, "sites");
        let read_back = triad.read().unwrap();
        assert_eq!(read_back, entries);
    }

    #[test]
    fn typed_fields_round_trip() {
        let dir = tempdir().unwrap();
        let fields = vec![
            FieldDef::new("NAME", FieldType::Character, 16, 0),
            FieldDef::new("SIZE", FieldType::Numeric, 8, 2),
        ];
        let entries = vec![ShapeEntry {
            number: 1,
            record: Record::new(vec![
                ("NAME".to_string(), Value::Character("plot".to_string())),
                ("SIZE".to_string(), Value::Numeric(3.25)),
            ]),
            geometry: Geometry::Point(Point { x: 5.0, y: 6.0 }),
        }];
        write_with_fields(dir.path(), "plots", &fields, &entries).unwrap();

        let read_back = FileTriad::from_shp_path(&dir.path().join("plots.shp"))
            .read()
            .unwrap();
        assert_eq!(read_back[0].record.get("SIZE"), Some(&Value::Numeric(3.25)));
    }

    #[test]
    fn untyped_write_stores_typed_values_as_text() {
        let dir = tempdir().unwrap();
        // entries fresh from a typed read carry numeric, date and logical
        // values; the convenience path renders them into character cells
        let entries = vec![ShapeEntry {
            number: 1,
            record: Record::new(vec![
                ("NAME".to_string(), Value::Character("plot".to_string())),
                ("AREA".to_string(), Value::Numeric(3.25)),
                ("OPEN".to_string(), Value::Logical(true)),
            ]),
            geometry: Geometry::Point(Point { x: 1.0, y: 2.0 }),
        }];
        write(dir.path(), "lossy", &entries).unwrap();

        let read_back = FileTriad::from_shp_path(&dir.path().join("lossy.shp"))
            .read()
            .unwrap();
        assert_eq!(
            read_back[0].record.get("AREA"),
            Some(&Value::Character("3.25".to_string()))
        );
        assert_eq!(
            read_back[0].record.get("OPEN"),
            Some(&Value::Character("T".to_string()))
        );
    }

    #[test]
    fn missing_shp_is_reported_first() {
        // none of the three files exist; the geometry file wins
        let err = read(
            Path::new("missing.shp"),
            Path::new("missing.dbf"),
            Path::new("missing.shx"),
        )
        .unwrap_err();
        assert!(matches!(err, Error::ShpNotFound(p) if p == Path::new("missing.shp")));
    }

    #[test]
    fn missing_dbf_is_distinguished() {
        let dir = tempdir().unwrap();
        write(dir.path(), "only", &[entry(1, "a", 1.0)]).unwrap();
        fs::remove_file(dir.path().join("only.dbf")).unwrap();

        let err = FileTriad::from_shp_path(&dir.path().join("only.shp"))
            .read()
            .unwrap_err();
        assert!(matches!(err, Error::DbfNotFound(_)));
    }

    #[test]
    fn count_mismatch_is_detected() {
        let dir = tempdir().unwrap();
        write(dir.path(), "pair", &[entry(1, "a", 1.0), entry(2, "b", 2.0)]).unwrap();

        // rewrite the attribute table with a single record
        let fields = vec![FieldDef::character("NAME"), FieldDef::character("X")];
        let one = Record::new(vec![
            ("NAME".to_string(), Value::Character("a".to_string())),
            ("X".to_string(), Value::Character("1".to_string())),
        ]);
        let dbf_bytes = dbf::encode(&fields, std::slice::from_ref(&one)).unwrap();
        fs::write(dir.path().join("pair.dbf"), dbf_bytes).unwrap();

        let err = FileTriad::from_shp_path(&dir.path().join("pair.shp"))
            .read()
            .unwrap_err();
        assert!(matches!(
            err,
            Error::CountMismatch { records: 1, geometries: 2 }
        ));
    }

    #[test]
    fn empty_write_creates_nothing() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("out");
        assert!(matches!(write(&out, "empty", &[]), Err(Error::EmptyInput)));
        assert!(!out.exists());
    }

    #[test]
    fn inconsistent_fields_are_rejected() {
        let dir = tempdir().unwrap();
        let mut second = entry(2, "b", 2.0);
        second.record = Record::new(vec![(
            "OTHER".to_string(),
            Value::Character("b".to_string()),
        )]);
        let err = write(dir.path(), "bad", &[entry(1, "a", 1.0), second]).unwrap_err();
        assert!(matches!(err, Error::FieldMismatch { index: 1, .. }));
    }

    #[test]
    fn write_overwrites_existing_triad() {
        let dir = tempdir().unwrap();
        write(dir.path(), "same", &[entry(1, "old", 1.0), entry(2, "older", 2.0)]).unwrap();
        write(dir.path(), "same", &[entry(1, "new", 9.0)]).unwrap();

        let read_back = FileTriad::from_shp_path(&dir.path().join("same.shp"))
            .read()
            .unwrap();
        assert_eq!(read_back.len(), 1);
        assert_eq!(
            read_back[0].record.get("NAME"),
            Some(&Value::Character("new".to_string()))
        );
    }
}
