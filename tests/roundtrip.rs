//! End-to-end flow: write a triad, bundle it, unpack the bundle, read it
//! back.

use std::path::PathBuf;

use tempfile::tempdir;

use shapepack::dbf::{FieldDef, FieldType, Record, Value};
use shapepack::geometry::{Geometry, Point};
use shapepack::shapefile::{self, ShapeEntry};
use shapepack::{GroupingPolicy, archive};

fn parcel(number: usize, name: &str, area: f64, ring: Vec<Point>) -> ShapeEntry {
    ShapeEntry {
        number,
        record: Record::new(vec![
            ("NAME".to_string(), Value::Character(name.to_string())),
            ("AREA".to_string(), Value::Numeric(area)),
        ]),
        geometry: Geometry::Polygon(vec![ring]),
    }
}

fn square(origin: f64, side: f64) -> Vec<Point> {
    vec![
        Point { x: origin, y: origin },
        Point { x: origin, y: origin + side },
        Point { x: origin + side, y: origin + side },
        Point { x: origin + side, y: origin },
        Point { x: origin, y: origin },
    ]
}

#[test]
fn triad_survives_a_pack_unpack_cycle() {
    let work = tempdir().unwrap();
    let source = work.path().join("source");

    let fields = vec![
        FieldDef::new("NAME", FieldType::Character, 20, 0),
        FieldDef::new("AREA", FieldType::Numeric, 12, 2),
    ];
    let entries = vec![
        parcel(1, "north", 100.0, square(0.0, 10.0)),
        parcel(2, "south", 25.0, square(20.0, 5.0)),
    ];
    shapefile::write_with_fields(&source, "parcels", &fields, &entries).unwrap();

    let inputs: Vec<PathBuf> = ["shp", "shx", "dbf"]
        .iter()
        .map(|ext| source.join(format!("parcels.{ext}")))
        .collect();
    let zip = archive::create_archive(work.path(), "parcels", &inputs).unwrap();

    let triads = archive::extract_and_group(&zip).unwrap();
    assert_eq!(triads.len(), 1);
    assert_eq!(triads[0].base_name, "parcels");
    // extraction lands somewhere fresh, not back in the source directory
    assert_ne!(triads[0].shp, inputs[0]);

    let read_back = triads[0].read().unwrap();
    assert_eq!(read_back, entries);
    assert_eq!(
        read_back[1].record.get("AREA"),
        Some(&Value::Numeric(25.0))
    );
}

#[test]
fn strict_unpack_rejects_a_bundle_missing_its_index() {
    let work = tempdir().unwrap();
    let source = work.path().join("source");

    shapefile::write(
        &source,
        "lonely",
        &[ShapeEntry {
            number: 1,
            record: Record::new(vec![(
                "NAME".to_string(),
                Value::Character("x".to_string()),
            )]),
            geometry: Geometry::Point(Point { x: 1.0, y: 2.0 }),
        }],
    )
    .unwrap();

    let inputs = vec![source.join("lonely.shp"), source.join("lonely.dbf")];
    let zip = archive::create_archive(work.path(), "partial", &inputs).unwrap();

    assert!(archive::extract_and_group_with(&zip, GroupingPolicy::Strict).is_err());
    assert!(archive::extract_and_group(&zip).is_err());
}
