//! SHP geometry file and SHX offset index codec.
//!
//! Both files open with the same 100-byte header (file code 9994, length
//! in 16-bit words, version 1000, shape type, bounding box). The geometry
//! file then carries records — a big-endian record header followed by a
//! little-endian shape payload — while the index file carries one
//! offset/length pair per record, also big-endian. The mixed endianness is
//! a quirk of the format, not of this implementation.
//!
//! - [`structures`]: file header, record header and index entry layouts
//! - [`parser`]: decoding, with index cross-checks against record content
//! - [`writer`]: encoding, recomputing bounds and index entries
//!
//! Decoding is lenient where the format allows it: measure sections are
//! optional on Z and M shapes, and polygon ring winding is accepted as
//! found. Unknown shape-type tags are an error, never a silent skip.

mod parser;
mod structures;
mod writer;

pub use parser::decode;
pub use structures::{FileHeader, IndexEntry, RecordHeader};
pub use writer::encode;

#[cfg(test)]
mod tests {
    use byteorder::{BigEndian, ByteOrder, LittleEndian};

    use super::*;
    use crate::error::Error;
    use crate::geometry::{Geometry, Point, PointM, PointZ};

    fn all_variants() -> Vec<Geometry> {
        vec![
            Geometry::Null,
            Geometry::Point(Point { x: 1.5, y: -2.5 }),
            Geometry::PointM(PointM { x: 1.0, y: 2.0, m: 3.5 }),
            Geometry::PointZ(PointZ { x: 1.0, y: 2.0, z: 9.25, m: 0.5 }),
            Geometry::MultiPoint(vec![
                Point { x: 0.0, y: 0.0 },
                Point { x: 4.0, y: 4.0 },
            ]),
            Geometry::MultiPointM(vec![PointM { x: 1.0, y: 1.0, m: 7.0 }]),
            Geometry::MultiPointZ(vec![PointZ { x: 1.0, y: 1.0, z: 2.0, m: 0.0 }]),
            Geometry::PolyLine(vec![vec![
                Point { x: 0.0, y: 0.0 },
                Point { x: 1.0, y: 1.0 },
                Point { x: 2.0, y: 0.5 },
            ]]),
            Geometry::PolyLineM(vec![vec![
                PointM { x: 0.0, y: 0.0, m: 0.0 },
                PointM { x: 1.0, y: 0.0, m: 1.0 },
            ]]),
            Geometry::PolyLineZ(vec![
                vec![
                    PointZ { x: 0.0, y: 0.0, z: 0.0, m: 0.0 },
                    PointZ { x: 1.0, y: 0.0, z: 1.0, m: 2.0 },
                ],
                vec![
                    PointZ { x: 5.0, y: 5.0, z: 2.0, m: 4.0 },
                    PointZ { x: 6.0, y: 5.0, z: 3.0, m: 8.0 },
                ],
            ]),
            Geometry::Polygon(vec![vec![
                Point { x: 0.0, y: 0.0 },
                Point { x: 0.0, y: 4.0 },
                Point { x: 4.0, y: 4.0 },
                Point { x: 4.0, y: 0.0 },
                Point { x: 0.0, y: 0.0 },
            ]]),
            Geometry::PolygonM(vec![vec![
                PointM { x: 0.0, y: 0.0, m: 1.0 },
                PointM { x: 0.0, y: 2.0, m: 2.0 },
                PointM { x: 2.0, y: 2.0, m: 3.0 },
                PointM { x: 0.0, y: 0.0, m: 1.0 },
            ]]),
            Geometry::PolygonZ(vec![vec![
                PointZ { x: 0.0, y: 0.0, z: 1.0, m: 0.0 },
                PointZ { x: 0.0, y: 2.0, z: 1.0, m: 0.0 },
                PointZ { x: 2.0, y: 2.0, z: 1.0, m: 0.0 },
                PointZ { x: 0.0, y: 0.0, z: 1.0, m: 0.0 },
            ]]),
        ]
    }

    #[test]
    fn every_variant_round_trips() {
        for geometry in all_variants() {
            let (shp, shx) = encode(std::slice::from_ref(&geometry)).unwrap();
            let decoded = decode(&shp, &shx).unwrap();
            assert_eq!(decoded, vec![geometry]);
        }
    }

    #[test]
    fn mixed_records_of_one_type_round_trip() {
        let geometries = vec![
            Geometry::Point(Point { x: 1.0, y: 2.0 }),
            Geometry::Null,
            Geometry::Point(Point { x: -10.0, y: 30.0 }),
        ];
        let (shp, shx) = encode(&geometries).unwrap();
        assert_eq!(decode(&shp, &shx).unwrap(), geometries);

        // global bounding box spans both points
        assert_eq!(LittleEndian::read_f64(&shp[36..44]), -10.0);
        assert_eq!(LittleEndian::read_f64(&shp[44..52]), 2.0);
        assert_eq!(LittleEndian::read_f64(&shp[52..60]), 1.0);
        assert_eq!(LittleEndian::read_f64(&shp[60..68]), 30.0);
    }

    #[test]
    fn mixed_shape_types_are_rejected_on_encode() {
        let geometries = vec![
            Geometry::Point(Point { x: 0.0, y: 0.0 }),
            Geometry::MultiPoint(vec![Point { x: 1.0, y: 1.0 }]),
        ];
        assert!(matches!(encode(&geometries), Err(Error::Format(_))));
    }

    #[test]
    fn unknown_shape_tag_is_an_error() {
        let (mut shp, shx) = encode(&[Geometry::Point(Point { x: 0.0, y: 0.0 })]).unwrap();
        // overwrite the record's shape tag (100-byte header + 8-byte
        // record header) with an unassigned code
        LittleEndian::write_i32(&mut shp[108..112], 7);
        match decode(&shp, &shx) {
            Err(Error::Format(msg)) => assert!(msg.contains("shape type"), "{msg}"),
            other => panic!("expected format error, got {other:?}"),
        }
    }

    #[test]
    fn index_content_length_mismatch_is_an_error() {
        let (shp, mut shx) = encode(&[Geometry::Point(Point { x: 0.0, y: 0.0 })]).unwrap();
        BigEndian::write_i32(&mut shx[104..108], 99);
        assert!(matches!(decode(&shp, &shx), Err(Error::Format(_))));
    }

    #[test]
    fn truncated_geometry_file_is_an_error() {
        let (shp, shx) = encode(&[Geometry::Point(Point { x: 0.0, y: 0.0 })]).unwrap();
        assert!(matches!(
            decode(&shp[..shp.len() - 4], &shx),
            Err(Error::Format(_))
        ));
    }

    #[test]
    fn bad_file_code_is_an_error() {
        let (mut shp, shx) = encode(&[Geometry::Null]).unwrap();
        BigEndian::write_i32(&mut shp[0..4], 1234);
        assert!(matches!(decode(&shp, &shx), Err(Error::Format(_))));
    }

    #[test]
    fn open_polygon_ring_is_rejected() {
        let geometries = vec![Geometry::Polygon(vec![vec![
            Point { x: 0.0, y: 0.0 },
            Point { x: 0.0, y: 1.0 },
            Point { x: 1.0, y: 1.0 },
            Point { x: 1.0, y: 0.0 },
        ]])];
        assert!(matches!(encode(&geometries), Err(Error::Format(_))));
    }

    #[test]
    fn z_record_without_measure_section_decodes_with_zero_measures() {
        // a PointZ record may omit the trailing measure; readers fill 0.0
        let full = Geometry::PointZ(PointZ { x: 3.0, y: 4.0, z: 5.0, m: 0.0 });
        let (mut shp, mut shx) = encode(std::slice::from_ref(&full)).unwrap();

        // drop the final 8 measure bytes and fix up the three lengths
        shp.truncate(shp.len() - 8);
        let shp_words = (shp.len() / 2) as i32;
        BigEndian::write_i32(&mut shp[24..28], shp_words);
        let content_words = BigEndian::read_i32(&shp[104..108]) - 4;
        BigEndian::write_i32(&mut shp[104..108], content_words);
        BigEndian::write_i32(&mut shx[104..108], content_words);

        assert_eq!(decode(&shp, &shx).unwrap(), vec![full]);
    }
}
