//! In-memory geometry model.
//!
//! Shapefile geometries are a closed set of thirteen shape types: null,
//! point, polyline, polygon, multipoint, and their measured (M) and 3D (Z)
//! forms. [`Geometry`] models them as one tagged enum so every consumer can
//! match exhaustively; the tag space is fixed by the format and will not
//! grow.
//!
//! Dimensionality is uniform within one geometry by construction: a
//! `PolyLineZ` holds only [`PointZ`] coordinates, so Z and M values cannot
//! be present for some vertices and absent for others.

/// A 2D coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// A 2D coordinate with a measure value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointM {
    pub x: f64,
    pub y: f64,
    pub m: f64,
}

/// A 3D coordinate with a measure value.
///
/// The format stores a measure alongside every Z coordinate; readers of
/// files written without measures see `0.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointZ {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub m: f64,
}

/// Shape-type tags as stored in .shp and .shx headers and records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeType {
    Null,
    Point,
    PolyLine,
    Polygon,
    MultiPoint,
    PointZ,
    PolyLineZ,
    PolygonZ,
    MultiPointZ,
    PointM,
    PolyLineM,
    PolygonM,
    MultiPointM,
}

impl ShapeType {
    /// Decode a shape-type tag. Returns `None` for tags outside the
    /// format's fixed set (including the retired MultiPatch family).
    pub fn from_i32(value: i32) -> Option<Self> {
        match value {
            0 => Some(ShapeType::Null),
            1 => Some(ShapeType::Point),
            3 => Some(ShapeType::PolyLine),
            5 => Some(ShapeType::Polygon),
            8 => Some(ShapeType::MultiPoint),
            11 => Some(ShapeType::PointZ),
            13 => Some(ShapeType::PolyLineZ),
            15 => Some(ShapeType::PolygonZ),
            18 => Some(ShapeType::MultiPointZ),
            21 => Some(ShapeType::PointM),
            23 => Some(ShapeType::PolyLineM),
            25 => Some(ShapeType::PolygonM),
            28 => Some(ShapeType::MultiPointM),
            _ => None,
        }
    }

    pub fn to_i32(self) -> i32 {
        match self {
            ShapeType::Null => 0,
            ShapeType::Point => 1,
            ShapeType::PolyLine => 3,
            ShapeType::Polygon => 5,
            ShapeType::MultiPoint => 8,
            ShapeType::PointZ => 11,
            ShapeType::PolyLineZ => 13,
            ShapeType::PolygonZ => 15,
            ShapeType::MultiPointZ => 18,
            ShapeType::PointM => 21,
            ShapeType::PolyLineM => 23,
            ShapeType::PolygonM => 25,
            ShapeType::MultiPointM => 28,
        }
    }
}

impl std::fmt::Display for ShapeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ShapeType::Null => "Null",
            ShapeType::Point => "Point",
            ShapeType::PolyLine => "PolyLine",
            ShapeType::Polygon => "Polygon",
            ShapeType::MultiPoint => "MultiPoint",
            ShapeType::PointZ => "PointZ",
            ShapeType::PolyLineZ => "PolyLineZ",
            ShapeType::PolygonZ => "PolygonZ",
            ShapeType::MultiPointZ => "MultiPointZ",
            ShapeType::PointM => "PointM",
            ShapeType::PolyLineM => "PolyLineM",
            ShapeType::PolygonM => "PolygonM",
            ShapeType::MultiPointM => "MultiPointM",
        };
        f.write_str(name)
    }
}

/// One shapefile geometry record.
///
/// Multi-part variants hold their parts as nested vectors: every inner
/// vector is one contiguous segment (polyline) or one closed ring
/// (polygon). Polygon rings follow the format convention of clockwise
/// outer rings and counter-clockwise holes; use [`ring_role`] to classify
/// rings from files that ignore the convention.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Null,
    Point(Point),
    PointM(PointM),
    PointZ(PointZ),
    MultiPoint(Vec<Point>),
    MultiPointM(Vec<PointM>),
    MultiPointZ(Vec<PointZ>),
    PolyLine(Vec<Vec<Point>>),
    PolyLineM(Vec<Vec<PointM>>),
    PolyLineZ(Vec<Vec<PointZ>>),
    Polygon(Vec<Vec<Point>>),
    PolygonM(Vec<Vec<PointM>>),
    PolygonZ(Vec<Vec<PointZ>>),
}

impl Geometry {
    pub fn shape_type(&self) -> ShapeType {
        match self {
            Geometry::Null => ShapeType::Null,
            Geometry::Point(_) => ShapeType::Point,
            Geometry::PointM(_) => ShapeType::PointM,
            Geometry::PointZ(_) => ShapeType::PointZ,
            Geometry::MultiPoint(_) => ShapeType::MultiPoint,
            Geometry::MultiPointM(_) => ShapeType::MultiPointM,
            Geometry::MultiPointZ(_) => ShapeType::MultiPointZ,
            Geometry::PolyLine(_) => ShapeType::PolyLine,
            Geometry::PolyLineM(_) => ShapeType::PolyLineM,
            Geometry::PolyLineZ(_) => ShapeType::PolyLineZ,
            Geometry::Polygon(_) => ShapeType::Polygon,
            Geometry::PolygonM(_) => ShapeType::PolygonM,
            Geometry::PolygonZ(_) => ShapeType::PolygonZ,
        }
    }

    /// Number of parts (0 for null, 1 for points and multipoints).
    pub fn part_count(&self) -> usize {
        match self {
            Geometry::Null => 0,
            Geometry::Point(_)
            | Geometry::PointM(_)
            | Geometry::PointZ(_)
            | Geometry::MultiPoint(_)
            | Geometry::MultiPointM(_)
            | Geometry::MultiPointZ(_) => 1,
            Geometry::PolyLine(parts) | Geometry::Polygon(parts) => parts.len(),
            Geometry::PolyLineM(parts) | Geometry::PolygonM(parts) => parts.len(),
            Geometry::PolyLineZ(parts) | Geometry::PolygonZ(parts) => parts.len(),
        }
    }

    /// Total number of coordinates across all parts.
    pub fn point_count(&self) -> usize {
        match self {
            Geometry::Null => 0,
            Geometry::Point(_) | Geometry::PointM(_) | Geometry::PointZ(_) => 1,
            Geometry::MultiPoint(pts) => pts.len(),
            Geometry::MultiPointM(pts) => pts.len(),
            Geometry::MultiPointZ(pts) => pts.len(),
            Geometry::PolyLine(parts) | Geometry::Polygon(parts) => {
                parts.iter().map(Vec::len).sum()
            }
            Geometry::PolyLineM(parts) | Geometry::PolygonM(parts) => {
                parts.iter().map(Vec::len).sum()
            }
            Geometry::PolyLineZ(parts) | Geometry::PolygonZ(parts) => {
                parts.iter().map(Vec::len).sum()
            }
        }
    }

    /// Fold this geometry's coordinates into a bounds accumulator.
    pub fn fold_bounds(&self, bounds: &mut Bounds) {
        match self {
            Geometry::Null => {}
            Geometry::Point(p) => bounds.add_xy(p.x, p.y),
            Geometry::PointM(p) => {
                bounds.add_xy(p.x, p.y);
                bounds.add_m(p.m);
            }
            Geometry::PointZ(p) => {
                bounds.add_xy(p.x, p.y);
                bounds.add_z(p.z);
                bounds.add_m(p.m);
            }
            Geometry::MultiPoint(pts) => {
                for p in pts {
                    bounds.add_xy(p.x, p.y);
                }
            }
            Geometry::MultiPointM(pts) => {
                for p in pts {
                    bounds.add_xy(p.x, p.y);
                    bounds.add_m(p.m);
                }
            }
            Geometry::MultiPointZ(pts) => {
                for p in pts {
                    bounds.add_xy(p.x, p.y);
                    bounds.add_z(p.z);
                    bounds.add_m(p.m);
                }
            }
            Geometry::PolyLine(parts) | Geometry::Polygon(parts) => {
                for p in parts.iter().flatten() {
                    bounds.add_xy(p.x, p.y);
                }
            }
            Geometry::PolyLineM(parts) | Geometry::PolygonM(parts) => {
                for p in parts.iter().flatten() {
                    bounds.add_xy(p.x, p.y);
                    bounds.add_m(p.m);
                }
            }
            Geometry::PolyLineZ(parts) | Geometry::PolygonZ(parts) => {
                for p in parts.iter().flatten() {
                    bounds.add_xy(p.x, p.y);
                    bounds.add_z(p.z);
                    bounds.add_m(p.m);
                }
            }
        }
    }

    /// Bounds of this geometry alone.
    pub fn bounds(&self) -> Bounds {
        let mut b = Bounds::new();
        self.fold_bounds(&mut b);
        b
    }
}

/// Min/max accumulator for the X/Y/Z/M ranges stored in file headers.
///
/// Starts inverted (`+inf`/`-inf`); [`Bounds::finish`] replaces ranges that
/// never saw a coordinate with zeros, matching what the format stores for
/// absent dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
    pub z_min: f64,
    pub z_max: f64,
    pub m_min: f64,
    pub m_max: f64,
}

impl Bounds {
    pub fn new() -> Self {
        Self {
            x_min: f64::INFINITY,
            y_min: f64::INFINITY,
            x_max: f64::NEG_INFINITY,
            y_max: f64::NEG_INFINITY,
            z_min: f64::INFINITY,
            z_max: f64::NEG_INFINITY,
            m_min: f64::INFINITY,
            m_max: f64::NEG_INFINITY,
        }
    }

    pub fn add_xy(&mut self, x: f64, y: f64) {
        self.x_min = self.x_min.min(x);
        self.y_min = self.y_min.min(y);
        self.x_max = self.x_max.max(x);
        self.y_max = self.y_max.max(y);
    }

    pub fn add_z(&mut self, z: f64) {
        self.z_min = self.z_min.min(z);
        self.z_max = self.z_max.max(z);
    }

    pub fn add_m(&mut self, m: f64) {
        self.m_min = self.m_min.min(m);
        self.m_max = self.m_max.max(m);
    }

    /// Zero out any range that never saw a coordinate.
    pub fn finish(mut self) -> Self {
        if !self.x_min.is_finite() {
            self.x_min = 0.0;
            self.y_min = 0.0;
            self.x_max = 0.0;
            self.y_max = 0.0;
        }
        if !self.z_min.is_finite() {
            self.z_min = 0.0;
            self.z_max = 0.0;
        }
        if !self.m_min.is_finite() {
            self.m_min = 0.0;
            self.m_max = 0.0;
        }
        self
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new()
    }
}

/// Role of one polygon ring, inferred from its winding direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingRole {
    /// Clockwise ring: encloses area.
    Outer,
    /// Counter-clockwise ring: a hole in the enclosing outer ring.
    Hole,
}

/// Twice the signed area of a ring (shoelace formula).
///
/// Positive for counter-clockwise rings in a Y-up coordinate system.
pub fn signed_area(ring: &[Point]) -> f64 {
    let mut sum = 0.0;
    for pair in ring.windows(2) {
        sum += (pair[1].x - pair[0].x) * (pair[1].y + pair[0].y);
    }
    sum / -2.0
}

pub fn is_clockwise(ring: &[Point]) -> bool {
    signed_area(ring) < 0.0
}

/// Classify a ring by winding direction, regardless of whether the file
/// that produced it honored the outer-clockwise convention.
pub fn ring_role(ring: &[Point]) -> RingRole {
    if is_clockwise(ring) {
        RingRole::Outer
    } else {
        RingRole::Hole
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(clockwise: bool) -> Vec<Point> {
        let mut ring = vec![
            Point { x: 0.0, y: 0.0 },
            Point { x: 0.0, y: 1.0 },
            Point { x: 1.0, y: 1.0 },
            Point { x: 1.0, y: 0.0 },
            Point { x: 0.0, y: 0.0 },
        ];
        if !clockwise {
            ring.reverse();
        }
        ring
    }

    #[test]
    fn shape_type_codes_round_trip() {
        for code in [0, 1, 3, 5, 8, 11, 13, 15, 18, 21, 23, 25, 28] {
            let st = ShapeType::from_i32(code).unwrap();
            assert_eq!(st.to_i32(), code);
        }
        assert_eq!(ShapeType::from_i32(2), None);
        assert_eq!(ShapeType::from_i32(31), None); // MultiPatch is out of scope
    }

    #[test]
    fn ring_winding() {
        assert!(is_clockwise(&square(true)));
        assert!(!is_clockwise(&square(false)));
        assert_eq!(ring_role(&square(true)), RingRole::Outer);
        assert_eq!(ring_role(&square(false)), RingRole::Hole);
    }

    #[test]
    fn signed_area_of_unit_square() {
        assert!((signed_area(&square(false)) - 1.0).abs() < 1e-12);
        assert!((signed_area(&square(true)) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn bounds_accumulate_and_finish() {
        let g = Geometry::MultiPoint(vec![
            Point { x: -3.0, y: 2.0 },
            Point { x: 7.0, y: -1.5 },
        ]);
        let b = g.bounds().finish();
        assert_eq!(b.x_min, -3.0);
        assert_eq!(b.y_min, -1.5);
        assert_eq!(b.x_max, 7.0);
        assert_eq!(b.y_max, 2.0);
        // no Z or M coordinates: ranges collapse to zero
        assert_eq!(b.z_min, 0.0);
        assert_eq!(b.m_max, 0.0);
    }

    #[test]
    fn point_and_part_counts() {
        let line = Geometry::PolyLine(vec![
            vec![Point { x: 0.0, y: 0.0 }, Point { x: 1.0, y: 1.0 }],
            vec![
                Point { x: 2.0, y: 2.0 },
                Point { x: 3.0, y: 3.0 },
                Point { x: 4.0, y: 4.0 },
            ],
        ]);
        assert_eq!(line.part_count(), 2);
        assert_eq!(line.point_count(), 5);
        assert_eq!(Geometry::Null.point_count(), 0);
    }
}
