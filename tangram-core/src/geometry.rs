use geo::{Contains, Rotate, Scale, Translate};
use geo_types::{Coord, LineString, Polygon};
use serde::{Deserialize, Serialize};

use crate::constants::PIECE_FRAME;

/// Basic two dimensional point in surface space (y grows downwards).
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl From<(f64, f64)> for Point {
    fn from(v: (f64, f64)) -> Self {
        Point { x: v.0, y: v.1 }
    }
}

impl From<[f64; 2]> for Point {
    fn from(v: [f64; 2]) -> Self {
        Point { x: v[0], y: v[1] }
    }
}

impl From<Point> for [f64; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

impl std::ops::Add for Point {
    type Output = Point;
    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub for Point {
    type Output = Point;
    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// One mirror axis. Serialized as `1` / `-1`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum Sign {
    #[default]
    Positive,
    Negative,
}

impl Sign {
    pub fn flipped(self) -> Sign {
        match self {
            Sign::Positive => Sign::Negative,
            Sign::Negative => Sign::Positive,
        }
    }

    pub fn factor(self) -> f64 {
        match self {
            Sign::Positive => 1.0,
            Sign::Negative => -1.0,
        }
    }
}

impl TryFrom<i8> for Sign {
    type Error = String;

    fn try_from(v: i8) -> Result<Self, Self::Error> {
        match v {
            1 => Ok(Sign::Positive),
            -1 => Ok(Sign::Negative),
            other => Err(format!("scale component must be 1 or -1, got {other}")),
        }
    }
}

impl From<Sign> for i8 {
    fn from(s: Sign) -> Self {
        match s {
            Sign::Positive => 1,
            Sign::Negative => -1,
        }
    }
}

/// Mirror scale of a piece. Each axis is exactly +1 or -1.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[Sign; 2]", into = "[Sign; 2]")]
pub struct MirrorScale {
    pub x: Sign,
    pub y: Sign,
}

impl MirrorScale {
    pub const IDENTITY: MirrorScale = MirrorScale {
        x: Sign::Positive,
        y: Sign::Positive,
    };

    pub const fn new(x: Sign, y: Sign) -> Self {
        MirrorScale { x, y }
    }

    /// Negates the x component. Applying it twice is the identity.
    pub fn flip_x(self) -> MirrorScale {
        MirrorScale {
            x: self.x.flipped(),
            y: self.y,
        }
    }
}

impl From<[Sign; 2]> for MirrorScale {
    fn from(v: [Sign; 2]) -> Self {
        MirrorScale { x: v[0], y: v[1] }
    }
}

impl From<MirrorScale> for [Sign; 2] {
    fn from(s: MirrorScale) -> Self {
        [s.x, s.y]
    }
}

/// Reduce an unbounded angle into `[0, 360)`. Never applied to stored rotations.
pub fn normalize_degrees(angle: f64) -> f64 {
    let a = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if a >= 360.0 { 0.0 } else { a }
}

/// Shortest angular distance between two unbounded angles, in `[0, 180]`.
pub fn normalized_angle_diff(a: f64, b: f64) -> f64 {
    let diff = (normalize_degrees(a) - normalize_degrees(b)).abs();
    diff.min(360.0 - diff)
}

/// Angle of the vector `from -> to` in degrees, measured the way `atan2(dy, dx)` measures it.
pub fn heading_degrees(from: Point, to: Point) -> f64 {
    (to.y - from.y).atan2(to.x - from.x).to_degrees()
}

/// Centre of the local frame; rotation and mirroring pivot around it.
pub fn frame_pivot() -> Point {
    Point::new(PIECE_FRAME / 2.0, PIECE_FRAME / 2.0)
}

fn to_polygon(points: &[Point]) -> Polygon<f64> {
    let ring: Vec<Coord<f64>> = points.iter().map(|p| Coord { x: p.x, y: p.y }).collect();
    Polygon::new(LineString::from(ring), vec![])
}

/// Place a local-frame outline on the surface: mirror inside the frame, rotate about the
/// frame centre, then translate by `position`.
pub fn place_outline(
    outline: &[Point],
    position: Point,
    rotation_deg: f64,
    scale: MirrorScale,
) -> Polygon<f64> {
    let pivot = frame_pivot();
    let pivot = geo_types::Point::new(pivot.x, pivot.y);
    to_polygon(outline)
        .scale_around_point(scale.x.factor(), scale.y.factor(), pivot)
        .rotate_around_point(rotation_deg, pivot)
        .translate(position.x, position.y)
}

pub fn polygon_points(poly: &Polygon<f64>) -> Vec<Point> {
    let ring = poly.exterior();
    let mut pts: Vec<Point> = ring.coords().map(|c| Point::new(c.x, c.y)).collect();
    // geo closes rings; drop the repeated first vertex
    if pts.len() > 1 && pts.first() == pts.last() {
        pts.pop();
    }
    pts
}

pub fn polygon_contains(poly: &Polygon<f64>, p: Point) -> bool {
    poly.contains(&geo_types::Point::new(p.x, p.y))
}
