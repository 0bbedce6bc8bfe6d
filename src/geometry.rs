// src/geometry.rs - Points, polylines and cubic Bezier curves

use nalgebra::{Point2, Vector2};

pub type Point = Point2<f64>;
pub type Vector = Vector2<f64>;

/// Cap on the de Casteljau subdivision depth when flattening a curve.
const FLATTEN_RECURSION_LIMIT: u32 = 16;

/// Squared distance between two points
#[inline]
pub fn dist_sq(a: Point, b: Point) -> f64 {
    (b - a).norm_squared()
}

/// Euclidean distance between two points
#[inline]
pub fn dist(a: Point, b: Point) -> f64 {
    (b - a).norm()
}

/// Midpoint of two points
#[inline]
pub fn midpoint(a: Point, b: Point) -> Point {
    Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

/// z-component of the 2D cross product of two vectors
#[inline]
pub fn cross(a: Vector, b: Vector) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Perpendicular distance of `p` from the infinite line through `a` and `b`.
///
/// Falls back to the plain distance to `a` when the chord is degenerate.
pub fn deviation_from_chord(p: Point, a: Point, b: Point) -> f64 {
    let chord = b - a;
    let len = chord.norm();
    if len == 0.0 {
        return dist(p, a);
    }
    (cross(chord, p - a) / len).abs()
}

/// An ordered run of 2D points, open or closed.
///
/// For a closed polyline the closing edge from the last point back to the
/// first is implicit; the first point is not repeated.
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    pub points: Vec<Point>,
    pub closed: bool,
}

impl Polyline {
    pub fn new(points: Vec<Point>, closed: bool) -> Self {
        Self { points, closed }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }
}

/// A cubic Bezier curve. The endpoints are fixed by the run being fitted;
/// only the two control points are free parameters during optimization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicBezier {
    pub p0: Point,
    pub c1: Point,
    pub c2: Point,
    pub p1: Point,
}

impl CubicBezier {
    pub fn new(p0: Point, c1: Point, c2: Point, p1: Point) -> Self {
        Self { p0, c1, c2, p1 }
    }

    /// Evaluate the curve at parameter `t` in `[0, 1]` (Bernstein form).
    pub fn point_at(&self, t: f64) -> Point {
        let mt = 1.0 - t;
        let mt2 = mt * mt;
        let t2 = t * t;
        let w0 = mt2 * mt;
        let w1 = 3.0 * mt2 * t;
        let w2 = 3.0 * mt * t2;
        let w3 = t2 * t;
        Point::new(
            w0 * self.p0.x + w1 * self.c1.x + w2 * self.c2.x + w3 * self.p1.x,
            w0 * self.p0.y + w1 * self.c1.y + w2 * self.c2.y + w3 * self.p1.y,
        )
    }

    /// Derivative at t = 0, the outgoing direction from the start point.
    #[inline]
    pub fn start_derivative(&self) -> Vector {
        (self.c1 - self.p0) * 3.0
    }

    /// Derivative at t = 1, the direction the curve leaves its end point.
    #[inline]
    pub fn end_derivative(&self) -> Vector {
        (self.p1 - self.c2) * 3.0
    }

    /// Maximum distance of either control point from the chord. Standard
    /// flatness measure for deciding when a chord may stand in for the curve.
    pub fn flatness(&self) -> f64 {
        let d1 = deviation_from_chord(self.c1, self.p0, self.p1);
        let d2 = deviation_from_chord(self.c2, self.p0, self.p1);
        d1.max(d2)
    }

    /// Split into two halves at t = 0.5 (de Casteljau).
    pub fn split(&self) -> (CubicBezier, CubicBezier) {
        let ab = midpoint(self.p0, self.c1);
        let bc = midpoint(self.c1, self.c2);
        let cd = midpoint(self.c2, self.p1);
        let abc = midpoint(ab, bc);
        let bcd = midpoint(bc, cd);
        let abcd = midpoint(abc, bcd);
        (
            CubicBezier::new(self.p0, ab, abc, abcd),
            CubicBezier::new(abcd, bcd, cd, self.p1),
        )
    }

    /// Flatten into a point sequence whose chords deviate from the curve by
    /// at most `flatness`. The result always starts with `p0` and ends with
    /// `p1`; interior points are added by adaptive subdivision.
    pub fn flatten(&self, flatness: f64) -> Vec<Point> {
        let mut points = Vec::with_capacity(8);
        points.push(self.p0);
        self.push_interior(&mut points, flatness, 0);
        points.push(self.p1);
        points
    }

    fn push_interior(&self, out: &mut Vec<Point>, flatness: f64, depth: u32) {
        if depth >= FLATTEN_RECURSION_LIMIT || self.flatness() <= flatness {
            return;
        }
        let (left, right) = self.split();
        left.push_interior(out, flatness, depth + 1);
        out.push(left.p1);
        right.push_interior(out, flatness, depth + 1);
    }
}
