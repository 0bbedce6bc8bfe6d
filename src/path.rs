// src/path.rs - The traced vector path handed back to the caller

use crate::geometry::{CubicBezier, Point, Vector};

/// One segment of the output path. Consecutive segments share endpoints
/// unless the source boundary had a gap between contours.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSegment {
    Line(Point, Point),
    Cubic(CubicBezier),
}

impl PathSegment {
    pub fn start(&self) -> Point {
        match self {
            PathSegment::Line(p0, _) => *p0,
            PathSegment::Cubic(curve) => curve.p0,
        }
    }

    pub fn end(&self) -> Point {
        match self {
            PathSegment::Line(_, p1) => *p1,
            PathSegment::Cubic(curve) => curve.p1,
        }
    }

    /// Direction the segment leaves its end point with, unnormalized. Used
    /// as the tangent continuity hint for the next fitted run.
    pub fn end_direction(&self) -> Vector {
        match self {
            PathSegment::Line(p0, p1) => *p1 - *p0,
            PathSegment::Cubic(curve) => curve.end_derivative(),
        }
    }
}

/// Ordered segments plus a closed/open flag.
///
/// Closed contours carry their closing edge as an explicit segment, so the
/// flag records intent rather than implying a hidden edge.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TracedPath {
    pub segments: Vec<PathSegment>,
    pub closed: bool,
}

impl TracedPath {
    pub fn new(closed: bool) -> Self {
        Self {
            segments: Vec::new(),
            closed,
        }
    }

    pub fn push(&mut self, segment: PathSegment) {
        self.segments.push(segment);
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }
}
