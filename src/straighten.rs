// src/straighten.rs - Collapse near-collinear runs in a polyline

use crate::errors::{Result, TraceError};
use crate::geometry::{deviation_from_chord, Polyline};

/// Merge consecutive segments whose shared vertex stays within `tolerance`
/// of the straight line between the surviving outer endpoints.
///
/// Endpoints are never moved and the open/closed flag is preserved; for a
/// closed polyline the seam vertex is pinned, so the closing edge is never
/// merged away. Passes repeat until no vertex can be dropped. At that fixed
/// point every surviving interior vertex deviates from its neighbors' chord
/// by more than the tolerance, which makes the operation idempotent.
pub fn straighten(line: &Polyline, tolerance: f64) -> Result<Polyline> {
    if !(tolerance >= 0.0) || !tolerance.is_finite() {
        return Err(TraceError::InvalidArgument(
            "straighten tolerance must be >= 0 and finite".to_string(),
        ));
    }
    if line.is_empty() {
        return Err(TraceError::EmptyPath);
    }

    let mut current = line.clone();
    loop {
        let reduced = drop_pass(&current, tolerance);
        if reduced.len() == current.len() {
            return Ok(reduced);
        }
        current = reduced;
    }
}

/// One left-to-right sweep. `pending` is the newest vertex not yet
/// committed; it is dropped when the chord from the last kept vertex to the
/// incoming point still passes within tolerance of it.
fn drop_pass(line: &Polyline, tolerance: f64) -> Polyline {
    if line.len() < 3 {
        return line.clone();
    }

    let points = &line.points;
    let mut kept = Vec::with_capacity(points.len());
    kept.push(points[0]);
    let mut pending = points[1];
    for &next in &points[2..] {
        let anchor = *kept.last().unwrap();
        if deviation_from_chord(pending, anchor, next) <= tolerance {
            pending = next;
        } else {
            kept.push(pending);
            pending = next;
        }
    }
    kept.push(pending);

    Polyline::new(kept, line.closed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    fn open(points: &[(f64, f64)]) -> Polyline {
        Polyline::new(
            points.iter().map(|&(x, y)| Point::new(x, y)).collect(),
            false,
        )
    }

    #[test]
    fn bad_tolerance_is_rejected() {
        let line = open(&[(0.0, 0.0), (1.0, 0.0)]);
        assert!(matches!(
            straighten(&line, -1.0),
            Err(TraceError::InvalidArgument(_))
        ));
        assert!(straighten(&line, f64::NAN).is_err());
    }

    #[test]
    fn empty_polyline_fails_closed() {
        let line = Polyline::new(vec![], false);
        assert!(matches!(straighten(&line, 1.0), Err(TraceError::EmptyPath)));
    }

    #[test]
    fn short_polylines_pass_through() {
        let line = open(&[(0.0, 0.0), (3.0, 4.0)]);
        assert_eq!(straighten(&line, 10.0).unwrap(), line);
    }

    #[test]
    fn generous_tolerance_collapses_a_zig_zag_to_one_segment() {
        let zig = open(&[
            (0.0, 0.0),
            (1.0, 0.6),
            (2.0, -0.5),
            (3.0, 0.4),
            (4.0, 0.0),
        ]);
        let out = straighten(&zig, 2.0).unwrap();
        assert_eq!(out.points, vec![Point::new(0.0, 0.0), Point::new(4.0, 0.0)]);
    }

    #[test]
    fn tight_tolerance_keeps_real_corners() {
        let corner = open(&[(0.0, 0.0), (5.0, 0.0), (10.0, 0.0), (10.0, 7.0)]);
        let out = straighten(&corner, 0.0).unwrap();
        assert_eq!(
            out.points,
            vec![
                Point::new(0.0, 0.0),
                Point::new(10.0, 0.0),
                Point::new(10.0, 7.0)
            ]
        );
    }

    #[test]
    fn straightening_is_idempotent() {
        let wiggly = open(&[
            (0.0, 0.0),
            (1.0, 0.2),
            (2.0, -0.1),
            (3.0, 3.0),
            (4.0, 3.1),
            (5.0, 2.9),
            (6.0, 0.0),
        ]);
        let once = straighten(&wiggly, 0.5).unwrap();
        let twice = straighten(&once, 0.5).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn cascaded_drops_reach_a_stable_result() {
        // Dropping the third point makes the second one droppable too; the
        // result must already reflect that, not change on a second call.
        let line = open(&[(0.0, 0.0), (1.0, 5.0), (2.0, -5.0), (3.0, -15.0)]);
        let once = straighten(&line, 2.0).unwrap();
        assert_eq!(
            once.points,
            vec![Point::new(0.0, 0.0), Point::new(3.0, -15.0)]
        );
        assert_eq!(straighten(&once, 2.0).unwrap(), once);
    }

    #[test]
    fn closed_polylines_keep_their_seam_and_flag() {
        let square = Polyline::new(
            vec![
                Point::new(0.0, 0.0),
                Point::new(5.0, 0.0),
                Point::new(10.0, 0.0),
                Point::new(10.0, 10.0),
                Point::new(0.0, 10.0),
            ],
            true,
        );
        let out = straighten(&square, 0.01).unwrap();
        assert!(out.closed);
        assert_eq!(out.points.first(), square.points.first());
        assert_eq!(out.points.len(), 4);
    }
}
