// src/grouper.rs - Split boundary polylines into runs and stitch fitted output

use crate::config::TraceConfig;
use crate::errors::{Result, TraceError};
use crate::fitter::{BezierFitter, FitStats};
use crate::geometry::{dist, Point, Polyline, Vector};
use crate::monitor::TraceMonitor;
use crate::path::{PathSegment, TracedPath};

/// Walks boundary polylines, slices them into fittable runs and emits one
/// continuous path.
///
/// A run ends where the distance between consecutive points exceeds the
/// tile diagonal (scaled): such long edges are straightened stretches that
/// need no curve and are kept as single line segments. The outgoing
/// direction of each emitted piece becomes the tangent hint for the next
/// run, so joints stay smooth; the hint resets at the gap between contours.
pub struct SegmentGrouper<'a> {
    max_length: f64,
    fitter: BezierFitter<'a>,
}

impl<'a> SegmentGrouper<'a> {
    pub fn new(config: &'a TraceConfig, monitor: &'a dyn TraceMonitor) -> Self {
        let diagonal =
            ((config.x_inc as f64).powi(2) + (config.y_inc as f64).powi(2)).sqrt();
        Self {
            max_length: config.scale * diagonal,
            fitter: BezierFitter::new(&config.fit, monitor),
        }
    }

    /// Group and fit every contour into one path. Closed contours have
    /// their closing edge materialized before grouping, so the output loop
    /// really returns to its first point.
    pub fn group(&self, contours: &[Polyline], stats: &mut FitStats) -> Result<TracedPath> {
        if contours.iter().all(|c| c.is_empty()) {
            return Err(TraceError::EmptyPath);
        }

        let closed = contours.iter().all(|c| c.closed);
        let mut segments = Vec::new();

        for contour in contours {
            if contour.len() < 2 {
                continue;
            }
            // Contour transitions are gaps: no tangent carries across.
            let mut hint: Option<Vector> = None;

            let mut pts = contour.points.clone();
            if contour.closed {
                pts.push(pts[0]);
            }

            let mut run: Vec<Point> = vec![pts[0]];
            for &next in &pts[1..] {
                let prev = *run.last().unwrap();
                if dist(prev, next) > self.max_length {
                    self.flush(&run, &mut hint, stats, &mut segments)?;
                    // The long edge itself stays a straight segment.
                    self.flush(&[prev, next], &mut hint, stats, &mut segments)?;
                    run.clear();
                }
                run.push(next);
            }
            self.flush(&run, &mut hint, stats, &mut segments)?;
        }

        Ok(TracedPath { segments, closed })
    }

    /// Emit one accumulated run. Short runs fall through without touching
    /// the optimizer; the tangent hint is updated from whatever was drawn.
    fn flush(
        &self,
        run: &[Point],
        hint: &mut Option<Vector>,
        stats: &mut FitStats,
        out: &mut Vec<PathSegment>,
    ) -> Result<()> {
        match run.len() {
            0 | 1 => {}
            2 => {
                out.push(PathSegment::Line(run[0], run[1]));
                stats.lines += 1;
                *hint = Some(run[1] - run[0]);
            }
            _ => {
                let fitted = self.fitter.fit_run(run, *hint, stats)?;
                if let Some(last) = fitted.last() {
                    *hint = Some(last.end_direction());
                }
                out.extend(fitted);
            }
        }
        Ok(())
    }
}
