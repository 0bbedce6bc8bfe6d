// src/fitter.rs - Cubic Bezier fitting over boundary point runs

use crate::config::FitConfig;
use crate::errors::{Result, TraceError};
use crate::geometry::{dist_sq, CubicBezier, Point, Vector};
use crate::monitor::TraceMonitor;
use crate::path::PathSegment;
use crate::simplex::{self, SimplexOptions, DIM, VERTEX_COUNT};

/// Exponent of the span-length bias in the fitting objective. Dividing by
/// the point count to this power favors one long curve over several short
/// ones. Empirically chosen; kept as a named constant for tuning.
pub const LENGTH_BIAS_POWER: i32 = 4;

/// Counters accumulated across every fit in a trace.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FitStats {
    pub curves: u32,
    pub lines: u32,
    pub simplex_iterations: u64,
    /// Simplex searches that hit the iteration cap. Their best vertex is
    /// still used; this only tracks fit quality.
    pub unconverged: u32,
}

struct SpanFit {
    curve: CubicBezier,
    value: f64,
}

/// Fits runs of boundary points with cubic Bezier segments.
///
/// For each run the fitter tries every candidate prefix span in descending
/// length, optimizes two control points per candidate with the simplex
/// search, and keeps the candidate with the lowest objective value. The
/// winning curve is emitted and the cursor advances to its end; the
/// remainder is fitted the same way until the run is covered.
pub struct BezierFitter<'a> {
    config: &'a FitConfig,
    monitor: &'a dyn TraceMonitor,
}

impl<'a> BezierFitter<'a> {
    pub fn new(config: &'a FitConfig, monitor: &'a dyn TraceMonitor) -> Self {
        Self { config, monitor }
    }

    /// Fit one run of at least two points into path segments.
    ///
    /// `hint` is the unnormalized outgoing direction of whatever preceded
    /// this run; the objective penalizes curves whose initial derivative
    /// disagrees with it. Endpoints of the input are always endpoints of
    /// the output, and consecutive output segments share their joints.
    pub fn fit_run(
        &self,
        points: &[Point],
        hint: Option<Vector>,
        stats: &mut FitStats,
    ) -> Result<Vec<PathSegment>> {
        if points.len() < 2 {
            return Err(TraceError::InvalidArgument(
                "a fit run needs at least two points".to_string(),
            ));
        }

        let last = points.len() - 1;
        let mut segments = Vec::new();
        let mut cursor = 0usize;
        let mut hint = hint;

        while cursor < last {
            // A two-point remainder is a plain line; the optimizer never
            // sees runs this short.
            if last - cursor == 1 {
                segments.push(PathSegment::Line(points[cursor], points[last]));
                stats.lines += 1;
                break;
            }

            // Try prefix spans longest-first. Strict improvement means the
            // longest span wins ties.
            let mut best: Option<(usize, CubicBezier, f64)> = None;
            for i in (cursor + 2..=last).rev() {
                let fit = self.fit_span(&points[cursor..=i], hint, stats)?;
                let improves = match &best {
                    Some((_, _, best_value)) => fit.value < *best_value,
                    None => fit.value.is_finite(),
                };
                if improves {
                    best = Some((i, fit.curve, fit.value));
                }
            }

            match best {
                Some((i, curve, _)) => {
                    hint = Some(curve.end_derivative());
                    segments.push(PathSegment::Cubic(curve));
                    stats.curves += 1;
                    cursor = i;
                }
                None => {
                    // No candidate produced a finite error. Keep the raw
                    // points as straight segments instead of failing.
                    for pair in points[cursor..=last].windows(2) {
                        segments.push(PathSegment::Line(pair[0], pair[1]));
                        stats.lines += 1;
                    }
                    break;
                }
            }
        }

        Ok(segments)
    }

    /// Optimize one candidate span of at least three points.
    fn fit_span(
        &self,
        span: &[Point],
        hint: Option<Vector>,
        stats: &mut FitStats,
    ) -> Result<SpanFit> {
        let p0 = span[0];
        let p1 = span[span.len() - 1];

        // Both control points start at the data point nearest the middle of
        // the span; the simplex is that seed perturbed once per dimension.
        let seed = span[span.len() / 2];
        let seed4 = [seed.x, seed.y, seed.x, seed.y];
        let mut initial = [seed4; VERTEX_COUNT];
        for d in 0..DIM {
            initial[d][d] += self.config.delta;
        }

        let interior = &span[1..span.len() - 1];
        let flatness = self.config.flatness;
        let monitor = self.monitor;
        let denominator = (span.len() as f64).powi(LENGTH_BIAS_POWER);

        let objective = |x: &[f64; DIM]| -> Result<f64> {
            let curve = CubicBezier::new(
                p0,
                Point::new(x[0], x[1]),
                Point::new(x[2], x[3]),
                p1,
            );
            let flat = curve.flatten(flatness);

            let mut total = 0.0;
            // Candidate measured against the data. The infinite sentinel
            // keeps non-finite distances non-finite, so spans holding a
            // broken point are rejected rather than scored.
            for fp in &flat[1..flat.len() - 1] {
                if monitor.cancel_requested() {
                    return Err(TraceError::Cancelled);
                }
                let mut nearest = f64::INFINITY;
                for dp in interior {
                    nearest = nearest.min(dist_sq(*fp, *dp));
                }
                total += nearest;
            }
            // Data measured against the candidate; without this term a
            // curve collapsed onto its chord scores zero on any input.
            for dp in interior {
                if monitor.cancel_requested() {
                    return Err(TraceError::Cancelled);
                }
                let mut nearest = f64::INFINITY;
                for fp in &flat {
                    nearest = nearest.min(dist_sq(*dp, *fp));
                }
                total += nearest;
            }

            if let Some(hint) = hint {
                let start = curve.start_derivative();
                total *= 1.0 + (start - hint).norm_squared();
            }

            Ok(total / denominator)
        };

        let options = SimplexOptions::from(self.config);
        let outcome = simplex::minimize(initial, objective, &options, self.monitor)?;

        stats.simplex_iterations += outcome.iterations as u64;
        if !outcome.converged {
            stats.unconverged += 1;
        }

        let curve = CubicBezier::new(
            p0,
            Point::new(outcome.best[0], outcome.best[1]),
            Point::new(outcome.best[2], outcome.best[3]),
            p1,
        );
        Ok(SpanFit {
            curve,
            value: outcome.value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::{CancelToken, NullMonitor};
    use assert_approx_eq::assert_approx_eq;
    use std::f64::consts::FRAC_PI_2;

    fn fitter_defaults() -> FitConfig {
        FitConfig::default()
    }

    fn quarter_circle(points: usize, radius: f64) -> Vec<Point> {
        (0..points)
            .map(|k| {
                let theta = FRAC_PI_2 * k as f64 / (points - 1) as f64;
                Point::new(radius * theta.cos(), radius * theta.sin())
            })
            .collect()
    }

    #[test]
    fn runs_shorter_than_two_points_are_rejected() {
        let config = fitter_defaults();
        let fitter = BezierFitter::new(&config, &NullMonitor);
        let mut stats = FitStats::default();
        assert!(matches!(
            fitter.fit_run(&[], None, &mut stats),
            Err(TraceError::InvalidArgument(_))
        ));
        assert!(fitter
            .fit_run(&[Point::new(0.0, 0.0)], None, &mut stats)
            .is_err());
    }

    #[test]
    fn two_point_run_is_a_line_and_skips_the_optimizer() {
        let config = fitter_defaults();
        let fitter = BezierFitter::new(&config, &NullMonitor);
        let mut stats = FitStats::default();
        let segments = fitter
            .fit_run(
                &[Point::new(0.0, 0.0), Point::new(5.0, 5.0)],
                None,
                &mut stats,
            )
            .unwrap();

        assert_eq!(
            segments,
            vec![PathSegment::Line(Point::new(0.0, 0.0), Point::new(5.0, 5.0))]
        );
        assert_eq!(stats.lines, 1);
        assert_eq!(stats.curves, 0);
        assert_eq!(stats.simplex_iterations, 0);
    }

    #[test]
    fn endpoints_survive_fitting_and_joints_are_shared() {
        let points: Vec<Point> = (0..10)
            .map(|k| {
                let x = k as f64;
                Point::new(x, (x * 0.7).sin() * 3.0)
            })
            .collect();
        let config = fitter_defaults();
        let fitter = BezierFitter::new(&config, &NullMonitor);
        let mut stats = FitStats::default();
        let segments = fitter.fit_run(&points, None, &mut stats).unwrap();

        assert!(!segments.is_empty());
        assert_eq!(segments.first().unwrap().start(), points[0]);
        assert_eq!(segments.last().unwrap().end(), *points.last().unwrap());
        for pair in segments.windows(2) {
            assert_eq!(pair[0].end(), pair[1].start());
        }
    }

    #[test]
    fn quarter_circle_needs_exactly_one_cubic() {
        let points = quarter_circle(20, 10.0);
        let config = fitter_defaults();
        let fitter = BezierFitter::new(&config, &NullMonitor);
        let mut stats = FitStats::default();
        let segments = fitter.fit_run(&points, None, &mut stats).unwrap();

        assert_eq!(segments.len(), 1);
        let curve = match segments[0] {
            PathSegment::Cubic(curve) => curve,
            ref other => panic!("expected a cubic, got {:?}", other),
        };

        // Average squared radial deviation from the ideal arc stays small.
        let samples = 64;
        let mut total = 0.0;
        for k in 0..=samples {
            let p = curve.point_at(k as f64 / samples as f64);
            let radial = (p.x * p.x + p.y * p.y).sqrt() - 10.0;
            total += radial * radial;
        }
        let average = total / (samples + 1) as f64;
        assert!(average < 0.5, "average squared error too large: {}", average);
    }

    #[test]
    fn collinear_points_stay_on_their_line() {
        let points: Vec<Point> = (0..5).map(|k| Point::new(k as f64, 2.0)).collect();
        let config = fitter_defaults();
        let fitter = BezierFitter::new(&config, &NullMonitor);
        let mut stats = FitStats::default();
        let segments = fitter.fit_run(&points, None, &mut stats).unwrap();

        assert!(!segments.is_empty());
        assert_eq!(segments.first().unwrap().start(), points[0]);
        assert_eq!(segments.last().unwrap().end(), points[4]);
        for pair in segments.windows(2) {
            assert_eq!(pair[0].end(), pair[1].start());
        }
        // Nothing may bulge off the shared line, cubic or not.
        for segment in &segments {
            match segment {
                PathSegment::Line(a, b) => {
                    assert_approx_eq!(a.y, 2.0);
                    assert_approx_eq!(b.y, 2.0);
                }
                PathSegment::Cubic(curve) => {
                    for k in 0..=16 {
                        let p = curve.point_at(k as f64 / 16.0);
                        assert!((p.y - 2.0).abs() < 1e-6, "off the line at {:?}", p);
                    }
                }
            }
        }
    }

    #[test]
    fn non_finite_input_degrades_to_straight_segments() {
        let points = vec![
            Point::new(0.0, 0.0),
            Point::new(f64::INFINITY, 0.0),
            Point::new(2.0, 0.0),
            Point::new(3.0, 1.0),
        ];
        let config = fitter_defaults();
        let fitter = BezierFitter::new(&config, &NullMonitor);
        let mut stats = FitStats::default();
        let segments = fitter.fit_run(&points, None, &mut stats).unwrap();

        assert_eq!(segments.len(), 3);
        assert!(segments
            .iter()
            .all(|s| matches!(s, PathSegment::Line(_, _))));
        assert_eq!(stats.curves, 0);
        assert_eq!(stats.lines, 3);
    }

    #[test]
    fn cancellation_aborts_before_any_segment_is_produced() {
        let token = CancelToken::new();
        token.cancel();
        let config = fitter_defaults();
        let fitter = BezierFitter::new(&config, &token);
        let mut stats = FitStats::default();
        let result = fitter.fit_run(&quarter_circle(8, 5.0), None, &mut stats);
        assert!(matches!(result, Err(TraceError::Cancelled)));
        assert_eq!(stats.curves, 0);
    }
}
