// src/pipeline.rs - Full trace from raster scan to fitted vector path

use tracing::{debug, info};

use crate::config::TraceConfig;
use crate::errors::{Result, TraceError};
use crate::fitter::FitStats;
use crate::geometry::Polyline;
use crate::grouper::SegmentGrouper;
use crate::monitor::{TraceMonitor, TracePhase, TraceProgress};
use crate::path::{PathSegment, TracedPath};
use crate::raster::{Raster, Rgb};
use crate::scanner::TileScanner;
use crate::straighten::straighten;

/// What a finished trace produced.
#[derive(Debug, Clone, PartialEq)]
pub enum TraceOutcome {
    /// The reconstructed outline plus counters describing the work done.
    Path { path: TracedPath, stats: TraceStats },
    /// Nothing to trace. Either no tile straddled the base color, or every
    /// boundary fragment was flat and the union cancelled to zero area.
    Empty,
    /// The monitor asked to stop; any partial result was discarded.
    Cancelled,
}

/// Counters accumulated across the pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TraceStats {
    /// Tiles whose corners straddled the base color.
    pub boundary_tiles: usize,
    /// Closed contours recovered from the boundary edge set.
    pub contours: usize,
    pub fit: FitStats,
}

/// Trace the outline of the `base` colored region of `raster`.
///
/// Cancellation requested through the monitor is a normal outcome, not an
/// error: the caller gets `TraceOutcome::Cancelled` back.
pub fn trace(
    raster: &dyn Raster,
    base: Rgb,
    config: &TraceConfig,
    monitor: &dyn TraceMonitor,
) -> Result<TraceOutcome> {
    match trace_inner(raster, base, config, monitor) {
        Err(TraceError::Cancelled) => Ok(TraceOutcome::Cancelled),
        other => other,
    }
}

fn trace_inner(
    raster: &dyn Raster,
    base: Rgb,
    config: &TraceConfig,
    monitor: &dyn TraceMonitor,
) -> Result<TraceOutcome> {
    config.validate()?;

    // Step 1: Scan the raster tile by tile, collecting boundary edges.
    monitor.on_progress(&TraceProgress::phase(TracePhase::Scan));
    let scanner = TileScanner::new(config.x_inc, config.y_inc)?;
    let scan = scanner.scan(raster, base, monitor)?;
    if scan.boundary_tiles == 0 {
        info!("no color boundary found, nothing to trace");
        return Ok(TraceOutcome::Empty);
    }
    let boundary_tiles = scan.boundary_tiles;

    // Step 2: Walk the surviving edges into closed contours.
    monitor.on_progress(&TraceProgress::phase(TracePhase::Boundary));
    let mut contours = scan.region.into_contours(config.scale)?;
    if contours.is_empty() {
        info!("boundary fragments cancelled to zero area, nothing to trace");
        return Ok(TraceOutcome::Empty);
    }
    debug!(
        "{} contour(s) from {} boundary tile(s)",
        contours.len(),
        boundary_tiles
    );

    // Step 3: Optional collinear cleanup before any fitting happens.
    if let Some(tolerance) = config.straighten {
        monitor.on_progress(&TraceProgress::phase(TracePhase::Straighten));
        for contour in &mut contours {
            *contour = straighten(contour, tolerance)?;
        }
    }

    // Step 4: Either fit curves through the contours or emit their edges
    // verbatim.
    let contour_count = contours.len();
    let mut fit = FitStats::default();
    let path = if config.smooth {
        monitor.on_progress(&TraceProgress::phase(TracePhase::Fit));
        let grouper = SegmentGrouper::new(config, monitor);
        grouper.group(&contours, &mut fit)?
    } else {
        debug!("smoothing disabled, keeping polyline edges");
        raw_edges(&contours, &mut fit)
    };

    info!(
        "traced {} segment(s): {} curve(s), {} line(s)",
        path.len(),
        fit.curves,
        fit.lines
    );
    Ok(TraceOutcome::Path {
        path,
        stats: TraceStats {
            boundary_tiles,
            contours: contour_count,
            fit,
        },
    })
}

/// Copy contour edges straight into the path, closing edges included.
fn raw_edges(contours: &[Polyline], stats: &mut FitStats) -> TracedPath {
    let closed = contours.iter().all(|c| c.closed);
    let mut path = TracedPath::new(closed);
    for contour in contours {
        if contour.len() < 2 {
            continue;
        }
        for pair in contour.points.windows(2) {
            path.push(PathSegment::Line(pair[0], pair[1]));
            stats.lines += 1;
        }
        if contour.closed {
            path.push(PathSegment::Line(
                *contour.points.last().unwrap(),
                contour.points[0],
            ));
            stats.lines += 1;
        }
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::monitor::NullMonitor;
    use crate::raster::PixelGrid;

    const BASE: Rgb = Rgb::new(255, 255, 255);
    const INK: Rgb = Rgb::new(0, 0, 0);

    #[test]
    fn invalid_config_is_rejected_before_any_work() {
        let grid = PixelGrid::filled(40, 40, BASE);
        let mut config = TraceConfig::default();
        config.x_inc = 0;
        assert!(matches!(
            trace(&grid, BASE, &config, &NullMonitor),
            Err(TraceError::InvalidArgument(_))
        ));
    }

    #[test]
    fn uniform_raster_traces_to_empty() {
        let grid = PixelGrid::filled(40, 40, BASE);
        let config = TraceConfig::default();
        let outcome = trace(&grid, BASE, &config, &NullMonitor).unwrap();
        assert_eq!(outcome, TraceOutcome::Empty);
    }

    #[test]
    fn lone_base_corner_sample_traces_to_empty() {
        // One base pixel exactly on the shared corner sample of four tiles.
        // Each tile emits a zero-area fragment, so the scan sees boundary
        // tiles but the union holds no outline to walk.
        let mut grid = PixelGrid::filled(40, 40, INK);
        grid.set(10, 10, BASE);
        let config = TraceConfig::default();
        let outcome = trace(&grid, BASE, &config, &NullMonitor).unwrap();
        assert_eq!(outcome, TraceOutcome::Empty);
    }

    #[test]
    fn one_pixel_stripe_on_a_tile_row_traces_to_empty() {
        // A stripe one pixel tall lying on the corner-sample row at y = 10.
        // Both tile rows touching it emit flat slivers that cancel away.
        let mut grid = PixelGrid::filled(40, 40, INK);
        grid.fill_rect(0, 10, 39, 10, BASE);
        let config = TraceConfig::default();
        let outcome = trace(&grid, BASE, &config, &NullMonitor).unwrap();
        assert_eq!(outcome, TraceOutcome::Empty);
    }

    #[test]
    fn raw_edges_materialize_the_closing_edge() {
        let square = Polyline::new(
            vec![
                Point::new(0.0, 0.0),
                Point::new(10.0, 0.0),
                Point::new(10.0, 10.0),
                Point::new(0.0, 10.0),
            ],
            true,
        );
        let mut stats = FitStats::default();
        let path = raw_edges(&[square], &mut stats);

        assert!(path.closed);
        assert_eq!(path.len(), 4);
        assert_eq!(
            path.segments[3],
            PathSegment::Line(Point::new(0.0, 10.0), Point::new(0.0, 0.0))
        );
        assert_eq!(stats.lines, 4);
    }

    #[test]
    fn stats_count_boundary_tiles_and_contours() {
        let mut grid = PixelGrid::filled(40, 40, INK);
        grid.fill_rect(0, 0, 10, 10, BASE);
        let mut config = TraceConfig::default();
        config.smooth = false;
        let outcome = trace(&grid, BASE, &config, &NullMonitor).unwrap();

        match outcome {
            TraceOutcome::Path { stats, .. } => {
                assert_eq!(stats.boundary_tiles, 3);
                assert_eq!(stats.contours, 1);
                assert_eq!(stats.fit.lines, 4);
                assert_eq!(stats.fit.curves, 0);
            }
            other => panic!("expected a path, got {other:?}"),
        }
    }
}
