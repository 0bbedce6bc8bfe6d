// src/scanner.rs - Tile sweep classifying corners against the base color

use tracing::debug;

use crate::errors::{Result, TraceError};
use crate::monitor::TraceMonitor;
use crate::raster::{Raster, Rgb};
use crate::region::Region;

/// Result of a full tile sweep.
pub struct ScanResult {
    /// Union of every fragment the sweep produced.
    pub region: Region,
    /// Number of tiles whose corners disagreed about the base color. Zero
    /// means the image held no boundary at all against that color.
    pub boundary_tiles: usize,
}

/// Sweeps a raster in fixed-size tiles and accumulates boundary fragments.
///
/// Each tile samples its four corner pixels against the base color. Tiles
/// whose corners agree contribute no boundary: fully outside tiles are
/// skipped, fully inside tiles add their whole extent to the region so the
/// interior is solid. Mixed tiles add a fragment from a fixed case table,
/// full-area where three corners are inside and flattened edge runs where
/// the boundary only clips a corner or an edge.
pub struct TileScanner {
    x_inc: u32,
    y_inc: u32,
}

impl TileScanner {
    pub fn new(x_inc: u32, y_inc: u32) -> Result<Self> {
        if x_inc == 0 || y_inc == 0 {
            return Err(TraceError::InvalidArgument(
                "tile increments must be > 0".to_string(),
            ));
        }
        Ok(Self { x_inc, y_inc })
    }

    /// Run the sweep over the whole raster. Cancellation is polled at the
    /// start of every tile and again inside every fragment union.
    pub fn scan(
        &self,
        raster: &dyn Raster,
        base: Rgb,
        monitor: &dyn TraceMonitor,
    ) -> Result<ScanResult> {
        let width = raster.width();
        let height = raster.height();

        let mut region = Region::new();
        let mut boundary_tiles = 0usize;

        let mut y0 = 0u32;
        while y0 < height {
            let mut x0 = 0u32;
            while x0 < width {
                if monitor.cancel_requested() {
                    return Err(TraceError::Cancelled);
                }
                if self.scan_tile(raster, base, x0, y0, &mut region, monitor)? {
                    boundary_tiles += 1;
                }
                x0 = x0.saturating_add(self.x_inc);
            }
            y0 = y0.saturating_add(self.y_inc);
        }

        debug!(
            "tile scan complete: {} boundary tiles, {} live edges",
            boundary_tiles,
            region.edge_count()
        );
        Ok(ScanResult {
            region,
            boundary_tiles,
        })
    }

    /// Classify one tile and union its fragment. Returns true when the tile
    /// crossed the boundary (corner flags disagreed).
    fn scan_tile(
        &self,
        raster: &dyn Raster,
        base: Rgb,
        x0: u32,
        y0: u32,
        region: &mut Region,
        monitor: &dyn TraceMonitor,
    ) -> Result<bool> {
        let width = raster.width();
        let height = raster.height();

        // Corner samples clamp to the last pixel; the tile's geometric
        // extent clips to the image edge instead, so edge tiles stay flush.
        let xs = x0.saturating_add(self.x_inc).min(width - 1);
        let ys = y0.saturating_add(self.y_inc).min(height - 1);
        let tl = raster.pixel(x0, y0) == base;
        let tr = raster.pixel(xs, y0) == base;
        let bl = raster.pixel(x0, ys) == base;
        let br = raster.pixel(xs, ys) == base;

        let x0 = x0 as f64;
        let y0 = y0 as f64;
        let x1 = (x0 + self.x_inc as f64).min(width as f64);
        let y1 = (y0 + self.y_inc as f64).min(height as f64);
        let mx = (x0 + x1) / 2.0;
        let my = (y0 + y1) / 2.0;

        // Every fragment is wound clockwise and pre-split at the edge
        // midpoints so neighboring tiles cancel their shared edges exactly.
        match (tl, tr, bl, br) {
            // Corners agree: no boundary here. A fully inside tile still
            // fills its extent so the union has a solid interior.
            (false, false, false, false) => Ok(false),
            (true, true, true, true) => {
                region.add_fragment(
                    &[
                        (x0, y0),
                        (mx, y0),
                        (x1, y0),
                        (x1, my),
                        (x1, y1),
                        (mx, y1),
                        (x0, y1),
                        (x0, my),
                    ],
                    monitor,
                )?;
                Ok(false)
            }

            // Three corners inside: the tile minus the outside quarter,
            // beveled between the midpoints flanking the outside corner.
            (false, true, true, true) => {
                region.add_fragment(
                    &[
                        (mx, y0),
                        (x1, y0),
                        (x1, my),
                        (x1, y1),
                        (mx, y1),
                        (x0, y1),
                        (x0, my),
                    ],
                    monitor,
                )?;
                Ok(true)
            }
            (true, false, true, true) => {
                region.add_fragment(
                    &[
                        (x0, y0),
                        (mx, y0),
                        (x1, my),
                        (x1, y1),
                        (mx, y1),
                        (x0, y1),
                        (x0, my),
                    ],
                    monitor,
                )?;
                Ok(true)
            }
            (true, true, false, true) => {
                region.add_fragment(
                    &[
                        (x0, y0),
                        (mx, y0),
                        (x1, y0),
                        (x1, my),
                        (x1, y1),
                        (mx, y1),
                        (x0, my),
                    ],
                    monitor,
                )?;
                Ok(true)
            }
            (true, true, true, false) => {
                region.add_fragment(
                    &[
                        (x0, y0),
                        (mx, y0),
                        (x1, y0),
                        (x1, my),
                        (mx, y1),
                        (x0, y1),
                        (x0, my),
                    ],
                    monitor,
                )?;
                Ok(true)
            }

            // Two adjacent corners inside: the boundary runs along their
            // full shared edge. The fragment is flat and nets to nothing on
            // its own; its first pass must run opposite to edges the tile
            // above or to the left already deposited, so those cancel and
            // the return pass restores them.
            (true, true, false, false) => {
                region.add_fragment(&[(x0, y0), (mx, y0), (x1, y0), (mx, y0)], monitor)?;
                Ok(true)
            }
            (false, false, true, true) => {
                region.add_fragment(&[(x0, y1), (mx, y1), (x1, y1), (mx, y1)], monitor)?;
                Ok(true)
            }
            (true, false, true, false) => {
                region.add_fragment(&[(x0, y1), (x0, my), (x0, y0), (x0, my)], monitor)?;
                Ok(true)
            }
            (false, true, false, true) => {
                region.add_fragment(&[(x1, y0), (x1, my), (x1, y1), (x1, my)], monitor)?;
                Ok(true)
            }

            // Diagonal corners inside: two opposite partial edges.
            (true, false, false, true) => {
                region.add_fragment(&[(x0, y0), (mx, y0)], monitor)?;
                region.add_fragment(&[(mx, y1), (x1, y1)], monitor)?;
                Ok(true)
            }
            (false, true, true, false) => {
                region.add_fragment(&[(mx, y0), (x1, y0)], monitor)?;
                region.add_fragment(&[(x0, y1), (mx, y1)], monitor)?;
                Ok(true)
            }

            // Single corner inside: a partial edge up to the midpoint.
            (true, false, false, false) => {
                region.add_fragment(&[(x0, y0), (mx, y0)], monitor)?;
                Ok(true)
            }
            (false, true, false, false) => {
                region.add_fragment(&[(mx, y0), (x1, y0)], monitor)?;
                Ok(true)
            }
            (false, false, true, false) => {
                region.add_fragment(&[(x0, y1), (mx, y1)], monitor)?;
                Ok(true)
            }
            (false, false, false, true) => {
                region.add_fragment(&[(mx, y1), (x1, y1)], monitor)?;
                Ok(true)
            }
        }
    }
}
