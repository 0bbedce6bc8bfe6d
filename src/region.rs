// src/region.rs - Union of boundary fragments and contour extraction

use std::collections::{BTreeMap, HashSet};

use crate::errors::{Result, TraceError};
use crate::geometry::{Point, Polyline};
use crate::monitor::TraceMonitor;

/// Vertex key in doubled pixel coordinates. Fragment vertices always sit on
/// half-pixel positions, so doubling makes them exact integers and edge
/// cancellation becomes exact set arithmetic.
type VertexKey = (i64, i64);

#[inline]
fn key(x: f64, y: f64) -> VertexKey {
    ((x * 2.0).round() as i64, (y * 2.0).round() as i64)
}

/// Running union of boundary fragments, kept as a set of directed edges.
///
/// Fragments are closed polygons wound clockwise (y grows downward).
/// Inserting an edge whose reverse is already present removes both, so edges
/// shared by adjacent fragments cancel and only the outline survives.
/// Zero-area fragments cancel themselves away entirely.
#[derive(Debug, Default)]
pub struct Region {
    edges: HashSet<(VertexKey, VertexKey)>,
}

impl Region {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Union one closed fragment given as a vertex list; the closing edge
    /// back to the first vertex is implied. Vertices must already include
    /// the edge midpoints so shared edges line up exactly between fragments
    /// from neighboring tiles. Cancellation is polled before the edge set is
    /// touched, so an aborted scan commits no partial fragment.
    pub fn add_fragment(
        &mut self,
        vertices: &[(f64, f64)],
        monitor: &dyn TraceMonitor,
    ) -> Result<()> {
        if monitor.cancel_requested() {
            return Err(TraceError::Cancelled);
        }
        let n = vertices.len();
        for i in 0..n {
            let (ax, ay) = vertices[i];
            let (bx, by) = vertices[(i + 1) % n];
            self.add_edge(key(ax, ay), key(bx, by));
        }
        Ok(())
    }

    fn add_edge(&mut self, a: VertexKey, b: VertexKey) {
        if a == b {
            return;
        }
        // An edge and its reverse annihilate, exactly like interior seams
        // vanishing in an area union.
        if self.edges.remove(&(b, a)) {
            return;
        }
        self.edges.insert((a, b));
    }

    /// Walk the surviving edges into closed contours, scaling from pixel
    /// space to output coordinates.
    ///
    /// Each contour starts at the smallest remaining vertex key. At a pinch
    /// vertex (two loops touching at a point) the sharpest left turn is
    /// taken, which keeps each loop separate instead of jumping between
    /// them. Collinear runs are merged so the midpoint split vertices drop
    /// out of the output.
    pub fn into_contours(self, scale: f64) -> Result<Vec<Polyline>> {
        let mut successors: BTreeMap<VertexKey, Vec<VertexKey>> = BTreeMap::new();
        for (a, b) in &self.edges {
            successors.entry(*a).or_default().push(*b);
        }
        for list in successors.values_mut() {
            list.sort();
        }

        let mut contours = Vec::new();
        while let Some((&start, _)) = successors.iter().next() {
            let mut keys = vec![start];
            let mut current = take_successor(&mut successors, start, None)?;
            let mut prev = start;
            while current != start {
                keys.push(current);
                let incoming = (current.0 - prev.0, current.1 - prev.1);
                let next = take_successor(&mut successors, current, Some(incoming))?;
                prev = current;
                current = next;
            }

            let merged = merge_collinear(keys);
            if merged.len() < 3 {
                return Err(TraceError::DegenerateGeometry(
                    "contour collapsed to fewer than three vertices".to_string(),
                ));
            }
            let points = merged
                .into_iter()
                .map(|(kx, ky)| Point::new(kx as f64 * 0.5 * scale, ky as f64 * 0.5 * scale))
                .collect();
            contours.push(Polyline::new(points, true));
        }
        Ok(contours)
    }
}

/// Remove and return the next vertex to walk to from `from`. With several
/// outgoing edges the one turning most sharply left relative to `incoming`
/// wins; the first step of a contour has no incoming direction and takes the
/// smallest candidate.
fn take_successor(
    successors: &mut BTreeMap<VertexKey, Vec<VertexKey>>,
    from: VertexKey,
    incoming: Option<(i64, i64)>,
) -> Result<VertexKey> {
    let list = successors.get_mut(&from).ok_or_else(|| {
        TraceError::DegenerateGeometry(format!(
            "boundary walk dead-ends at ({}, {})",
            from.0 as f64 * 0.5,
            from.1 as f64 * 0.5
        ))
    })?;

    let idx = match incoming {
        _ if list.len() == 1 => 0,
        None => 0,
        Some(dir) => sharpest_left_turn(from, dir, list),
    };
    let next = list.swap_remove(idx);
    if list.is_empty() {
        successors.remove(&from);
    }
    Ok(next)
}

fn sharpest_left_turn(from: VertexKey, incoming: (i64, i64), candidates: &[VertexKey]) -> usize {
    let inx = incoming.0 as f64;
    let iny = incoming.1 as f64;
    let mut best = 0;
    let mut best_angle = f64::NEG_INFINITY;
    for (i, cand) in candidates.iter().enumerate() {
        let outx = (cand.0 - from.0) as f64;
        let outy = (cand.1 - from.1) as f64;
        let cross = inx * outy - iny * outx;
        let dot = inx * outx + iny * outy;
        let angle = cross.atan2(dot);
        if angle > best_angle {
            best_angle = angle;
            best = i;
        }
    }
    best
}

/// Drop every vertex that continues its predecessor's direction unchanged.
/// Wraps around the seam, so a closed loop keeps only its true corners.
fn merge_collinear(keys: Vec<VertexKey>) -> Vec<VertexKey> {
    let n = keys.len();
    if n < 3 {
        return keys;
    }
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let p = keys[(i + n - 1) % n];
        let v = keys[i];
        let x = keys[(i + 1) % n];
        let d1 = (v.0 - p.0, v.1 - p.1);
        let d2 = (x.0 - v.0, x.1 - v.1);
        let cross = d1.0 * d2.1 - d1.1 * d2.0;
        let dot = d1.0 * d2.0 + d1.1 * d2.1;
        if cross != 0 || dot <= 0 {
            out.push(v);
        }
    }
    out
}
