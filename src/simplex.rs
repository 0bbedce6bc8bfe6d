// src/simplex.rs - Nelder-Mead simplex search over control-point space

use std::cmp::Ordering;

use tracing::debug;

use crate::config::FitConfig;
use crate::errors::{Result, TraceError};
use crate::monitor::{TraceMonitor, TracePhase, TraceProgress};

/// Dimension of the search space: two free control points of a cubic.
pub const DIM: usize = 4;

/// A simplex in `DIM` dimensions has one vertex more than the dimension.
pub const VERTEX_COUNT: usize = DIM + 1;

/// Coefficients and stopping criteria for one simplex search.
#[derive(Debug, Clone, Copy)]
pub struct SimplexOptions {
    pub rho: f64,
    pub chi: f64,
    pub gamma: f64,
    pub sigma: f64,
    pub max_iterations: u32,
    pub tol_fun: f64,
    pub tol_x: f64,
}

impl From<&FitConfig> for SimplexOptions {
    fn from(fit: &FitConfig) -> Self {
        Self {
            rho: fit.rho,
            chi: fit.chi,
            gamma: fit.gamma,
            sigma: fit.sigma,
            max_iterations: fit.max_iterations,
            tol_fun: fit.tol_fun,
            tol_x: fit.tol_x,
        }
    }
}

impl Default for SimplexOptions {
    fn default() -> Self {
        SimplexOptions::from(&FitConfig::default())
    }
}

/// Where the search ended up.
#[derive(Debug, Clone, Copy)]
pub struct SimplexOutcome {
    pub best: [f64; DIM],
    pub value: f64,
    pub iterations: u32,
    /// False when the iteration cap ran out before either tolerance was met.
    /// The best vertex is still usable.
    pub converged: bool,
}

#[derive(Debug, Clone, Copy)]
struct Vertex {
    x: [f64; DIM],
    value: f64,
}

/// Minimize `objective` starting from the given simplex.
///
/// The objective is fallible so a cancellation observed inside an evaluation
/// can unwind the whole search; cancellation is also polled at the top of
/// every iteration. Progress snapshots carry the running best value. The
/// best value never increases from one iteration to the next.
pub fn minimize<F>(
    initial: [[f64; DIM]; VERTEX_COUNT],
    mut objective: F,
    options: &SimplexOptions,
    monitor: &dyn TraceMonitor,
) -> Result<SimplexOutcome>
where
    F: FnMut(&[f64; DIM]) -> Result<f64>,
{
    let mut vertices = Vec::with_capacity(VERTEX_COUNT);
    for x in initial {
        let value = objective(&x)?;
        vertices.push(Vertex { x, value });
    }
    sort_by_value(&mut vertices);

    let mut iterations = 0u32;
    let mut converged = false;

    while iterations < options.max_iterations {
        if monitor.cancel_requested() {
            return Err(TraceError::Cancelled);
        }
        if within_tolerance(&vertices, options) {
            converged = true;
            break;
        }
        iterations += 1;

        let centroid = centroid_of_best(&vertices);
        let worst = vertices[VERTEX_COUNT - 1];

        // Reflect the worst vertex through the centroid of the rest.
        let xr = step(&centroid, &worst.x, options.rho);
        let fr = objective(&xr)?;

        if fr < vertices[0].value {
            // Reflection beat the best vertex, try going further out.
            let xe = step(&centroid, &worst.x, options.rho * options.chi);
            let fe = objective(&xe)?;
            if fe < fr {
                vertices[VERTEX_COUNT - 1] = Vertex { x: xe, value: fe };
            } else {
                vertices[VERTEX_COUNT - 1] = Vertex { x: xr, value: fr };
            }
        } else if fr < vertices[VERTEX_COUNT - 2].value {
            vertices[VERTEX_COUNT - 1] = Vertex { x: xr, value: fr };
        } else if fr < worst.value {
            // Between second-worst and worst: contract on the outside.
            let xc = step(&centroid, &worst.x, options.rho * options.gamma);
            let fc = objective(&xc)?;
            if fc <= fr {
                vertices[VERTEX_COUNT - 1] = Vertex { x: xc, value: fc };
            } else {
                shrink(&mut vertices, options.sigma, &mut objective)?;
            }
        } else {
            // Reflection did not even beat the worst: contract inside.
            let xcc = step(&centroid, &worst.x, -options.gamma);
            let fcc = objective(&xcc)?;
            if fcc < worst.value {
                vertices[VERTEX_COUNT - 1] = Vertex { x: xcc, value: fcc };
            } else {
                shrink(&mut vertices, options.sigma, &mut objective)?;
            }
        }

        sort_by_value(&mut vertices);
        monitor.on_progress(&TraceProgress {
            phase: TracePhase::Fit,
            iteration: iterations,
            best_error: Some(vertices[0].value),
        });
    }

    if !converged {
        debug!(
            "simplex search exhausted {} iterations, best value {:e}",
            options.max_iterations, vertices[0].value
        );
    }

    Ok(SimplexOutcome {
        best: vertices[0].x,
        value: vertices[0].value,
        iterations,
        converged,
    })
}

/// `from + t * (from - away)` in every dimension.
fn step(from: &[f64; DIM], away: &[f64; DIM], t: f64) -> [f64; DIM] {
    let mut out = [0.0; DIM];
    for d in 0..DIM {
        out[d] = from[d] + t * (from[d] - away[d]);
    }
    out
}

fn centroid_of_best(vertices: &[Vertex]) -> [f64; DIM] {
    let mut centroid = [0.0; DIM];
    for vertex in &vertices[..VERTEX_COUNT - 1] {
        for d in 0..DIM {
            centroid[d] += vertex.x[d];
        }
    }
    for c in &mut centroid {
        *c /= (VERTEX_COUNT - 1) as f64;
    }
    centroid
}

/// Pull every vertex toward the best one and re-evaluate.
fn shrink<F>(vertices: &mut [Vertex], sigma: f64, objective: &mut F) -> Result<()>
where
    F: FnMut(&[f64; DIM]) -> Result<f64>,
{
    let anchor = vertices[0].x;
    for vertex in &mut vertices[1..] {
        for d in 0..DIM {
            vertex.x[d] = anchor[d] + sigma * (vertex.x[d] - anchor[d]);
        }
        vertex.value = objective(&vertex.x)?;
    }
    Ok(())
}

/// Ascending by value; NaN sorts worst so a poisoned vertex gets replaced
/// first. The sort is stable, so equal values keep their order.
fn sort_by_value(vertices: &mut [Vertex]) {
    vertices.sort_by(|a, b| match (a.value.is_nan(), b.value.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.value.partial_cmp(&b.value).unwrap_or(Ordering::Equal),
    });
}

fn within_tolerance(vertices: &[Vertex], options: &SimplexOptions) -> bool {
    // Parameter spread: the widest range any single dimension spans.
    let mut spread = 0.0f64;
    for d in 0..DIM {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for vertex in vertices {
            lo = lo.min(vertex.x[d]);
            hi = hi.max(vertex.x[d]);
        }
        spread = spread.max(hi - lo);
    }
    if spread < options.tol_x {
        return true;
    }

    // Relative spread of objective values.
    let fmin = vertices[0].value;
    let fmax = vertices[VERTEX_COUNT - 1].value;
    let diff = fmax - fmin;
    if diff == 0.0 {
        return true;
    }
    if fmax != 0.0 {
        let rel = diff / fmax.abs();
        if rel.is_finite() && rel < options.tol_fun {
            return true;
        }
    }
    false
}
