// src/monitor.rs - Progress reporting and cancellation for long traces

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Pipeline stage reported alongside progress updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TracePhase {
    Scan,
    Boundary,
    Straighten,
    Fit,
}

/// Snapshot of tracing progress. Built fresh for every update, so a monitor
/// may keep it around without borrowing anything from the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceProgress {
    pub phase: TracePhase,
    /// Optimizer iteration within the current fit. Zero outside fitting.
    pub iteration: u32,
    /// Best objective value seen so far in the current fit, if any.
    pub best_error: Option<f64>,
}

impl TraceProgress {
    pub fn phase(phase: TracePhase) -> Self {
        Self {
            phase,
            iteration: 0,
            best_error: None,
        }
    }
}

/// Observer hooks for a running trace. Every method has a default, so a
/// monitor only implements what it cares about.
pub trait TraceMonitor {
    /// Polled between units of work. Returning true stops the trace and makes
    /// it report a cancelled outcome instead of a path.
    fn cancel_requested(&self) -> bool {
        false
    }

    /// Called with progress snapshots as the pipeline advances.
    fn on_progress(&self, _progress: &TraceProgress) {}
}

/// Monitor that never cancels and discards progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullMonitor;

impl TraceMonitor for NullMonitor {}

/// Shared cancellation flag. Clone the token to another thread and call
/// `cancel` there to stop a trace running on this one.
#[derive(Debug, Default, Clone)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

impl TraceMonitor for CancelToken {
    fn cancel_requested(&self) -> bool {
        self.is_cancelled()
    }
}
