// src/lib.rs - Library interface for raster_trace

pub mod config;
pub mod errors;
pub mod fitter;
pub mod geometry;
pub mod grouper;
pub mod monitor;
pub mod path;
pub mod pipeline;
pub mod raster;
pub mod region;
pub mod scanner;
pub mod simplex;
pub mod straighten;

// Re-export commonly used types and functions
pub use config::{FitConfig, TraceConfig};
pub use errors::{Result, TraceError};
pub use pipeline::{trace, TraceOutcome, TraceStats};

// Re-export the path model
pub use geometry::{CubicBezier, Point, Polyline, Vector};
pub use path::{PathSegment, TracedPath};

// Re-export raster input types
pub use raster::{load_rgb, PixelGrid, Raster, Rgb};

// Re-export progress and cancellation plumbing
pub use monitor::{CancelToken, NullMonitor, TraceMonitor, TracePhase, TraceProgress};

// Re-export the lower pipeline stages for callers that drive them directly
pub use fitter::{BezierFitter, FitStats};
pub use grouper::SegmentGrouper;
pub use region::Region;
pub use scanner::{ScanResult, TileScanner};
pub use simplex::{SimplexOptions, SimplexOutcome};
pub use straighten::straighten;
