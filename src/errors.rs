use thiserror::Error;
use std::io;

/// Custom error types for raster tracing
#[derive(Error, Debug)]
pub enum TraceError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Tracing produced an empty path")]
    EmptyPath,

    #[error("Tracing was cancelled")]
    Cancelled,

    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),
}

/// Type alias for Result with our custom error type
pub type Result<T> = std::result::Result<T, TraceError>;
