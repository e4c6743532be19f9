//! Crate-level error type and `Result` alias for stable, structured error handling.
//! Converts underlying I/O, decoding and encoding errors, and provides semantic
//! variants for dimension validation and rendering failures.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image decode error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JPEG encode error: {0}")]
    Jpeg(#[from] jpeg_encoder::EncodingError),

    #[error("TIFF encode error: {0}")]
    Tiff(#[from] tiff::TiffError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The requested crop or output size does not fit the source bounds.
    /// Not retryable without changing the options.
    #[error("Invalid dimensions: {reason}")]
    InvalidDimensions { reason: String },

    #[error("Empty input: {reason}")]
    EmptyInput { reason: String },

    /// The rendering surface could not be obtained or failed mid-draw.
    #[error("Rendering context unavailable: {reason}")]
    ContextUnavailable { reason: String },

    #[error("Pixel buffer length mismatch: expected {expected} bytes, got {actual}")]
    InvalidBuffer { expected: usize, actual: usize },

    #[error("Invalid argument: {arg}={value}")]
    InvalidArgument { arg: &'static str, value: String },

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("External error: {0}")]
    External(String),
}

impl Error {
    pub fn external<E: std::fmt::Display>(e: E) -> Self {
        Error::External(e.to_string())
    }

    pub fn invalid_dimensions(reason: impl Into<String>) -> Self {
        Error::InvalidDimensions {
            reason: reason.into(),
        }
    }

    pub fn context_unavailable<E: std::fmt::Display>(e: E) -> Self {
        Error::ContextUnavailable {
            reason: e.to_string(),
        }
    }
}
