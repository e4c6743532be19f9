//! Encoders for rendered buffers (PNG, JPEG, TIFF) and the JSON metadata sidecar.
use std::path::Path;

use tracing::info;

use crate::error::Result;
use crate::types::{OutputFormat, PixelBuffer};

pub mod jpeg;
pub mod metadata;
pub mod png;
pub mod tiff;

/// Encode `buffer` to `output` in the given format.
pub fn write_output(format: OutputFormat, output: &Path, buffer: &PixelBuffer) -> Result<()> {
    match format {
        OutputFormat::Png => png::write_rgba_png(output, buffer)?,
        OutputFormat::Jpeg => jpeg::write_rgba_jpeg(output, buffer, jpeg::DEFAULT_QUALITY)?,
        OutputFormat::Tiff => tiff::write_rgba_tiff(output, buffer)?,
    }
    info!(
        "Saved {} {}x{} to {:?}",
        format,
        buffer.width(),
        buffer.height(),
        output
    );
    Ok(())
}
