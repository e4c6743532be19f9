use std::path::Path;

use image::{ColorType, ImageFormat};

use crate::error::Result;
use crate::types::PixelBuffer;

pub fn write_rgba_png(output: &Path, buffer: &PixelBuffer) -> Result<()> {
    image::save_buffer_with_format(
        output,
        buffer.data(),
        buffer.width(),
        buffer.height(),
        ColorType::Rgba8,
        ImageFormat::Png,
    )?;
    Ok(())
}
