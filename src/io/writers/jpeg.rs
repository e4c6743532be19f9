use jpeg_encoder::{ColorType, Encoder};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::error::{Error, Result};
use crate::types::PixelBuffer;

pub const DEFAULT_QUALITY: u8 = 90;

/// Write an RGBA buffer as baseline JPEG. Alpha is discarded.
pub fn write_rgba_jpeg(output: &Path, buffer: &PixelBuffer, quality: u8) -> Result<()> {
    let (Ok(width), Ok(height)) = (u16::try_from(buffer.width()), u16::try_from(buffer.height()))
    else {
        return Err(Error::invalid_dimensions(format!(
            "{}x{} exceeds the JPEG limit of 65535 pixels per side",
            buffer.width(),
            buffer.height()
        )));
    };
    let file = File::create(output)?;
    let mut writer = BufWriter::new(file);
    let encoder = Encoder::new(&mut writer, quality);
    encoder.encode(buffer.data(), width, height, ColorType::Rgba)?;
    Ok(())
}
