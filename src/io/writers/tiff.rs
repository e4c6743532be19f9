use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use tiff::encoder::{TiffEncoder, colortype};

use crate::error::Result;
use crate::types::PixelBuffer;

/// Write an RGBA buffer as an uncompressed 8-bit TIFF.
pub fn write_rgba_tiff(output: &Path, buffer: &PixelBuffer) -> Result<()> {
    let file = File::create(output)?;
    let mut writer = BufWriter::new(file);
    let mut encoder = TiffEncoder::new(&mut writer)?;
    encoder.write_image::<colortype::RGBA8>(buffer.width(), buffer.height(), buffer.data())?;
    Ok(())
}
