//! I/O layer: decoding source images into `PixelBuffer`s (`reader`) and
//! `writers` for PNG/JPEG/TIFF outputs and JSON metadata sidecars.
pub mod reader;
pub use reader::{decode_pixel_buffer, is_supported_image, load_pixel_buffer};

pub mod writers;
pub use writers::write_output;
