use std::path::Path;

use tracing::debug;

use crate::error::Result;
use crate::types::PixelBuffer;

fn from_dynamic(image: image::DynamicImage) -> Result<PixelBuffer> {
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    PixelBuffer::new(width, height, rgba.into_raw())
}

/// Decode any format the `image` crate recognises into an RGBA buffer.
pub fn load_pixel_buffer(path: &Path) -> Result<PixelBuffer> {
    let buffer = from_dynamic(image::open(path)?)?;
    debug!(
        "Loaded {:?}: {}x{}",
        path,
        buffer.width(),
        buffer.height()
    );
    Ok(buffer)
}

/// Decode an in-memory encoded image (format guessed from its header).
pub fn decode_pixel_buffer(bytes: &[u8]) -> Result<PixelBuffer> {
    from_dynamic(image::load_from_memory(bytes)?)
}

/// Whether the extension names a raster format this crate reads.
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            matches!(
                ext.to_ascii_lowercase().as_str(),
                "png" | "jpg" | "jpeg" | "tif" | "tiff" | "gif" | "bmp" | "webp"
            )
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn decodes_png_bytes_to_rgba() {
        let image = image::RgbImage::from_pixel(3, 2, image::Rgb([10, 20, 30]));
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(image)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();

        let buffer = decode_pixel_buffer(&bytes).unwrap();
        assert_eq!((buffer.width(), buffer.height()), (3, 2));
        assert_eq!(buffer.pixel(2, 1), [10, 20, 30, 255]);
    }

    #[test]
    fn garbage_is_an_image_error() {
        let err = decode_pixel_buffer(b"not an image").unwrap_err();
        assert!(matches!(err, crate::error::Error::Image(_)));
    }

    #[test]
    fn recognises_extensions() {
        assert!(is_supported_image(Path::new("a/b.PNG")));
        assert!(is_supported_image(Path::new("photo.jpeg")));
        assert!(!is_supported_image(Path::new("notes.txt")));
        assert!(!is_supported_image(Path::new("no_extension")));
    }
}
