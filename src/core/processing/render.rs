use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer, images::Image};
use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{CropCandidate, PixelBuffer, ResampleFilter};

/// Explicit rendering surface: draws a source region scaled into a new buffer.
///
/// Every stage that needs resampling receives one of these instead of reaching
/// for an implicit global drawing context.
pub trait Compositor {
    fn draw(
        &mut self,
        source: &PixelBuffer,
        region: CropCandidate,
        out_width: u32,
        out_height: u32,
    ) -> Result<PixelBuffer>;
}

/// `fast_image_resize`-backed compositor. Reuses one `Resizer` across draws.
pub struct ResizeCompositor {
    resizer: Resizer,
    filter: ResampleFilter,
}

impl ResizeCompositor {
    pub fn new(filter: ResampleFilter) -> Self {
        Self {
            resizer: Resizer::new(),
            filter,
        }
    }

    pub fn filter(&self) -> ResampleFilter {
        self.filter
    }

    fn resize_alg(&self) -> ResizeAlg {
        match self.filter {
            ResampleFilter::Nearest => ResizeAlg::Nearest,
            ResampleFilter::Bilinear => ResizeAlg::Convolution(FilterType::Bilinear),
            ResampleFilter::Lanczos3 => ResizeAlg::Convolution(FilterType::Lanczos3),
        }
    }
}

impl Default for ResizeCompositor {
    fn default() -> Self {
        Self::new(ResampleFilter::default())
    }
}

impl Compositor for ResizeCompositor {
    fn draw(
        &mut self,
        source: &PixelBuffer,
        region: CropCandidate,
        out_width: u32,
        out_height: u32,
    ) -> Result<PixelBuffer> {
        if source.is_empty() {
            return Err(Error::EmptyInput {
                reason: "cannot render from a zero-size buffer".to_string(),
            });
        }
        if out_width == 0 || out_height == 0 {
            return Err(Error::invalid_dimensions(format!(
                "output size {}x{} must be non-zero",
                out_width, out_height
            )));
        }
        if region.width == 0
            || region.height == 0
            || !region.fits_within(source.width(), source.height())
        {
            return Err(Error::invalid_dimensions(format!(
                "region {}x{}+{}+{} is outside the {}x{} source",
                region.width,
                region.height,
                region.x,
                region.y,
                source.width(),
                source.height()
            )));
        }

        let full = CropCandidate::new(0, 0, source.width(), source.height());
        if region == full && out_width == source.width() && out_height == source.height() {
            return Ok(source.clone());
        }

        debug!(
            "Rendering {}x{}+{}+{} -> {}x{} ({})",
            region.width, region.height, region.x, region.y, out_width, out_height, self.filter
        );

        let src_image = Image::from_vec_u8(
            source.width(),
            source.height(),
            source.data().to_vec(),
            PixelType::U8x4,
        )
        .map_err(Error::context_unavailable)?;
        let mut dst_image = Image::new(out_width, out_height, PixelType::U8x4);

        let resize_options = ResizeOptions::new().resize_alg(self.resize_alg()).crop(
            region.x as f64,
            region.y as f64,
            region.width as f64,
            region.height as f64,
        );
        self.resizer
            .resize(&src_image, &mut dst_image, &resize_options)
            .map_err(Error::context_unavailable)?;

        PixelBuffer::new(out_width, out_height, dst_image.into_vec())
    }
}

/// Scaled rectangular copy of `crop` into an `out_width x out_height` buffer.
pub fn render_crop(
    compositor: &mut dyn Compositor,
    buffer: &PixelBuffer,
    crop: CropCandidate,
    out_width: u32,
    out_height: u32,
) -> Result<PixelBuffer> {
    compositor.draw(buffer, crop, out_width, out_height)
}

/// Resample the whole buffer to a new size.
pub fn resize_buffer(
    compositor: &mut dyn Compositor,
    buffer: &PixelBuffer,
    out_width: u32,
    out_height: u32,
) -> Result<PixelBuffer> {
    let full = CropCandidate::new(0, 0, buffer.width(), buffer.height());
    compositor.draw(buffer, full, out_width, out_height)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 4x2 image: left half red, right half blue.
    fn halves() -> PixelBuffer {
        let mut data = Vec::new();
        for _y in 0..2 {
            for x in 0..4 {
                if x < 2 {
                    data.extend_from_slice(&[255, 0, 0, 255]);
                } else {
                    data.extend_from_slice(&[0, 0, 255, 255]);
                }
            }
        }
        PixelBuffer::new(4, 2, data).unwrap()
    }

    #[test]
    fn nearest_crop_copies_the_region() {
        let mut compositor = ResizeCompositor::new(ResampleFilter::Nearest);
        let out = render_crop(&mut compositor, &halves(), CropCandidate::new(2, 0, 2, 2), 4, 4)
            .unwrap();
        assert_eq!((out.width(), out.height()), (4, 4));
        assert!(out.data().chunks_exact(4).all(|px| px == [0, 0, 255, 255]));
    }

    #[test]
    fn output_has_exact_requested_size() {
        let mut compositor = ResizeCompositor::default();
        let source = PixelBuffer::filled(40, 30, [10, 20, 30, 255]);
        let out = render_crop(&mut compositor, &source, CropCandidate::new(5, 5, 20, 20), 7, 3)
            .unwrap();
        assert_eq!((out.width(), out.height()), (7, 3));
        assert_eq!(out.data().len(), 7 * 3 * 4);
        assert_eq!(out.pixel(3, 1), [10, 20, 30, 255]);
    }

    #[test]
    fn identity_draw_returns_the_source() {
        let mut compositor = ResizeCompositor::default();
        let source = halves();
        let out = resize_buffer(&mut compositor, &source, 4, 2).unwrap();
        assert_eq!(out, source);
    }

    #[test]
    fn rejects_regions_outside_the_source() {
        let mut compositor = ResizeCompositor::default();
        let err = render_crop(&mut compositor, &halves(), CropCandidate::new(3, 0, 2, 2), 2, 2)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidDimensions { .. }));

        let err = render_crop(&mut compositor, &halves(), CropCandidate::new(0, 0, 2, 2), 0, 2)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidDimensions { .. }));
    }

    #[test]
    fn zero_size_source_is_empty_input() {
        let mut compositor = ResizeCompositor::default();
        let empty = PixelBuffer::new(0, 0, Vec::new()).unwrap();
        let err = resize_buffer(&mut compositor, &empty, 2, 2).unwrap_err();
        assert!(matches!(err, Error::EmptyInput { .. }));
    }
}
