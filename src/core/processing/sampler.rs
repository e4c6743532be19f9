use crate::core::params::PaletteOptions;
use crate::types::{PixelBuffer, Rgb};

/// Pixels with alpha below this are too transparent to represent visible color.
const MIN_ALPHA: u8 = 125;
/// Pixels with every channel above this are treated as background/margin white.
const NEAR_WHITE: u8 = 250;

/// Rectangular sub-region of a buffer, already clipped to its bounds.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SampleRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl SampleRegion {
    /// Resolve palette options against a buffer: missing width/height extend to
    /// the edge, and the result never reaches outside the buffer.
    pub fn from_options(buffer: &PixelBuffer, opts: &PaletteOptions) -> Self {
        Self {
            x: opts.x,
            y: opts.y,
            width: opts.width.unwrap_or(u32::MAX),
            height: opts.height.unwrap_or(u32::MAX),
        }
        .clipped_to(buffer)
    }

    /// The part of this region that lies inside `buffer`.
    pub fn clipped_to(self, buffer: &PixelBuffer) -> Self {
        let x = self.x.min(buffer.width());
        let y = self.y.min(buffer.height());
        Self {
            x,
            y,
            width: self.width.min(buffer.width() - x),
            height: self.height.min(buffer.height() - y),
        }
    }

    fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

#[inline]
fn keep(rgba: &[u8]) -> Option<Rgb> {
    let (r, g, b, a) = (rgba[0], rgba[1], rgba[2], rgba[3]);
    if a < MIN_ALPHA {
        return None;
    }
    if r > NEAR_WHITE && g > NEAR_WHITE && b > NEAR_WHITE {
        return None;
    }
    Some(Rgb::new(r, g, b))
}

/// Decimate a buffer into opaque, non-near-white colors.
///
/// Visits pixel indices `0, stride, 2*stride, ...` (stride in pixels, a zero
/// stride behaves like 1) and keeps survivors in scan order.
pub fn sample(buffer: &PixelBuffer, stride: usize) -> Vec<Rgb> {
    let stride = stride.max(1);
    let data = buffer.data();
    (0..buffer.pixel_count())
        .step_by(stride)
        .filter_map(|i| keep(&data[i * 4..i * 4 + 4]))
        .collect()
}

/// Same as [`sample`], over the pixels of `region` only. The region is clipped
/// to the buffer first; indices are counted row-major within it, as if the
/// region had been copied out.
pub fn sample_region(buffer: &PixelBuffer, region: SampleRegion, stride: usize) -> Vec<Rgb> {
    let stride = stride.max(1);
    let region = region.clipped_to(buffer);
    if region.width == 0 || region.height == 0 {
        return Vec::new();
    }
    let data = buffer.data();
    let row_stride = buffer.width() as usize;
    let region_w = region.width as usize;
    (0..region.pixel_count())
        .step_by(stride)
        .filter_map(|i| {
            let x = region.x as usize + i % region_w;
            let y = region.y as usize + i / region_w;
            let offset = (y * row_stride + x) * 4;
            keep(&data[offset..offset + 4])
        })
        .collect()
}
