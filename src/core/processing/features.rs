//! Per-pixel saliency features used by the crop scorer.
//!
//! Three channels are computed over the analysis image and stored as clamped
//! bytes: skin likelihood, detail (Laplacian of luminance) and saturation. The
//! score map is a block-downsampled copy of that map which the crop search
//! iterates over.
use ndarray::{Array2, Array3, ArrayView3};

use crate::core::params::CropHeuristics;
use crate::error::Result;
use crate::types::PixelBuffer;

pub const SKIN: usize = 0;
pub const DETAIL: usize = 1;
pub const SATURATION: usize = 2;

/// Luminance with the weights the skin and saturation thresholds were tuned on.
#[inline]
fn cie(r: f64, g: f64, b: f64) -> f64 {
    0.5126 * b + 0.7152 * g + 0.0722 * r
}

/// Saturate to a byte, rounding half to even.
#[inline]
fn clamp_u8(v: f64) -> u8 {
    if v.is_nan() {
        0
    } else {
        v.round_ties_even().clamp(0.0, 255.0) as u8
    }
}

/// 1 minus the distance between the normalized color and the reference skin tone.
fn skin_likeness(h: &CropHeuristics, r: f64, g: f64, b: f64) -> f64 {
    let mag = (r * r + g * g + b * b).sqrt();
    if mag == 0.0 {
        return 0.0;
    }
    let rd = r / mag - h.skin_color[0];
    let gd = g / mag - h.skin_color[1];
    let bd = b / mag - h.skin_color[2];
    1.0 - (rd * rd + gd * gd + bd * bd).sqrt()
}

/// HSL saturation in [0, 1].
fn saturation(r: f64, g: f64, b: f64) -> f64 {
    let max = (r / 255.0).max(g / 255.0).max(b / 255.0);
    let min = (r / 255.0).min(g / 255.0).min(b / 255.0);
    if max == min {
        return 0.0;
    }
    let l = (max + min) / 2.0;
    let d = max - min;
    if l > 0.5 {
        d / (2.0 - max - min)
    } else {
        d / (max + min)
    }
}

/// Feature channels laid out as `(row, column, channel)`.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMap {
    values: Array3<u8>,
}

impl FeatureMap {
    pub fn width(&self) -> usize {
        self.values.dim().1
    }

    pub fn height(&self) -> usize {
        self.values.dim().0
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize, channel: usize) -> u8 {
        self.values[[row, col, channel]]
    }

    /// Skin, detail and saturation in R, G and B; opaque alpha.
    pub fn to_pixel_buffer(&self) -> Result<PixelBuffer> {
        let (rows, cols, _) = self.values.dim();
        let mut data = Vec::with_capacity(rows * cols * 4);
        for row in 0..rows {
            for col in 0..cols {
                data.push(self.values[[row, col, SKIN]]);
                data.push(self.values[[row, col, DETAIL]]);
                data.push(self.values[[row, col, SATURATION]]);
                data.push(255);
            }
        }
        PixelBuffer::new(cols as u32, rows as u32, data)
    }

    /// Average `factor x factor` blocks into one cell. Skin and detail keep part
    /// of the block maximum so small features survive; saturation is a plain
    /// mean. Partial blocks at the right/bottom edge are dropped.
    pub fn down_sample(&self, factor: usize) -> FeatureMap {
        let factor = factor.max(1);
        let (rows, cols, _) = self.values.dim();
        let (out_rows, out_cols) = (rows / factor, cols / factor);
        let inv_area = 1.0 / (factor * factor) as f64;

        let mut values = Array3::<u8>::zeros((out_rows, out_cols, 3));
        for row in 0..out_rows {
            for col in 0..out_cols {
                let mut sum = [0.0f64; 3];
                let mut max = [0u8; 2];
                for v in 0..factor {
                    for u in 0..factor {
                        let (y, x) = (row * factor + v, col * factor + u);
                        let skin = self.values[[y, x, SKIN]];
                        let detail = self.values[[y, x, DETAIL]];
                        sum[SKIN] += skin as f64;
                        sum[DETAIL] += detail as f64;
                        sum[SATURATION] += self.values[[y, x, SATURATION]] as f64;
                        max[SKIN] = max[SKIN].max(skin);
                        max[DETAIL] = max[DETAIL].max(detail);
                    }
                }
                values[[row, col, SKIN]] =
                    clamp_u8(sum[SKIN] * inv_area * 0.5 + max[SKIN] as f64 * 0.5);
                values[[row, col, DETAIL]] =
                    clamp_u8(sum[DETAIL] * inv_area * 0.7 + max[DETAIL] as f64 * 0.3);
                values[[row, col, SATURATION]] = clamp_u8(sum[SATURATION] * inv_area);
            }
        }
        FeatureMap { values }
    }
}

fn luminance_map(view: &ArrayView3<'_, u8>) -> Array2<f64> {
    let (rows, cols, _) = view.dim();
    Array2::from_shape_fn((rows, cols), |(y, x)| {
        cie(
            view[[y, x, 0]] as f64,
            view[[y, x, 1]] as f64,
            view[[y, x, 2]] as f64,
        )
    })
}

/// Compute the skin, detail and saturation channels of `image`.
pub fn analyse(image: &PixelBuffer, h: &CropHeuristics) -> Result<FeatureMap> {
    let view = image.view()?;
    let (rows, cols, _) = view.dim();
    let lum = luminance_map(&view);

    let skin_scale = 255.0 / (1.0 - h.skin_threshold);
    let saturation_scale = 255.0 / (1.0 - h.saturation_threshold);

    let mut values = Array3::<u8>::zeros((rows, cols, 3));
    for y in 0..rows {
        for x in 0..cols {
            let (r, g, b) = (
                view[[y, x, 0]] as f64,
                view[[y, x, 1]] as f64,
                view[[y, x, 2]] as f64,
            );
            let lightness = lum[[y, x]] / 255.0;

            // Laplacian; the outermost ring has no neighbours and keeps raw luminance
            let detail = if x == 0 || y == 0 || x + 1 >= cols || y + 1 >= rows {
                lum[[y, x]]
            } else {
                lum[[y, x]] * 4.0
                    - lum[[y - 1, x]]
                    - lum[[y, x - 1]]
                    - lum[[y, x + 1]]
                    - lum[[y + 1, x]]
            };
            values[[y, x, DETAIL]] = clamp_u8(detail);

            let skin = skin_likeness(h, r, g, b);
            if skin > h.skin_threshold
                && lightness >= h.skin_brightness_min
                && lightness <= h.skin_brightness_max
            {
                values[[y, x, SKIN]] = clamp_u8((skin - h.skin_threshold) * skin_scale);
            }

            let sat = saturation(r, g, b);
            if sat > h.saturation_threshold
                && lightness >= h.saturation_brightness_min
                && lightness <= h.saturation_brightness_max
            {
                values[[y, x, SATURATION]] =
                    clamp_u8((sat - h.saturation_threshold) * saturation_scale);
            }
        }
    }

    Ok(FeatureMap { values })
}
