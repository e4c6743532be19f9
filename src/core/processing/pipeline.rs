use tracing::{debug, info};

use crate::core::params::{PaletteOptions, PipelineParams};
use crate::core::processing::crop::{CropResult, find_best_crop_with};
use crate::core::processing::quantize::quantize;
use crate::core::processing::render::{Compositor, render_crop};
use crate::core::processing::sampler::{SampleRegion, sample_region};
use crate::error::Result;
use crate::types::{PaletteSource, PixelBuffer, Rgb};

/// Everything one pipeline run produces.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub crop: CropResult,
    /// The chosen crop scaled to exactly `width x height`
    pub rendered: PixelBuffer,
    /// `None` when palette extraction was not requested
    pub palette: Option<Vec<Rgb>>,
}

/// Sample the option's region of `buffer` and reduce it to a palette.
///
/// An empty palette is a valid result (fully transparent or near-white
/// input, or a region outside the buffer).
pub fn extract_palette(buffer: &PixelBuffer, options: &PaletteOptions) -> Vec<Rgb> {
    let region = SampleRegion::from_options(buffer, options);
    let colors = sample_region(buffer, region, options.quality);
    debug!(
        "Sampled {} colors from {}x{}+{}+{} (stride {})",
        colors.len(),
        region.width,
        region.height,
        region.x,
        region.y,
        options.quality
    );
    quantize(&colors, options.size)
}

/// Find the best crop, render it at the target size and optionally extract a
/// palette. Stops at the first failing stage.
pub fn run_pipeline(
    buffer: &PixelBuffer,
    params: &PipelineParams,
    compositor: &mut dyn Compositor,
) -> Result<PipelineOutput> {
    let options = &params.crop;
    info!(
        "Pipeline: {}x{} source -> {}x{} target",
        buffer.width(),
        buffer.height(),
        options.width,
        options.height
    );

    let crop = find_best_crop_with(buffer, options, compositor)?;
    info!(
        "Selected crop {}x{}+{}+{} (score {:.5})",
        crop.crop.width, crop.crop.height, crop.crop.x, crop.crop.y, crop.score.total
    );

    let rendered = render_crop(compositor, buffer, crop.crop, options.width, options.height)?;

    let palette = params.palette.as_ref().map(|palette_options| {
        let source = match params.palette_source {
            PaletteSource::Cropped => &rendered,
            PaletteSource::Original => buffer,
        };
        let palette = extract_palette(source, palette_options);
        info!(
            "Extracted {} palette colors from the {:?} image",
            palette.len(),
            params.palette_source
        );
        palette
    });

    Ok(PipelineOutput {
        crop,
        rendered,
        palette,
    })
}
