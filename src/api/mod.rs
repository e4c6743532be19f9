//! High-level, ergonomic library API: crop and extract palettes from image files
//! or in-memory buffers, write outputs with optional sidecars, and batch helpers
//! for directories. Prefer these entrypoints over the low-level processing
//! modules when integrating smartcrop_palette.
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::core::params::{PaletteOptions, PipelineParams};
use crate::core::processing::pipeline::{PipelineOutput, extract_palette, run_pipeline};
use crate::core::processing::render::ResizeCompositor;
use crate::error::{Error, Result};
use crate::io::reader::{is_supported_image, load_pixel_buffer};
use crate::io::writers::metadata::{CropMetadata, create_metadata_sidecar};
use crate::io::writers::png::write_rgba_png;
use crate::io::writers::write_output;
use crate::types::{PixelBuffer, Rgb};

/// Run the pipeline on a decoded buffer with a compositor built from
/// `params.resample` (no disk I/O).
pub fn process_buffer(buffer: &PixelBuffer, params: &PipelineParams) -> Result<PipelineOutput> {
    let mut compositor = ResizeCompositor::new(params.resample);
    run_pipeline(buffer, params, &mut compositor)
}

/// Decode `input` and run the pipeline in memory.
pub fn process_image_to_buffer(input: &Path, params: &PipelineParams) -> Result<PipelineOutput> {
    let buffer = load_pixel_buffer(input)?;
    process_buffer(&buffer, params)
}

/// Palette of an un-cropped image file.
pub fn extract_palette_from_path(input: &Path, options: &PaletteOptions) -> Result<Vec<Rgb>> {
    let buffer = load_pixel_buffer(input)?;
    Ok(extract_palette(&buffer, options))
}

/// `<stem>.debug.png` next to the output image.
pub fn debug_map_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    output.with_file_name(format!("{stem}.debug.png"))
}

/// Decode `input`, run the pipeline and write the rendered crop to `output`.
/// Writes the JSON sidecar when `params.sidecar` is set and the feature map
/// when `params.crop.debug` is set.
pub fn process_image_to_path(
    input: &Path,
    output: &Path,
    params: &PipelineParams,
) -> Result<PipelineOutput> {
    let buffer = load_pixel_buffer(input)?;
    let result = process_buffer(&buffer, params)?;

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    write_output(params.format, output, &result.rendered)?;

    if params.sidecar {
        let metadata = CropMetadata::from_output(
            Some(input),
            buffer.width(),
            buffer.height(),
            params.format,
            &result,
        );
        create_metadata_sidecar(output, &metadata)?;
    }

    if let Some(crop_debug) = &result.crop.debug {
        let path = debug_map_path(output);
        write_rgba_png(&path, &crop_debug.feature_map)?;
        info!(
            "Wrote feature map {:?} ({} candidates scored)",
            path, crop_debug.candidates
        );
    }

    Ok(result)
}

/// Batch processing report
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchReport {
    pub processed: usize,
    pub skipped: usize,
    pub errors: usize,
}

/// Image files directly inside `input_dir`, sorted by path.
pub fn iterate_images(input_dir: &Path) -> Result<std::vec::IntoIter<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(input_dir).map_err(Error::from)? {
        let entry = entry.map_err(Error::from)?;
        let path = entry.path();
        if path.is_file() && is_supported_image(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files.into_iter())
}

/// Process every image in `input_dir` into `output_dir` as `<stem>.<ext>`.
/// Other directory entries count as skipped. If `continue_on_error` is true,
/// failures are counted in the report and processing continues; otherwise the
/// first error is returned.
pub fn process_directory_to_path(
    input_dir: &Path,
    output_dir: &Path,
    params: &PipelineParams,
    continue_on_error: bool,
) -> Result<BatchReport> {
    std::fs::create_dir_all(output_dir).map_err(Error::from)?;

    let mut report = BatchReport::default();
    let total = std::fs::read_dir(input_dir).map_err(Error::from)?.count();

    for path in iterate_images(input_dir)? {
        let Some(stem) = path.file_stem() else {
            report.skipped += 1;
            continue;
        };
        let output_path = output_dir.join(format!(
            "{}.{}",
            stem.to_string_lossy(),
            params.format.extension()
        ));

        info!("Processing: {:?} -> {:?}", path, output_path);
        match process_image_to_path(&path, &output_path, params) {
            Ok(_) => report.processed += 1,
            Err(e) => {
                warn!("Error processing {:?}: {}", path, e);
                report.errors += 1;
                if !continue_on_error {
                    return Err(e);
                }
            }
        }
    }

    report.skipped += total.saturating_sub(report.processed + report.errors + report.skipped);
    info!(
        "Batch complete: {} processed, {} skipped, {} errors",
        report.processed, report.skipped, report.errors
    );
    Ok(report)
}
