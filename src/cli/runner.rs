use std::path::Path;

use tracing::info;
use tracing_subscriber::EnvFilter;

use smartcrop_palette::api::{process_directory_to_path, process_image_to_path};
use smartcrop_palette::core::params::{PaletteOptions, PipelineParams};

use super::args::CliArgs;
use super::errors::AppError;

/// Defaults, then the config file, then explicit flags.
pub fn build_params(args: &CliArgs) -> Result<PipelineParams, AppError> {
    let mut params = match &args.config {
        Some(path) => {
            info!("Loading parameters from {:?}", path);
            PipelineParams::from_json_file(path)?
        }
        None => PipelineParams::default(),
    };

    if let Some(width) = args.width {
        params.crop.width = width;
    }
    if let Some(height) = args.height {
        params.crop.height = height;
    }
    if let Some(min_scale) = args.min_scale {
        if !(min_scale > 0.0 && min_scale <= 1.0) {
            return Err(AppError::InvalidValue {
                arg: "--min-scale".to_string(),
                value: min_scale.to_string(),
            });
        }
        params.crop.min_scale = min_scale;
    }
    if args.no_rule_of_thirds {
        params.crop.rule_of_thirds = false;
    }
    params.crop.boosts.extend(args.boosts.iter().copied());
    if args.debug_map {
        params.crop.debug = true;
    }

    if args.no_palette {
        params.palette = None;
    } else if args.palette_size.is_some() || args.quality.is_some() {
        let palette = params.palette.get_or_insert_with(PaletteOptions::default);
        if let Some(size) = args.palette_size {
            palette.size = size;
        }
        if let Some(quality) = args.quality {
            palette.quality = quality;
        }
    }
    if let Some(source) = args.palette_source {
        params.palette_source = source;
    }
    if let Some(format) = args.format {
        params.format = format;
    }
    if let Some(resample) = args.resample {
        params.resample = resample;
    }
    if args.sidecar {
        params.sidecar = true;
    }

    Ok(params)
}

fn process_single_file(input: &Path, output: &Path, params: &PipelineParams) -> Result<(), AppError> {
    let result = process_image_to_path(input, output, params)?;
    let crop = result.crop.crop;
    println!(
        "crop: x={} y={} width={} height={}",
        crop.x, crop.y, crop.width, crop.height
    );
    if let Some(palette) = &result.palette {
        let hex: Vec<String> = palette.iter().map(|c| c.to_hex()).collect();
        println!("palette: {}", hex.join(" "));
    }
    Ok(())
}

pub fn run(args: CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    if args.log {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let params = build_params(&args)?;
    let batch_mode = args.batch || args.input_dir.is_some();

    if batch_mode {
        let input_dir = args.input_dir.ok_or(AppError::MissingArgument {
            arg: "--input-dir".to_string(),
        })?;
        let output_dir = args.output_dir.ok_or(AppError::MissingArgument {
            arg: "--output-dir".to_string(),
        })?;

        info!("Starting batch processing from directory: {:?}", input_dir);
        info!("Output directory: {:?}", output_dir);

        let report = process_directory_to_path(&input_dir, &output_dir, &params, args.batch)?;

        info!("Batch processing complete!");
        info!("Processed: {}", report.processed);
        info!("Skipped: {}", report.skipped);
        info!("Errors: {}", report.errors);
        if report.errors > 0 {
            return Err(AppError::BatchFailures {
                errors: report.errors,
            }
            .into());
        }
    } else {
        let input = args.input.ok_or(AppError::MissingArgument {
            arg: "--input".to_string(),
        })?;
        let output = args.output.ok_or(AppError::MissingArgument {
            arg: "--output".to_string(),
        })?;

        process_single_file(&input, &output, &params)?;
        info!("Successfully processed: {:?} -> {:?}", input, output);
    }

    Ok(())
}
