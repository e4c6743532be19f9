use clap::Parser;
use std::path::PathBuf;

use smartcrop_palette::types::{BoostRegion, OutputFormat, PaletteSource, ResampleFilter};

fn parse_boost(s: &str) -> Result<BoostRegion, String> {
    s.parse::<BoostRegion>()
        .map_err(|_| format!("expected x,y,width,height,weight with weight in [0, 1], got '{s}'"))
}

#[derive(Parser, Debug)]
#[command(
    name = "smartcrop",
    version,
    about = "Content-aware crop and palette extraction"
)]
pub struct CliArgs {
    /// Input image (single file mode)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Input directory containing images (batch mode)
    #[arg(long)]
    pub input_dir: Option<PathBuf>,

    /// Output filename (single file mode)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output directory for batch processing (batch mode)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// JSON parameters file; flags given on the command line override it
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Crop width in pixels [default: 1200]
    #[arg(long)]
    pub width: Option<u32>,

    /// Crop height in pixels [default: 630]
    #[arg(long)]
    pub height: Option<u32>,

    /// Minimal crop scale in (0, 1]; below 1 allows sources smaller than the target [default: 1.0]
    #[arg(long)]
    pub min_scale: Option<f64>,

    /// Disable the rule of thirds composition weight
    #[arg(long, default_value_t = false)]
    pub no_rule_of_thirds: bool,

    /// Boost region as x,y,width,height,weight (repeatable)
    #[arg(long = "boost", value_parser = parse_boost)]
    pub boosts: Vec<BoostRegion>,

    /// Number of palette colors [default: 5]
    #[arg(long)]
    pub palette_size: Option<usize>,

    /// Palette sampling stride in pixels; higher is faster [default: 10]
    #[arg(long)]
    pub quality: Option<usize>,

    /// Sample the palette from the rendered crop or the original image
    #[arg(long, value_enum)]
    pub palette_source: Option<PaletteSource>,

    /// Skip palette extraction
    #[arg(long, default_value_t = false)]
    pub no_palette: bool,

    /// Output format (png, jpeg or tiff)
    #[arg(short = 'f', long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Resampling filter used for prescaling and rendering
    #[arg(long, value_enum)]
    pub resample: Option<ResampleFilter>,

    /// Also write the feature map as <output stem>.debug.png
    #[arg(long, default_value_t = false)]
    pub debug_map: bool,

    /// Write a JSON sidecar with crop, score and palette next to each output
    #[arg(long, default_value_t = false)]
    pub sidecar: bool,

    /// Enable logging (RUST_LOG overrides the default debug level)
    #[arg(long, default_value_t = false)]
    pub log: bool,

    /// Batch mode: continue processing other files when one fails
    #[arg(long, default_value_t = false)]
    pub batch: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_repeated_boosts() {
        let args = CliArgs::try_parse_from([
            "smartcrop",
            "-i",
            "in.png",
            "-o",
            "out.png",
            "--boost",
            "0,0,10,10,0.5",
            "--boost",
            "5,5,20,20,1",
            "--format",
            "jpeg",
        ])
        .unwrap();
        assert_eq!(args.boosts.len(), 2);
        assert_eq!(args.boosts[1].weight, 1.0);
        assert_eq!(args.format, Some(OutputFormat::Jpeg));
    }

    #[test]
    fn rejects_malformed_boost() {
        assert!(CliArgs::try_parse_from(["smartcrop", "--boost", "1,2,3"]).is_err());
        assert!(CliArgs::try_parse_from(["smartcrop", "--boost", "1,2,3,4,2"]).is_err());
    }
}
