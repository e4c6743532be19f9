use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{BoostRegion, OutputFormat, PaletteSource, ResampleFilter};

/// Tunable constants of the crop scorer.
///
/// The defaults are fixed and callers may rely on the relative ordering they
/// produce; the absolute score values carry no meaning on their own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropHeuristics {
    pub detail_weight: f64,
    /// Reference skin tone as a normalized RGB direction
    pub skin_color: [f64; 3],
    pub skin_bias: f64,
    pub skin_brightness_min: f64,
    pub skin_brightness_max: f64,
    pub skin_threshold: f64,
    pub skin_weight: f64,
    pub saturation_brightness_min: f64,
    pub saturation_brightness_max: f64,
    pub saturation_threshold: f64,
    pub saturation_bias: f64,
    pub saturation_weight: f64,
    /// Side of the square cell the feature map is averaged into before scoring
    pub score_down_sample: u32,
    /// Candidate position grid step, in analysis pixels
    pub step: u32,
    pub scale_step: f64,
    pub max_scale: f64,
    pub edge_radius: f64,
    pub edge_weight: f64,
    pub outside_importance: f64,
    pub boost_weight: f64,
    /// Downscale the source before analysis so its short side is about `prescale_size`
    pub prescale: bool,
    pub prescale_size: u32,
}

impl Default for CropHeuristics {
    fn default() -> Self {
        Self {
            detail_weight: 0.2,
            skin_color: [0.78, 0.57, 0.44],
            skin_bias: 0.01,
            skin_brightness_min: 0.2,
            skin_brightness_max: 1.0,
            skin_threshold: 0.8,
            skin_weight: 1.8,
            saturation_brightness_min: 0.05,
            saturation_brightness_max: 0.9,
            saturation_threshold: 0.4,
            saturation_bias: 0.2,
            saturation_weight: 0.1,
            score_down_sample: 8,
            step: 8,
            scale_step: 0.1,
            max_scale: 1.0,
            edge_radius: 0.4,
            edge_weight: -20.0,
            outside_importance: -0.5,
            boost_weight: 100.0,
            prescale: true,
            prescale_size: 256,
        }
    }
}

/// Options for a single smart crop search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropOptions {
    /// Width of the crop you want to use
    pub width: u32,
    /// Height of the crop you want to use
    pub height: u32,
    /// Minimal scale of the crop rect; 1.0 prevents smaller than necessary crops
    pub min_scale: f64,
    /// Regions whose interestingness is boosted
    pub boosts: Vec<BoostRegion>,
    /// Set to false to turn off the rule of thirds composition weight
    pub rule_of_thirds: bool,
    /// Return the feature map and candidate count alongside the result
    pub debug: bool,
    pub heuristics: CropHeuristics,
}

impl CropOptions {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn with_min_scale(mut self, min_scale: f64) -> Self {
        self.min_scale = min_scale;
        self
    }

    pub fn with_boost(mut self, boost: BoostRegion) -> Self {
        self.boosts.push(boost);
        self
    }

    pub fn with_rule_of_thirds(mut self, enabled: bool) -> Self {
        self.rule_of_thirds = enabled;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

impl Default for CropOptions {
    /// Open Graph banner size (1200x630).
    fn default() -> Self {
        Self {
            width: 1200,
            height: 630,
            min_scale: 1.0,
            boosts: Vec::new(),
            rule_of_thirds: true,
            debug: false,
            heuristics: CropHeuristics::default(),
        }
    }
}

/// Palette extraction options. The region fields select a sub-rectangle of
/// the analysed buffer; `None` width/height mean "to the right/bottom edge".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaletteOptions {
    /// Pixels from the left side
    pub x: u32,
    /// Pixels from the top
    pub y: u32,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// How many colors as output
    pub size: usize,
    /// Sampling stride in pixels; higher is faster and coarser
    pub quality: usize,
}

impl Default for PaletteOptions {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            width: None,
            height: None,
            size: 5,
            quality: 10,
        }
    }
}

/// Processing parameters suitable for config files and CLI presets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineParams {
    pub crop: CropOptions,
    /// None skips palette extraction
    pub palette: Option<PaletteOptions>,
    pub palette_source: PaletteSource,
    pub format: OutputFormat,
    pub resample: ResampleFilter,
    /// Write a JSON sidecar with the crop and palette next to the output
    pub sidecar: bool,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            crop: CropOptions::default(),
            palette: Some(PaletteOptions::default()),
            palette_source: PaletteSource::Cropped,
            format: OutputFormat::Png,
            resample: ResampleFilter::Bilinear,
            sidecar: false,
        }
    }
}

impl PipelineParams {
    /// Load parameters from a JSON file; missing fields take their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn to_json_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let params: PipelineParams =
            serde_json::from_str(r#"{ "crop": { "width": 200, "height": 100 }, "format": "jpeg" }"#)
                .unwrap();
        assert_eq!(params.crop.width, 200);
        assert_eq!(params.crop.height, 100);
        assert_eq!(params.crop.min_scale, 1.0);
        assert!(params.crop.rule_of_thirds);
        assert_eq!(params.format, OutputFormat::Jpeg);
        assert_eq!(params.palette, Some(PaletteOptions::default()));
        assert_eq!(params.crop.heuristics, CropHeuristics::default());
    }

    #[test]
    fn json_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");
        let params = PipelineParams {
            palette: None,
            sidecar: true,
            ..PipelineParams::default()
        };
        params.to_json_file(&path).unwrap();
        assert_eq!(PipelineParams::from_json_file(&path).unwrap(), params);
    }
}
