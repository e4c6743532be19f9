use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::processing::crop::CropScore;
use crate::core::processing::pipeline::PipelineOutput;
use crate::error::Result;
use crate::types::{CropCandidate, OutputFormat};

/// Crop and palette record written next to a rendered image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropMetadata {
    pub source: Option<String>,
    pub source_width: u32,
    pub source_height: u32,
    pub output_width: u32,
    pub output_height: u32,
    pub format: OutputFormat,
    pub crop: CropCandidate,
    pub score: CropScore,
    /// Lowercase `#rrggbb` entries in palette order
    pub palette: Option<Vec<String>>,
    pub generated_at: String,
}

impl CropMetadata {
    pub fn from_output(
        source: Option<&Path>,
        source_width: u32,
        source_height: u32,
        format: OutputFormat,
        output: &PipelineOutput,
    ) -> Self {
        Self {
            source: source.map(|p| p.display().to_string()),
            source_width,
            source_height,
            output_width: output.rendered.width(),
            output_height: output.rendered.height(),
            format,
            crop: output.crop.crop,
            score: output.crop.score,
            palette: output
                .palette
                .as_ref()
                .map(|colors| colors.iter().map(|c| c.to_hex()).collect()),
            generated_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Path of the JSON sidecar for an output image.
pub fn sidecar_path(output_path: &Path) -> PathBuf {
    output_path.with_extension("json")
}

/// Write `metadata` as pretty JSON beside `output_path`; returns the sidecar path.
pub fn create_metadata_sidecar(output_path: &Path, metadata: &CropMetadata) -> Result<PathBuf> {
    let sidecar_path = sidecar_path(output_path);
    let json_string = serde_json::to_string_pretty(metadata)?;
    std::fs::write(&sidecar_path, json_string)?;
    info!("Created metadata sidecar: {:?}", sidecar_path);
    Ok(sidecar_path)
}
