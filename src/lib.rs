#![doc = r##"
smartcrop_palette: content-aware cropping and dominant-color extraction.

This crate picks the most interesting rectangle of an image for a target size
(saliency from skin tones, edge detail and saturation, with a rule-of-thirds
composition weight and optional boost regions), renders that rectangle at the
exact requested size, and reduces pixels to a small palette with median-cut
quantization. It powers the `smartcrop` CLI and can be embedded in your own
Rust applications.

Stability
---------
The public library API is experimental in initial releases and may evolve as
the crate stabilizes. Results are deterministic for a given input and options;
the absolute score values are not part of the contract.

Add dependency
--------------
```toml
[dependencies]
smartcrop_palette = { version = "0.1", features = ["full"] }
```

Quick start: crop an image file
-------------------------------
```rust,no_run
use std::path::Path;
use smartcrop_palette::{process_image_to_path, CropOptions, OutputFormat, PipelineParams};

fn main() -> smartcrop_palette::Result<()> {
    let params = PipelineParams {
        crop: CropOptions::new(1200, 630),
        format: OutputFormat::Jpeg,
        sidecar: true,
        ..PipelineParams::default()
    };

    let output = process_image_to_path(
        Path::new("/data/photo.jpg"),
        Path::new("/out/banner.jpg"),
        &params,
    )?;
    println!("crop: {:?}", output.crop.crop);
    Ok(())
}
```

In-memory buffers
-----------------
```rust
use smartcrop_palette::{find_best_crop, extract_palette, CropOptions, PaletteOptions, PixelBuffer};

fn main() -> smartcrop_palette::Result<()> {
    let buffer = PixelBuffer::filled(1000, 500, [40, 90, 160, 255]);

    let result = find_best_crop(&buffer, &CropOptions::new(200, 200))?;
    assert_eq!(result.crop.width, result.crop.height);

    let palette = extract_palette(&buffer, &PaletteOptions::default());
    assert_eq!(palette[0].to_hex(), "#285aa0");
    Ok(())
}
```

Boost regions
-------------
Known regions of interest (e.g. detected faces) can pull the crop towards them.
Their contribution grows with `weight` and with how much of the region a
candidate covers.

```rust
use smartcrop_palette::{find_best_crop, BoostRegion, CropOptions, PixelBuffer};

fn main() -> smartcrop_palette::Result<()> {
    let buffer = PixelBuffer::filled(400, 100, [128, 128, 128, 255]);
    let face = BoostRegion { x: 300.0, y: 0.0, width: 100.0, height: 100.0, weight: 1.0 };
    let result = find_best_crop(&buffer, &CropOptions::new(100, 100).with_boost(face))?;
    assert!(result.crop.x >= 250);
    Ok(())
}
```

Batch helpers
-------------
```rust,no_run
use std::path::Path;
use smartcrop_palette::{process_directory_to_path, PipelineParams};

fn main() -> smartcrop_palette::Result<()> {
    let report = process_directory_to_path(
        Path::new("/data/photos"),
        Path::new("/out"),
        &PipelineParams::default(),
        true, // continue_on_error
    )?;

    println!("processed={} skipped={} errors={}", report.processed, report.skipped, report.errors);
    Ok(())
}
```

Error handling
--------------
All public functions return `smartcrop_palette::Result<T>`; match on
`smartcrop_palette::Error` to handle specific cases.

```rust
use smartcrop_palette::{find_best_crop, CropOptions, Error, PixelBuffer};

let small = PixelBuffer::filled(100, 100, [0, 0, 0, 255]);
match find_best_crop(&small, &CropOptions::new(200, 200)) {
    Err(Error::InvalidDimensions { reason }) => eprintln!("does not fit: {reason}"),
    Err(other) => eprintln!("other error: {other}"),
    Ok(result) => println!("{:?}", result.crop),
}
```

Feature flags
-------------
- `parallel` (default): score crop candidates on the rayon thread pool. The
  selected crop is identical with or without it.
- `full`: enables a complete feature set for typical end-to-end workflows.

Useful modules
--------------
- [`api`]: high-level, ergonomic entry points.
- [`core`]: parameters and the processing stages (sampler, quantizer, crop search, renderer).
- [`types`]: `PixelBuffer`, `Rgb`, crop/boost rectangles and CLI-facing enums.
- [`io`]: image decoding and PNG/JPEG/TIFF/sidecar writers.
- [`error`]: crate-level `Error` and `Result`.
"##]

// Core modules (public)
pub mod api;
pub mod core;
pub mod error;
pub mod io;
pub mod types;

// Curated public API surface
// Types
pub use crate::core::params::{CropHeuristics, CropOptions, PaletteOptions, PipelineParams};
pub use error::{Error, Result};
pub use types::{
    BoostRegion, Channel, CropCandidate, OutputFormat, PaletteSource, PixelBuffer,
    ResampleFilter, Rgb,
};

// Processing stages
pub use crate::core::processing::crop::{CropDebug, CropResult, CropScore, find_best_crop, find_best_crop_with};
pub use crate::core::processing::pipeline::{PipelineOutput, extract_palette, run_pipeline};
pub use crate::core::processing::quantize::quantize;
pub use crate::core::processing::render::{Compositor, ResizeCompositor, render_crop};
pub use crate::core::processing::sampler::{SampleRegion, sample, sample_region};

// Readers and writers
pub use io::reader::{decode_pixel_buffer, load_pixel_buffer};
pub use io::writers::metadata::{CropMetadata, create_metadata_sidecar};
pub use io::writers::write_output;

// High-level API re-exports
pub use api::{
    BatchReport, extract_palette_from_path, iterate_images, process_buffer,
    process_directory_to_path, process_image_to_buffer, process_image_to_path,
};
