//! Processing stages in dependency order: pixel sampling and median-cut
//! quantization for palettes, feature analysis and candidate scoring for the
//! crop search, compositor-backed rendering, and the orchestrating pipeline.
pub mod crop;
pub mod features;
pub mod pipeline;
pub mod quantize;
pub mod render;
pub mod sampler;
