//! Core building blocks: typed parameters (`params`) and the processing
//! stages (`processing`) for palette extraction, crop search and rendering.
//! These are internal primitives consumed by the high-level `api` module.
pub mod params;
pub mod processing;
