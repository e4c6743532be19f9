//! Command Line Interface (CLI) layer for smartcrop.
//!
//! This module defines argument parsing (`args`), error types (`errors`),
//! and the orchestration logic (`runner`) for single-file and batch
//! processing flows. Flags are layered over an optional JSON config and
//! handed to `smartcrop_palette::api`.
//!
//! If you are embedding the crop and palette pipeline into another
//! application, prefer the high-level `smartcrop_palette::api` module.
pub mod args;
pub mod errors;
pub mod runner;

pub use args::CliArgs;
pub use runner::run;
