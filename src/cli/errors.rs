use thiserror::Error;

/// Application-specific errors for the CLI
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Missing required argument: {arg}")]
    MissingArgument { arg: String },

    #[error("Invalid value for {arg}: {value}")]
    InvalidValue { arg: String, value: String },

    #[error("Batch finished with {errors} failed file(s)")]
    BatchFailures { errors: usize },

    #[error(transparent)]
    Library(#[from] smartcrop_palette::Error),
}
