// crates/airq-core/src/error.rs

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("failed to read input '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("required column '{0}' is missing from the input header")]
    MissingColumn(&'static str),

    #[error("no year-labeled columns found in the input header")]
    NoYearColumns,

    #[error("year {0} is not one of the recognized year columns")]
    UnknownYear(i32),

    #[error("invalid PM2.5 range: min {min} is greater than max {max}")]
    InvalidRange { min: f64, max: f64 },

    #[error("Polars operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
