use std::io;
use std::path::PathBuf;

use polars::prelude::{DataType, PolarsError};
use thiserror::Error;

/// Every way the pipeline can stop. None of these are recovered from.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("polars error: {0}")]
    Polars(#[from] PolarsError),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("required column {column:?} is missing from the input")]
    MissingColumn { column: String },
    #[error("required column {column:?} has non-numeric type {dtype}")]
    NonNumericColumn { column: String, dtype: DataType },
    #[error("bin edges for {column:?} must increase monotonically, got {edges:?}")]
    NonMonotonicBins { column: String, edges: Vec<f64> },
    #[error("could not render {path:?}: {message}")]
    Chart { path: PathBuf, message: String },
}

pub type Result<T> = std::result::Result<T, PipelineError>;
