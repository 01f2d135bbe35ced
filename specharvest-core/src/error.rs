use specharvest_scanner::ScanError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DatasetError {
    #[error("record for '{title}' has {actual} fields, the schema needs {expected}")]
    Arity {
        title: String,
        expected: usize,
        actual: usize,
    },
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error("input has no '{0}' column")]
    MissingColumn(String),

    /// A fatal error after some pages were already written to disk.
    #[error("{source} (partial dataset of {pages} page(s) kept at {})", .path.display())]
    Checkpointed {
        path: PathBuf,
        pages: usize,
        source: Box<PipelineError>,
    },
}

pub type Result<T> = std::result::Result<T, PipelineError>;
