use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("Gave up on {url} after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        url: String,
        attempts: u32,
        last_error: String,
    },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Pagination control unusable: {0}")]
    Pagination(String),

    #[error("Invalid selector '{selector}': {reason}")]
    Selector { selector: String, reason: String },

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Layout file error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Other error: {0}")]
    Other(String),
}

impl ScanError {
    /// Whether another attempt at the same request could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ScanError::HttpError(e) => !e.is_builder() && !e.is_redirect(),
            ScanError::Status { status, .. } => *status == 429 || (500..=599).contains(status),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
