use thiserror::Error;

#[derive(Error, Debug)]
pub enum CistatError {
    #[error("query service returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("query service returned status {status} after {retries} retries")]
    ApiAfterRetries { status: u16, retries: u32 },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("misaligned query result: column '{column}' has {actual} rows, expected {expected}")]
    ColumnMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("no classification delays left after filtering; nothing to report")]
    NoData,

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CistatError>;
