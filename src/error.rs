use crate::engines::evaluation::stats::StatsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchmiError {
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("Statistical test failed: {0}")]
    Statistics(#[from] StatsError),

    #[error("Data error: {0}")]
    Data(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("Serde error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Export error: {0}")]
    Export(#[from] rust_xlsxwriter::XlsxError),
}

pub type Result<T> = std::result::Result<T, SearchmiError>;
