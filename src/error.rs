use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpendError {
    #[error("Data file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Missing columns: {}", .0.join(", "))]
    Schema(Vec<String>),

    #[error("Invalid {column} value {value:?} on line {line}")]
    Parse {
        line: u64,
        column: &'static str,
        value: String,
    },

    #[error("Invalid date range: {start} is after {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("Generator error: {0}")]
    Generator(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, SpendError>;
