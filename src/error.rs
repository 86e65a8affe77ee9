// src/error.rs
use thiserror::Error;

/// Errors raised while loading the tables or computing dashboard data.
#[derive(Error, Debug)]
pub enum DashboardError {
    /// No parseable review date anywhere in the record set
    #[error("dataset has no valid review dates")]
    EmptyDataset,

    #[error("missing column: {0}")]
    MissingColumn(String),

    /// The active filter selects no rows
    #[error("filter matches no listings: {0}")]
    InvalidFilterSelection(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("model error: {0}")]
    Model(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DashboardError>;
