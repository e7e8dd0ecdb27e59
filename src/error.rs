use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid period format: {0}")]
    PeriodParse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown dashboard: {0}")]
    UnknownDashboard(String),

    #[error("Invalid record snapshot: {0}")]
    Snapshot(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
