// Error types for the posadmin data layer.
// Covers durable storage failures, serialization, and sync callback errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PosError {
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("sync failed: {0}")]
    Sync(String),
}

pub type Result<T> = std::result::Result<T, PosError>;
