use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A group, tab or window lookup missed.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The operation targets a protected system or synthetic group.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Nothing eligible to capture.
    #[error("Nothing to shelve: {0}")]
    Empty(String),

    /// The browser rejected a tab/window operation.
    #[error("Browser operation failed: {0}")]
    External(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;
