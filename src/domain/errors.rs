// src/domain/errors.rs
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Exchange error: {0}")]
    Exchange(#[from] ExchangeError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP server error: {0}")]
    Http(#[from] hyper::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failures of a single upstream exchange call.
#[derive(Error, Debug)]
pub enum ExchangeError {
    /// Connection-level failure, nothing usable came back.
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("{method} {url} {status}")]
    UpstreamStatus {
        method: String,
        url: String,
        status: u16,
    },

    /// The exchange answered with its own error envelope.
    #[error("{method} {url} {status} [{code}: {message}]")]
    UpstreamApi {
        method: String,
        url: String,
        status: u16,
        code: String,
        message: String,
    },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("{method} {url} deadline exceeded")]
    DeadlineExceeded { method: String, url: String },
}

impl From<hyper::http::Error> for ExchangeError {
    fn from(err: hyper::http::Error) -> Self {
        ExchangeError::Transport(err.to_string())
    }
}

// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
pub type ExchangeResult<T> = Result<T, ExchangeError>;
