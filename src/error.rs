//! Error handling and custom error types
//!
//! Provides unified error handling across the application using thiserror.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Validation(String),

    #[error("A generation request is already in progress")]
    ConcurrentSubmission,

    #[error("{0}")]
    Transport(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] dotenvy::Error),
}

impl Error {
    /// True for failures of the outbound call itself (network, status, body).
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Http(_) | Error::Transport(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
