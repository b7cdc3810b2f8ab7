//! Error types for Munger

use thiserror::Error;

use crate::diagnostics::DiagnosticKind;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Reasoning service error: {0}")]
    Service(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Classify this error for the diagnostic channel
    ///
    /// Anything that means "we got a response but could not use it" is a parse
    /// failure; everything else is a service failure.
    pub fn diagnostic_kind(&self) -> DiagnosticKind {
        match self {
            Error::Parse(_) | Error::Json(_) | Error::InvalidData(_) => DiagnosticKind::Parse,
            _ => DiagnosticKind::Service,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
