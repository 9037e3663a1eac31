//! Brief - A client library for the Legal Document AI Assistant.
//!
//! This library provides the document-lifecycle core used by the `brief`
//! binary: uploading documents, keeping the document list in sync with the
//! backend, driving AI analysis and follow-up questions, bulk deletion, and
//! the view routing that ties them together.

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;
pub mod models;
pub mod registry;
pub mod router;
pub mod selection;
pub mod session;
#[cfg(feature = "tui")]
pub mod tui;
pub mod upload;


/// Library-level error type for Brief operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Backend returned {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unexpected response from server: {0}")]
    UnexpectedResponse(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unsupported file type: {0} (accepted: .pdf, .doc, .docx, .txt)")]
    UnsupportedFile(String),

    #[error("{0} already in progress")]
    Busy(&'static str),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Validation failures are caught before any request is issued.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::InvalidInput(_) | Error::UnsupportedFile(_))
    }

    /// Whether the failure came from talking to the backend.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Error::Transport(_)
                | Error::Status { .. }
                | Error::NotFound(_)
                | Error::UnexpectedResponse(_)
        )
    }
}

/// Result type alias for Brief operations.
pub type Result<T> = std::result::Result<T, Error>;
