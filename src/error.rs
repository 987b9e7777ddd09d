// src/error.rs
//! Error kinds for the extraction pipeline.
//!
//! The session driver and the extractor never let these escape as panics;
//! they come back as values so the runner can decide what to report.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StatsError>;

#[derive(Error, Debug)]
pub enum StatsError {
    // Session
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    #[error("login field not found")]
    LoginFieldMissing,

    #[error("password field not found")]
    PasswordFieldMissing,

    #[error("authentication rejected (still on login page: {url})")]
    AuthenticationRejected { url: String },

    // Extraction
    #[error("failed to parse statistics: {reason}")]
    Extraction { reason: String },

    // Snapshot store
    #[error("snapshot store {path:?}: {reason}")]
    Persistence { path: PathBuf, reason: String },

    // Browser plumbing
    #[error("webdriver {command}: {error}: {message}")]
    WebDriver { command: String, error: String, message: String },

    #[error("HTTP {0}")]
    Http(String),

    #[error("chart rendering failed: {0}")]
    Chart(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl StatsError {
    pub fn extraction(reason: impl Into<String>) -> Self {
        Self::Extraction { reason: reason.into() }
    }

    pub fn persistence(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Persistence { path: path.into(), reason: reason.to_string() }
    }

    /// True for the WebDriver "no such element" answer, which callers
    /// treat as an empty lookup rather than a failure.
    pub fn is_no_such_element(&self) -> bool {
        matches!(self, Self::WebDriver { error, .. } if error == "no such element")
    }
}
