// src/error.rs

//! Unified error handling for the link checker.

use std::fmt;

use thiserror::Error;

use crate::models::SetId;

/// Result type alias for link checker operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Link set id is unknown to the store
    #[error("link set {id} not found")]
    NotFound { id: SetId },

    /// URL is not a member of an otherwise known link set
    #[error("url {url} is not found in link set {id}")]
    LinkNotFound { id: SetId, url: String },

    /// Snapshot could not be written or read back
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Report could not be rendered
    #[error("Report error: {0}")]
    Report(String),

    /// Request or data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a persistence error with context.
    pub fn persistence(context: impl fmt::Display, cause: impl fmt::Display) -> Self {
        Self::Persistence(format!("{context}: {cause}"))
    }

    /// Create a report rendering error.
    pub fn report(cause: impl fmt::Display) -> Self {
        Self::Report(cause.to_string())
    }

    /// Whether the error only signals a missing set or link.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::LinkNotFound { .. })
    }
}
