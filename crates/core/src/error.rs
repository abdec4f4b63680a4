//! Error types for Vernissage operations.
//!
//! This module defines the main error type [`VernissageError`] which represents
//! all possible errors that can occur while fetching pages, parsing HTML,
//! talking to the presentation and catalog services, and persisting the ledger.

use thiserror::Error;

/// Main error type for pipeline operations.
///
/// Per-item failures inside a batch run are represented by this type but never
/// abort the batch; the controller catches them, counts the item as skipped,
/// and moves on. Only setup failures (missing credentials, invalid site)
/// surface to the process boundary.
#[derive(Error, Debug)]
pub enum VernissageError {
    /// HTTP request errors from reqwest.
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Request timeout.
    ///
    /// Returned when an HTTP request exceeds the configured timeout duration.
    #[error("Request timed out after {timeout} seconds")]
    Timeout { timeout: u64 },

    /// Invalid URL provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// HTML parsing errors.
    ///
    /// Returned when a CSS selector is invalid or markup cannot be queried.
    #[error("Failed to parse HTML: {0}")]
    HtmlParseError(String),

    /// JSON encoding/decoding errors (ledger file, API payloads).
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// File I/O errors (ledger persistence).
    #[error("Failed to write to file: {0}")]
    WriteError(#[from] std::io::Error),

    /// A remote collaborator (Slides, Drive, Sheets) rejected a call.
    #[error("{service} API error: {message}")]
    ApiError { service: &'static str, message: String },

    /// A presentation was requested for an item with zero qualifying images.
    ///
    /// Callers normally skip such items before reaching the builder; the
    /// builder still refuses them so the contract holds for every caller.
    #[error("No images supplied for presentation")]
    NoImages,

    /// Required credentials could not be resolved. Fatal at setup time.
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),
}

/// Result type alias for VernissageError.
pub type Result<T> = std::result::Result<T, VernissageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = VernissageError::InvalidUrl("not a url".to_string());
        assert!(err.to_string().contains("Invalid URL"));
    }

    #[test]
    fn test_api_error_names_service() {
        let err = VernissageError::ApiError { service: "slides", message: "quota exceeded".to_string() };
        assert!(err.to_string().contains("slides"));
        assert!(err.to_string().contains("quota exceeded"));
    }

    #[test]
    fn test_timeout_error() {
        let err = VernissageError::Timeout { timeout: 10 };
        assert!(err.to_string().contains("10"));
    }
}
