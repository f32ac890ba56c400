//! Error types for the Notion client.

use thiserror::Error;

/// Result type for Notion client operations.
pub type Result<T> = std::result::Result<T, NotionError>;

/// Notion client errors.
#[derive(Debug, Error)]
pub enum NotionError {
    /// Non-2xx response from the API.
    #[error("Notion API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Transport failure (connection, timeout, malformed response body).
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
}
