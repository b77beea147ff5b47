//! Error types for Confluence publishing.

use std::path::PathBuf;

use cfpub_document::{DocumentError, LinkError};

/// Error from Confluence API operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfluenceError {
    /// HTTP request failed (network error, timeout, etc).
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] ureq::Error),

    /// HTTP response error (server returned error status).
    #[error("HTTP error: {status} - {body}")]
    HttpResponse {
        /// HTTP status code.
        status: u16,
        /// Response body (may contain error details).
        body: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Response lacks a field the operation depends on.
    #[error("response is missing {0}")]
    MissingField(&'static str),
}

/// Error while creating or updating one page or attachment.
#[derive(Debug, thiserror::Error)]
pub enum UpsertError {
    /// The page names a parent that does not exist in the space.
    #[error("The parent page '{title}' could not be found")]
    ParentNotFound {
        /// Title of the missing parent.
        title: String,
    },

    /// Remote call failed.
    #[error(transparent)]
    Confluence(#[from] ConfluenceError),

    /// Attachment file could not be read.
    #[error("Failed to read attachment {}: {source}", path.display())]
    Io {
        /// Path of the attachment.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Error that stops a publishing run.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// The batch is not publishable.
    #[error(transparent)]
    Input(#[from] DocumentError),

    /// Relative links could not be resolved.
    #[error(transparent)]
    Links(#[from] LinkError),

    /// Publishing a page failed.
    #[error("Failed to publish '{title}': {source}")]
    Page {
        /// Title of the page.
        title: String,
        /// What went wrong.
        source: UpsertError,
    },
}
