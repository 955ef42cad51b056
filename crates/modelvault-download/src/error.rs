//! Download error types.
//!
//! Errors are serializable and clonable: a campaign result is stored in a
//! shared single-flight future and delivered to every concurrent caller, so
//! the error type cannot embed `std::io::Error` or other one-shot types.
//! I/O errors capture the kind and message as strings instead.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for download operations.
#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DownloadError {
    /// I/O error during file operations.
    #[error("I/O error ({kind}): {message}")]
    Io {
        /// The kind of I/O error (e.g., "not found", "permission denied").
        kind: String,
        /// Detailed error message.
        message: String,
    },

    /// Network error during transfer.
    #[error("Network error: {message}")]
    Network {
        /// Detailed error message.
        message: String,
        /// HTTP status code if one was received.
        #[serde(skip_serializing_if = "Option::is_none")]
        status_code: Option<u16>,
    },

    /// The final response after redirects was not a success status.
    #[error("HTTP {status} from {url}")]
    HttpStatus {
        /// The status code received.
        status: u16,
        /// The URL that produced it.
        url: String,
    },

    /// The redirect hop budget was exhausted.
    #[error("Too many redirects fetching {url}")]
    TooManyRedirects {
        /// The originally requested URL.
        url: String,
    },

    /// A URL could not be parsed or resolved.
    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl {
        /// The offending URL.
        url: String,
        /// Parse failure detail.
        reason: String,
    },

    /// The asset catalog could not be loaded (zero descriptors).
    #[error("Model catalog could not be loaded from {path}")]
    CatalogUnavailable {
        /// The catalog file path.
        path: String,
    },

    /// The requested asset id is not in the catalog.
    #[error("Unknown asset: {id}")]
    UnknownAsset {
        /// The requested id.
        id: String,
    },

    /// A proxy environment variable held an unusable value.
    #[error("Invalid proxy configuration: {message}")]
    InvalidProxy {
        /// What was wrong.
        message: String,
    },
}

impl DownloadError {
    /// Build an `Io` variant from a std I/O error.
    #[must_use]
    pub fn from_io(err: &std::io::Error) -> Self {
        Self::Io {
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for DownloadError {
    fn from(err: std::io::Error) -> Self {
        Self::from_io(&err)
    }
}

impl From<reqwest::Error> for DownloadError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network {
            message: err.to_string(),
            status_code: err.status().map(|s| s.as_u16()),
        }
    }
}

/// Result alias for download operations.
pub type DownloadResult<T> = Result<T, DownloadError>;
