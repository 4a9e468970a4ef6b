//! Error types for dialog-media-dl
//!
//! Errors are split by how far they propagate:
//! - [`Error`] is returned by run-level and dialog-level operations
//! - [`FetchError`] and write failures are attachment-scoped and never abort a dialog
//! - [`ParseError`] is raised by the page parser and aborts only the dialog it belongs to

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for dialog-media-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for dialog-media-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "max_concurrent_downloads")
        key: Option<String>,
    },

    /// Configuration file could not be deserialized
    #[error("invalid configuration file: {0}")]
    ConfigFormat(#[from] toml::de::Error),

    /// The base directory of the export could not be resolved
    #[error("failed to resolve export root: {0}")]
    RootResolution(String),

    /// Walking the export tree failed (permission denied, I/O error, ...)
    #[error("failed to walk export tree: {0}")]
    Traversal(#[from] walkdir::Error),

    /// A page of a dialog could not be read
    #[error("failed to read page {path}: {source}")]
    PageRead {
        /// The page that could not be read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A page of a dialog is not a valid export page
    #[error("failed to parse page {path}: {source}")]
    PageParse {
        /// The page that failed to parse
        path: PathBuf,
        /// Underlying parse error
        #[source]
        source: ParseError,
    },

    /// Output directory for a dialog could not be created
    #[error("failed to create output directory {path}: {source}")]
    CreateDir {
        /// The directory that could not be created
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A background dialog task panicked or was cancelled
    #[error("dialog task failed: {0}")]
    Task(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Attachment fetch failures
///
/// These are recoverable: the processor logs them and moves on to the next attachment.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The server answered with something other than `200 OK`
    #[error("received non-200 status {status} for {url}")]
    Status {
        /// The requested URL
        url: String,
        /// The HTTP status code returned by the server
        status: u16,
    },

    /// Connection, DNS, timeout or body read failure
    #[error("transport error fetching {url}: {source}")]
    Transport {
        /// The requested URL
        url: String,
        /// Underlying HTTP client error
        #[source]
        source: reqwest::Error,
    },

    /// The HTTP client could not be constructed
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

impl FetchError {
    /// Status code of a non-success response, if this was one
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Page parsing failures
#[derive(Debug, Error)]
pub enum ParseError {
    /// Page bytes are not UTF-8 text
    #[error("page is not valid UTF-8 (at byte {valid_up_to})")]
    NotUtf8 {
        /// Length of the longest valid UTF-8 prefix
        valid_up_to: usize,
    },

    /// Page contains no markup at all
    #[error("page is empty")]
    Empty,
}

impl Error {
    /// Whether this error should stop the whole run rather than a single dialog
    ///
    /// Only a page that fails to parse is confined to its dialog. Unreadable pages,
    /// directory creation failures and traversal errors point at a broken export or
    /// output location and abort the run.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::PageParse { .. })
    }
}
