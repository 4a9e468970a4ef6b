//! # dialog-media-dl
//!
//! Extracts voice messages and pictures from an exported chat history.
//!
//! The export is a directory with one folder per conversation, each holding
//! paginated HTML pages. For every one-to-one dialog the pages are parsed,
//! attachment links are fetched over HTTP, and the media is written to
//! `<output>/<dialog name>/voices/<n>.ogg` and `.../pictures/<n>.jpg`.
//!
//! ## Pipeline
//!
//! - [`discovery`] finds dialog folders and their pages, skipping community and group chats
//! - [`parser`] extracts the dialog name and attachment links from a page, without I/O
//! - [`processor`] fetches and writes one dialog's attachments concurrently
//! - [`extractor`] runs dialogs in parallel and aggregates a [`RunReport`]
//!
//! A broken link or a failed write never stops a dialog; a page that fails to
//! parse stops only its own dialog.
//!
//! ## Quick Start
//!
//! ```no_run
//! use dialog_media_dl::{Config, Extractor, RootResolver};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         root: RootResolver::Fixed("Archive".into()),
//!         max_concurrent_downloads: 16,
//!         ..Default::default()
//!     };
//!
//!     let report = Extractor::new(config)?.run().await?;
//!     println!(
//!         "{} dialogs, {} files written",
//!         report.dialogs_processed(),
//!         report.files_written()
//!     );
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Dialog discovery in an export tree
pub mod discovery;
/// Error types
pub mod error;
/// Run driver
pub mod extractor;
/// Attachment fetching
pub mod fetcher;
/// Dialog page parsing
pub mod parser;
/// Per-dialog processing
pub mod processor;
/// Core domain types
pub mod types;
/// Attachment persistence
pub mod writer;

#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export commonly used types
pub use config::{Config, RootResolver};
pub use discovery::{Discovery, discover_dialogs, is_excluded};
pub use error::{Error, FetchError, ParseError, Result};
pub use extractor::Extractor;
pub use fetcher::{AttachmentFetcher, HttpFetcher};
pub use parser::{DialogPage, parse_page, sanitize_dir_name};
pub use processor::{DialogProcessor, OutputIndex, OutputNames, PreparedDialog};
pub use types::{
    AttachmentRef, Dialog, DialogKind, DialogReport, ExcludedDialog, MediaKind, RunReport, Totals,
};
