//! Per-dialog processing: parse pages, fetch attachments, persist them
//!
//! A dialog is processed in two stages:
//! 1. [`prepare`](DialogProcessor::prepare) reads and parses every page (any failure
//!    aborts the dialog) and settles the output folder name
//! 2. [`download`](DialogProcessor::download) creates the `voices` and `pictures`
//!    output directories, then fetches and writes supported attachments concurrently
//!
//! Between the stages a run claims folder names through [`OutputNames`], so two
//! dialogs with the same display name never share a folder.
//!
//! Output files are numbered per kind through an [`OutputIndex`]. An index is taken
//! only after the fetch succeeded, so broken links leave no gaps. A write failure
//! after the index was taken leaves a gap.

use crate::error::{Error, Result};
use crate::fetcher::AttachmentFetcher;
use crate::parser::{parse_page, sanitize_dir_name};
use crate::types::{AttachmentRef, Dialog, DialogReport, MediaKind};
use crate::writer::write_file;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};


/// Per-dialog, per-kind counters used to name output files
///
/// Starts at zero; [`next`](Self::next) returns 1 on its first call for a kind.
/// Increments are atomic, so concurrent downloads never receive the same index.
#[derive(Debug, Default)]
pub struct OutputIndex {
    voices: AtomicU64,
    pictures: AtomicU64,
}

impl OutputIndex {
    /// Create a fresh index with both counters at zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the next index for `kind`
    pub fn next(&self, kind: MediaKind) -> u64 {
        let counter = match kind {
            MediaKind::Voice => &self.voices,
            MediaKind::Picture => &self.pictures,
        };
        counter.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// Result of handling one attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Written(MediaKind),
    FetchFailed,
    WriteFailed,
}

/// Output folder names claimed by the dialogs of one run
///
/// Names compare case-insensitively, so two dialogs never land in one folder on a
/// case-insensitive filesystem either.
#[derive(Debug, Default)]
pub struct OutputNames {
    claimed: HashSet<String>,
}

impl OutputNames {
    /// Create an empty set of claims
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim a folder for the dialog stored in `dir_name`
    ///
    /// Returns `name` if it is still free, otherwise `<name> (<dir_name>)`,
    /// followed by ` 2`, ` 3`, ... until the result is free.
    pub fn claim(&mut self, name: &str, dir_name: &str) -> String {
        if self.claimed.insert(name.to_lowercase()) {
            return name.to_string();
        }

        let base = format!("{} ({})", name, dir_name);
        let mut candidate = base.clone();
        let mut n = 2u32;
        while !self.claimed.insert(candidate.to_lowercase()) {
            candidate = format!("{} {}", base, n);
            n += 1;
        }

        warn!(
            dialog = %dir_name,
            name = %name,
            folder = %candidate,
            "display name already taken, using a distinct folder"
        );
        candidate
    }
}

/// A dialog whose pages were read and parsed, ready for downloading
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedDialog {
    /// Dialog directory name in the export
    pub dir_name: String,
    /// Folder under the output root, already sanitized
    pub folder_name: String,
    /// Attachments across all pages, in page order
    pub attachments: Vec<AttachmentRef>,
}

/// Pages of a dialog after parsing
struct ParsedDialog {
    display_name: Option<String>,
    attachments: Vec<AttachmentRef>,
}

/// Processes dialogs into `<output_root>/<display name>/{voices,pictures}`
#[derive(Clone)]
pub struct DialogProcessor {
    fetcher: Arc<dyn AttachmentFetcher>,
    output_root: PathBuf,
    max_concurrent_downloads: usize,
}

impl DialogProcessor {
    /// Create a processor writing below `output_root`
    ///
    /// `max_concurrent_downloads` is clamped to at least 1.
    pub fn new(
        fetcher: Arc<dyn AttachmentFetcher>,
        output_root: impl Into<PathBuf>,
        max_concurrent_downloads: usize,
    ) -> Self {
        Self {
            fetcher,
            output_root: output_root.into(),
            max_concurrent_downloads: max_concurrent_downloads.max(1),
        }
    }

    /// Root directory dialogs are written under
    #[must_use]
    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Process one dialog on its own, without claiming its folder name
    ///
    /// Fetch and write failures are counted in the returned report and never
    /// abort the dialog.
    ///
    /// # Errors
    /// Returns an error if a page cannot be read or parsed, or if the output
    /// directories cannot be created
    pub async fn process(&self, dialog: &Dialog) -> Result<DialogReport> {
        let prepared = self.prepare(dialog).await?;
        self.download(prepared).await
    }

    /// Read and parse every page of `dialog` and pick its output folder name
    ///
    /// The first display name found on any page wins; without one the dialog
    /// directory name is used. Nothing is fetched or written.
    ///
    /// # Errors
    /// Returns an error if a page cannot be read or parsed
    pub async fn prepare(&self, dialog: &Dialog) -> Result<PreparedDialog> {
        info!(
            dialog = %dialog.dir_name,
            pages = dialog.pages.len(),
            "processing dialog"
        );

        let parsed = read_pages(&dialog.pages).await?;

        let folder_name = sanitize_dir_name(
            parsed.display_name.as_deref().unwrap_or_default(),
            &dialog.dir_name,
        );
        if parsed.display_name.is_none() {
            warn!(
                dialog = %dialog.dir_name,
                "no display name found, using directory name"
            );
        }

        Ok(PreparedDialog {
            dir_name: dialog.dir_name.clone(),
            folder_name,
            attachments: parsed.attachments,
        })
    }

    /// Create the output directories of a prepared dialog and materialize its attachments
    ///
    /// # Errors
    /// Returns an error if the output directories cannot be created
    pub async fn download(&self, dialog: PreparedDialog) -> Result<DialogReport> {
        let dialog_dir = self.output_root.join(&dialog.folder_name);
        for kind in MediaKind::ALL {
            let dir = dialog_dir.join(kind.dir_name());
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|source| Error::CreateDir { path: dir, source })?;
        }

        let mut report = DialogReport {
            dir_name: dialog.dir_name,
            display_name: dialog.folder_name,
            ..Default::default()
        };

        let mut supported = Vec::with_capacity(dialog.attachments.len());
        for attachment in dialog.attachments {
            match attachment.kind() {
                Some(kind) => supported.push((kind, attachment.url)),
                None => report.unsupported += 1,
            }
        }

        let index = OutputIndex::new();
        let outcomes: Vec<Outcome> = stream::iter(supported)
            .map(|(kind, url)| self.save_attachment(&dialog_dir, &index, kind, url))
            .buffer_unordered(self.max_concurrent_downloads)
            .collect()
            .await;

        for outcome in outcomes {
            match outcome {
                Outcome::Written(kind) => report.record_written(kind),
                Outcome::FetchFailed => report.fetch_failures += 1,
                Outcome::WriteFailed => report.write_failures += 1,
            }
        }

        info!(
            dialog = %report.dir_name,
            name = %report.display_name,
            voices = report.voices,
            pictures = report.pictures,
            failures = report.failures(),
            "dialog processed"
        );

        Ok(report)
    }

    async fn save_attachment(
        &self,
        dialog_dir: &Path,
        index: &OutputIndex,
        kind: MediaKind,
        url: String,
    ) -> Outcome {
        let bytes = match self.fetcher.fetch(&url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(url = %url, error = %e, "skipping attachment, fetch failed");
                return Outcome::FetchFailed;
            }
        };

        let path = dialog_dir
            .join(kind.dir_name())
            .join(kind.file_name(index.next(kind)));

        match write_file(&path, &bytes).await {
            Ok(()) => {
                debug!(url = %url, path = %path.display(), size = bytes.len(), "attachment saved");
                Outcome::Written(kind)
            }
            Err(e) => {
                warn!(url = %url, path = %path.display(), error = %e, "failed to write attachment");
                Outcome::WriteFailed
            }
        }
    }
}

/// Read and parse every page; the first page with a display name sets it
async fn read_pages(pages: &[PathBuf]) -> Result<ParsedDialog> {
    let mut display_name: Option<String> = None;
    let mut attachments = Vec::new();

    for path in pages {
        let bytes = tokio::fs::read(path).await.map_err(|source| Error::PageRead {
            path: path.clone(),
            source,
        })?;

        let page = parse_page(&bytes).map_err(|source| Error::PageParse {
            path: path.clone(),
            source,
        })?;

        if display_name.is_none() {
            display_name = page.display_name;
        }
        attachments.extend(page.attachments);
    }

    Ok(ParsedDialog {
        display_name,
        attachments,
    })
}
