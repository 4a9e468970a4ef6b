//! Dialog discovery in an export tree
//!
//! The export root holds one directory per conversation. The directory name
//! tells what kind of conversation it is (see [`DialogKind`]). Only ordinary
//! one-to-one dialogs are processed. Their pages are the files whose name
//! contains [`PAGE_MARKER`], at any depth below the dialog directory.

use crate::error::Result;
use crate::types::{Dialog, DialogKind, ExcludedDialog, PAGE_MARKER};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Result of scanning an export root
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Discovery {
    /// Eligible dialogs with at least one page, sorted by directory name
    pub dialogs: Vec<Dialog>,
    /// Directories skipped because of their kind
    pub excluded: Vec<ExcludedDialog>,
}

/// Whether a dialog directory is skipped by discovery
///
/// True iff the name starts with `-` (community/bot chat) or with the group-chat prefix.
#[must_use]
pub fn is_excluded(dir_name: &str) -> bool {
    DialogKind::from_dir_name(dir_name).is_excluded()
}

/// Scan `export_root` for dialogs
///
/// Eligible directories without any page are dropped silently.
///
/// # Errors
/// Any traversal error (missing root, permission denied, I/O) aborts the scan
pub fn discover_dialogs(export_root: &Path) -> Result<Discovery> {
    let mut discovery = Discovery::default();

    for entry in WalkDir::new(export_root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        if !entry.file_type().is_dir() {
            continue;
        }

        let dir_name = entry.file_name().to_string_lossy().into_owned();
        let kind = DialogKind::from_dir_name(&dir_name);
        if kind.is_excluded() {
            debug!(dialog = %dir_name, kind = %kind, "skipping excluded chat");
            discovery.excluded.push(ExcludedDialog { dir_name, kind });
            continue;
        }

        let pages = find_pages(entry.path())?;
        if pages.is_empty() {
            debug!(dialog = %dir_name, "dialog has no pages");
            continue;
        }

        discovery.dialogs.push(Dialog {
            dir_name,
            path: entry.into_path(),
            pages,
        });
    }

    Ok(discovery)
}

/// Recursively collect page files below a dialog directory, sorted by path
fn find_pages(dialog_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut pages = Vec::new();
    for entry in WalkDir::new(dialog_dir).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() && entry.file_name().to_string_lossy().contains(PAGE_MARKER)
        {
            pages.push(entry.into_path());
        }
    }
    Ok(pages)
}
