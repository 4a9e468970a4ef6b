//! Core domain types shared across the pipeline

use std::fmt;
use std::ops::AddAssign;
use std::path::PathBuf;

/// Directory name prefix used by the export for community and bot chats
pub const COMMUNITY_PREFIX: &str = "-";

/// Directory name prefix used by the export for group conversations
pub const GROUP_CHAT_PREFIX: &str = "200000";

/// Substring identifying message-export pages inside a dialog directory
pub const PAGE_MARKER: &str = "messages";

/// Classification of a dialog directory, derived from its name
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DialogKind {
    /// Chat with a community or bot (name starts with `-`)
    CommunityChat,
    /// Group conversation (name starts with the group-chat prefix)
    GroupChat,
    /// One-to-one conversation
    OrdinaryDialog,
}

impl DialogKind {
    /// Classify a dialog directory by its name
    ///
    /// # Examples
    ///
    /// ```
    /// use dialog_media_dl::types::DialogKind;
    ///
    /// assert_eq!(DialogKind::from_dir_name("-67890"), DialogKind::CommunityChat);
    /// assert_eq!(DialogKind::from_dir_name("2000000012"), DialogKind::GroupChat);
    /// assert_eq!(DialogKind::from_dir_name("12345"), DialogKind::OrdinaryDialog);
    /// ```
    #[must_use]
    pub fn from_dir_name(name: &str) -> Self {
        if name.starts_with(COMMUNITY_PREFIX) {
            DialogKind::CommunityChat
        } else if name.starts_with(GROUP_CHAT_PREFIX) {
            DialogKind::GroupChat
        } else {
            DialogKind::OrdinaryDialog
        }
    }

    /// Whether dialogs of this kind are skipped by discovery
    #[must_use]
    pub fn is_excluded(self) -> bool {
        !matches!(self, DialogKind::OrdinaryDialog)
    }
}

impl fmt::Display for DialogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DialogKind::CommunityChat => "community",
            DialogKind::GroupChat => "group",
            DialogKind::OrdinaryDialog => "dialog",
        };
        f.write_str(s)
    }
}

/// Media kind of a downloadable attachment
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MediaKind {
    /// Voice message (`ogg`)
    Voice,
    /// Picture (`jpg`)
    Picture,
}

impl MediaKind {
    /// All supported kinds, in output-directory creation order
    pub const ALL: [MediaKind; 2] = [MediaKind::Voice, MediaKind::Picture];

    /// Classify an attachment URL by its trailing three characters
    ///
    /// The raw URL string is matched as is, query string and fragment included.
    /// Returns `None` for unsupported attachments.
    ///
    /// # Examples
    ///
    /// ```
    /// use dialog_media_dl::types::MediaKind;
    ///
    /// assert_eq!(MediaKind::from_url("http://x/a.ogg"), Some(MediaKind::Voice));
    /// assert_eq!(MediaKind::from_url("http://x/b.jpg"), Some(MediaKind::Picture));
    /// assert_eq!(MediaKind::from_url("http://x/b.jpg?size=604x604"), None);
    /// assert_eq!(MediaKind::from_url("http://x/c.mp4"), None);
    /// ```
    #[must_use]
    pub fn from_url(url: &str) -> Option<Self> {
        MediaKind::ALL
            .into_iter()
            .find(|kind| url.ends_with(kind.extension()))
    }

    /// File extension used for both classification and output naming
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            MediaKind::Voice => "ogg",
            MediaKind::Picture => "jpg",
        }
    }

    /// Output subdirectory name under the dialog folder
    #[must_use]
    pub fn dir_name(self) -> &'static str {
        match self {
            MediaKind::Voice => "voices",
            MediaKind::Picture => "pictures",
        }
    }

    /// File name for the attachment with the given index (`3` -> `3.ogg`)
    #[must_use]
    pub fn file_name(self, index: u64) -> String {
        format!("{}.{}", index, self.extension())
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MediaKind::Voice => "voice",
            MediaKind::Picture => "picture",
        };
        f.write_str(s)
    }
}

/// A link to an attachment found on a page
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttachmentRef {
    /// Source URL as written in the page
    pub url: String,
}

impl AttachmentRef {
    /// Create a reference from a URL
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Media kind inferred from the URL, `None` if unsupported
    #[must_use]
    pub fn kind(&self) -> Option<MediaKind> {
        MediaKind::from_url(&self.url)
    }
}

/// One eligible dialog found by discovery
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dialog {
    /// Directory name inside the export root (opaque identifier)
    pub dir_name: String,
    /// Full path of the dialog directory
    pub path: PathBuf,
    /// Page files belonging to this dialog, sorted by path
    pub pages: Vec<PathBuf>,
}

/// Dialog directory skipped by discovery
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExcludedDialog {
    /// Directory name inside the export root
    pub dir_name: String,
    /// Why the directory was skipped
    pub kind: DialogKind,
}

/// Outcome of processing a single dialog
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DialogReport {
    /// Directory name of the dialog
    pub dir_name: String,
    /// Folder name used for the dialog's output
    pub display_name: String,
    /// Voice files written
    pub voices: u64,
    /// Picture files written
    pub pictures: u64,
    /// Attachments skipped because their kind is unsupported
    pub unsupported: u64,
    /// Attachments whose fetch failed
    pub fetch_failures: u64,
    /// Attachments fetched but not persisted
    pub write_failures: u64,
}

impl DialogReport {
    /// Total files written for this dialog
    #[must_use]
    pub fn files_written(&self) -> u64 {
        self.voices + self.pictures
    }

    /// Total attachment-scoped failures for this dialog
    #[must_use]
    pub fn failures(&self) -> u64 {
        self.fetch_failures + self.write_failures
    }

    pub(crate) fn record_written(&mut self, kind: MediaKind) {
        match kind {
            MediaKind::Voice => self.voices += 1,
            MediaKind::Picture => self.pictures += 1,
        }
    }
}

/// Aggregated attachment counters across dialogs
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Totals {
    /// Voice files written
    pub voices: u64,
    /// Picture files written
    pub pictures: u64,
    /// Unsupported attachments skipped
    pub unsupported: u64,
    /// Failed fetches
    pub fetch_failures: u64,
    /// Failed writes
    pub write_failures: u64,
}

impl AddAssign<&DialogReport> for Totals {
    fn add_assign(&mut self, report: &DialogReport) {
        self.voices += report.voices;
        self.pictures += report.pictures;
        self.unsupported += report.unsupported;
        self.fetch_failures += report.fetch_failures;
        self.write_failures += report.write_failures;
    }
}

/// Outcome of a whole extraction run
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Per-dialog reports for dialogs that completed
    pub dialogs: Vec<DialogReport>,
    /// Dialogs whose processing returned an error, with the error message
    pub failed: Vec<(String, String)>,
    /// Directories skipped by classification
    pub excluded: Vec<ExcludedDialog>,
    /// Sum of all completed dialog reports
    pub totals: Totals,
}

impl RunReport {
    /// Record a completed dialog
    pub(crate) fn push(&mut self, report: DialogReport) {
        self.totals += &report;
        self.dialogs.push(report);
    }

    /// Number of dialogs processed successfully
    #[must_use]
    pub fn dialogs_processed(&self) -> usize {
        self.dialogs.len()
    }

    /// Number of dialogs that failed
    #[must_use]
    pub fn dialogs_failed(&self) -> usize {
        self.failed.len()
    }

    /// Total files written across all dialogs
    #[must_use]
    pub fn files_written(&self) -> u64 {
        self.totals.voices + self.totals.pictures
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialog_kind_classification_table() {
        let cases = [
            ("12345", DialogKind::OrdinaryDialog),
            ("-67890", DialogKind::CommunityChat),
            ("-", DialogKind::CommunityChat),
            ("2000000001", DialogKind::GroupChat),
            ("200000", DialogKind::GroupChat),
            ("20000", DialogKind::OrdinaryDialog),
            ("120000012", DialogKind::OrdinaryDialog),
            ("", DialogKind::OrdinaryDialog),
            ("alice", DialogKind::OrdinaryDialog),
        ];

        for (name, expected) in cases {
            assert_eq!(DialogKind::from_dir_name(name), expected, "name: {name:?}");
            assert_eq!(
                DialogKind::from_dir_name(name).is_excluded(),
                name.starts_with('-') || name.starts_with("200000"),
                "name: {name:?}"
            );
        }
    }

    #[test]
    fn test_media_kind_from_url() {
        assert_eq!(MediaKind::from_url("http://x/a.ogg"), Some(MediaKind::Voice));
        assert_eq!(MediaKind::from_url("http://x/b.jpg"), Some(MediaKind::Picture));
        assert_eq!(MediaKind::from_url("http://x/c.mp4"), None);
        assert_eq!(MediaKind::from_url("http://x/d.JPG"), None);
        assert_eq!(MediaKind::from_url("http://x/e.jpeg"), None);
    }

    #[test]
    fn test_media_kind_matches_trailing_characters_of_raw_url() {
        // Query strings and fragments are part of the suffix
        assert_eq!(
            MediaKind::from_url("http://x/a.mp4?fmt=ogg"),
            Some(MediaKind::Voice)
        );
        assert_eq!(MediaKind::from_url("http://x/photo.jpg?size=1"), None);
        assert_eq!(MediaKind::from_url("https://cdn.example.com/voice.ogg#t=3"), None);
        assert_eq!(
            MediaKind::from_url("https://cdn.example.com/x?f=a.jpg"),
            Some(MediaKind::Picture)
        );
        // No dot required, only the last three characters count
        assert_eq!(MediaKind::from_url("http://x/stream_ogg"), Some(MediaKind::Voice));
    }

    #[test]
    fn test_media_kind_short_and_relative_urls() {
        assert_eq!(MediaKind::from_url("relative/a.ogg"), Some(MediaKind::Voice));
        assert_eq!(MediaKind::from_url("jpg"), Some(MediaKind::Picture));
        assert_eq!(MediaKind::from_url("og"), None);
        assert_eq!(MediaKind::from_url(""), None);
    }

    #[test]
    fn test_media_kind_output_naming() {
        assert_eq!(MediaKind::Voice.file_name(1), "1.ogg");
        assert_eq!(MediaKind::Picture.file_name(12), "12.jpg");
        assert_eq!(MediaKind::Voice.dir_name(), "voices");
        assert_eq!(MediaKind::Picture.dir_name(), "pictures");
    }

    #[test]
    fn test_run_report_totals() {
        let mut run = RunReport::default();
        run.push(DialogReport {
            dir_name: "1".into(),
            display_name: "Alice".into(),
            voices: 2,
            pictures: 1,
            unsupported: 1,
            fetch_failures: 1,
            write_failures: 0,
        });
        run.push(DialogReport {
            dir_name: "2".into(),
            display_name: "Bob".into(),
            voices: 0,
            pictures: 3,
            unsupported: 0,
            fetch_failures: 0,
            write_failures: 1,
        });

        assert_eq!(run.dialogs_processed(), 2);
        assert_eq!(run.files_written(), 6);
        assert_eq!(run.totals.fetch_failures, 1);
        assert_eq!(run.totals.write_failures, 1);
        assert_eq!(run.totals.unsupported, 1);
    }
}
