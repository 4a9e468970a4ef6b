//! Dialog page parsing
//!
//! Extraction is pure: [`parse_page`] turns page bytes into a [`DialogPage`] and
//! performs no I/O. Fetching and writing happen afterwards in the processor.

use crate::error::ParseError;
use crate::types::AttachmentRef;
use scraper::{Html, Selector};
use std::sync::LazyLock;

/// Selector for the anchor holding the interlocutor's name in a message header
const DIALOG_NAME_SELECTOR: &str = "div.message__header > a";

/// Selector for attachment links
const ATTACHMENT_SELECTOR: &str = ".attachment__link";

static DIALOG_NAME: LazyLock<Selector> = LazyLock::new(|| compile(DIALOG_NAME_SELECTOR));
static ATTACHMENT: LazyLock<Selector> = LazyLock::new(|| compile(ATTACHMENT_SELECTOR));

#[allow(clippy::expect_used)]
fn compile(selector: &str) -> Selector {
    // Selectors are compile-time constants covered by tests
    Selector::parse(selector).expect("static selector must be valid")
}

/// Data extracted from one page of a dialog export
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DialogPage {
    /// Text of the first message-header link, if the page has one
    pub display_name: Option<String>,
    /// Attachment links in document order
    pub attachments: Vec<AttachmentRef>,
}

/// Parse an exported dialog page
///
/// # Errors
/// Returns [`ParseError`] if the bytes are not UTF-8 text or contain no markup
///
/// # Examples
///
/// ```
/// use dialog_media_dl::parser::parse_page;
///
/// let html = br#"<div class="message__header"><a href="/id1">Alice</a></div>
///     <a class="attachment__link" href="http://x/a.ogg">voice</a>"#;
/// let page = parse_page(html).unwrap();
/// assert_eq!(page.display_name.as_deref(), Some("Alice"));
/// assert_eq!(page.attachments[0].url, "http://x/a.ogg");
/// ```
pub fn parse_page(bytes: &[u8]) -> Result<DialogPage, ParseError> {
    let text = std::str::from_utf8(bytes).map_err(|e| ParseError::NotUtf8 {
        valid_up_to: e.valid_up_to(),
    })?;
    if text.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    let document = Html::parse_document(text);

    let display_name = document
        .select(&DIALOG_NAME)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|name| !name.is_empty());

    let attachments = document
        .select(&ATTACHMENT)
        .filter_map(|el| el.value().attr("href"))
        .map(AttachmentRef::new)
        .collect();

    Ok(DialogPage {
        display_name,
        attachments,
    })
}

/// Turn a scraped display name into a single safe path component
///
/// Path separators, NUL, control characters and characters reserved on Windows
/// are replaced with `_`. Surrounding whitespace and trailing dots are trimmed.
/// Falls back to `fallback` when nothing usable remains.
///
/// # Examples
///
/// ```
/// use dialog_media_dl::parser::sanitize_dir_name;
///
/// assert_eq!(sanitize_dir_name("Alice Smith", "123"), "Alice Smith");
/// assert_eq!(sanitize_dir_name("../etc/passwd", "123"), ".._etc_passwd");
/// assert_eq!(sanitize_dir_name("..", "123"), "123");
/// ```
#[must_use]
pub fn sanitize_dir_name(name: &str, fallback: &str) -> String {
    const RESERVED: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

    let replaced: String = name
        .chars()
        .map(|c| {
            if c.is_control() || RESERVED.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect();

    let trimmed = replaced.trim().trim_end_matches('.').trim_end();

    if trimmed.is_empty() || trimmed == "." || trimmed == ".." {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}
