//! Export tree fixtures and mock attachment server helpers

use std::path::{Path, PathBuf};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Render a page the way the chat export does: a header link with the
/// interlocutor's name, then one attachment block per URL
pub fn export_page(name: Option<&str>, urls: &[String]) -> String {
    let mut html = String::from(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>Messages</title></head>
<body>
<div class="wrap_page_content">
"#,
    );
    if let Some(name) = name {
        html.push_str(&format!(
            r#"<div class="item"><div class="message" data-id="1">
<div class="message__header"><a href="https://example.com/id1">{}</a>, 1 Jan 2021 at 9:00:00</div>
<div>hello</div></div></div>
"#,
            name
        ));
    }
    for (i, url) in urls.iter().enumerate() {
        html.push_str(&format!(
            r#"<div class="item"><div class="message" data-id="{}">
<div class="message__header">You, 1 Jan 2021 at 9:00:00</div>
<div><div class="kludges"><div class="attachment">
<div class="attachment__description">Attachment</div>
<a class="attachment__link" href="{}">{}</a>
</div></div></div></div></div>
"#,
            i + 2,
            url,
            url
        ));
    }
    html.push_str("</div>\n</body>\n</html>\n");
    html
}

/// Base directory laid out as `<base>/messages/<dialog>/...` with output in `<base>/files`
pub struct ExportTree {
    /// Keeps the directory alive for the test's duration
    pub dir: TempDir,
}

impl ExportTree {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("Failed to create temp dir"),
        }
    }

    pub fn base(&self) -> &Path {
        self.dir.path()
    }

    pub fn output(&self) -> PathBuf {
        self.dir.path().join("files")
    }

    /// Add a page at `messages/<dialog>/<relative>`
    pub fn page(&self, dialog: &str, relative: &str, content: &[u8]) -> &Self {
        let path = self.dir.path().join("messages").join(dialog).join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
        self
    }
}

/// Serve `body` at `route` with status 200
pub async fn serve(server: &MockServer, route: &str, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
        .mount(server)
        .await;
}

/// Answer `route` with an error status
pub async fn fail(server: &MockServer, route: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}

/// Sorted file names directly inside `dir`, empty if it does not exist
pub fn files_in(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
