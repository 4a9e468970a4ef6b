//! Persisting fetched attachments

use std::path::Path;
use tokio::io::AsyncWriteExt;

/// Write `bytes` to `path`, creating or truncating the file
///
/// Parent directories are not created; the processor creates them once per dialog.
/// The file handle is dropped on every return path, after a flush on success.
///
/// # Errors
/// Returns the underlying I/O error if the file cannot be created or written
pub async fn write_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    Ok(())
}
