//! Run driver: discovery, parallel dialog processing, reporting

use crate::config::Config;
use crate::discovery::discover_dialogs;
use crate::error::{Error, Result};
use crate::fetcher::{AttachmentFetcher, HttpFetcher};
use crate::processor::{DialogProcessor, OutputNames, PreparedDialog};
use crate::types::{Dialog, RunReport};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info};

/// Extracts media from every eligible dialog of an export
///
/// # Example
///
/// ```no_run
/// use dialog_media_dl::{Config, Extractor, RootResolver};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Config {
///     root: RootResolver::Fixed("/home/me/Archive".into()),
///     ..Default::default()
/// };
/// let report = Extractor::new(config)?.run().await?;
/// println!("{} files written", report.files_written());
/// # Ok(())
/// # }
/// ```
pub struct Extractor {
    config: Config,
    fetcher: Arc<dyn AttachmentFetcher>,
}

impl Extractor {
    /// Create an extractor fetching over HTTP
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or the HTTP client cannot be built
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let fetcher = HttpFetcher::new(&config).map_err(|e| Error::Config {
            message: e.to_string(),
            key: None,
        })?;
        Ok(Self {
            config,
            fetcher: Arc::new(fetcher),
        })
    }

    /// Create an extractor with a custom fetcher
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid
    pub fn with_fetcher(config: Config, fetcher: Arc<dyn AttachmentFetcher>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, fetcher })
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Resolve the roots from the configuration and run
    ///
    /// # Errors
    /// See [`run_on`](Self::run_on)
    pub async fn run(&self) -> Result<RunReport> {
        let (export_root, output_root) = self.config.resolve_roots()?;
        self.run_on(&export_root, &output_root).await
    }

    /// Process every eligible dialog below `export_root` into `output_root`
    ///
    /// Every dialog's pages are parsed first, then output folders are claimed in
    /// directory order and attachments are downloaded. Both stages run dialogs in
    /// parallel, at most `max_concurrent_dialogs` at a time. A dialog whose page fails
    /// to parse is recorded in [`RunReport::failed`] and the run goes on.
    ///
    /// # Errors
    /// Traversal errors, unreadable pages and output directory failures abort the
    /// run; dialogs still in flight are cancelled.
    pub async fn run_on(&self, export_root: &Path, output_root: &Path) -> Result<RunReport> {
        info!(
            export_root = %export_root.display(),
            output_root = %output_root.display(),
            "starting extraction"
        );

        let root = export_root.to_path_buf();
        let discovery = tokio::task::spawn_blocking(move || discover_dialogs(&root))
            .await
            .map_err(|e| Error::Task(e.to_string()))??;

        info!(
            dialogs = discovery.dialogs.len(),
            excluded = discovery.excluded.len(),
            "export scanned"
        );

        let mut report = RunReport {
            excluded: discovery.excluded,
            ..Default::default()
        };

        let processor = DialogProcessor::new(
            Arc::clone(&self.fetcher),
            output_root.to_path_buf(),
            self.config.max_concurrent_downloads,
        );
        let limit = Arc::new(Semaphore::new(self.config.max_concurrent_dialogs));

        let mut prepared = run_bounded(&limit, discovery.dialogs, &mut report, |dialog: Dialog| {
            let processor = processor.clone();
            async move {
                let result = processor.prepare(&dialog).await;
                (dialog.dir_name, result)
            }
        })
        .await?;

        // Claim folders in directory order so reruns pick the same names
        prepared.sort_by(|a, b| a.dir_name.cmp(&b.dir_name));
        let mut names = OutputNames::new();
        for dialog in &mut prepared {
            dialog.folder_name = names.claim(&dialog.folder_name, &dialog.dir_name);
        }

        let reports = run_bounded(&limit, prepared, &mut report, |dialog: PreparedDialog| {
            let processor = processor.clone();
            async move {
                let dir_name = dialog.dir_name.clone();
                (dir_name, processor.download(dialog).await)
            }
        })
        .await?;
        for dialog_report in reports {
            report.push(dialog_report);
        }

        report.dialogs.sort_by(|a, b| a.dir_name.cmp(&b.dir_name));
        report.failed.sort();

        info!(
            dialogs = report.dialogs_processed(),
            failed = report.dialogs_failed(),
            voices = report.totals.voices,
            pictures = report.totals.pictures,
            fetch_failures = report.totals.fetch_failures,
            write_failures = report.totals.write_failures,
            "extraction finished"
        );

        Ok(report)
    }
}

/// Run `task` for every item, at most `limit` at a time
///
/// Returns the successful outputs in completion order. Dialog-scoped failures are
/// recorded in `report`; a fatal error is returned at once, and dropping the
/// `JoinSet` aborts the tasks still running.
async fn run_bounded<I, F, Fut, T>(
    limit: &Arc<Semaphore>,
    items: I,
    report: &mut RunReport,
    task: F,
) -> Result<Vec<T>>
where
    I: IntoIterator,
    F: Fn(I::Item) -> Fut,
    Fut: Future<Output = (String, Result<T>)> + Send + 'static,
    T: Send + 'static,
{
    let mut tasks: JoinSet<(String, Result<T>)> = JoinSet::new();
    let mut done = Vec::new();

    for item in items {
        let permit = Arc::clone(limit)
            .acquire_owned()
            .await
            .map_err(|e| Error::Task(e.to_string()))?;
        let work = task(item);
        tasks.spawn(async move {
            let _permit = permit;
            work.await
        });

        // Surface fatal errors without waiting for every dialog to be queued
        while let Some(joined) = tasks.try_join_next() {
            done.extend(collect(report, joined)?);
        }
    }

    while let Some(joined) = tasks.join_next().await {
        done.extend(collect(report, joined)?);
    }

    Ok(done)
}

/// Fold one finished dialog task into the report
fn collect<T>(
    report: &mut RunReport,
    joined: std::result::Result<(String, Result<T>), tokio::task::JoinError>,
) -> Result<Option<T>> {
    let (dir_name, result) = joined.map_err(|e| Error::Task(e.to_string()))?;
    match result {
        Ok(output) => Ok(Some(output)),
        Err(e) if !e.is_fatal() => {
            error!(dialog = %dir_name, error = %e, "dialog failed, continuing");
            report.failed.push((dir_name, e.to_string()));
            Ok(None)
        }
        Err(e) => {
            error!(dialog = %dir_name, error = %e, "aborting run");
            Err(e)
        }
    }
}
