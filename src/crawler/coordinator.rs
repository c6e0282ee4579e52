//! Crawler coordinator - main run orchestration logic
//!
//! This module contains the run loop that coordinates:
//! - Fetching the catalog listing and reading its entries
//! - Pacing between entries
//! - Per-entry extraction and asset downloads
//! - Writing the run manifest and reporting statistics
//!
//! Failure scope follows the structure of a run: a listing page that cannot
//! be fetched aborts the run, a detail page that cannot be fetched or has no
//! title skips that entry, and an asset that cannot be downloaded fails only
//! that asset.

use crate::config::{Config, Credentials};
use crate::crawler::fetcher::{
    build_http_client, fetch_page, AssetKind, DownloadOutcome, DownloadTask, Downloader,
};
use crate::crawler::pacing::Pacer;
use crate::crawler::parser::{CatalogEntry, ListingParser};
use crate::crawler::resolver::{AssetResolver, VideoPageInfo};
use crate::crawler::retry::{with_retry, RetryPolicy};
use crate::output::{AssetReport, AssetResult, EntryReport, RunManifest, RunStatistics};
use crate::sanitize::sanitize_segment;
use crate::state::EntryState;
use crate::url::asset_file_name;
use crate::GrabberError;
use reqwest::Client;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use url::Url;

/// Name of the per-entry subdirectory holding cover images
pub const COVERS_DIR: &str = "covers";

/// Switches that change what a run does, not how
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Resolve every entry but download nothing and write no manifest
    pub dry_run: bool,

    /// Process at most this many entries from the listing
    pub limit: Option<usize>,
}

/// Everything a finished run produced
#[derive(Debug, Clone)]
pub struct RunReport {
    /// One report per processed entry, in listing order
    pub entries: Vec<EntryReport>,

    /// Video URLs on disk after this run
    pub manifest: RunManifest,

    /// Where the manifest was written (None for dry runs)
    pub manifest_path: Option<PathBuf>,

    pub statistics: RunStatistics,
}

/// Main run coordinator structure
pub struct Coordinator {
    config: Config,
    client: Client,
    downloader: Downloader,
    listing: ListingParser,
    resolver: AssetResolver,
    retry: RetryPolicy,
    pacer: Pacer,
    site_dir: PathBuf,
    options: RunOptions,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The validated configuration
    /// * `credentials` - Session cookies sent with every request
    /// * `options` - Dry run and entry limit
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(GrabberError)` - A selector or the HTTP client could not be built
    pub fn new(
        config: Config,
        credentials: &Credentials,
        options: RunOptions,
    ) -> Result<Self, GrabberError> {
        let client = build_http_client(&config.crawler, credentials)?;
        let listing = ListingParser::new(&config.selectors)?;
        let resolver = AssetResolver::new(&config.selectors)?;
        let retry = RetryPolicy::new(config.crawler.max_attempts);
        let pacer = Pacer::from_config(&config.crawler);
        let site_dir = Path::new(&config.output.download_root)
            .join(sanitize_segment(&config.crawler.site_name));

        Ok(Self {
            downloader: Downloader::new(client.clone(), config.crawler.request_timeout()),
            client,
            listing,
            resolver,
            retry,
            pacer,
            site_dir,
            options,
            config,
        })
    }

    /// Replaces the pacing between entries
    pub fn with_pacer(mut self, pacer: Pacer) -> Self {
        self.pacer = pacer;
        self
    }

    /// Directory holding every entry of this catalog
    pub fn site_dir(&self) -> &Path {
        &self.site_dir
    }

    /// Runs the main crawl loop
    ///
    /// 1. Fetches the listing page (fatal on failure)
    /// 2. Processes every entry in order, pausing in between
    /// 3. Writes the manifest (unless this is a dry run)
    /// 4. Logs statistics
    pub async fn run(&self) -> Result<RunReport, GrabberError> {
        let catalog_url = Url::parse(&self.config.crawler.catalog_url)?;
        let start_time = std::time::Instant::now();

        tracing::info!("Fetching catalog listing {}", catalog_url);
        let body = with_retry(&self.retry, "catalog listing", || {
            fetch_page(&self.client, &catalog_url, self.timeout())
        })
        .await?;

        let mut entries = self.listing.parse(&body, &catalog_url);
        if entries.is_empty() {
            tracing::warn!("Catalog listing {} has no entries", catalog_url);
        }
        if let Some(limit) = self.options.limit {
            entries.truncate(limit);
        }
        tracing::info!("Found {} catalog entries", entries.len());

        let mut reports = Vec::with_capacity(entries.len());
        for (position, entry) in entries.iter().enumerate() {
            if position > 0 {
                self.pacer.wait().await;
            }

            tracing::info!(
                "[{}/{}] Processing {}",
                position + 1,
                entries.len(),
                entry.url
            );
            let report = self.process_entry(entry).await;
            tracing::info!(
                "[{}/{}] {} -> {}",
                position + 1,
                entries.len(),
                entry.url,
                report.state
            );
            reports.push(report);
        }

        let manifest = RunManifest::from_reports(&reports);
        let manifest_path = if self.options.dry_run {
            None
        } else {
            let dir = Path::new(&self.config.output.manifest_dir);
            let path = manifest.write(dir, &chrono::Local::now())?;
            tracing::info!(
                "Wrote manifest with {} URLs to {}",
                manifest.len(),
                path.display()
            );
            Some(path)
        };

        let statistics = RunStatistics::from_reports(&reports);
        statistics.log();
        tracing::info!("Run completed in {:?}", start_time.elapsed());

        Ok(RunReport {
            entries: reports,
            manifest,
            manifest_path,
            statistics,
        })
    }

    /// Processes a single catalog entry from `Pending` to a terminal state
    ///
    /// Never fails: every problem is logged and reflected in the report.
    /// Takes `&self` only, so entries do not depend on each other.
    pub async fn process_entry(&self, entry: &CatalogEntry) -> EntryReport {
        let mut state = EntryState::Pending;
        advance(&mut state, EntryState::Extracting, entry);

        let info = match self.extract(entry).await {
            Ok(info) => info,
            Err(e) => {
                tracing::error!(
                    "Skipping entry {} ({}): {}",
                    entry.index,
                    entry.url,
                    e
                );
                advance(&mut state, EntryState::Skipped, entry);
                return EntryReport::skipped(entry.clone(), e.to_string());
            }
        };

        advance(&mut state, EntryState::Downloading, entry);
        let directory = self.site_dir.join(info.dir_name());
        tracing::info!(
            "'{}': {} videos, {} covers -> {}",
            info.title,
            info.video_urls.len(),
            info.cover_urls.len(),
            directory.display()
        );

        let mut assets = Vec::with_capacity(info.asset_count());
        let mut claimed = HashSet::new();
        for task in download_tasks(&info, &directory) {
            let result = match claim_destination(&mut claimed, &task) {
                Ok(()) => self.download(&task).await,
                Err(path) => {
                    tracing::warn!(
                        "Not downloading {}: {} is already the destination of another asset",
                        task.source_url,
                        path.display()
                    );
                    AssetResult::Failed {
                        error: format!("destination {} already taken", path.display()),
                    }
                }
            };
            assets.push(AssetReport {
                url: task.source_url,
                kind: task.kind,
                result,
            });
        }

        let succeeded = assets.iter().filter(|a| !a.result.is_failure()).count();
        let failed = assets.len() - succeeded;
        advance(
            &mut state,
            EntryState::from_asset_counts(succeeded, failed),
            entry,
        );
        debug_assert!(state.is_terminal());

        EntryReport {
            entry: entry.clone(),
            state,
            title: Some(info.title),
            directory: Some(directory),
            assets,
            error: None,
        }
    }

    fn timeout(&self) -> std::time::Duration {
        self.config.crawler.request_timeout()
    }

    /// Fetches and resolves a detail page
    async fn extract(&self, entry: &CatalogEntry) -> Result<VideoPageInfo, GrabberError> {
        let operation = format!("detail page {}", entry.url);
        let body = with_retry(&self.retry, &operation, || {
            fetch_page(&self.client, &entry.url, self.timeout())
        })
        .await?;

        self.resolver
            .resolve_html(&body, &entry.url)
            .map_err(|source| GrabberError::Extract {
                url: entry.url.to_string(),
                source,
            })
    }

    /// Downloads one asset, turning failures into a report entry
    async fn download(&self, task: &DownloadTask) -> AssetResult {
        if self.options.dry_run {
            return planned(task);
        }

        let operation = format!("download {}", task.source_url);
        match with_retry(&self.retry, &operation, || self.downloader.run(task)).await {
            Ok(DownloadOutcome::Downloaded { path, bytes }) => {
                AssetResult::Downloaded { path, bytes }
            }
            Ok(DownloadOutcome::AlreadyPresent { path }) => AssetResult::AlreadyPresent { path },
            Err(e) => {
                tracing::error!(
                    "Failed to download {} into {}: {}",
                    task.source_url,
                    task.destination_dir.display(),
                    e
                );
                AssetResult::Failed {
                    error: e.to_string(),
                }
            }
        }
    }
}

/// Videos go directly into the entry directory, covers into `covers/`
fn download_tasks(info: &VideoPageInfo, directory: &Path) -> Vec<DownloadTask> {
    let videos = info.video_urls.iter().map(|(format, url)| DownloadTask {
        source_url: url.clone(),
        destination_dir: directory.to_path_buf(),
        kind: AssetKind::Video(format.clone()),
    });

    let covers = info.cover_urls.iter().map(|url| DownloadTask {
        source_url: url.clone(),
        destination_dir: directory.join(COVERS_DIR),
        kind: AssetKind::Cover,
    });

    videos.chain(covers).collect()
}

/// Records the file `task` will write, or returns it if an earlier asset of
/// the same entry already targets it
///
/// Tasks whose URL has no usable file name pass through; the download itself
/// reports that error.
fn claim_destination(claimed: &mut HashSet<PathBuf>, task: &DownloadTask) -> Result<(), PathBuf> {
    let Ok(name) = asset_file_name(&task.source_url) else {
        return Ok(());
    };
    let path = task.destination_dir.join(name);
    if claimed.contains(&path) {
        return Err(path);
    }
    claimed.insert(path);
    Ok(())
}

fn planned(task: &DownloadTask) -> AssetResult {
    match asset_file_name(&task.source_url) {
        Ok(name) => {
            let path = task.destination_dir.join(name);
            tracing::info!("[dry run] {} -> {}", task.source_url, path.display());
            AssetResult::Planned { path }
        }
        Err(e) => AssetResult::Failed {
            error: e.to_string(),
        },
    }
}

fn advance(state: &mut EntryState, next: EntryState, entry: &CatalogEntry) {
    debug_assert!(
        state.can_transition_to(next),
        "invalid entry transition {} -> {}",
        state,
        next
    );
    tracing::trace!("Entry {} ({}): {} -> {}", entry.index, entry.url, state, next);
    *state = next;
}

/// Runs a complete crawl
///
/// # Example
///
/// ```no_run
/// use catalog_grabber::config::{load_config, load_credentials};
/// use catalog_grabber::crawler::{run_crawl, RunOptions};
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("grabber.toml"))?;
/// let credentials = load_credentials(&config)?;
/// let report = run_crawl(config, &credentials, RunOptions::default()).await?;
/// println!("{} URLs in manifest", report.manifest.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(
    config: Config,
    credentials: &Credentials,
    options: RunOptions,
) -> Result<RunReport, GrabberError> {
    let coordinator = Coordinator::new(config, credentials, options)?;
    coordinator.run().await
}
