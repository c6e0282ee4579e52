//! HTTP fetcher implementation
//!
//! This module handles all HTTP traffic of a run:
//! - Building the shared client (user agent, timeout, session cookies)
//! - Fetching listing and detail pages as text
//! - Streaming assets to disk with skip-if-present semantics
//!
//! An asset is written to `<name>.part` next to its destination and renamed
//! into place only after the last chunk is on disk. A failed transfer removes
//! the partial file, so an existing destination always means a complete one.
//!
//! The request timeout bounds connecting, waiting for the response headers
//! and every single body read. It never bounds a whole transfer: a large
//! video may stream for as long as bytes keep arriving.

use crate::config::{CrawlerConfig, Credentials};
use crate::url::asset_file_name;
use crate::{ConfigError, GrabberError};
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use reqwest::{Client, Response};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use url::Url;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// What kind of asset a download is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetKind {
    /// A video rendition, with its format name
    Video(String),
    /// A cover image
    Cover,
}

impl AssetKind {
    pub fn is_video(&self) -> bool {
        matches!(self, Self::Video(_))
    }
}

/// One asset to place on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    pub source_url: Url,
    pub destination_dir: PathBuf,
    pub kind: AssetKind,
}

/// Result of a successful [`Downloader::fetch`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// The asset was transferred in this call
    Downloaded { path: PathBuf, bytes: u64 },

    /// A file was already at the destination; nothing was requested
    AlreadyPresent { path: PathBuf },
}

impl DownloadOutcome {
    pub fn path(&self) -> &Path {
        match self {
            Self::Downloaded { path, .. } | Self::AlreadyPresent { path } => path,
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// Only the connect phase is bounded here. Header and body reads are bounded
/// per call by [`fetch_page`] and [`ResponseChunks`]. Session cookies become
/// a default `Cookie` header, so every request made through the client
/// carries them unchanged.
///
/// # Arguments
///
/// * `config` - The crawler configuration (user agent and timeout)
/// * `credentials` - Session cookies loaded at startup
pub fn build_http_client(
    config: &CrawlerConfig,
    credentials: &Credentials,
) -> Result<Client, GrabberError> {
    let mut headers = HeaderMap::new();
    if let Some(cookie) = credentials.cookie_header() {
        let value = HeaderValue::from_str(&cookie).map_err(|_| {
            ConfigError::Validation("cookie values contain invalid header characters".to_string())
        })?;
        headers.insert(COOKIE, value);
    }

    let timeout = config.request_timeout();

    Client::builder()
        .user_agent(config.user_agent.clone())
        .default_headers(headers)
        .connect_timeout(CONNECT_TIMEOUT.min(timeout))
        .gzip(true)
        .brotli(true)
        .build()
        .map_err(GrabberError::Client)
}

/// Sends a GET request and rejects non-success status codes
///
/// `timeout` bounds the wait for the response headers.
async fn get(client: &Client, url: &Url, timeout: Duration) -> Result<Response, GrabberError> {
    tracing::debug!("GET {}", url);

    let response = tokio::time::timeout(timeout, client.get(url.clone()).send())
        .await
        .map_err(|_| GrabberError::Timeout {
            url: url.to_string(),
        })?
        .map_err(|e| GrabberError::from_reqwest(url.as_str(), e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(GrabberError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    Ok(response)
}

/// Fetches a page and returns its body as text
///
/// `timeout` applies to the headers and again to the body.
pub async fn fetch_page(
    client: &Client,
    url: &Url,
    timeout: Duration,
) -> Result<String, GrabberError> {
    let response = get(client, url, timeout).await?;

    tokio::time::timeout(timeout, response.text())
        .await
        .map_err(|_| GrabberError::Timeout {
            url: url.to_string(),
        })?
        .map_err(|e| GrabberError::from_reqwest(url.as_str(), e))
}

/// A source of body chunks, read until exhausted
#[allow(async_fn_in_trait)]
pub trait ChunkSource {
    /// Returns the next chunk, or `None` once the body is complete
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, GrabberError>;
}

/// Chunks of a streaming HTTP response body
///
/// Each read must produce a chunk within `idle_timeout`; the body as a whole
/// has no deadline.
pub struct ResponseChunks {
    response: Response,
    url: String,
    idle_timeout: Duration,
}

impl ResponseChunks {
    pub fn new(response: Response, idle_timeout: Duration) -> Self {
        let url = response.url().to_string();
        Self {
            response,
            url,
            idle_timeout,
        }
    }
}

impl ChunkSource for ResponseChunks {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, GrabberError> {
        match tokio::time::timeout(self.idle_timeout, self.response.chunk()).await {
            Ok(chunk) => chunk.map_err(|e| GrabberError::from_reqwest(&self.url, e)),
            Err(_) => {
                tracing::debug!("No data from {} for {:?}", self.url, self.idle_timeout);
                Err(GrabberError::Timeout {
                    url: self.url.clone(),
                })
            }
        }
    }
}

/// Path of the in-progress file for a destination
pub fn part_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    destination.with_file_name(name)
}

/// Streams every chunk of `source` into `destination`
///
/// Bytes go to the `.part` file first, which is truncated if a previous run
/// left one behind. On success the part file is renamed onto the destination;
/// on any failure it is removed before the error is returned.
///
/// # Returns
///
/// * `Ok(u64)` - Number of bytes written
/// * `Err(GrabberError)` - The source or the filesystem failed
pub async fn write_to_destination<S: ChunkSource>(
    source: &mut S,
    destination: &Path,
) -> Result<u64, GrabberError> {
    let part = part_path(destination);

    let result = match stream_into(source, &part).await {
        Ok(bytes) => tokio::fs::rename(&part, destination)
            .await
            .map(|()| bytes)
            .map_err(|e| GrabberError::filesystem(destination, e)),
        Err(e) => Err(e),
    };

    if result.is_err() {
        discard_partial(&part).await;
    }

    result
}

async fn stream_into<S: ChunkSource>(source: &mut S, part: &Path) -> Result<u64, GrabberError> {
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(part)
        .await
        .map_err(|e| GrabberError::filesystem(part, e))?;

    let mut written = 0u64;
    while let Some(chunk) = source.next_chunk().await? {
        file.write_all(&chunk)
            .await
            .map_err(|e| GrabberError::filesystem(part, e))?;
        written += chunk.len() as u64;
    }

    file.flush()
        .await
        .map_err(|e| GrabberError::filesystem(part, e))?;

    Ok(written)
}

async fn discard_partial(part: &Path) {
    match tokio::fs::remove_file(part).await {
        Ok(()) => tracing::debug!("Removed partial file {}", part.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("Failed to remove partial file {}: {}", part.display(), e),
    }
}

/// Streams assets to disk
#[derive(Debug, Clone)]
pub struct Downloader {
    client: Client,
    /// Bound on the header wait and on each body read
    timeout: Duration,
}

impl Downloader {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Downloads `source_url` into `destination_dir`
    ///
    /// The file name is the last path segment of the URL. If that file
    /// already exists the call returns [`DownloadOutcome::AlreadyPresent`]
    /// without touching the network. Otherwise the directory is created and
    /// the body is streamed to disk chunk by chunk.
    ///
    /// Safe to call again after a failure: nothing is left at the destination.
    pub async fn fetch(
        &self,
        source_url: &Url,
        destination_dir: &Path,
    ) -> Result<DownloadOutcome, GrabberError> {
        let file_name = asset_file_name(source_url)?;
        let destination = destination_dir.join(file_name);

        let exists = tokio::fs::try_exists(&destination)
            .await
            .map_err(|e| GrabberError::filesystem(&destination, e))?;
        if exists {
            tracing::info!("File exists, skipping: {}", destination.display());
            return Ok(DownloadOutcome::AlreadyPresent { path: destination });
        }

        tokio::fs::create_dir_all(destination_dir)
            .await
            .map_err(|e| GrabberError::filesystem(destination_dir, e))?;

        tracing::info!("Downloading {} -> {}", source_url, destination.display());
        let response = get(&self.client, source_url, self.timeout).await?;
        let mut chunks = ResponseChunks::new(response, self.timeout);
        let bytes = write_to_destination(&mut chunks, &destination).await?;

        tracing::debug!("Wrote {} bytes to {}", bytes, destination.display());
        Ok(DownloadOutcome::Downloaded {
            path: destination,
            bytes,
        })
    }

    /// Runs a [`DownloadTask`]
    pub async fn run(&self, task: &DownloadTask) -> Result<DownloadOutcome, GrabberError> {
        self.fetch(&task.source_url, &task.destination_dir).await
    }
}
