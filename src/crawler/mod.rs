//! Crawler module for catalog traversal and asset retrieval
//!
//! This module contains the core crawling logic, including:
//! - Listing page parsing into catalog entries
//! - Detail page resolution into video and cover URLs
//! - HTTP fetching and streamed, resumable downloads
//! - Bounded retry and request pacing
//! - Overall run coordination

mod coordinator;
mod fetcher;
mod pacing;
mod parser;
mod resolver;
mod retry;

pub use coordinator::{run_crawl, Coordinator, RunOptions, RunReport, COVERS_DIR};
pub use fetcher::{
    build_http_client, fetch_page, part_path, write_to_destination, AssetKind, ChunkSource,
    DownloadOutcome, DownloadTask, Downloader, ResponseChunks,
};
pub use pacing::Pacer;
pub use parser::{CatalogEntry, ListingParser};
pub use resolver::{AssetResolver, ExtractError, VideoPageInfo};
pub use retry::{with_retry, RetryPolicy, DEFAULT_MAX_ATTEMPTS};
