//! Per-entry and per-asset results of a run
//!
//! The coordinator produces one [`EntryReport`] per catalog entry. The
//! manifest and the run statistics are both derived from these reports.

use crate::crawler::{AssetKind, CatalogEntry};
use crate::state::EntryState;
use std::path::PathBuf;
use url::Url;

/// What happened to one asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetResult {
    /// Transferred in this run
    Downloaded { path: PathBuf, bytes: u64 },

    /// Already on disk from an earlier run
    AlreadyPresent { path: PathBuf },

    /// Would have been downloaded (dry run)
    Planned { path: PathBuf },

    /// Gave up on this asset
    Failed { error: String },
}

impl AssetResult {
    /// Returns true if the asset is on disk after this run
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Downloaded { .. } | Self::AlreadyPresent { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Information about a processed asset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetReport {
    pub url: Url,
    pub kind: AssetKind,
    pub result: AssetResult,
}

/// Information about a processed catalog entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryReport {
    /// The detail page reference
    pub entry: CatalogEntry,

    /// Terminal state of the entry
    pub state: EntryState,

    /// Resolved title, if extraction succeeded
    pub title: Option<String>,

    /// Directory holding the entry's videos, if extraction succeeded
    pub directory: Option<PathBuf>,

    /// Per-asset results, videos first
    pub assets: Vec<AssetReport>,

    /// Why the entry was skipped
    pub error: Option<String>,
}

impl EntryReport {
    /// Report for an entry whose detail page could not be used
    pub fn skipped(entry: CatalogEntry, error: String) -> Self {
        Self {
            entry,
            state: EntryState::Skipped,
            title: None,
            directory: None,
            assets: Vec::new(),
            error: Some(error),
        }
    }

    pub fn succeeded(&self) -> usize {
        self.assets.iter().filter(|a| a.result.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.assets.iter().filter(|a| a.result.is_failure()).count()
    }

    /// Video URLs that are on disk after this run, in processing order
    pub fn completed_video_urls(&self) -> impl Iterator<Item = &Url> {
        self.assets
            .iter()
            .filter(|a| a.kind.is_video() && a.result.is_success())
            .map(|a| &a.url)
    }
}
