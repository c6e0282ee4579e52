//! Run manifest
//!
//! At the end of every run the URLs of all video assets that ended up on disk
//! are written as a JSON array to `<manifest-dir>/urls-<timestamp>.json`.
//! Cover images are not listed. A manifest is written once and never touched
//! again; an existing file is never overwritten.

use crate::output::report::EntryReport;
use crate::GrabberError;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Suffix attempts before giving up on finding a free file name
const MAX_NAME_COLLISIONS: u32 = 100;

/// Asset URLs processed in one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunManifest {
    urls: Vec<String>,
}

impl RunManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the manifest from entry reports, in processing order
    pub fn from_reports(reports: &[EntryReport]) -> Self {
        let mut manifest = Self::new();
        for report in reports {
            for url in report.completed_video_urls() {
                manifest.record(url.as_str());
            }
        }
        manifest
    }

    /// Adds a URL; repeated URLs are kept once
    pub fn record(&mut self, url: &str) {
        if !self.urls.iter().any(|u| u == url) {
            self.urls.push(url.to_string());
        }
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    /// File name for a manifest completed at `finished_at`
    pub fn file_name(finished_at: &DateTime<Local>) -> String {
        format!("urls-{}.json", finished_at.format("%Y%m%dT%H%M%S"))
    }

    /// Writes the manifest into `dir`, creating the directory if needed
    ///
    /// # Returns
    ///
    /// * `Ok(PathBuf)` - Path of the new manifest file
    /// * `Err(GrabberError)` - Directory or file could not be written
    pub fn write(&self, dir: &Path, finished_at: &DateTime<Local>) -> Result<PathBuf, GrabberError> {
        std::fs::create_dir_all(dir).map_err(|e| GrabberError::filesystem(dir, e))?;

        let json = serde_json::to_string_pretty(self)?;
        let base = Self::file_name(finished_at);

        for attempt in 0..MAX_NAME_COLLISIONS {
            let path = if attempt == 0 {
                dir.join(&base)
            } else {
                dir.join(base.replace(".json", &format!("-{}.json", attempt)))
            };

            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(json.as_bytes())
                        .map_err(|e| GrabberError::filesystem(&path, e))?;
                    return Ok(path);
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(GrabberError::filesystem(&path, e)),
            }
        }

        Err(GrabberError::filesystem(
            dir.join(base),
            std::io::Error::new(
                std::io::ErrorKind::AlreadyExists,
                "no free manifest file name",
            ),
        ))
    }

    /// Reads a manifest written by [`RunManifest::write`]
    pub fn load(path: &Path) -> Result<Self, GrabberError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| GrabberError::filesystem(path, e))?;
        Ok(serde_json::from_str(&content)?)
    }
}
