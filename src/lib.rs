//! Catalog Grabber: a resumable asset downloader for paginated video catalogs
//!
//! This crate walks a catalog listing page, visits every detail page it links
//! to, extracts video renditions and cover images with CSS selectors and
//! downloads them into a per-title directory tree. Downloads are idempotent
//! across runs and never leave truncated files behind.

pub mod config;
pub mod crawler;
pub mod output;
pub mod sanitize;
pub mod state;
pub mod url;

use std::path::PathBuf;
use thiserror::Error;

pub use crawler::ExtractError;

/// Main error type for Catalog Grabber operations
#[derive(Debug, Error)]
pub enum GrabberError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP {status} for {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Extraction failed for {url}: {source}")]
    Extract { url: String, source: ExtractError },

    #[error("Filesystem error at {}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{operation} failed after {attempts} attempts: {}", failures.join("; "))]
    RetriesExhausted {
        operation: String,
        attempts: u32,
        failures: Vec<String>,
    },

    #[error("URL error: {0}")]
    Url(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Failed to build HTTP client: {0}")]
    Client(reqwest::Error),

    #[error("Failed to serialize manifest: {0}")]
    Manifest(#[from] serde_json::Error),
}

impl GrabberError {
    /// Wraps a reqwest error, separating timeouts from other transport failures
    pub fn from_reqwest(url: &str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else {
            Self::Http {
                url: url.to_string(),
                source,
            }
        }
    }

    /// Wraps an IO error with the path it happened on
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Returns true if the failure is transient and the operation may be repeated
    ///
    /// Only network failures qualify. Filesystem failures (permissions, disk
    /// full) and extraction failures will not change on a second attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Http { .. } | Self::Timeout { .. } | Self::HttpStatus { .. }
        )
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to parse cookie file: {0}")]
    Cookies(#[from] serde_json::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("URL has no file name segment: {0}")]
    NoFileName(String),

    #[error("Unsupported URL scheme: {0}")]
    InvalidScheme(String),
}

/// Result type alias for Catalog Grabber operations
pub type Result<T> = std::result::Result<T, GrabberError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::{Config, Credentials};
pub use crawler::{Coordinator, DownloadOutcome, Downloader, VideoPageInfo};
pub use sanitize::{sanitize_path, sanitize_segment};
pub use state::EntryState;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_errors_are_retryable() {
        let err = GrabberError::Timeout {
            url: "https://example.com/".to_string(),
        };
        assert!(err.is_retryable());

        let err = GrabberError::HttpStatus {
            url: "https://example.com/".to_string(),
            status: 503,
        };
        assert!(err.is_retryable());
    }

    #[test]
    fn test_filesystem_errors_are_not_retryable() {
        let err = GrabberError::filesystem(
            "/tmp/x",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_extraction_errors_are_not_retryable() {
        let err = GrabberError::Extract {
            url: "https://example.com/v/1".to_string(),
            source: ExtractError::MissingTitle { part: "heading" },
        };
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_retries_exhausted_lists_failures() {
        let err = GrabberError::RetriesExhausted {
            operation: "listing page".to_string(),
            attempts: 2,
            failures: vec!["first".to_string(), "second".to_string()],
        };
        let message = err.to_string();
        assert!(message.contains("after 2 attempts"));
        assert!(message.contains("first; second"));
        assert!(!err.is_retryable());
    }
}
