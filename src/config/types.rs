use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Catalog Grabber
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    pub output: OutputConfig,
    pub selectors: SelectorConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Listing page that links to every detail page
    #[serde(rename = "catalog-url")]
    pub catalog_url: String,

    /// Directory name used for this catalog under the download root
    #[serde(rename = "site-name")]
    pub site_name: String,

    /// Per-request timeout (seconds), including body streaming
    #[serde(rename = "request-timeout", default = "default_request_timeout")]
    pub request_timeout: u64,

    /// Attempts per network operation before giving up
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed part of the pause between catalog entries (milliseconds)
    #[serde(rename = "delay-floor", default = "default_delay_floor")]
    pub delay_floor: u64,

    /// Upper bound of the random part of the pause (milliseconds)
    #[serde(rename = "delay-jitter", default = "default_delay_jitter")]
    pub delay_jitter: u64,

    /// User-Agent header sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

impl CrawlerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

/// Where the cookie jar comes from
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CredentialsConfig {
    /// JSON object of cookie names to values
    #[serde(rename = "cookies-path")]
    pub cookies_path: Option<String>,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Root directory for downloaded assets
    #[serde(rename = "download-root")]
    pub download_root: String,

    /// Directory receiving one URL manifest per run
    #[serde(rename = "manifest-dir")]
    pub manifest_dir: String,
}

/// CSS selectors used against listing and detail pages
#[derive(Debug, Clone, Deserialize)]
pub struct SelectorConfig {
    /// Anchors on the listing page pointing at detail pages
    #[serde(rename = "detail-pages")]
    pub detail_pages: String,

    #[serde(rename = "detail-attribute", default = "default_link_attribute")]
    pub detail_attribute: String,

    /// Main title text on a detail page
    #[serde(rename = "title-heading")]
    pub title_heading: String,

    /// Secondary title text, rendered in parentheses
    #[serde(rename = "title-subtitle")]
    pub title_subtitle: String,

    /// Cover images on a detail page
    pub covers: String,

    #[serde(rename = "cover-attribute", default = "default_cover_attribute")]
    pub cover_attribute: String,

    /// Video renditions, tried in order
    #[serde(default)]
    pub formats: Vec<FormatSelector>,
}

/// One named video rendition and how to find its link
#[derive(Debug, Clone, Deserialize)]
pub struct FormatSelector {
    /// Label used in logs, e.g. "Best" or "Android"
    pub name: String,

    /// CSS selector for candidate elements
    pub selector: String,

    /// Attribute holding the URL
    #[serde(default = "default_link_attribute")]
    pub attribute: String,

    /// Only elements whose trimmed text equals this value match
    #[serde(default)]
    pub text: Option<String>,

    /// A miss skips the whole page instead of logging a warning
    #[serde(default)]
    pub required: bool,
}

fn default_request_timeout() -> u64 {
    15
}

fn default_max_attempts() -> u32 {
    3
}

fn default_delay_floor() -> u64 {
    2000
}

fn default_delay_jitter() -> u64 {
    1000
}

fn default_user_agent() -> String {
    format!("catalog-grabber/{}", env!("CARGO_PKG_VERSION"))
}

fn default_link_attribute() -> String {
    "href".to_string()
}

fn default_cover_attribute() -> String {
    "src".to_string()
}
