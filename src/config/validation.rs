use crate::config::types::{Config, CrawlerConfig, FormatSelector, OutputConfig, SelectorConfig};
use crate::sanitize::sanitize_segment;
use crate::ConfigError;
use scraper::Selector;
use std::collections::HashSet;
use url::Url;

const MAX_ATTEMPTS_LIMIT: u32 = 20;
const MAX_REQUEST_TIMEOUT: u64 = 3600;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_output_config(&config.output)?;
    validate_selector_config(&config.selectors)?;
    Ok(())
}

/// Compiles a CSS selector, reporting the offending text on failure
pub(crate) fn compile_selector(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.catalog_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid catalog-url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "catalog-url must use HTTP or HTTPS, got '{}'",
            config.catalog_url
        )));
    }

    if sanitize_segment(&config.site_name).is_empty() {
        return Err(ConfigError::Validation(format!(
            "site-name must contain at least one filesystem-safe character, got '{}'",
            config.site_name
        )));
    }

    if config.max_attempts < 1 || config.max_attempts > MAX_ATTEMPTS_LIMIT {
        return Err(ConfigError::Validation(format!(
            "max-attempts must be between 1 and {}, got {}",
            MAX_ATTEMPTS_LIMIT, config.max_attempts
        )));
    }

    if config.request_timeout < 1 || config.request_timeout > MAX_REQUEST_TIMEOUT {
        return Err(ConfigError::Validation(format!(
            "request-timeout must be between 1 and {} seconds, got {}",
            MAX_REQUEST_TIMEOUT, config.request_timeout
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.download_root.is_empty() {
        return Err(ConfigError::Validation(
            "download-root cannot be empty".to_string(),
        ));
    }

    if config.manifest_dir.is_empty() {
        return Err(ConfigError::Validation(
            "manifest-dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates that every selector compiles and format names are usable
fn validate_selector_config(config: &SelectorConfig) -> Result<(), ConfigError> {
    compile_selector(&config.detail_pages)?;
    compile_selector(&config.title_heading)?;
    compile_selector(&config.title_subtitle)?;
    compile_selector(&config.covers)?;

    validate_attribute("detail-attribute", &config.detail_attribute)?;
    validate_attribute("cover-attribute", &config.cover_attribute)?;

    if config.formats.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[selectors.formats]] entry is required".to_string(),
        ));
    }

    let mut names = HashSet::new();
    for format in &config.formats {
        validate_format(format)?;
        if !names.insert(format.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate format name '{}'",
                format.name
            )));
        }
    }

    Ok(())
}

fn validate_format(format: &FormatSelector) -> Result<(), ConfigError> {
    if format.name.trim().is_empty() {
        return Err(ConfigError::Validation(
            "format name cannot be empty".to_string(),
        ));
    }

    compile_selector(&format.selector)?;
    validate_attribute(&format!("format '{}' attribute", format.name), &format.attribute)
}

fn validate_attribute(label: &str, attribute: &str) -> Result<(), ConfigError> {
    if attribute.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{} cannot be empty", label)));
    }
    Ok(())
}
