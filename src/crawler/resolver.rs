//! Detail page asset resolution
//!
//! This module turns a detail page into a [`VideoPageInfo`]:
//! - A title built from a heading and a subtitle (required)
//! - One URL per configured video format, in configuration order (optional
//!   unless the format is marked required)
//! - Every cover image URL (may be empty)

use crate::config::validation::compile_selector;
use crate::config::{FormatSelector, SelectorConfig};
use crate::sanitize::sanitize_segment;
use crate::url::resolve_reference;
use crate::ConfigError;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use thiserror::Error;
use url::Url;

/// Page-fatal extraction failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("title {part} not found")]
    MissingTitle { part: &'static str },

    #[error("title '{title}' has no filesystem-safe characters")]
    EmptyTitle { title: String },

    #[error("required format '{name}' not found")]
    MissingFormat { name: String },
}

/// Everything worth downloading from one detail page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoPageInfo {
    /// Display title in the form `Heading (Subtitle)`
    pub title: String,

    /// Video URLs keyed by format name, in configuration order
    pub video_urls: Vec<(String, Url)>,

    /// Cover image URLs in document order, without duplicates
    pub cover_urls: Vec<Url>,

    /// Optional formats whose selector matched nothing
    pub missing_formats: Vec<String>,
}

impl VideoPageInfo {
    /// Directory name for this entry; never empty for a resolved page
    pub fn dir_name(&self) -> String {
        sanitize_segment(&self.title)
    }

    /// Total number of assets to download
    pub fn asset_count(&self) -> usize {
        self.video_urls.len() + self.cover_urls.len()
    }
}

/// A format selector with its CSS compiled
#[derive(Debug, Clone)]
struct CompiledFormat {
    name: String,
    selector: Selector,
    attribute: String,
    text: Option<String>,
    required: bool,
}

impl CompiledFormat {
    fn compile(format: &FormatSelector) -> Result<Self, ConfigError> {
        Ok(Self {
            name: format.name.clone(),
            selector: compile_selector(&format.selector)?,
            attribute: format.attribute.clone(),
            text: format.text.as_ref().map(|t| t.trim().to_string()),
            required: format.required,
        })
    }

    /// First URL carried by a matching element
    fn first_match(&self, document: &Html, base: &Url) -> Option<Url> {
        document
            .select(&self.selector)
            .filter(|element| match &self.text {
                Some(expected) => element_text(element) == *expected,
                None => true,
            })
            .find_map(|element| {
                element
                    .value()
                    .attr(&self.attribute)
                    .and_then(|value| resolve_reference(value, base))
            })
    }
}

/// Applies the configured selectors to detail pages
///
/// Holds no state beyond the compiled selectors, so resolving is a pure
/// function of the document.
#[derive(Debug, Clone)]
pub struct AssetResolver {
    heading: Selector,
    subtitle: Selector,
    covers: Selector,
    cover_attribute: String,
    formats: Vec<CompiledFormat>,
}

impl AssetResolver {
    /// Compiles every selector in the configuration
    pub fn new(config: &SelectorConfig) -> Result<Self, ConfigError> {
        let formats = config
            .formats
            .iter()
            .map(CompiledFormat::compile)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            heading: compile_selector(&config.title_heading)?,
            subtitle: compile_selector(&config.title_subtitle)?,
            covers: compile_selector(&config.covers)?,
            cover_attribute: config.cover_attribute.clone(),
            formats,
        })
    }

    /// Parses raw HTML and resolves it
    pub fn resolve_html(&self, html: &str, page_url: &Url) -> Result<VideoPageInfo, ExtractError> {
        let document = Html::parse_document(html);
        self.resolve(&document, page_url)
    }

    /// Extracts title, video URLs and cover URLs from a parsed detail page
    ///
    /// A missing title is fatal for the page and no URLs are returned. A
    /// missing optional format produces one warning and is listed in
    /// `missing_formats`; the formats that did match are still returned.
    pub fn resolve(&self, document: &Html, page_url: &Url) -> Result<VideoPageInfo, ExtractError> {
        let title = self.extract_title(document)?;

        let mut video_urls = Vec::with_capacity(self.formats.len());
        let mut missing_formats = Vec::new();

        for format in &self.formats {
            match format.first_match(document, page_url) {
                Some(url) => video_urls.push((format.name.clone(), url)),
                None if format.required => {
                    return Err(ExtractError::MissingFormat {
                        name: format.name.clone(),
                    });
                }
                None => {
                    tracing::warn!("Format '{}' not found on {}", format.name, page_url);
                    missing_formats.push(format.name.clone());
                }
            }
        }

        if video_urls.is_empty() {
            tracing::warn!("No video formats found on {}", page_url);
        }

        let cover_urls = self.extract_covers(document, page_url);

        Ok(VideoPageInfo {
            title,
            video_urls,
            cover_urls,
            missing_formats,
        })
    }

    fn extract_title(&self, document: &Html) -> Result<String, ExtractError> {
        let heading = first_text(document, &self.heading)
            .ok_or(ExtractError::MissingTitle { part: "heading" })?;
        let subtitle = first_text(document, &self.subtitle)
            .ok_or(ExtractError::MissingTitle { part: "subtitle" })?;

        let title = format!("{} ({})", heading, subtitle);

        // The parentheses always survive sanitization, so judge the parts
        if sanitize_segment(&heading).is_empty() && sanitize_segment(&subtitle).is_empty() {
            return Err(ExtractError::EmptyTitle { title });
        }

        Ok(title)
    }

    fn extract_covers(&self, document: &Html, page_url: &Url) -> Vec<Url> {
        let mut seen = HashSet::new();
        document
            .select(&self.covers)
            .filter_map(|element| element.value().attr(&self.cover_attribute))
            .filter_map(|value| resolve_reference(value, page_url))
            .filter(|url| seen.insert(url.to_string()))
            .collect()
    }
}

/// Whitespace-collapsed text content of an element
fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Text of the first match, if it is not blank
fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .map(|element| element_text(&element))
        .filter(|text| !text.is_empty())
}
