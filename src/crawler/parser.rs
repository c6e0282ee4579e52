//! Listing page parser
//!
//! The catalog listing links to every detail page with the same kind of
//! anchor. This module collects those references, in page order and without
//! duplicates.

use crate::config::validation::compile_selector;
use crate::config::SelectorConfig;
use crate::url::resolve_reference;
use crate::ConfigError;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// One detail page to visit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Position on the listing page, starting at 0
    pub index: usize,

    /// Absolute URL of the detail page
    pub url: Url,
}

/// Extracts detail page references from listing pages
#[derive(Debug, Clone)]
pub struct ListingParser {
    selector: Selector,
    attribute: String,
}

impl ListingParser {
    pub fn new(config: &SelectorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            selector: compile_selector(&config.detail_pages)?,
            attribute: config.detail_attribute.clone(),
        })
    }

    /// Parses a listing page and returns its catalog entries
    ///
    /// Relative references are resolved against `base_url`. References that
    /// cannot be resolved to HTTP(S) are dropped; repeated references keep
    /// their first position.
    ///
    /// # Example
    ///
    /// ```
    /// use catalog_grabber::config::SelectorConfig;
    /// use catalog_grabber::crawler::ListingParser;
    /// use url::Url;
    ///
    /// let config = SelectorConfig {
    ///     detail_pages: "a.item".to_string(),
    ///     detail_attribute: "href".to_string(),
    ///     title_heading: "h1".to_string(),
    ///     title_subtitle: "h2".to_string(),
    ///     covers: "img".to_string(),
    ///     cover_attribute: "src".to_string(),
    ///     formats: vec![],
    /// };
    /// let parser = ListingParser::new(&config).unwrap();
    /// let base = Url::parse("https://example.com/videos/").unwrap();
    /// let entries = parser.parse(r#"<a class="item" href="/v/1/">One</a>"#, &base);
    /// assert_eq!(entries[0].url.as_str(), "https://example.com/v/1/");
    /// ```
    pub fn parse(&self, html: &str, base_url: &Url) -> Vec<CatalogEntry> {
        let document = Html::parse_document(html);
        let mut seen = HashSet::new();

        document
            .select(&self.selector)
            .filter_map(|element| element.value().attr(&self.attribute))
            .filter_map(|value| resolve_reference(value, base_url))
            .filter(|url| seen.insert(url.to_string()))
            .enumerate()
            .map(|(index, url)| CatalogEntry { index, url })
            .collect()
    }
}
