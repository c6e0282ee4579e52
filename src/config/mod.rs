//! Configuration module for Catalog Grabber
//!
//! This module handles loading, parsing, and validating the TOML configuration
//! file and the JSON cookie file it points at.
//!
//! # Example
//!
//! ```no_run
//! use catalog_grabber::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("grabber.toml")).unwrap();
//! println!("Catalog: {}", config.crawler.catalog_url);
//! ```

mod credentials;
mod parser;
mod types;
pub(crate) mod validation;

// Re-export types
pub use credentials::Credentials;
pub use types::{
    Config, CrawlerConfig, CredentialsConfig, FormatSelector, OutputConfig, SelectorConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, load_credentials};
