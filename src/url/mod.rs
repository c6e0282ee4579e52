//! URL handling module for Catalog Grabber
//!
//! This module resolves references found in markup against the page they
//! came from, and derives local file names from asset URLs.

mod file_name;
mod reference;

// Re-export main functions
pub use file_name::asset_file_name;
pub use reference::resolve_reference;
