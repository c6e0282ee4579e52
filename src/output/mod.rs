//! Output module for run results
//!
//! This module handles:
//! - Per-entry and per-asset reports produced by the coordinator
//! - The run manifest of downloaded video URLs
//! - Run statistics for logs and the CLI

pub mod manifest;
pub mod report;
pub mod stats;

pub use manifest::RunManifest;
pub use report::{AssetReport, AssetResult, EntryReport};
pub use stats::{format_statistics, print_statistics, RunStatistics};
