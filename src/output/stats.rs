//! Run statistics
//!
//! Aggregates entry reports into counts per entry state and per asset
//! outcome, for the end-of-run log and the CLI summary.

use crate::output::report::{AssetResult, EntryReport};
use crate::state::EntryState;
use std::collections::HashMap;

/// Run statistics summary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStatistics {
    /// Number of catalog entries processed
    pub total_entries: u64,

    /// Count of entries by terminal state
    pub entries_by_state: HashMap<EntryState, u64>,

    /// Assets transferred in this run
    pub assets_downloaded: u64,

    /// Assets skipped because they were already on disk
    pub assets_present: u64,

    /// Assets that failed after exhausting retries
    pub assets_failed: u64,

    /// Assets listed but not fetched (dry run)
    pub assets_planned: u64,

    /// Bytes transferred in this run
    pub bytes_downloaded: u64,
}

impl RunStatistics {
    /// Aggregates statistics from entry reports
    pub fn from_reports(reports: &[EntryReport]) -> Self {
        let mut stats = Self {
            total_entries: reports.len() as u64,
            ..Self::default()
        };

        for report in reports {
            *stats.entries_by_state.entry(report.state).or_insert(0) += 1;

            for asset in &report.assets {
                match &asset.result {
                    AssetResult::Downloaded { bytes, .. } => {
                        stats.assets_downloaded += 1;
                        stats.bytes_downloaded += bytes;
                    }
                    AssetResult::AlreadyPresent { .. } => stats.assets_present += 1,
                    AssetResult::Planned { .. } => stats.assets_planned += 1,
                    AssetResult::Failed { .. } => stats.assets_failed += 1,
                }
            }
        }

        stats
    }

    /// Number of entries that ended in `state`
    pub fn entries_in(&self, state: EntryState) -> u64 {
        self.entries_by_state.get(&state).copied().unwrap_or(0)
    }

    /// Returns true if any entry or asset failed
    pub fn has_failures(&self) -> bool {
        self.assets_failed > 0
            || self.entries_in(EntryState::Skipped) > 0
            || self.entries_in(EntryState::Failed) > 0
    }

    /// Logs a one-line summary at info level
    pub fn log(&self) {
        tracing::info!(
            "Run finished: {} entries (done {}, partial {}, failed {}, skipped {}), \
             assets downloaded {}, already present {}, failed {}, {} bytes",
            self.total_entries,
            self.entries_in(EntryState::Done),
            self.entries_in(EntryState::PartiallyDone),
            self.entries_in(EntryState::Failed),
            self.entries_in(EntryState::Skipped),
            self.assets_downloaded,
            self.assets_present,
            self.assets_failed,
            self.bytes_downloaded
        );
    }
}

/// Formats statistics as a human-readable block
pub fn format_statistics(stats: &RunStatistics) -> String {
    let mut out = String::new();

    out.push_str("=== Run Statistics ===\n\n");
    out.push_str(&format!("Entries: {}\n", stats.total_entries));
    for state in EntryState::terminal_states() {
        let count = stats.entries_in(state);
        let percentage = if stats.total_entries > 0 {
            (count as f64 / stats.total_entries as f64) * 100.0
        } else {
            0.0
        };
        out.push_str(&format!("  {}: {} ({:.1}%)\n", state, count, percentage));
    }

    out.push_str("\nAssets:\n");
    out.push_str(&format!("  Downloaded: {}\n", stats.assets_downloaded));
    out.push_str(&format!("  Already present: {}\n", stats.assets_present));
    out.push_str(&format!("  Failed: {}\n", stats.assets_failed));
    if stats.assets_planned > 0 {
        out.push_str(&format!("  Planned: {}\n", stats.assets_planned));
    }
    out.push_str(&format!(
        "  Transferred: {:.2} MiB\n",
        stats.bytes_downloaded as f64 / (1024.0 * 1024.0)
    ));

    out
}

/// Prints statistics to stdout
pub fn print_statistics(stats: &RunStatistics) {
    print!("{}", format_statistics(stats));
}
