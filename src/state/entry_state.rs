//! Entry state definitions for tracking catalog entry progress
//!
//! Every catalog entry moves through these states exactly once per run.

use std::fmt;

/// Represents the current state of a catalog entry in a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryState {
    // ===== Active States =====
    /// Entry has been read from the listing page
    Pending,

    /// Detail page is being fetched and resolved
    Extracting,

    /// Assets are being downloaded
    Downloading,

    // ===== Terminal States =====
    /// Every asset was downloaded or already present
    Done,

    /// Some assets failed after exhausting retries, others succeeded
    PartiallyDone,

    /// Every asset failed
    Failed,

    /// Detail page could not be fetched or lacked a title
    Skipped,
}

impl EntryState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending | Self::Extracting | Self::Downloading)
    }

    /// Returns true if moving from `self` to `next` is a legal transition
    ///
    /// ```text
    /// Pending -> Extracting -> Downloading -> Done | PartiallyDone | Failed
    ///                       -> Skipped
    /// ```
    pub fn can_transition_to(&self, next: EntryState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Extracting)
                | (Self::Extracting, Self::Downloading)
                | (Self::Extracting, Self::Skipped)
                | (Self::Downloading, Self::Done)
                | (Self::Downloading, Self::PartiallyDone)
                | (Self::Downloading, Self::Failed)
        )
    }

    /// Picks the terminal state for an entry from its asset results
    pub fn from_asset_counts(succeeded: usize, failed: usize) -> Self {
        match (succeeded, failed) {
            (_, 0) => Self::Done,
            (0, _) => Self::Failed,
            _ => Self::PartiallyDone,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Extracting => "extracting",
            Self::Downloading => "downloading",
            Self::Done => "done",
            Self::PartiallyDone => "partially_done",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }

    /// Returns all terminal states, in reporting order
    pub fn terminal_states() -> [Self; 4] {
        [Self::Done, Self::PartiallyDone, Self::Failed, Self::Skipped]
    }
}

impl fmt::Display for EntryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
