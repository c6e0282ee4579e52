//! State module for tracking run progress
//!
//! # Components
//!
//! - `EntryState`: Tracks one catalog entry from the listing through extraction
//!   and download to its terminal outcome

mod entry_state;

// Re-export main types
pub use entry_state::EntryState;
