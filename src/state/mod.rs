//! State module for tracking fetch progress
//!
//! # Components
//!
//! - `FetchState`: Tracks where a single book id is in the fetch pipeline
//! - `RangeProgress`: Counters for one run over a range of ids

mod fetch_state;
mod progress;

// Re-export main types
pub use fetch_state::FetchState;
pub use progress::RangeProgress;
