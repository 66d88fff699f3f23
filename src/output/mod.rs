//! Output module for user-facing run reporting
//!
//! - `ProgressLine`: the overwriting `Progress: NN.NN%` indicator
//! - `RunSummary`: counts and timing for a finished run

mod progress;
mod summary;

pub use progress::{format_progress, ProgressLine};
pub use summary::RunSummary;
