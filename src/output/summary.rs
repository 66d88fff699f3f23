//! End-of-run summary

use crate::state::RangeProgress;
use chrono::{DateTime, Utc};

/// Counts and timing for one completed (or aborted) range run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub start_id: u32,
    pub end_id: u32,
    pub progress: RangeProgress,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    /// Percentage of processed ids that were downloaded
    pub fn success_rate(&self) -> f64 {
        if self.progress.processed == 0 {
            return 0.0;
        }
        (self.progress.succeeded as f64 / self.progress.processed as f64) * 100.0
    }

    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    /// Logs the summary at info level
    pub fn log(&self) {
        tracing::info!(
            "Run [{}, {}) finished in {}s: {} requested, {} processed, {} downloaded, {} not found, {} failed, {} exhausted ({:.1}% success)",
            self.start_id,
            self.end_id,
            self.elapsed().num_seconds(),
            self.progress.total_requested,
            self.progress.processed,
            self.progress.succeeded,
            self.progress.not_found,
            self.progress.failed,
            self.progress.exhausted,
            self.success_rate()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_rate() {
        let mut progress = RangeProgress::for_range(1, 5);
        progress.record_success();
        progress.record_success();
        progress.record_not_found();
        progress.record_failure();

        let now = Utc::now();
        let summary = RunSummary {
            start_id: 1,
            end_id: 5,
            progress,
            started_at: now,
            finished_at: now + chrono::Duration::seconds(3),
        };

        assert_eq!(summary.success_rate(), 50.0);
        assert_eq!(summary.elapsed().num_seconds(), 3);
    }

    #[test]
    fn test_empty_run_success_rate() {
        let now = Utc::now();
        let summary = RunSummary {
            start_id: 5,
            end_id: 5,
            progress: RangeProgress::for_range(5, 5),
            started_at: now,
            finished_at: now,
        };
        assert_eq!(summary.success_rate(), 0.0);
    }
}
