//! Run-scoped progress counters

/// Counters for one range run
///
/// Created when a run starts and dropped when it ends. `processed` only ever
/// grows and never exceeds `total_requested`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeProgress {
    /// Number of ids in the requested range
    pub total_requested: u64,

    /// Ids that completed, successfully or with a handled failure
    pub processed: u64,

    pub succeeded: u64,
    pub not_found: u64,
    pub failed: u64,

    /// Ids that exhausted their retries (only counted under the continue policy)
    pub exhausted: u64,
}

impl RangeProgress {
    /// Creates counters for the half-open range `[start_id, end_id)`
    ///
    /// An empty or inverted range has zero work.
    pub fn for_range(start_id: u32, end_id: u32) -> Self {
        Self {
            total_requested: u64::from(end_id.saturating_sub(start_id)),
            ..Self::default()
        }
    }

    pub fn record_success(&mut self) {
        self.succeeded += 1;
        self.mark_processed();
    }

    pub fn record_not_found(&mut self) {
        self.not_found += 1;
        self.mark_processed();
    }

    pub fn record_failure(&mut self) {
        self.failed += 1;
        self.mark_processed();
    }

    pub fn record_exhausted(&mut self) {
        self.exhausted += 1;
        self.mark_processed();
    }

    fn mark_processed(&mut self) {
        if self.processed < self.total_requested {
            self.processed += 1;
        }
    }

    /// Percentage of the range that has been processed
    ///
    /// Returns 0.0 for an empty range instead of dividing by zero.
    pub fn percentage(&self) -> f64 {
        if self.total_requested == 0 {
            return 0.0;
        }
        (self.processed as f64 / self.total_requested as f64) * 100.0
    }

    pub fn is_complete(&self) -> bool {
        self.processed == self.total_requested
    }
}
