//! Range runner - iterates a span of book ids
//!
//! Ids are processed one at a time in ascending order. Per-book failures are
//! counted and skipped; exhausted retries either stop the run or are counted,
//! depending on the configured `ExhaustionPolicy`.

use crate::config::ExhaustionPolicy;
use crate::crawler::book_fetcher::{BookFetcher, FetchOutcome};
use crate::crawler::fetcher::{HttpFetcher, ReqwestFetcher};
use crate::output::{ProgressLine, RunSummary};
use crate::state::RangeProgress;
use crate::{TululuError, FAILURE_LOG_TARGET};
use chrono::Utc;
use std::io::{self, Write};

/// Drives a `BookFetcher` over `[start_id, end_id)`
pub struct RangeRunner<F = ReqwestFetcher, W: Write = io::Stdout> {
    fetcher: BookFetcher<F>,
    policy: ExhaustionPolicy,
    progress_line: ProgressLine<W>,
}

impl<F: HttpFetcher> RangeRunner<F, io::Stdout> {
    /// Creates a runner that reports progress on stdout
    pub fn new(fetcher: BookFetcher<F>, policy: ExhaustionPolicy) -> Self {
        Self::with_progress_line(fetcher, policy, ProgressLine::stdout())
    }
}

impl<F: HttpFetcher, W: Write> RangeRunner<F, W> {
    pub fn with_progress_line(
        fetcher: BookFetcher<F>,
        policy: ExhaustionPolicy,
        progress_line: ProgressLine<W>,
    ) -> Self {
        Self {
            fetcher,
            policy,
            progress_line,
        }
    }

    pub fn policy(&self) -> ExhaustionPolicy {
        self.policy
    }

    /// Consumes the runner, returning the progress sink
    pub fn into_progress_line(self) -> ProgressLine<W> {
        self.progress_line
    }

    /// Processes every id in `[start_id, end_id)`
    ///
    /// An empty or inverted range makes no requests and returns a zero
    /// summary. After each id the progress line is rewritten; a completed run
    /// always ends the line with a newline. Under
    /// `ExhaustionPolicy::Abort`, the first book to exhaust its retries ends
    /// the run with `TululuError::RetriesExhausted`.
    pub async fn run(&mut self, start_id: u32, end_id: u32) -> crate::Result<RunSummary> {
        let started_at = Utc::now();
        let mut progress = RangeProgress::for_range(start_id, end_id);

        if progress.total_requested == 0 {
            tracing::info!("Empty range [{}, {}), nothing to do", start_id, end_id);
        } else {
            tracing::info!(
                "Fetching {} book(s) from id {} to {}",
                progress.total_requested,
                start_id,
                end_id
            );
        }

        for book_id in start_id..end_id {
            match self.fetcher.fetch_one(book_id).await {
                FetchOutcome::Success { .. } => progress.record_success(),
                FetchOutcome::NotFound { .. } => progress.record_not_found(),
                FetchOutcome::Failed { .. } => progress.record_failure(),
                FetchOutcome::RetriesExhausted { book_id, attempts } => match self.policy {
                    ExhaustionPolicy::Abort => {
                        if self.progress_line.has_output() {
                            self.progress_line.finish()?;
                        }
                        return Err(TululuError::RetriesExhausted { book_id, attempts });
                    }
                    ExhaustionPolicy::Continue => {
                        tracing::warn!(
                            target: FAILURE_LOG_TARGET,
                            book_id,
                            "Skipping book {} after {} failed attempts",
                            book_id,
                            attempts
                        );
                        progress.record_exhausted();
                    }
                },
            }

            self.progress_line.update(&progress)?;
        }

        self.progress_line.finish()?;

        let summary = RunSummary {
            start_id,
            end_id,
            progress,
            started_at,
            finished_at: Utc::now(),
        };
        summary.log();
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    fn runner(policy: ExhaustionPolicy) -> RangeRunner<ReqwestFetcher, Vec<u8>> {
        let fetcher = BookFetcher::from_config(&Config::default()).unwrap();
        RangeRunner::with_progress_line(fetcher, policy, ProgressLine::new(Vec::new()))
    }

    #[tokio::test]
    async fn test_empty_range_does_nothing() {
        let mut runner = runner(ExhaustionPolicy::Abort);

        let summary = runner.run(5, 5).await.unwrap();

        assert_eq!(summary.progress.total_requested, 0);
        assert_eq!(summary.progress.processed, 0);
        assert_eq!(summary.progress.percentage(), 0.0);
        assert_eq!(runner.into_progress_line().into_inner(), b"\n");
    }

    #[tokio::test]
    async fn test_inverted_range_does_nothing() {
        let mut runner = runner(ExhaustionPolicy::Continue);

        let summary = runner.run(10, 3).await.unwrap();

        assert_eq!(summary.progress, RangeProgress::default());
        assert_eq!(runner.into_progress_line().into_inner(), b"\n");
    }
}
