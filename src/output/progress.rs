//! Single-line progress indicator

use crate::state::RangeProgress;
use std::io::{self, Write};

/// Writes `Progress: NN.NN%` on one line, rewriting it in place
///
/// Each update starts with a carriage return so the terminal shows only the
/// latest value. `finish` ends the line with a newline.
#[derive(Debug)]
pub struct ProgressLine<W: Write> {
    out: W,
    started: bool,
}

impl ProgressLine<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> ProgressLine<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            started: false,
        }
    }

    /// Rewrites the progress line with the current percentage
    pub fn update(&mut self, progress: &RangeProgress) -> io::Result<()> {
        write!(self.out, "\r{}", format_progress(progress.percentage()))?;
        self.out.flush()?;
        self.started = true;
        Ok(())
    }

    /// Terminates the progress line
    pub fn finish(&mut self) -> io::Result<()> {
        writeln!(self.out)?;
        self.out.flush()
    }

    /// True once at least one update has been written
    pub fn has_output(&self) -> bool {
        self.started
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Formats a percentage with two decimals, e.g. `Progress: 33.33% `
pub fn format_progress(percentage: f64) -> String {
    format!("Progress: {:.2}% ", percentage)
}
