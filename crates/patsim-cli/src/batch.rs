//! Batch driver: runs every input line through the analyzer.
//!
//! Lines are processed one at a time. Each successful record is written and
//! flushed before the next line starts. A failed line is logged and either
//! skipped or ends the batch, depending on [`OnError`].

use crate::output::RecordWriter;
use anyhow::Result;
use clap::ValueEnum;
use patsim_core::{AnalysisError, Analyzer};
use std::fmt;
use std::io::Write;
use std::time::Instant;
use tracing::{error, info, warn};

/// What to do when a line fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OnError {
    /// Log the failure and continue with the next line
    #[default]
    Skip,
    /// Stop the batch at the first failure
    Halt,
}

/// A line that could not be analyzed.
#[derive(Debug, Clone)]
pub struct LineFailure {
    /// 1-based line number in the input
    pub line_number: usize,
    pub line: String,
    pub error: AnalysisError,
}

/// Counts for one batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    /// Non-blank lines attempted
    pub lines_processed: usize,
    /// Records written
    pub lines_succeeded: usize,
    /// Blank lines skipped without analysis
    pub blank_lines: usize,
    pub failures: Vec<LineFailure>,
    /// True if the batch stopped early on a failure
    pub halted: bool,
    pub elapsed_ms: u64,
}

impl BatchSummary {
    /// Number of failed lines.
    pub fn lines_failed(&self) -> usize {
        self.failures.len()
    }

    /// Returns true if every attempted line produced a record.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Processed {} line{}: {} succeeded, {} failed",
            self.lines_processed,
            if self.lines_processed == 1 { "" } else { "s" },
            self.lines_succeeded,
            self.lines_failed()
        )?;
        if self.halted {
            write!(f, " (halted)")?;
        }
        Ok(())
    }
}

/// Analyzes `lines` in order and streams records to `writer`.
///
/// Line failures are collected in the summary. Only writer failures are
/// returned as errors, since they affect every following line too.
pub async fn run_batch<I, W>(
    analyzer: &Analyzer<'_>,
    lines: I,
    writer: &mut RecordWriter<W>,
    on_error: OnError,
) -> Result<BatchSummary>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
    W: Write,
{
    let start = Instant::now();
    let mut summary = BatchSummary::default();

    for (index, line) in lines.into_iter().enumerate() {
        let line = line.as_ref();
        let line_number = index + 1;

        if line.trim().is_empty() {
            summary.blank_lines += 1;
            continue;
        }
        summary.lines_processed += 1;

        match analyzer.analyze_line(line).await {
            Ok(record) => {
                writer.write(&record)?;
                summary.lines_succeeded += 1;
            }
            Err(e) => {
                if e.is_input_error() {
                    warn!("Line {}: {}", line_number, e);
                } else {
                    error!("Line {}: {}", line_number, e);
                }
                summary.failures.push(LineFailure {
                    line_number,
                    line: line.to_string(),
                    error: e,
                });

                if on_error == OnError::Halt {
                    summary.halted = true;
                    break;
                }
            }
        }
    }

    summary.elapsed_ms = start.elapsed().as_millis() as u64;
    info!(
        "{} ({} blank skipped) in {}ms",
        summary, summary.blank_lines, summary.elapsed_ms
    );
    Ok(summary)
}
