//! Output writers for analyzed lines.
//!
//! Two formats:
//! - CSV with a fixed header, one row per line, compatible with spreadsheet
//!   workflows built around the original column layout
//! - JSON Lines, one serialized [`OutputRecord`] per line
//!
//! Both writers flush after every record so partial batches survive a crash
//! or an interrupted run.

use anyhow::{anyhow, Context, Result};
use clap::ValueEnum;
use patsim_core::config::IDENTIFIER_SEPARATOR;
use patsim_core::record::OutputRecord;
use patsim_core::similarity::{DistanceEntry, Metric, SetLabel};
use patsim_core::{ResultSet, VariantSet};
use std::io::Write;

/// Column label used for the single variant in OR-only mode.
const BOOL_TERM_LABEL: &str = "Bool term";

/// Output file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Csv,
    Jsonl,
}

impl OutputFormat {
    /// File extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Jsonl => "jsonl",
        }
    }
}

/// Header label for a result set under the given variant configuration.
fn set_label(label: SetLabel, variants: VariantSet) -> String {
    match (label, variants) {
        (SetLabel::Or, VariantSet::OrOnly) => BOOL_TERM_LABEL.to_string(),
        _ => label.to_string(),
    }
}

/// Distance columns in output order, as entries without values.
fn distance_columns(variants: VariantSet) -> Vec<DistanceEntry> {
    let mut pairs = vec![(SetLabel::Term1, SetLabel::Term2)];
    for &kind in variants.kinds() {
        let set = SetLabel::from(kind);
        pairs.extend([(SetLabel::Term1, set), (SetLabel::Term2, set)]);
    }

    let mut columns = Vec::with_capacity(variants.full_distance_len());
    for (left, right) in pairs {
        for metric in [Metric::Jaccard, Metric::Dice] {
            columns.push(DistanceEntry {
                metric,
                left,
                right,
                value: None,
            });
        }
    }
    columns
}

/// Builds the CSV header row.
pub fn csv_header(variants: VariantSet) -> Vec<String> {
    let sets = [SetLabel::Term1, SetLabel::Term2]
        .into_iter()
        .chain(variants.kinds().iter().map(|&k| SetLabel::from(k)));

    let mut header = Vec::new();
    for set in sets {
        let label = set_label(set, variants);
        header.push(label.clone());
        header.extend([
            format!("{}: total results", label),
            format!("{}: top results", label),
        ]);
    }

    header.extend(
        distance_columns(variants)
            .iter()
            .map(|column| column.label_with(|set| set_label(set, variants))),
    );
    header
}

fn push_set(row: &mut Vec<String>, name: Option<&str>, result: Option<&ResultSet>) {
    row.push(name.unwrap_or_default().to_string());
    match result {
        Some(result) => {
            row.push(result.total_count.to_string());
            row.push(result.top_identifiers.join(IDENTIFIER_SEPARATOR));
        }
        None => row.extend([String::new(), String::new()]),
    }
}

/// Builds the CSV row for one record.
///
/// Missing term 2, absent variants, and undefined distances are blank cells,
/// so every row has exactly as many cells as [`csv_header`].
pub fn csv_row(record: &OutputRecord, variants: VariantSet) -> Vec<String> {
    let mut row = Vec::new();

    for index in 0..2 {
        let term = record.base_term(index);
        push_set(
            &mut row,
            term.map(|t| t.term.as_str()),
            term.map(|t| &t.result),
        );
    }

    for &kind in variants.kinds() {
        let variant = record.variant(kind);
        push_set(
            &mut row,
            variant.and_then(|v| v.query.as_deref()),
            variant.and_then(|v| v.result.as_ref()),
        );
    }

    for column in distance_columns(variants) {
        let cell = record
            .distances
            .get(column.metric, column.left, column.right)
            .and_then(|entry| entry.value)
            .map(|value| format!("{:.4}", value))
            .unwrap_or_default();
        row.push(cell);
    }
    row
}

/// Serializes one record as a single JSON line (no trailing newline).
pub fn format_jsonl(record: &OutputRecord) -> Result<String> {
    serde_json::to_string(record).context("Failed to serialize record")
}

enum Sink<W: Write> {
    Csv(csv::Writer<W>),
    Jsonl(W),
}

/// Streams records to a writer in the chosen format.
pub struct RecordWriter<W: Write> {
    sink: Sink<W>,
    variants: VariantSet,
    written: usize,
}

impl<W: Write> RecordWriter<W> {
    /// Wraps `writer`. CSV output gets its header immediately.
    pub fn new(writer: W, format: OutputFormat, variants: VariantSet) -> Result<Self> {
        let sink = match format {
            OutputFormat::Csv => {
                let mut csv = csv::Writer::from_writer(writer);
                csv.write_record(csv_header(variants))
                    .context("Failed to write CSV header")?;
                csv.flush().context("Failed to flush CSV header")?;
                Sink::Csv(csv)
            }
            OutputFormat::Jsonl => Sink::Jsonl(writer),
        };

        Ok(Self {
            sink,
            variants,
            written: 0,
        })
    }

    /// Writes and flushes one record.
    pub fn write(&mut self, record: &OutputRecord) -> Result<()> {
        match &mut self.sink {
            Sink::Csv(csv) => {
                csv.write_record(csv_row(record, self.variants))
                    .context("Failed to write CSV row")?;
                csv.flush()?;
            }
            Sink::Jsonl(out) => {
                let line = format_jsonl(record)?;
                writeln!(out, "{}", line).context("Failed to write JSON line")?;
                out.flush()?;
            }
        }
        self.written += 1;
        Ok(())
    }

    /// Number of records written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Flushes and returns the underlying writer.
    pub fn into_inner(self) -> Result<W> {
        match self.sink {
            Sink::Csv(csv) => csv
                .into_inner()
                .map_err(|e| anyhow!("Failed to flush CSV output: {}", e.error())),
            Sink::Jsonl(mut out) => {
                out.flush()?;
                Ok(out)
            }
        }
    }
}
