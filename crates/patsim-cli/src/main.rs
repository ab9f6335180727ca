//! patsim - compare how patent search terms and their boolean combinations
//! overlap in search results.
//!
//! # Usage
//!
//! ```bash
//! # One line per comparison: term 1, term 2[, acronym]
//! patsim queries.txt
//! patsim queries.txt -o cameras.csv
//! patsim queries.txt --format jsonl --variants or
//!
//! # Search USPTO Patent Public Search instead (top 30, uspto_output.csv)
//! patsim queries.txt --backend uspto
//!
//! # Offline run against canned results
//! patsim queries.txt --fixtures fixtures.json
//!
//! # Interactive: prompts for a single line
//! patsim
//! ```

mod batch;
mod config;
mod output;
mod retriever;

use anyhow::{Context, Result};
use batch::{run_batch, OnError};
use clap::{Parser, ValueEnum};
use output::{OutputFormat, RecordWriter};
use patsim_core::config::MIN_TOTAL_RESULTS;
use patsim_core::{AnalysisConfig, Analyzer, Retriever, VariantSet};
use retriever::backend::SearchBackend;
use retriever::engine::PagedRetriever;
use retriever::{Backend, DirectorySink, GooglePatentsRetriever, RetrieverConfig, UsptoRetriever};
use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Boolean variants to search for each line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Variants {
    /// OR form only
    Or,
    /// OR form and AND form
    OrAnd,
}

impl From<Variants> for VariantSet {
    fn from(v: Variants) -> Self {
        match v {
            Variants::Or => VariantSet::OrOnly,
            Variants::OrAnd => VariantSet::OrAnd,
        }
    }
}

/// Patent search-term comparison.
///
/// Searches each pair of terms, their OR and AND combinations, and reports
/// Jaccard and Dice distances between the top results.
#[derive(Parser)]
#[command(name = "patsim", version, about)]
struct Cli {
    /// Input file with one query line per row; prompts when omitted
    input: Option<PathBuf>,

    /// Output file name, placed under the output directory
    #[arg(short, long)]
    output: Option<String>,

    /// Directory for output files
    #[arg(long, env = config::OUTPUT_DIR_ENV, default_value = config::DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Csv)]
    format: OutputFormat,

    /// Boolean variants to search
    #[arg(long, value_enum, default_value_t = Variants::OrAnd)]
    variants: Variants,

    /// Search engine to query
    #[arg(long, value_enum, default_value_t = Backend::Google)]
    backend: Backend,

    /// Result pages scanned per query [default: 2 for google, 1 for uspto]
    #[arg(long, value_parser = parse_positive)]
    pages: Option<usize>,

    /// Identifiers kept per query [default: 10 for google, 30 for uspto]
    #[arg(long, value_parser = parse_positive)]
    top_n: Option<usize>,

    /// Reject queries reporting fewer total results
    #[arg(long, default_value_t = MIN_TOTAL_RESULTS)]
    min_results: u64,

    /// Pause between requests in milliseconds [default: 1000 for google, 2000 for uspto]
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Retries for timeouts and throttled or failed requests
    #[arg(long, default_value_t = 2)]
    retries: u32,

    /// Answer queries from a JSON fixtures file instead of the network
    #[arg(long)]
    fixtures: Option<PathBuf>,

    /// Save every fetched result page under this directory
    #[arg(long)]
    dump_dir: Option<PathBuf>,

    /// What to do when a line fails
    #[arg(long, value_enum, default_value_t = OnError::Skip)]
    on_error: OnError,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn retriever_config(&self) -> RetrieverConfig {
        let defaults = self.backend.default_config();
        RetrieverConfig {
            pages: self.pages.unwrap_or(defaults.pages),
            top_n: self.top_n.unwrap_or(defaults.top_n),
            min_total: self.min_results,
            delay_ms: self.delay_ms.unwrap_or(defaults.delay_ms),
            max_retries: self.retries,
            ..defaults
        }
    }

    fn build_retriever(&self) -> Result<Box<dyn Retriever>> {
        if let Some(path) = &self.fixtures {
            info!("Using fixtures from {}", path.display());
            return Ok(Box::new(config::load_fixtures(path, self.min_results)?));
        }

        let config = self.retriever_config();
        match self.backend {
            Backend::Google => self.with_dump_sink(GooglePatentsRetriever::new(config)?),
            Backend::Uspto => self.with_dump_sink(UsptoRetriever::new(config)?),
        }
    }

    fn with_dump_sink<B>(&self, retriever: PagedRetriever<B>) -> Result<Box<dyn Retriever>>
    where
        B: SearchBackend + 'static,
    {
        let Some(dir) = &self.dump_dir else {
            return Ok(Box::new(retriever));
        };
        let sink = DirectorySink::new(dir)
            .with_context(|| format!("Failed to create dump directory: {}", dir.display()))?;
        Ok(Box::new(retriever.with_sink(sink)))
    }
}

fn parse_positive(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

/// Reads query lines from `input`, or prompts for one on stdin.
fn read_lines(input: Option<&Path>) -> Result<Vec<String>> {
    match input {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read input file: {}", path.display()))?;
            Ok(text.lines().map(str::to_string).collect())
        }
        None => {
            print!("Enter your query: ");
            io::stdout().flush()?;
            let mut line = String::new();
            io::stdin()
                .lock()
                .read_line(&mut line)
                .context("Failed to read query from stdin")?;
            Ok(vec![line.trim_end_matches(['\r', '\n']).to_string()])
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    // Validate the output name before doing any network work
    let output_path = config::output_path(
        &cli.output_dir,
        cli.output.as_deref(),
        cli.backend.output_stem(),
        cli.format,
    )?;
    let lines = read_lines(cli.input.as_deref())?;
    let retriever = cli.build_retriever()?;

    config::ensure_parent_dir(&output_path)?;
    let file = File::create(&output_path)
        .with_context(|| format!("Failed to create output file: {}", output_path.display()))?;

    let variants = VariantSet::from(cli.variants);
    let mut writer = RecordWriter::new(file, cli.format, variants)?;
    let analyzer = Analyzer::new(retriever.as_ref(), AnalysisConfig::with_variants(variants));

    let summary = run_batch(&analyzer, &lines, &mut writer, cli.on_error).await?;
    info!("Wrote {} records", writer.written());
    writer.into_inner()?;

    println!("Output saved to {}", output_path.display());
    println!("{}", summary);
    if !summary.is_clean() {
        for failure in &summary.failures {
            eprintln!(
                "  line {} ({}): {}",
                failure.line_number, failure.line, failure.error
            );
        }
    }

    if summary.halted {
        std::process::exit(1);
    }
    Ok(())
}
