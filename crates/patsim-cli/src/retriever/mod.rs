//! Patent search retrieval over HTTP.
//!
//! Pipeline per query:
//! 1. [`backend`] describes the request for each result page
//! 2. [`fetcher`] sends it with retries and backoff
//! 3. [`parser`] reads the total hit count and the page's identifiers
//! 4. [`diagnostics`] optionally keeps the raw body for later inspection
//!
//! The [`engine`] drives the pages, folds identifiers into a capped,
//! deduplicated [`ResultSet`](patsim_core::ResultSet) and rejects queries
//! whose total is below the configured floor.

pub mod backend;
pub mod diagnostics;
pub mod engine;
pub mod fetcher;
pub mod parser;

pub use diagnostics::DirectorySink;
pub use engine::{GooglePatentsRetriever, UsptoRetriever};

use clap::ValueEnum;
use patsim_core::config::{DEFAULT_PAGES, DEFAULT_TOP_N, MIN_TOTAL_RESULTS};

/// JSON endpoint behind the Google Patents result list.
pub const DEFAULT_BASE_URL: &str = "https://patents.google.com/xhr/query";

/// Search API behind USPTO Patent Public Search.
pub const USPTO_SEARCH_URL: &str =
    "https://ppubs.uspto.gov/dirsearch-public/searches/searchWithBeFamily";

/// Identifiers kept per query on USPTO.
pub const USPTO_TOP_N: usize = 30;

/// Search engine to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Backend {
    /// Google Patents
    #[default]
    Google,
    /// USPTO Patent Public Search
    Uspto,
}

impl Backend {
    /// Retriever defaults for this engine.
    pub fn default_config(self) -> RetrieverConfig {
        match self {
            Backend::Google => RetrieverConfig::default(),
            Backend::Uspto => RetrieverConfig {
                base_url: USPTO_SEARCH_URL.to_string(),
                pages: 1,
                top_n: USPTO_TOP_N,
                delay_ms: 2000,
                ..RetrieverConfig::default()
            },
        }
    }

    /// File stem of the default output file.
    pub fn output_stem(self) -> &'static str {
        match self {
            Backend::Google => "output",
            Backend::Uspto => "uspto_output",
        }
    }
}

/// Browser-like user agent; the endpoint throttles unknown clients harder.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";

/// Configuration for the HTTP retrievers.
#[derive(Debug, Clone)]
pub struct RetrieverConfig {
    /// Search endpoint
    pub base_url: String,
    /// Result pages scanned per query
    pub pages: usize,
    /// Identifiers kept per query
    pub top_n: usize,
    /// Queries reporting fewer total hits are rejected
    pub min_total: u64,
    /// Pause before every request after the first (milliseconds)
    pub delay_ms: u64,
    /// Per-request timeout (seconds)
    pub timeout_secs: u64,
    /// Extra attempts for timeouts, HTTP 429 and 5xx
    pub max_retries: u32,
    /// First retry backoff; doubles on each further attempt (milliseconds)
    pub backoff_ms: u64,
    pub user_agent: String,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            pages: DEFAULT_PAGES,
            top_n: DEFAULT_TOP_N,
            min_total: MIN_TOTAL_RESULTS,
            delay_ms: 1000,
            timeout_secs: 30,
            max_retries: 2,
            backoff_ms: 500,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RetrieverConfig::default();
        assert_eq!(config.pages, 2);
        assert_eq!(config.top_n, 10);
        assert_eq!(config.min_total, 10);
        assert_eq!(config.max_retries, 2);
        assert!(config.base_url.starts_with("https://"));
    }

    #[test]
    fn test_backend_defaults() {
        let google = Backend::Google.default_config();
        assert_eq!(google.base_url, DEFAULT_BASE_URL);
        assert_eq!(google.top_n, 10);

        let uspto = Backend::Uspto.default_config();
        assert_eq!(uspto.base_url, USPTO_SEARCH_URL);
        assert_eq!(uspto.top_n, 30);
        assert_eq!(uspto.pages, 1);
        assert_eq!(uspto.min_total, 10);

        assert_eq!(Backend::Google.output_stem(), "output");
        assert_eq!(Backend::Uspto.output_stem(), "uspto_output");
    }
}
