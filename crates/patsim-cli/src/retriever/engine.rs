//! Paged retrieval shared by every search backend.
//!
//! For each query the engine:
//! - Asks the backend for one request per page
//! - Waits out the politeness delay before every request but the first
//! - Checks the result floor on page 0, before fetching more pages
//! - Folds identifiers across pages, deduplicated and capped at top-N
//! - Stops early once the cap is reached or a page comes back empty

use std::cell::Cell;
use std::time::Duration;

use anyhow::{Context, Result};
use patsim_core::{ResultSet, RetrievalError, Retriever};
use tokio::time::sleep;
use tracing::{debug, info, instrument};

use super::backend::{GooglePatents, SearchBackend, Uspto};
use super::diagnostics::{DiagnosticSink, NoopSink};
use super::fetcher::Fetcher;
use super::parser::ParsedPage;
use super::RetrieverConfig;

/// [`Retriever`] that pages through a [`SearchBackend`] over HTTP.
pub struct PagedRetriever<B> {
    config: RetrieverConfig,
    backend: B,
    fetcher: Fetcher,
    sink: Box<dyn DiagnosticSink>,
    requests: Cell<usize>,
}

/// Retriever backed by the Google Patents JSON endpoint.
pub type GooglePatentsRetriever = PagedRetriever<GooglePatents>;

/// Retriever backed by USPTO Patent Public Search.
pub type UsptoRetriever = PagedRetriever<Uspto>;

impl GooglePatentsRetriever {
    pub fn new(config: RetrieverConfig) -> Result<Self> {
        let backend = GooglePatents::new(&config.base_url)?;
        Self::with_backend(backend, config)
    }
}

impl UsptoRetriever {
    pub fn new(config: RetrieverConfig) -> Result<Self> {
        let backend = Uspto::new(&config.base_url, config.top_n)?;
        Self::with_backend(backend, config)
    }
}

impl<B: SearchBackend> PagedRetriever<B> {
    /// Creates a retriever with a pooled HTTP client and no page capture.
    pub fn with_backend(backend: B, config: RetrieverConfig) -> Result<Self> {
        let fetcher = Fetcher::new(&config).context("Failed to build HTTP client")?;

        Ok(Self {
            config,
            backend,
            fetcher,
            sink: Box::new(NoopSink),
            requests: Cell::new(0),
        })
    }

    /// Sends every fetched page body to `sink`.
    pub fn with_sink(mut self, sink: impl DiagnosticSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Number of HTTP page fetches started so far (retries not counted).
    #[cfg(test)]
    fn request_count(&self) -> usize {
        self.requests.get()
    }

    async fn pause(&self) {
        let made = self.requests.get();
        if made > 0 && self.config.delay_ms > 0 {
            sleep(Duration::from_millis(self.config.delay_ms)).await;
        }
        self.requests.set(made + 1);
    }

    async fn fetch_parsed(&self, query: &str, page: usize) -> Result<ParsedPage, RetrievalError> {
        self.pause().await;

        let request = self.backend.page_request(query, page);
        let (body, status) = self.fetcher.fetch(query, &request).await?;
        self.sink.record_page(query, page, &body);

        if !(200..300).contains(&status) {
            return Err(RetrievalError::Request {
                query: query.to_string(),
                cause: format!("HTTP {} from {}", status, request.url()),
            });
        }

        self.backend
            .parse_page(&body)
            .map_err(|e| RetrievalError::Parse {
                query: query.to_string(),
                cause: e.to_string(),
            })
    }
}

#[async_trait::async_trait(?Send)]
impl<B: SearchBackend> Retriever for PagedRetriever<B> {
    #[instrument(skip_all, fields(query = %query))]
    async fn retrieve(&self, query: &str) -> Result<ResultSet, RetrievalError> {
        let cap = self.config.top_n;
        let mut result = ResultSet::default();

        for page in 0..self.config.pages {
            let parsed = self.fetch_parsed(query, page).await?;

            if page == 0 {
                result = ResultSet::new(parsed.total_results, Vec::new())
                    .ensure_floor(query, self.config.min_total)?;
            }
            if parsed.identifiers.is_empty() {
                debug!("Page {} of '{}' is empty, stopping", page, query);
                break;
            }

            result = result.extend_capped(parsed.identifiers, cap);
            if result.len() >= cap {
                debug!("Collected {} identifiers for '{}' by page {}", cap, query, page);
                break;
            }
        }

        info!(
            "{} '{}': {} total results, kept {}",
            self.backend.name(),
            query,
            result.total_count,
            result.len()
        );
        Ok(result)
    }
}
