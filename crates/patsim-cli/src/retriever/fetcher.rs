//! HTTP fetching with retry and backoff.
//!
//! One pooled `reqwest::Client` is built per [`Fetcher`] and reused for every
//! page of every query, so repeated requests to the same host share
//! connections.

use super::RetrieverConfig;
use patsim_core::RetrievalError;
use reqwest::StatusCode;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, instrument, warn};

/// One HTTP request for a result page.
#[derive(Debug, Clone, PartialEq)]
pub enum PageRequest {
    Get(String),
    /// POST with a JSON body
    PostJson {
        url: String,
        body: serde_json::Value,
    },
}

impl PageRequest {
    pub fn url(&self) -> &str {
        match self {
            PageRequest::Get(url) => url,
            PageRequest::PostJson { url, .. } => url,
        }
    }
}

/// Pooled HTTP client that retries transient failures.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    max_retries: u32,
    backoff_ms: u64,
}

impl Fetcher {
    /// Builds the client from the retriever configuration.
    pub fn new(config: &RetrieverConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(4)
            .build()?;

        Ok(Self {
            client,
            max_retries: config.max_retries,
            backoff_ms: config.backoff_ms,
        })
    }

    /// Sends `request` and returns the response body and HTTP status.
    ///
    /// Timeouts, connection failures, HTTP 429 and 5xx are retried up to
    /// `max_retries` times with exponential backoff. Any other status is
    /// returned as-is for the caller to judge. `query` only labels errors.
    #[instrument(skip_all, fields(query = %query, url = %request.url()))]
    pub async fn fetch(
        &self,
        query: &str,
        request: &PageRequest,
    ) -> Result<(String, u16), RetrievalError> {
        let mut attempt = 0;
        loop {
            let outcome = self.fetch_once(query, request).await;

            let retryable = match &outcome {
                Ok((_, status)) => is_retryable_status(*status),
                Err(e) => e.is_transient(),
            };
            if !retryable || attempt >= self.max_retries {
                return outcome;
            }

            let backoff = self.backoff(attempt);
            match &outcome {
                Ok((_, status)) => warn!(
                    "HTTP {} for '{}', retrying in {:?} ({}/{})",
                    status,
                    query,
                    backoff,
                    attempt + 1,
                    self.max_retries
                ),
                Err(e) => warn!(
                    "{}, retrying in {:?} ({}/{})",
                    e,
                    backoff,
                    attempt + 1,
                    self.max_retries
                ),
            }
            sleep(backoff).await;
            attempt += 1;
        }
    }

    async fn fetch_once(
        &self,
        query: &str,
        request: &PageRequest,
    ) -> Result<(String, u16), RetrievalError> {
        let builder = match request {
            PageRequest::Get(url) => {
                debug!("GET {}", url);
                self.client.get(url)
            }
            PageRequest::PostJson { url, body } => {
                debug!("POST {}", url);
                self.client.post(url).json(body)
            }
        };

        let response = builder
            .send()
            .await
            .map_err(|e| request_error(query, e))?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| request_error(query, e))?;

        Ok((body, status))
    }

    fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.backoff_ms.saturating_mul(1u64 << attempt.min(16)))
    }
}

fn request_error(query: &str, e: reqwest::Error) -> RetrievalError {
    if e.is_timeout() {
        RetrievalError::Timeout {
            query: query.to_string(),
        }
    } else {
        RetrievalError::Request {
            query: query.to_string(),
            cause: e.to_string(),
        }
    }
}

/// Throttling and server-side failures.
fn is_retryable_status(status: u16) -> bool {
    StatusCode::from_u16(status)
        .map(|s| s == StatusCode::TOO_MANY_REQUESTS || s.is_server_error())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_status() {
        assert!(is_retryable_status(429));
        assert!(is_retryable_status(500));
        assert!(is_retryable_status(503));
        assert!(!is_retryable_status(200));
        assert!(!is_retryable_status(404));
        assert!(!is_retryable_status(403));
    }

    #[test]
    fn test_backoff_doubles() {
        let config = RetrieverConfig {
            backoff_ms: 250,
            ..RetrieverConfig::default()
        };
        let fetcher = Fetcher::new(&config).unwrap();

        assert_eq!(fetcher.backoff(0), Duration::from_millis(250));
        assert_eq!(fetcher.backoff(1), Duration::from_millis(500));
        assert_eq!(fetcher.backoff(2), Duration::from_millis(1000));
    }

    #[test]
    fn test_request_url() {
        let get = PageRequest::Get("http://a.test/x".to_string());
        let post = PageRequest::PostJson {
            url: "http://b.test/y".to_string(),
            body: serde_json::json!({"q": "cats"}),
        };
        assert_eq!(get.url(), "http://a.test/x");
        assert_eq!(post.url(), "http://b.test/y");
    }

    #[tokio::test]
    async fn test_unreachable_host_is_request_error() {
        let config = RetrieverConfig {
            max_retries: 0,
            timeout_secs: 5,
            ..RetrieverConfig::default()
        };
        let fetcher = Fetcher::new(&config).unwrap();

        // Port 9 on localhost is reserved for discard and normally closed
        let request = PageRequest::Get("http://127.0.0.1:9/".to_string());
        let result = fetcher.fetch("q", &request).await;
        assert!(matches!(
            result,
            Err(RetrievalError::Request { .. }) | Err(RetrievalError::Timeout { .. })
        ));
    }
}
