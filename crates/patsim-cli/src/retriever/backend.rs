//! Search backends: how one result page is requested and parsed.
//!
//! - [`GooglePatents`] - GET against the `xhr/query` JSON endpoint
//! - [`Uspto`] - POST against the Patent Public Search API
//!
//! Paging, politeness, the result floor and folding are shared and live in
//! [`engine`](super::engine).

use anyhow::{Context, Result};
use patsim_core::expansion::encode_query;
use serde_json::json;
use url::Url;

use super::fetcher::PageRequest;
use super::parser::{parse_google_page, parse_uspto_page, ParsedPage};

/// One search engine's request and response format.
pub trait SearchBackend {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Request for result page `page` (0-based) of `query`.
    fn page_request(&self, query: &str, page: usize) -> PageRequest;

    /// Reads the total count and identifiers from a response body.
    fn parse_page(&self, body: &str) -> Result<ParsedPage, serde_json::Error>;
}

/// Google Patents.
#[derive(Debug, Clone)]
pub struct GooglePatents {
    base_url: Url,
}

impl GooglePatents {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url =
            Url::parse(base_url).with_context(|| format!("Invalid base URL: {}", base_url))?;
        Ok(Self { base_url })
    }

    /// URL of result page `page` for `query`: the encoded search
    /// `q=(query)&page=N` goes in the endpoint's `url` parameter.
    pub fn page_url(&self, query: &str, page: usize) -> String {
        let search = format!("q={}&page={}", encode_query(query), page);
        let mut url = self.base_url.clone();
        url.query_pairs_mut().append_pair("url", &search);
        url.into()
    }
}

impl SearchBackend for GooglePatents {
    fn name(&self) -> &'static str {
        "google"
    }

    fn page_request(&self, query: &str, page: usize) -> PageRequest {
        PageRequest::Get(self.page_url(query, page))
    }

    fn parse_page(&self, body: &str) -> Result<ParsedPage, serde_json::Error> {
        parse_google_page(body)
    }
}

/// Databases searched on Patent Public Search: published applications,
/// granted patents, and OCR'd historical patents.
const USPTO_DATABASES: [&str; 3] = ["US-PGPUB", "USPAT", "USOCR"];

/// USPTO Patent Public Search.
///
/// Pages are `page_size` documents long, so page `N` starts at
/// `N * page_size`.
#[derive(Debug, Clone)]
pub struct Uspto {
    search_url: Url,
    page_size: usize,
}

impl Uspto {
    pub fn new(search_url: &str, page_size: usize) -> Result<Self> {
        let search_url = Url::parse(search_url)
            .with_context(|| format!("Invalid base URL: {}", search_url))?;
        Ok(Self {
            search_url,
            page_size,
        })
    }

    /// JSON body of the search request. The query goes in unchanged, in the
    /// engine's own boolean syntax.
    pub fn search_body(&self, query: &str, page: usize) -> serde_json::Value {
        let databases: Vec<_> = USPTO_DATABASES
            .iter()
            .map(|name| json!({ "databaseName": name, "countryCodes": [] }))
            .collect();

        json!({
            "start": page * self.page_size,
            "pageCount": self.page_size,
            "sort": "date_publ desc",
            "docFamilyFiltering": "familyIdFiltering",
            "searchType": 1,
            "query": {
                "q": query,
                "qt": "brs",
                "op": "OR",
                "searchType": 1,
                "plurals": true,
                "britishEquivalents": true,
                "databaseFilters": databases,
                "userEnteredQuery": query,
            },
        })
    }
}

impl SearchBackend for Uspto {
    fn name(&self) -> &'static str {
        "uspto"
    }

    fn page_request(&self, query: &str, page: usize) -> PageRequest {
        PageRequest::PostJson {
            url: self.search_url.to_string(),
            body: self.search_body(query, page),
        }
    }

    fn parse_page(&self, body: &str) -> Result<ParsedPage, serde_json::Error> {
        parse_uspto_page(body)
    }
}
