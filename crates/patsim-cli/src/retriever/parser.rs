//! Parsing of search responses into [`ParsedPage`]s.
//!
//! Only the two things the analysis needs are read: the engine's total hit
//! count and the identifiers listed on the page, in rank order.
//!
//! Google Patents `xhr/query`:
//!
//! ```json
//! {
//!   "results": {
//!     "total_num_results": 7412,
//!     "cluster": [
//!       { "result": [ { "id": "patent/US9876543B2/en",
//!                       "patent": { "publication_number": "US9876543B2" } } ] }
//!     ]
//!   }
//! }
//! ```
//!
//! USPTO Patent Public Search (`searchWithBeFamily`):
//!
//! ```json
//! { "numFound": 412, "patents": [ { "guid": "US-11223344-B2" } ] }
//! ```

use serde::Deserialize;

/// One parsed result page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPage {
    /// Engine-reported number of matches for the whole query
    pub total_results: u64,
    /// Publication numbers on this page, in rank order
    pub identifiers: Vec<String>,
}

#[derive(Deserialize)]
struct QueryResponse {
    results: Results,
}

#[derive(Deserialize)]
struct Results {
    #[serde(default)]
    total_num_results: u64,
    #[serde(default)]
    cluster: Vec<Cluster>,
}

#[derive(Deserialize)]
struct Cluster {
    #[serde(default)]
    result: Vec<Hit>,
}

#[derive(Deserialize)]
struct Hit {
    id: Option<String>,
    patent: Option<PatentSummary>,
}

#[derive(Deserialize)]
struct PatentSummary {
    publication_number: Option<String>,
}

impl Hit {
    /// Publication number, falling back to the middle of `patent/<ID>/<lang>`.
    fn identifier(self) -> Option<String> {
        let from_patent = self
            .patent
            .and_then(|p| p.publication_number)
            .filter(|n| !n.is_empty());

        from_patent.or_else(|| {
            self.id
                .as_deref()
                .and_then(|id| id.split('/').nth(1))
                .filter(|n| !n.is_empty())
                .map(str::to_string)
        })
    }
}

/// Parses one Google Patents response body.
///
/// Hits without a usable identifier are dropped. An empty page (no clusters)
/// parses to an empty identifier list.
pub fn parse_google_page(body: &str) -> Result<ParsedPage, serde_json::Error> {
    let response: QueryResponse = serde_json::from_str(body)?;

    let identifiers = response
        .results
        .cluster
        .into_iter()
        .flat_map(|c| c.result)
        .filter_map(Hit::identifier)
        .collect();

    Ok(ParsedPage {
        total_results: response.results.total_num_results,
        identifiers,
    })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsptoResponse {
    num_found: u64,
    #[serde(default)]
    patents: Vec<UsptoDoc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsptoDoc {
    guid: Option<String>,
    publication_reference_document_number: Option<String>,
}

impl UsptoDoc {
    fn identifier(self) -> Option<String> {
        self.guid
            .filter(|g| !g.is_empty())
            .or(self.publication_reference_document_number)
            .filter(|n| !n.is_empty())
    }
}

/// Parses one USPTO search response body.
///
/// `numFound` is required so that an error object is not mistaken for an
/// empty result.
pub fn parse_uspto_page(body: &str) -> Result<ParsedPage, serde_json::Error> {
    let response: UsptoResponse = serde_json::from_str(body)?;

    Ok(ParsedPage {
        total_results: response.num_found,
        identifiers: response
            .patents
            .into_iter()
            .filter_map(UsptoDoc::identifier)
            .collect(),
    })
}
