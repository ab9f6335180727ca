//! Retrieval abstraction and result sets.
//!
//! The analyzer never talks to a search engine directly. It is handed a
//! [`Retriever`] and asks it for one [`ResultSet`] per query string. How the
//! set is obtained (HTTP, a rendered page, canned fixtures) is up to the
//! implementation, as are retries and politeness delays.
//!
//! # Implementations
//!
//! - [`InMemoryRetriever`] - Canned results keyed by query, for tests and offline runs
//! - `GooglePatentsRetriever`, `UsptoRetriever` - HTTP retrievers (in the CLI crate)

use crate::error::RetrievalError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Total hit count plus a ranked, deduplicated sample of identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSet {
    /// Engine-reported number of matches
    pub total_count: u64,
    /// Top identifiers in rank order, unique, capped at N
    pub top_identifiers: Vec<String>,
}

impl ResultSet {
    /// Creates a result set, dropping duplicate identifiers (first one wins).
    pub fn new(total_count: u64, identifiers: Vec<String>) -> Self {
        Self::from_candidates(total_count, identifiers, usize::MAX)
    }

    /// Folds a candidate sequence into a deduplicated list capped at `cap`.
    ///
    /// Candidates are consumed lazily: iteration stops as soon as `cap`
    /// unique identifiers have been collected, so a lazy page iterator is
    /// never advanced further than needed.
    ///
    /// # Example
    ///
    /// ```
    /// use patsim_core::retrieval::ResultSet;
    ///
    /// let candidates = ["US1", "US2", "US1", "US3", "US4"].map(String::from);
    /// let set = ResultSet::from_candidates(120, candidates, 3);
    /// assert_eq!(set.top_identifiers, vec!["US1", "US2", "US3"]);
    /// ```
    pub fn from_candidates<I>(total_count: u64, candidates: I, cap: usize) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut seen = HashSet::new();
        let top_identifiers = candidates
            .into_iter()
            .filter(|id| seen.insert(id.clone()))
            .take(cap)
            .collect();

        Self {
            total_count,
            top_identifiers,
        }
    }

    /// Appends `candidates` after the current identifiers, keeping the list
    /// deduplicated and capped at `cap`.
    ///
    /// Used to fold successive result pages into one set.
    pub fn extend_capped<I>(self, candidates: I, cap: usize) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self::from_candidates(
            self.total_count,
            self.top_identifiers.into_iter().chain(candidates),
            cap,
        )
    }

    /// Returns the identifiers as a set for scoring.
    pub fn identifier_set(&self) -> HashSet<&str> {
        self.top_identifiers.iter().map(String::as_str).collect()
    }

    /// Returns the number of identifiers sampled.
    pub fn len(&self) -> usize {
        self.top_identifiers.len()
    }

    /// Returns true if no identifiers were sampled.
    pub fn is_empty(&self) -> bool {
        self.top_identifiers.is_empty()
    }

    /// Rejects the set when the engine-reported total is below `floor`.
    pub fn ensure_floor(self, query: &str, floor: u64) -> Result<Self, RetrievalError> {
        if self.total_count < floor {
            return Err(RetrievalError::InsufficientResults {
                query: query.to_string(),
                total: self.total_count,
                floor,
            });
        }
        Ok(self)
    }
}

/// Source of result sets for query strings.
///
/// Implementations may block for a long time (network, rendering). The
/// analyzer awaits one call at a time and never retries; retry and backoff
/// belong to the implementation.
#[async_trait::async_trait(?Send)]
pub trait Retriever {
    /// Runs `query` and returns its result set.
    ///
    /// # Errors
    ///
    /// - `RetrievalError::Request` / `Timeout` / `Parse` on backend failure
    /// - `RetrievalError::InsufficientResults` when the total is below the
    ///   implementation's floor
    #[must_use = "Retrieval failures must not be mistaken for empty results"]
    async fn retrieve(&self, query: &str) -> Result<ResultSet, RetrievalError>;
}

/// Retriever backed by a map of canned results.
///
/// Records every query it is asked for, which lets tests assert which
/// variants were (or were not) retrieved.
#[derive(Debug, Default)]
pub struct InMemoryRetriever {
    results: HashMap<String, ResultSet>,
    min_total: u64,
    calls: Mutex<Vec<String>>,
}

impl InMemoryRetriever {
    /// Creates an empty retriever with no result floor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a retriever from a query → result map.
    pub fn from_results(results: HashMap<String, ResultSet>) -> Self {
        Self {
            results,
            ..Self::default()
        }
    }

    /// Adds (or replaces) the canned result for `query`.
    pub fn insert(&mut self, query: impl Into<String>, result: ResultSet) {
        self.results.insert(query.into(), result);
    }

    /// Builder-style variant of [`insert`](Self::insert).
    pub fn with_result(mut self, query: impl Into<String>, result: ResultSet) -> Self {
        self.insert(query, result);
        self
    }

    /// Sets the minimum total count; smaller totals fail with
    /// `InsufficientResults`.
    pub fn with_min_total(mut self, floor: u64) -> Self {
        self.min_total = floor;
        self
    }

    /// Returns the number of canned queries.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Returns true if no results are loaded.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Returns every query retrieved so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.call_log().clone()
    }

    /// Locks the call log, recovering it if a previous holder panicked.
    fn call_log(&self) -> MutexGuard<'_, Vec<String>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait::async_trait(?Send)]
impl Retriever for InMemoryRetriever {
    async fn retrieve(&self, query: &str) -> Result<ResultSet, RetrievalError> {
        self.call_log().push(query.to_string());

        let result = self
            .results
            .get(query)
            .cloned()
            .ok_or_else(|| RetrievalError::NotFound {
                query: query.to_string(),
            })?;

        result.ensure_floor(query, self.min_total)
    }
}
