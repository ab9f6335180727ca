//! Error types for patsim-core.
//!
//! Every error here is scoped to a single input line. Callers driving a batch
//! can match on them to decide whether to skip the line, retry it, or halt.

use crate::similarity::SetLabel;
use thiserror::Error;

/// Errors raised by the query expander.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExpansionError {
    /// The acronym is a substring of neither base term.
    ///
    /// Not fatal: the line is still analyzed, just without boolean variants.
    #[error("Acronym '{acronym}' not found in either term")]
    AcronymNotFound { acronym: String },
}

/// Errors raised by the set-similarity scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DistanceError {
    /// Both sets are empty, so the ratio has a zero denominator.
    #[error("Distance undefined for two empty sets")]
    Undefined,
}

/// Errors a [`Retriever`](crate::retrieval::Retriever) may return.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RetrievalError {
    /// Network or HTTP failure
    #[error("Request failed for '{query}': {cause}")]
    Request { query: String, cause: String },
    /// The backend did not answer in time
    #[error("Request timed out for '{query}'")]
    Timeout { query: String },
    /// The response could not be interpreted
    #[error("Failed to parse results for '{query}': {cause}")]
    Parse { query: String, cause: String },
    /// The engine reported fewer hits than the configured floor
    #[error("Search for '{query}' returned {total} results (at least {floor} required)")]
    InsufficientResults { query: String, total: u64, floor: u64 },
    /// No canned result exists for the query (in-memory retriever)
    #[error("No results recorded for '{query}'")]
    NotFound { query: String },
}

impl RetrievalError {
    /// Returns the query this error was raised for.
    pub fn query(&self) -> &str {
        match self {
            RetrievalError::Request { query, .. }
            | RetrievalError::Timeout { query }
            | RetrievalError::Parse { query, .. }
            | RetrievalError::InsufficientResults { query, .. }
            | RetrievalError::NotFound { query } => query,
        }
    }

    /// Whether retrying the same request might succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            RetrievalError::Request { .. } | RetrievalError::Timeout { .. }
        )
    }
}

/// Errors that abort analysis of one input line.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// Too many comma-separated segments
    #[error("Expected at most {max} comma-separated terms, got {segments}")]
    InvalidQueryShape { segments: usize, max: usize },
    /// Nothing to analyze
    #[error("Empty query line")]
    EmptyLine,
    /// Retrieval failed for one of the line's queries
    #[error("Retrieval failed for {label} query '{query}': {source}")]
    Retrieval {
        label: SetLabel,
        query: String,
        #[source]
        source: RetrievalError,
    },
}

impl AnalysisError {
    /// Returns true for errors caused by the shape of the input line rather
    /// than by the retrieval backend.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            AnalysisError::InvalidQueryShape { .. } | AnalysisError::EmptyLine
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retrieval_error_query() {
        let err = RetrievalError::InsufficientResults {
            query: "dslr camera".to_string(),
            total: 4,
            floor: 10,
        };
        assert_eq!(err.query(), "dslr camera");
        assert!(!err.is_transient());
        assert!(err.to_string().contains("at least 10"));
    }

    #[test]
    fn test_transient_errors() {
        let timeout = RetrievalError::Timeout {
            query: "q".to_string(),
        };
        assert!(timeout.is_transient());

        let parse = RetrievalError::Parse {
            query: "q".to_string(),
            cause: "bad json".to_string(),
        };
        assert!(!parse.is_transient());
    }

    #[test]
    fn test_analysis_error_display_names_query() {
        let err = AnalysisError::Retrieval {
            label: SetLabel::Or,
            query: "(dslr OR digital single lens reflex) AND camera".to_string(),
            source: RetrievalError::Timeout {
                query: "(dslr OR digital single lens reflex) AND camera".to_string(),
            },
        };
        let msg = err.to_string();
        assert!(msg.contains("OR term"));
        assert!(msg.contains("(dslr OR digital single lens reflex) AND camera"));
        assert!(!err.is_input_error());
    }

    #[test]
    fn test_invalid_shape_is_input_error() {
        let err = AnalysisError::InvalidQueryShape {
            segments: 4,
            max: 3,
        };
        assert!(err.is_input_error());
        assert_eq!(
            err.to_string(),
            "Expected at most 3 comma-separated terms, got 4"
        );
    }
}
