//! Per-line analysis: terms → queries → result sets → distances.
//!
//! The [`Analyzer`] borrows a [`Retriever`] owned by the caller and runs one
//! line to completion before returning. Retrievals happen strictly in order:
//!
//! 1. Base term 1, base term 2
//! 2. Boolean variants in configured order (OR, then AND)
//!
//! Any retrieval failure aborts the line. A failed retrieval is never
//! replaced with an empty set, since that would read as "no overlap" in the
//! distance math.

use crate::config::{AnalysisConfig, BASE_TERM_COUNT, MAX_QUERY_SEGMENTS};
use crate::error::{AnalysisError, ExpansionError};
use crate::expansion::{expand, BooleanQueries, VariantKind};
use crate::record::{OutputRecord, TermOutcome, VariantOutcome};
use crate::retrieval::{ResultSet, Retriever};
use crate::similarity::{compute_distances, DistanceVector, SetLabel};
use std::collections::HashSet;
use tracing::{debug, info, warn};

impl From<VariantKind> for SetLabel {
    fn from(kind: VariantKind) -> Self {
        match kind {
            VariantKind::Or => SetLabel::Or,
            VariantKind::And => SetLabel::And,
        }
    }
}

const BASE_LABELS: [SetLabel; BASE_TERM_COUNT] = [SetLabel::Term1, SetLabel::Term2];

/// Splits a raw input line into trimmed, comma-separated terms.
///
/// # Errors
///
/// - `AnalysisError::EmptyLine` for a blank line
/// - `AnalysisError::InvalidQueryShape` for more than
///   [`MAX_QUERY_SEGMENTS`] segments
///
/// # Example
///
/// ```
/// use patsim_core::analysis::split_terms;
///
/// let terms = split_terms("dslr camera, digital single lens reflex camera,dslr").unwrap();
/// assert_eq!(terms, vec!["dslr camera", "digital single lens reflex camera", "dslr"]);
/// ```
pub fn split_terms(raw: &str) -> Result<Vec<String>, AnalysisError> {
    if raw.trim().is_empty() {
        return Err(AnalysisError::EmptyLine);
    }

    let terms: Vec<String> = raw.split(',').map(|s| s.trim().to_string()).collect();
    if terms.len() > MAX_QUERY_SEGMENTS {
        return Err(AnalysisError::InvalidQueryShape {
            segments: terms.len(),
            max: MAX_QUERY_SEGMENTS,
        });
    }

    Ok(terms)
}

/// Analyzes input lines against a retriever.
///
/// # Example
///
/// ```ignore
/// let retriever = GooglePatentsRetriever::new(RetrieverConfig::default())?;
/// let analyzer = Analyzer::new(&retriever, AnalysisConfig::default());
///
/// let record = analyzer
///     .analyze_line("dslr camera, digital single lens reflex camera, dslr")
///     .await?;
/// println!("{} distances", record.distances.len());
/// ```
pub struct Analyzer<'r> {
    retriever: &'r dyn Retriever,
    config: AnalysisConfig,
}

impl<'r> Analyzer<'r> {
    /// Creates an analyzer over a borrowed retriever.
    pub fn new(retriever: &'r dyn Retriever, config: AnalysisConfig) -> Self {
        Self { retriever, config }
    }

    /// Analyzes one raw input line.
    ///
    /// # Errors
    ///
    /// - `InvalidQueryShape` / `EmptyLine` from [`split_terms`]
    /// - `Retrieval` when any of the line's queries fails, tagged with the
    ///   failing query
    pub async fn analyze_line(&self, raw: &str) -> Result<OutputRecord, AnalysisError> {
        let terms = split_terms(raw)?;

        let mut base = Vec::with_capacity(BASE_TERM_COUNT);
        for (term, label) in terms.iter().zip(BASE_LABELS) {
            let result = self.retrieve(label, term).await?;
            base.push(TermOutcome {
                term: term.clone(),
                result,
            });
        }

        let queries = expand_terms(&terms);

        let mut variants = Vec::with_capacity(self.config.variants.kinds().len());
        for &kind in self.config.variants.kinds() {
            let query = queries.as_ref().map(|q| q.get(kind).to_string());
            let result = match &query {
                Some(q) => Some(self.retrieve(kind.into(), q).await?),
                None => None,
            };
            variants.push(VariantOutcome {
                kind,
                query,
                result,
            });
        }

        let distances = line_distances(&base, &variants);

        info!(
            "Analyzed \"{}\": {} terms, {} variants, {} distances",
            raw,
            terms.len(),
            variants.iter().filter(|v| v.is_present()).count(),
            distances.len()
        );

        Ok(OutputRecord {
            line: raw.to_string(),
            terms,
            base,
            variants,
            distances,
        })
    }

    async fn retrieve(&self, label: SetLabel, query: &str) -> Result<ResultSet, AnalysisError> {
        debug!("Retrieving {} query: \"{}\"", label, query);

        let result = self
            .retriever
            .retrieve(query)
            .await
            .map_err(|source| AnalysisError::Retrieval {
                label,
                query: query.to_string(),
                source,
            })?;

        debug!(
            "{} query returned {} total, {} sampled",
            label,
            result.total_count,
            result.len()
        );
        Ok(result)
    }
}

/// Builds boolean queries for a split line, if it has two base terms.
///
/// An acronym found in neither term is logged and yields `None`; the line is
/// still analyzed without boolean variants.
fn expand_terms(terms: &[String]) -> Option<BooleanQueries> {
    let expanded = match terms {
        [t1, t2] => expand(t1, t2, None),
        [t1, t2, acronym] => expand(t1, t2, Some(acronym.as_str())),
        _ => return None,
    };

    match expanded {
        Ok(queries) => Some(queries),
        Err(ExpansionError::AcronymNotFound { acronym }) => {
            warn!(
                "Acronym \"{}\" not found in \"{}\" or \"{}\"; skipping boolean variants",
                acronym, terms[0], terms[1]
            );
            None
        }
    }
}

/// Distances between the two base sets and every present variant set.
fn line_distances(base: &[TermOutcome], variants: &[VariantOutcome]) -> DistanceVector {
    let [t1, t2] = base else {
        return DistanceVector::default();
    };

    let term1 = t1.result.identifier_set();
    let term2 = t2.result.identifier_set();

    let variant_sets: Vec<(SetLabel, Option<HashSet<&str>>)> = variants
        .iter()
        .map(|v| (v.kind.into(), v.result.as_ref().map(ResultSet::identifier_set)))
        .collect();
    let extras: Vec<(SetLabel, Option<&HashSet<&str>>)> = variant_sets
        .iter()
        .map(|(label, set)| (*label, set.as_ref()))
        .collect();

    compute_distances(&term1, &term2, &extras)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VariantSet;
    use crate::error::RetrievalError;
    use crate::retrieval::InMemoryRetriever;
    use crate::similarity::Metric;

    fn result(total: u64, ids: &[&str]) -> ResultSet {
        ResultSet::new(total, ids.iter().map(|s| s.to_string()).collect())
    }

    fn dslr_retriever() -> InMemoryRetriever {
        InMemoryRetriever::new()
            .with_result("dslr camera", result(150, &["a", "b", "c", "d"]))
            .with_result(
                "digital single lens reflex camera",
                result(90, &["a", "b", "e", "f"]),
            )
            .with_result(
                "(dslr OR digital single lens reflex) AND camera",
                result(300, &["a", "b", "c", "e"]),
            )
            .with_result(
                "(dslr AND digital single lens reflex) AND camera",
                result(20, &["a", "b"]),
            )
    }

    const DSLR_LINE: &str = "dslr camera, digital single lens reflex camera, dslr";

    #[test]
    fn test_split_terms_trims_segments() {
        let terms = split_terms("cats ,  dogs").unwrap();
        assert_eq!(terms, vec!["cats", "dogs"]);
    }

    #[test]
    fn test_split_terms_rejects_four_segments() {
        let err = split_terms("a, b, c, d").unwrap_err();
        assert_eq!(
            err,
            AnalysisError::InvalidQueryShape {
                segments: 4,
                max: 3
            }
        );
    }

    #[test]
    fn test_split_terms_rejects_blank_line() {
        assert_eq!(split_terms("   "), Err(AnalysisError::EmptyLine));
    }

    #[tokio::test]
    async fn test_analyze_line_with_acronym() {
        let retriever = dslr_retriever();
        let analyzer = Analyzer::new(&retriever, AnalysisConfig::default());

        let record = analyzer.analyze_line(DSLR_LINE).await.unwrap();

        assert_eq!(record.terms.len(), 3);
        assert_eq!(record.terms[2], "dslr");
        assert_eq!(
            record.variant(VariantKind::Or).unwrap().query.as_deref(),
            Some("(dslr OR digital single lens reflex) AND camera")
        );
        assert_eq!(
            record.variant(VariantKind::And).unwrap().query.as_deref(),
            Some("(dslr AND digital single lens reflex) AND camera")
        );
        assert_eq!(record.distances.len(), 10);
        assert_eq!(record.distances.undefined_count(), 0);

        assert_eq!(
            retriever.calls(),
            vec![
                "dslr camera",
                "digital single lens reflex camera",
                "(dslr OR digital single lens reflex) AND camera",
                "(dslr AND digital single lens reflex) AND camera",
            ]
        );
    }

    #[tokio::test]
    async fn test_analyze_line_or_only() {
        let retriever = dslr_retriever();
        let analyzer = Analyzer::new(
            &retriever,
            AnalysisConfig::with_variants(VariantSet::OrOnly),
        );

        let record = analyzer.analyze_line(DSLR_LINE).await.unwrap();

        assert_eq!(record.variants.len(), 1);
        assert_eq!(record.distances.len(), 6);
        assert_eq!(retriever.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_analyze_line_distance_values() {
        let retriever = dslr_retriever();
        let analyzer = Analyzer::new(&retriever, AnalysisConfig::default());

        let record = analyzer.analyze_line(DSLR_LINE).await.unwrap();

        // term1 {a,b,c,d} vs term2 {a,b,e,f}: |∩|=2, |∪|=6
        let jaccard = record
            .distances
            .get(Metric::Jaccard, SetLabel::Term1, SetLabel::Term2)
            .and_then(|e| e.value)
            .unwrap();
        assert!((jaccard - (1.0 - 2.0 / 6.0)).abs() < 1e-9);

        // term2 {a,b,e,f} vs AND {a,b}: dice = 1 - 4/6
        let dice = record
            .distances
            .get(Metric::Dice, SetLabel::Term2, SetLabel::And)
            .and_then(|e| e.value)
            .unwrap();
        assert!((dice - (1.0 - 4.0 / 6.0)).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_analyze_line_without_acronym() {
        let retriever = InMemoryRetriever::new()
            .with_result("cats", result(40, &["1", "2"]))
            .with_result("dogs", result(60, &["2", "3"]))
            .with_result("cats OR dogs", result(100, &["1", "2", "3"]))
            .with_result("cats AND dogs", result(12, &["2"]));
        let analyzer = Analyzer::new(&retriever, AnalysisConfig::default());

        let record = analyzer.analyze_line("cats, dogs").await.unwrap();

        assert_eq!(record.terms.len(), 2);
        assert_eq!(
            record.variant(VariantKind::Or).unwrap().query.as_deref(),
            Some("cats OR dogs")
        );
        assert_eq!(record.distances.len(), 10);
    }

    #[tokio::test]
    async fn test_acronym_not_found_skips_variants() {
        let retriever = InMemoryRetriever::new()
            .with_result("dslr camera", result(150, &["a", "b"]))
            .with_result("mirrorless camera", result(80, &["b", "c"]));
        let analyzer = Analyzer::new(&retriever, AnalysisConfig::default());

        let record = analyzer
            .analyze_line("dslr camera, mirrorless camera, lcd")
            .await
            .unwrap();

        assert!(record.variants.iter().all(|v| v.query.is_none()));
        assert!(record.variants.iter().all(|v| !v.is_present()));
        assert_eq!(record.distances.len(), 2);
        assert_eq!(
            retriever.calls(),
            vec!["dslr camera", "mirrorless camera"]
        );
    }

    #[tokio::test]
    async fn test_single_term_has_no_distances() {
        let retriever = InMemoryRetriever::new().with_result("cats", result(40, &["1"]));
        let analyzer = Analyzer::new(&retriever, AnalysisConfig::default());

        let record = analyzer.analyze_line("cats").await.unwrap();

        assert_eq!(record.base.len(), 1);
        assert!(record.distances.is_empty());
        assert!(record.variants.iter().all(|v| v.query.is_none()));
        assert_eq!(retriever.calls(), vec!["cats"]);
    }

    #[tokio::test]
    async fn test_retrieval_failure_names_failing_query() {
        // AND variant has no canned result
        let retriever = InMemoryRetriever::new()
            .with_result("cats", result(40, &["1"]))
            .with_result("dogs", result(60, &["2"]))
            .with_result("cats OR dogs", result(100, &["1", "2"]));
        let analyzer = Analyzer::new(&retriever, AnalysisConfig::default());

        let err = analyzer.analyze_line("cats, dogs").await.unwrap_err();

        match err {
            AnalysisError::Retrieval {
                label,
                query,
                source,
            } => {
                assert_eq!(label, SetLabel::And);
                assert_eq!(query, "cats AND dogs");
                assert!(matches!(source, RetrievalError::NotFound { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_insufficient_results_aborts_line() {
        let retriever = InMemoryRetriever::new()
            .with_result("cats", result(4, &["1"]))
            .with_min_total(10);
        let analyzer = Analyzer::new(&retriever, AnalysisConfig::default());

        let err = analyzer.analyze_line("cats, dogs").await.unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Retrieval {
                label: SetLabel::Term1,
                source: RetrievalError::InsufficientResults { .. },
                ..
            }
        ));
        // Aborted before the second term was searched
        assert_eq!(retriever.calls(), vec!["cats"]);
    }

    #[tokio::test]
    async fn test_invalid_shape_never_retrieves() {
        let retriever = InMemoryRetriever::new();
        let analyzer = Analyzer::new(&retriever, AnalysisConfig::default());

        let err = analyzer.analyze_line("a, b, c, d").await.unwrap_err();
        assert!(err.is_input_error());
        assert!(retriever.calls().is_empty());
    }

    #[tokio::test]
    async fn test_empty_base_sets_yield_undefined_distances() {
        let retriever = InMemoryRetriever::new()
            .with_result("x", result(10, &[]))
            .with_result("y", result(10, &[]))
            .with_result("x OR y", result(10, &["1"]));
        let analyzer = Analyzer::new(
            &retriever,
            AnalysisConfig::with_variants(VariantSet::OrOnly),
        );

        let record = analyzer.analyze_line("x, y").await.unwrap();

        assert_eq!(record.distances.len(), 6);
        // Only (Term 1, Term 2) has two empty sides
        assert_eq!(record.distances.undefined_count(), 2);
        let entry = record
            .distances
            .get(Metric::Jaccard, SetLabel::Term1, SetLabel::Or)
            .unwrap();
        assert_eq!(entry.value, Some(1.0));
    }
}
