//! Per-line output records.
//!
//! An [`OutputRecord`] is created fresh for every analyzed line and handed to
//! a writer; nothing in the core reads it back.

use crate::expansion::VariantKind;
use crate::retrieval::ResultSet;
use crate::similarity::DistanceVector;
use serde::{Deserialize, Serialize};

/// A base term and the results it retrieved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermOutcome {
    pub term: String,
    pub result: ResultSet,
}

/// A boolean variant and the results it retrieved.
///
/// Both fields are `None` when expansion could not build the variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantOutcome {
    pub kind: VariantKind,
    pub query: Option<String>,
    pub result: Option<ResultSet>,
}

impl VariantOutcome {
    /// Returns true if the variant was built and retrieved.
    pub fn is_present(&self) -> bool {
        self.result.is_some()
    }
}

/// Everything computed for one input line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRecord {
    /// The raw input line
    pub line: String,
    /// Comma-separated segments, trimmed
    pub terms: Vec<String>,
    /// Results for the first one or two terms, in input order
    pub base: Vec<TermOutcome>,
    /// One entry per configured variant kind, in analysis order
    pub variants: Vec<VariantOutcome>,
    /// Fixed-order distances; empty when fewer than two base terms
    pub distances: DistanceVector,
}

impl OutputRecord {
    /// Returns the outcome for the base term at `index` (0 or 1).
    pub fn base_term(&self, index: usize) -> Option<&TermOutcome> {
        self.base.get(index)
    }

    /// Returns the outcome for a variant kind, if it was configured.
    pub fn variant(&self, kind: VariantKind) -> Option<&VariantOutcome> {
        self.variants.iter().find(|v| v.kind == kind)
    }
}
