//! Analysis configuration.
//!
//! Constants shared by the analyzer, the retrievers, and the output writers,
//! plus [`AnalysisConfig`] which selects the boolean variants to run.
//!
//! # Usage
//!
//! ```
//! use patsim_core::config::{AnalysisConfig, VariantSet, MAX_QUERY_SEGMENTS};
//!
//! let config = AnalysisConfig::default();
//! assert_eq!(config.variants, VariantSet::OrAnd);
//! assert_eq!(MAX_QUERY_SEGMENTS, 3);
//! ```

use crate::expansion::VariantKind;
use serde::{Deserialize, Serialize};

// =============================================================================
// Input Shape
// =============================================================================

/// Maximum comma-separated segments per input line.
///
/// Two base terms plus one optional acronym.
pub const MAX_QUERY_SEGMENTS: usize = 3;

/// Number of base terms searched individually.
pub const BASE_TERM_COUNT: usize = 2;

// =============================================================================
// Retrieval Defaults
// =============================================================================

/// Identifiers kept per result set.
pub const DEFAULT_TOP_N: usize = 10;

/// Result pages scanned per query.
pub const DEFAULT_PAGES: usize = 2;

/// Minimum engine-reported total below which a search is rejected.
pub const MIN_TOTAL_RESULTS: u64 = 10;

// =============================================================================
// Output
// =============================================================================

/// Separator used when flattening identifier lists into a single cell.
pub const IDENTIFIER_SEPARATOR: &str = "; ";

/// Which boolean variants are derived and searched for each line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VariantSet {
    /// Only the OR form
    OrOnly,
    /// OR form followed by AND form
    #[default]
    OrAnd,
}

impl VariantSet {
    /// Variant kinds in analysis order.
    pub fn kinds(&self) -> &'static [VariantKind] {
        match self {
            VariantSet::OrOnly => &[VariantKind::Or],
            VariantSet::OrAnd => &[VariantKind::Or, VariantKind::And],
        }
    }

    /// Length of the distance vector when every set is present.
    pub fn full_distance_len(&self) -> usize {
        2 + 4 * self.kinds().len()
    }
}

/// Configuration for [`Analyzer`](crate::analysis::Analyzer).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Boolean variants to derive and retrieve.
    pub variants: VariantSet,
}

impl AnalysisConfig {
    /// Creates a configuration with the given variant set.
    pub fn with_variants(variants: VariantSet) -> Self {
        Self { variants }
    }
}
