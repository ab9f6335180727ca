//! Boolean query expansion for a pair of base terms.
//!
//! Given `"dslr camera"`, `"digital single lens reflex camera"` and the
//! acronym `"dslr"`, the shared qualifier `"camera"` is factored out and the
//! acronym is paired with its definition:
//!
//! ```text
//! OR:  (dslr OR digital single lens reflex) AND camera
//! AND: (dslr AND digital single lens reflex) AND camera
//! ```
//!
//! The heuristic is purely syntactic: one substring substitution, no case or
//! punctuation normalization beyond trimming whitespace.

use crate::error::ExpansionError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A boolean query variant derived from the base terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VariantKind {
    Or,
    And,
}

impl VariantKind {
    /// The boolean operator joining the two alternatives.
    pub fn operator(&self) -> &'static str {
        match self {
            VariantKind::Or => "OR",
            VariantKind::And => "AND",
        }
    }
}

impl fmt::Display for VariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.operator())
    }
}

/// The OR and AND forms produced by [`expand`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BooleanQueries {
    pub or: String,
    pub and: String,
}

impl BooleanQueries {
    /// Returns the query string for one variant.
    pub fn get(&self, kind: VariantKind) -> &str {
        match kind {
            VariantKind::Or => &self.or,
            VariantKind::And => &self.and,
        }
    }

    /// Plain combination of two unrelated terms: `a OR b`, `a AND b`.
    fn independent(term1: &str, term2: &str) -> Self {
        Self {
            or: format!("{} OR {}", term1, term2),
            and: format!("{} AND {}", term1, term2),
        }
    }

    /// `(acronym OP definition) AND overlap`, dropping the qualifier when
    /// there is none.
    fn factored(acronym: &str, definition: &str, overlap: &str) -> Self {
        let build = |kind: VariantKind| {
            let group = format!("({} {} {})", acronym, kind.operator(), definition);
            if overlap.is_empty() {
                group
            } else {
                format!("{} AND {}", group, overlap)
            }
        };
        Self {
            or: build(VariantKind::Or),
            and: build(VariantKind::And),
        }
    }
}

/// Expands two base terms and an optional acronym into boolean queries.
///
/// # Arguments
///
/// * `term1`, `term2` - The trimmed base terms
/// * `acronym` - Abbreviation of one of the base terms; `None` or `""` means
///   there is none
///
/// # Returns
///
/// - Without a meaningful acronym (absent, empty, or equal to a base term):
///   `term1 OR term2` / `term1 AND term2`
/// - With an acronym contained in a base term (`term1` checked first):
///   `(acronym OP definition) AND overlap`
/// - When removing the acronym leaves no overlap, the trailing `AND overlap`
///   is left out: `(acronym OP definition)`
/// - `Err(AcronymNotFound)` when neither term contains the acronym
///
/// # Example
///
/// ```
/// use patsim_core::expansion::expand;
///
/// let queries = expand(
///     "dslr camera",
///     "digital single lens reflex camera",
///     Some("dslr"),
/// )
/// .unwrap();
/// assert_eq!(queries.or, "(dslr OR digital single lens reflex) AND camera");
/// ```
pub fn expand(
    term1: &str,
    term2: &str,
    acronym: Option<&str>,
) -> Result<BooleanQueries, ExpansionError> {
    let acronym = match acronym {
        Some(a) if !a.is_empty() && a != term1 && a != term2 => a,
        _ => return Ok(BooleanQueries::independent(term1, term2)),
    };

    let (containing, other) = if term1.contains(acronym) {
        (term1, term2)
    } else if term2.contains(acronym) {
        (term2, term1)
    } else {
        return Err(ExpansionError::AcronymNotFound {
            acronym: acronym.to_string(),
        });
    };

    let overlap = containing.replace(acronym, "");
    let overlap = overlap.trim();

    let definition = if overlap.is_empty() {
        other.trim().to_string()
    } else {
        other.replace(overlap, "").trim().to_string()
    };

    Ok(BooleanQueries::factored(acronym, &definition, overlap))
}

/// Encodes a query for the search URL's `q` parameter.
///
/// Spaces become `+`, commas become `%2c`, and the whole string is wrapped
/// in one pair of parentheses.
///
/// ```
/// use patsim_core::expansion::encode_query;
///
/// assert_eq!(encode_query("dslr camera"), "(dslr+camera)");
/// assert_eq!(encode_query("cats, dogs"), "(cats%2c+dogs)");
/// ```
pub fn encode_query(query: &str) -> String {
    let mut encoded = String::with_capacity(query.len() + 2);
    encoded.push('(');
    for c in query.chars() {
        match c {
            ' ' => encoded.push('+'),
            ',' => encoded.push_str("%2c"),
            _ => encoded.push(c),
        }
    }
    encoded.push(')');
    encoded
}
