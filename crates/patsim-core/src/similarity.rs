//! Set-dissimilarity metrics over retrieved identifier sets.
//!
//! Both metrics treat the top identifiers as an unordered set; rank order is
//! kept in [`ResultSet`](crate::retrieval::ResultSet) only for audit output.
//!
//! | Metric | Formula |
//! |--------|---------|
//! | Jaccard distance | `1 - |A ∩ B| / |A ∪ B|` |
//! | Dice distance | `1 - 2|A ∩ B| / (|A| + |B|)` |
//!
//! Both are undefined when the two sets are empty. That case is reported as
//! [`DistanceError::Undefined`] and never coerced to 0 or 1.

use crate::error::DistanceError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;

/// Names the result set on either side of a distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SetLabel {
    Term1,
    Term2,
    Or,
    And,
}

impl fmt::Display for SetLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SetLabel::Term1 => "Term 1",
            SetLabel::Term2 => "Term 2",
            SetLabel::Or => "OR term",
            SetLabel::And => "AND term",
        };
        f.write_str(label)
    }
}

/// Distance metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    Jaccard,
    Dice,
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Jaccard => f.write_str("Jaccard"),
            Metric::Dice => f.write_str("Dice"),
        }
    }
}

impl Metric {
    /// Computes this metric between two sets.
    pub fn distance<T: Eq + Hash>(
        &self,
        a: &HashSet<T>,
        b: &HashSet<T>,
    ) -> Result<f64, DistanceError> {
        match self {
            Metric::Jaccard => jaccard_distance(a, b),
            Metric::Dice => dice_distance(a, b),
        }
    }
}

/// Computes the Jaccard distance `1 - |A ∩ B| / |A ∪ B|`.
///
/// # Returns
///
/// A value in `[0, 1]`, or `Err(DistanceError::Undefined)` when both sets
/// are empty.
pub fn jaccard_distance<T: Eq + Hash>(
    a: &HashSet<T>,
    b: &HashSet<T>,
) -> Result<f64, DistanceError> {
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    if union == 0 {
        return Err(DistanceError::Undefined);
    }
    Ok(1.0 - intersection as f64 / union as f64)
}

/// Computes the Sørensen–Dice distance `1 - 2|A ∩ B| / (|A| + |B|)`.
///
/// Weights shared elements more heavily than Jaccard does.
///
/// # Returns
///
/// A value in `[0, 1]`, or `Err(DistanceError::Undefined)` when both sets
/// are empty.
pub fn dice_distance<T: Eq + Hash>(
    a: &HashSet<T>,
    b: &HashSet<T>,
) -> Result<f64, DistanceError> {
    let total = a.len() + b.len();
    if total == 0 {
        return Err(DistanceError::Undefined);
    }
    let intersection = a.intersection(b).count();
    Ok(1.0 - (2.0 * intersection as f64) / total as f64)
}

/// One computed distance, tagged with the pair of sets it came from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistanceEntry {
    pub metric: Metric,
    pub left: SetLabel,
    pub right: SetLabel,
    /// `None` when the distance is undefined (both sets empty)
    pub value: Option<f64>,
}

impl DistanceEntry {
    fn compute<T: Eq + Hash>(
        metric: Metric,
        (left, a): (SetLabel, &HashSet<T>),
        (right, b): (SetLabel, &HashSet<T>),
    ) -> Self {
        Self {
            metric,
            left,
            right,
            value: metric.distance(a, b).ok(),
        }
    }

    /// Column label, e.g. `Jaccard distance (Term 1, OR term)`.
    pub fn label(&self) -> String {
        self.label_with(|set| set.to_string())
    }

    /// Column label with set names supplied by `name`.
    pub fn label_with(&self, name: impl Fn(SetLabel) -> String) -> String {
        format!(
            "{} distance ({}, {})",
            self.metric,
            name(self.left),
            name(self.right)
        )
    }
}

/// Ordered distances for one analyzed line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistanceVector {
    entries: Vec<DistanceEntry>,
}

impl DistanceVector {
    /// Returns the entries in computation order.
    pub fn entries(&self) -> &[DistanceEntry] {
        &self.entries
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no distances were computed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up the entry for a metric and set pair.
    ///
    /// Returns `None` if that pair was skipped (absent set).
    pub fn get(
        &self,
        metric: Metric,
        left: SetLabel,
        right: SetLabel,
    ) -> Option<&DistanceEntry> {
        self.entries
            .iter()
            .find(|e| e.metric == metric && e.left == left && e.right == right)
    }

    /// Number of entries whose value is undefined.
    pub fn undefined_count(&self) -> usize {
        self.entries.iter().filter(|e| e.value.is_none()).count()
    }

    fn push_pair<T: Eq + Hash>(
        &mut self,
        left: (SetLabel, &HashSet<T>),
        right: (SetLabel, &HashSet<T>),
    ) {
        self.entries
            .push(DistanceEntry::compute(Metric::Jaccard, left, right));
        self.entries
            .push(DistanceEntry::compute(Metric::Dice, left, right));
    }
}

/// Computes the fixed-order distance vector for one line.
///
/// Order: `[J(t1,t2), D(t1,t2)]`, then for each present extra set `S` in call
/// order `[J(t1,S), D(t1,S), J(t2,S), D(t2,S)]`. Extra sets given as `None`
/// are skipped entirely; no placeholder entries are emitted for them.
///
/// # Example
///
/// ```
/// use patsim_core::similarity::{compute_distances, SetLabel};
/// use std::collections::HashSet;
///
/// let t1: HashSet<&str> = ["a", "b"].into_iter().collect();
/// let t2: HashSet<&str> = ["b", "c"].into_iter().collect();
/// let or: HashSet<&str> = ["a", "b", "c"].into_iter().collect();
///
/// let vector = compute_distances(&t1, &t2, &[(SetLabel::Or, Some(&or)), (SetLabel::And, None)]);
/// assert_eq!(vector.len(), 6);
/// ```
pub fn compute_distances<T: Eq + Hash>(
    term1: &HashSet<T>,
    term2: &HashSet<T>,
    extras: &[(SetLabel, Option<&HashSet<T>>)],
) -> DistanceVector {
    let t1 = (SetLabel::Term1, term1);
    let t2 = (SetLabel::Term2, term2);

    let mut vector = DistanceVector::default();
    vector.push_pair(t1, t2);

    for (label, set) in extras {
        if let Some(set) = set {
            vector.push_pair(t1, (*label, *set));
            vector.push_pair(t2, (*label, *set));
        }
    }

    vector
}
