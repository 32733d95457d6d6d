//! Canonical enumeration of feature subsets
//!
//! Subsets come out by increasing size, then lexicographically by candidate
//! position: for `[A, B, C]` the order is `{A} {B} {C} {A,B} {A,C} {B,C} {A,B,C}`.
//! The position of a subset in this order is its `ordinal`, which is the
//! tie-break whenever two subsets score the same.

use crate::error::{Result, SearchError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of non-empty subsets of `k` candidates, `None` on overflow
pub fn subset_count(k: usize) -> Option<usize> {
    1usize.checked_shl(k as u32).map(|total| total - 1)
}

/// A non-empty selection of candidate features
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeatureSubset {
    ordinal: usize,
    indices: Vec<usize>,
    names: Vec<String>,
}

impl FeatureSubset {
    /// Position in enumeration order
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    /// Positions of the selected features in the candidate list
    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    /// Names of the selected features, in candidate order
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

impl fmt::Display for FeatureSubset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, name) in self.names.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "'{}'", name)?;
        }
        write!(f, "]")
    }
}

/// Lazy iterator over every non-empty subset of a candidate list
#[derive(Debug, Clone)]
pub struct SubsetEnumerator {
    candidates: Vec<String>,
    current: Vec<usize>,
    ordinal: usize,
    total: usize,
}

impl SubsetEnumerator {
    /// Enumerate the subsets of `candidates`
    pub fn new(candidates: Vec<String>) -> Result<Self> {
        let total = subset_count(candidates.len()).ok_or_else(|| {
            SearchError::InvalidConfig(format!(
                "{} candidates is too many to enumerate",
                candidates.len()
            ))
        })?;
        let current = if candidates.is_empty() { Vec::new() } else { vec![0] };

        Ok(Self {
            candidates,
            current,
            ordinal: 0,
            total,
        })
    }

    /// Total number of subsets this enumerator yields
    pub fn total(&self) -> usize {
        self.total
    }

    /// Move `current` to the next combination, growing the size when exhausted
    fn advance(&mut self) {
        let k = self.candidates.len();
        let size = self.current.len();

        if let Some(i) = (0..size).rev().find(|&i| self.current[i] < k - size + i) {
            self.current[i] += 1;
            for j in i + 1..size {
                self.current[j] = self.current[j - 1] + 1;
            }
        } else if size < k {
            self.current = (0..size + 1).collect();
        } else {
            self.current.clear();
        }
    }
}

impl Iterator for SubsetEnumerator {
    type Item = FeatureSubset;

    fn next(&mut self) -> Option<FeatureSubset> {
        if self.ordinal >= self.total || self.current.is_empty() {
            return None;
        }

        let subset = FeatureSubset {
            ordinal: self.ordinal,
            indices: self.current.clone(),
            names: self
                .current
                .iter()
                .map(|&i| self.candidates[i].clone())
                .collect(),
        };

        self.ordinal += 1;
        self.advance();
        Some(subset)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.total - self.ordinal;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for SubsetEnumerator {}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_canonical_order_for_three() {
        let subsets: Vec<Vec<String>> = SubsetEnumerator::new(names(&["A", "B", "C"]))
            .unwrap()
            .map(|s| s.names().to_vec())
            .collect();

        let expected: Vec<Vec<String>> = vec![
            names(&["A"]),
            names(&["B"]),
            names(&["C"]),
            names(&["A", "B"]),
            names(&["A", "C"]),
            names(&["B", "C"]),
            names(&["A", "B", "C"]),
        ];
        assert_eq!(subsets, expected);
    }

    #[rstest]
    #[case(0, 0)]
    #[case(1, 1)]
    #[case(4, 15)]
    #[case(10, 1023)]
    fn test_count(#[case] k: usize, #[case] expected: usize) {
        let candidates: Vec<String> = (0..k).map(|i| format!("f{}", i)).collect();
        let enumerator = SubsetEnumerator::new(candidates).unwrap();
        assert_eq!(enumerator.total(), expected);
        assert_eq!(enumerator.len(), expected);
        assert_eq!(enumerator.count(), expected);
    }

    #[test]
    fn test_ordinals_are_sequential_and_unique() {
        let candidates: Vec<String> = (0..6).map(|i| format!("f{}", i)).collect();
        let subsets: Vec<FeatureSubset> = SubsetEnumerator::new(candidates).unwrap().collect();

        let mut seen = std::collections::HashSet::new();
        for (i, subset) in subsets.iter().enumerate() {
            assert_eq!(subset.ordinal(), i);
            assert!(!subset.is_empty());
            assert!(subset.indices().windows(2).all(|w| w[0] < w[1]));
            assert!(seen.insert(subset.indices().to_vec()));
        }
        // sizes never decrease
        assert!(subsets.windows(2).all(|w| w[0].len() <= w[1].len()));
    }

    #[test]
    fn test_display() {
        let subset = SubsetEnumerator::new(names(&["Crude Oil (Imports)", "previous_price"]))
            .unwrap()
            .last()
            .unwrap();
        assert_eq!(subset.to_string(), "['Crude Oil (Imports)', 'previous_price']");
    }

    #[test]
    fn test_subset_count_overflow() {
        assert_eq!(subset_count(3), Some(7));
        assert_eq!(subset_count(usize::BITS as usize), None);
        let too_many: Vec<String> = (0..usize::BITS).map(|i| format!("f{}", i)).collect();
        assert!(SubsetEnumerator::new(too_many).is_err());
    }
}
