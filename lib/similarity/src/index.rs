//! Column-match similarity index
//!
//! For every left value with at least one qualifying match, the index stores
//! the right clusters whose similarity reaches the build boundary, sorted by
//! descending similarity and then ascending cluster id. Left values without
//! matches are absent, so the size follows match density rather than
//! column cardinality.

use crate::error::{IndexError, Result};
use crate::measure::{SimilarityMeasure, MAX_SIMILARITY};
use ahash::AHashMap;
use matchdep_core::{ClusterId, ValueId};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// One qualifying right cluster
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClusterMatch {
    pub cluster: ClusterId,
    pub similarity: f64,
}

impl ClusterMatch {
    pub fn new(cluster: ClusterId, similarity: f64) -> Self {
        Self { cluster, similarity }
    }

    /// Descending similarity, then ascending cluster id
    #[inline]
    pub(crate) fn rank(a: &ClusterMatch, b: &ClusterMatch) -> Ordering {
        b.similarity
            .total_cmp(&a.similarity)
            .then_with(|| a.cluster.cmp(&b.cluster))
    }
}

/// Immutable similarity index for one (left column, right column) pair
#[derive(Debug, Clone)]
pub struct ColumnMatchSimilarityIndex {
    boundary: f64,
    null_equals_null: bool,
    /// Ascending left id, every list non-empty and ranked
    entries: Vec<(ValueId, Box<[ClusterMatch]>)>,
    positions: AHashMap<ValueId, usize>,
}

impl ColumnMatchSimilarityIndex {
    /// Assemble an index from per-left match lists
    ///
    /// Lists are ranked here and empty lists dropped; left ids may arrive in
    /// any order.
    pub fn from_matches<I>(boundary: f64, null_equals_null: bool, matches: I) -> Self
    where
        I: IntoIterator<Item = (ValueId, Vec<ClusterMatch>)>,
    {
        let mut entries: Vec<(ValueId, Box<[ClusterMatch]>)> = matches
            .into_iter()
            .filter(|(_, list)| !list.is_empty())
            .map(|(left, mut list)| {
                list.sort_by(ClusterMatch::rank);
                (left, list.into_boxed_slice())
            })
            .collect();
        entries.sort_by_key(|(left, _)| *left);
        entries.dedup_by_key(|(left, _)| *left);
        Self::from_ranked(boundary, null_equals_null, entries)
    }

    fn from_ranked(
        boundary: f64,
        null_equals_null: bool,
        entries: Vec<(ValueId, Box<[ClusterMatch]>)>,
    ) -> Self {
        let positions = entries
            .iter()
            .enumerate()
            .map(|(pos, (left, _))| (*left, pos))
            .collect();
        Self {
            boundary,
            null_equals_null,
            entries,
            positions,
        }
    }

    /// Boundary the index was built (or re-thresholded) at
    pub fn boundary(&self) -> f64 {
        self.boundary
    }

    pub fn null_equals_null(&self) -> bool {
        self.null_equals_null
    }

    /// Number of left values with at least one match
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of stored (left, cluster) pairs
    pub fn match_count(&self) -> usize {
        self.entries.iter().map(|(_, list)| list.len()).sum()
    }

    pub fn contains(&self, left: ValueId) -> bool {
        self.positions.contains_key(&left)
    }

    /// Ranked matches of `left`, empty if it has none
    #[inline]
    pub fn matches(&self, left: ValueId) -> &[ClusterMatch] {
        self.positions
            .get(&left)
            .map(|&pos| &*self.entries[pos].1)
            .unwrap_or(&[])
    }

    /// Prefix of the matches of `left` reaching `boundary`
    pub fn matches_at(&self, left: ValueId, boundary: f64) -> &[ClusterMatch] {
        let list = self.matches(left);
        &list[..list.partition_point(|m| m.similarity >= boundary)]
    }

    /// Stored similarity of a pair, `None` when below the index boundary
    pub fn similarity(&self, left: ValueId, cluster: ClusterId) -> Option<f64> {
        self.matches(left)
            .iter()
            .find(|m| m.cluster == cluster)
            .map(|m| m.similarity)
    }

    /// `(left id, matches)` in ascending left id; call again to restart
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (ValueId, &[ClusterMatch])> + '_ {
        self.entries.iter().map(|(left, list)| (*left, &**list))
    }

    pub fn left_ids(&self) -> impl Iterator<Item = ValueId> + '_ {
        self.entries.iter().map(|(left, _)| *left)
    }

    /// Distinct similarities present in the index, descending
    ///
    /// The content of the index only changes when the threshold crosses one
    /// of these values, which makes them the candidate decision boundaries.
    pub fn natural_boundaries(&self) -> Vec<f64> {
        let mut values: Vec<f64> = self
            .entries
            .iter()
            .flat_map(|(_, list)| list.iter().map(|m| m.similarity))
            .collect();
        values.sort_by(|a, b| b.total_cmp(a));
        values.dedup();
        values
    }

    /// Same index as a build at the tighter `boundary`, without rescoring
    ///
    /// Only tightening is possible: matches below the current boundary were
    /// never stored.
    pub fn rethreshold(&self, boundary: f64) -> Result<Self> {
        if !boundary.is_finite() || boundary < self.boundary || boundary > MAX_SIMILARITY {
            return Err(IndexError::config(format!(
                "cannot re-threshold index built at {} to {}",
                self.boundary, boundary
            )));
        }
        let entries = self
            .entries
            .iter()
            .filter_map(|(left, list)| {
                let keep = list.partition_point(|m| m.similarity >= boundary);
                (keep > 0).then(|| (*left, list[..keep].to_vec().into_boxed_slice()))
            })
            .collect();
        Ok(Self::from_ranked(boundary, self.null_equals_null, entries))
    }
}

impl PartialEq for ColumnMatchSimilarityIndex {
    fn eq(&self, other: &Self) -> bool {
        self.boundary.to_bits() == other.boundary.to_bits()
            && self.null_equals_null == other.null_equals_null
            && self.entries.len() == other.entries.len()
            && self.entries.iter().zip(&other.entries).all(|((la, a), (lb, b))| {
                la == lb
                    && a.len() == b.len()
                    && a.iter().zip(b.iter()).all(|(x, y)| {
                        x.cluster == y.cluster && x.similarity.to_bits() == y.similarity.to_bits()
                    })
            })
    }
}

/// Cache key for a built index
///
/// Identifies the inputs an index depends on; rebuilding from the same key
/// yields an identical index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndexKey {
    pub left_column: String,
    pub right_column: String,
    pub measure: String,
    boundary_bits: u64,
    pub null_equals_null: bool,
}

impl IndexKey {
    pub fn new(
        left_column: impl Into<String>,
        right_column: impl Into<String>,
        measure: &SimilarityMeasure,
        boundary: f64,
        null_equals_null: bool,
    ) -> Self {
        // -0.0 and 0.0 select the same matches
        let boundary = if boundary == 0.0 { 0.0 } else { boundary };
        Self {
            left_column: left_column.into(),
            right_column: right_column.into(),
            measure: measure.name().to_string(),
            boundary_bits: boundary.to_bits(),
            null_equals_null,
        }
    }

    pub fn boundary(&self) -> f64 {
        f64::from_bits(self.boundary_bits)
    }
}
