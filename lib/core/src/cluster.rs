//! Row clusters (position list index)
//!
//! A cluster groups the rows that share one dictionary value. The cluster
//! table of a column is index-aligned with its dictionary: cluster `i` holds
//! the rows whose value is dictionary entry `i`.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Position of a row in the profiled table
pub type RowId = usize;

/// Position of a cluster in its table, equal to the dictionary [`ValueId`](crate::ValueId)
pub type ClusterId = usize;

/// Rows sharing one value, ascending
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RowCluster {
    rows: SmallVec<[RowId; 4]>,
}

impl RowCluster {
    pub fn new(mut rows: Vec<RowId>) -> Self {
        rows.sort_unstable();
        rows.dedup();
        Self {
            rows: SmallVec::from_vec(rows),
        }
    }

    pub(crate) fn push(&mut self, row: RowId) {
        debug_assert!(self.rows.last().map_or(true, |&last| last < row));
        self.rows.push(row);
    }

    #[inline]
    pub fn rows(&self) -> &[RowId] {
        &self.rows
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// All clusters of one column
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClusterTable {
    clusters: Vec<RowCluster>,
}

impl ClusterTable {
    pub fn new(clusters: Vec<RowCluster>) -> Self {
        Self { clusters }
    }

    /// Build a table from plain row lists
    pub fn from_rows(clusters: Vec<Vec<RowId>>) -> Self {
        Self::new(clusters.into_iter().map(RowCluster::new).collect())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    #[inline]
    pub fn get(&self, id: ClusterId) -> Option<&RowCluster> {
        self.clusters.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ClusterId, &RowCluster)> + '_ {
        self.clusters.iter().enumerate()
    }

    /// Total number of rows covered by the table
    pub fn row_count(&self) -> usize {
        self.clusters.iter().map(RowCluster::len).sum()
    }
}
