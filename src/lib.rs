//! # matchdep
//!
//! Similarity index engine for matching-dependency discovery.
//!
//! A matching dependency says that when two values are similar enough in one
//! column pair, they are also similar enough in another. Discovering them
//! repeatedly asks "which right values are at least this similar to each left
//! value?". matchdep answers that with a column-match similarity index built
//! once per column pair and queried at any tighter threshold.
//!
//! ## Quick Start
//!
//! ### As a CLI
//!
//! ```bash
//! matchdep --table table.json --config profile.json --output indexes.json
//! ```
//!
//! ### As a Library
//!
//! ```rust
//! use matchdep::prelude::*;
//!
//! let left = EncodedColumn::encode(
//!     ValueType::String,
//!     ["john", "jon", "mary"].map(Value::from),
//! ).unwrap();
//! let right = EncodedColumn::encode(
//!     ValueType::String,
//!     ["john", "marie"].map(Value::from),
//! ).unwrap();
//!
//! let measure = SimilarityMeasure::new(MeasureKind::Levenshtein, ValueType::String).unwrap();
//! let index = IndexBuilder::new(0.5, true)
//!     .build(&ColumnPair::new(&left, &right, &measure))
//!     .unwrap();
//!
//! // "jon" is one edit away from "john"
//! assert_eq!(index.matches(1)[0].cluster, 0);
//!
//! // Serve a tighter threshold without rescoring
//! let strict = index.rethreshold(0.9).unwrap();
//! assert!(strict.matches(1).is_empty());
//! ```
//!
//! ## Crate Structure
//!
//! - `matchdep-core` - Typed values, value dictionaries, row-cluster tables
//! - `matchdep-similarity` - Measures, index builder, index, profiling config

// Re-export core types
pub use matchdep_core::{
    ClusterId, ClusterTable, Column, EncodedColumn, RowCluster, RowId, Table, Value,
    ValueDictionary, ValueId, ValueType,
};

// Re-export similarity
pub use matchdep_similarity::{
    make_indexes, CancellationToken, ClusterMatch, ColumnMatchSimilarityIndex, ColumnPair,
    ConfigError, IndexBuilder, IndexError, IndexKey, MeasureConfig, MeasureKind, Normalization,
    PairConfig, ProfileConfig, SimilarityMeasure,
};

pub mod report;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        make_indexes, CancellationToken, ClusterMatch, ClusterTable, ColumnMatchSimilarityIndex,
        ColumnPair, EncodedColumn, IndexBuilder, IndexError, MeasureKind, Normalization,
        ProfileConfig, SimilarityMeasure, Value, ValueDictionary, ValueType,
    };
}

/// Scoring functions usable outside an index build
pub mod distance {
    pub use matchdep_similarity::distance::{
        jaro_similarity, jaro_winkler_similarity, levenshtein_similarity, numeric_distance,
        token_jaccard_similarity, trigram_similarity,
    };
}
