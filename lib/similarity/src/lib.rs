//! # matchdep Similarity
//!
//! Similarity measures and column-match similarity indexes for
//! matching-dependency discovery.
//!
//! For a pair of dictionary-encoded columns, an index lists for every left
//! value the right clusters whose similarity reaches a decision boundary,
//! best match first. The discovery search queries it at varying thresholds
//! without rescoring.
//!
//! ## Features
//!
//! - **Tagged measures**: equality, numeric distance, Levenshtein, Jaro-Winkler,
//!   token and trigram Jaccard, plus caller-supplied distance functions
//! - **Explicit normalization**: fixed scale or per-column-pair value range
//! - **Pruned builds**: numeric distance only scores the boundary window
//! - **Parallel and cancellable**: rayon-backed left scan with a cooperative token
//! - **Re-thresholding**: tighter boundaries are served from an existing index
//!
//! ## Example
//!
//! ```rust
//! use matchdep_core::{EncodedColumn, Value, ValueType};
//! use matchdep_similarity::{ColumnPair, IndexBuilder, Normalization, SimilarityMeasure};
//!
//! let left = EncodedColumn::encode(ValueType::Int, [10, 12, 20].map(Value::Int)).unwrap();
//! let right = EncodedColumn::encode(ValueType::Int, [11, 25].map(Value::Int)).unwrap();
//! let measure = SimilarityMeasure::numeric(ValueType::Int, Normalization::Fixed { scale: 30.0 }).unwrap();
//!
//! let index = IndexBuilder::new(0.9, true)
//!     .build(&ColumnPair::new(&left, &right, &measure))
//!     .unwrap();
//!
//! assert_eq!(index.matches(0)[0].cluster, 0);
//! assert!(index.matches(2).is_empty());
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ Dictionaries│────>│   Builder   │────>│    Index    │
//! │  + clusters │     │ (prune/par) │     │ (per left)  │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                            ^                   │
//!                     ┌─────────────┐     ┌─────────────┐
//!                     │   Measure   │     │ Re-threshold│
//!                     │  (tagged)   │     │   / lookup  │
//!                     └─────────────┘     └─────────────┘
//! ```

pub mod error;
pub mod distance;
pub mod measure;
pub mod index;
pub mod builder;
pub mod config;

// Re-export main types for convenience
pub use error::{IndexError, Result};
pub use measure::{
    DistanceFn,
    MeasureKind,
    Normalization,
    PreparedMeasure,
    SimilarityMeasure,
    MAX_SIMILARITY,
    MIN_SIMILARITY,
};
pub use index::{ClusterMatch, ColumnMatchSimilarityIndex, IndexKey};
pub use builder::{make_indexes, CancellationToken, ColumnPair, IndexBuilder};
pub use config::{ConfigError, MeasureConfig, PairConfig, ProfileConfig};
