//! Profiling configuration
//!
//! Declares which column pairs get an index, with which measure, at which
//! minimum decision boundary and under which null policy. The minimum
//! boundary should be the smallest one the outer search will ever query, so
//! tighter thresholds can be served by re-thresholding.

use crate::builder::IndexBuilder;
use crate::error::IndexError;
use crate::measure::{MeasureKind, Normalization, SimilarityMeasure, MAX_SIMILARITY, MIN_SIMILARITY};
use matchdep_core::ValueType;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Profiling configuration version 1
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProfileConfig {
    /// Config version for future compatibility
    #[serde(default = "default_version")]
    pub version: u32,

    /// Decision boundary every index is built at
    #[serde(default)]
    pub min_boundary: f64,

    /// Whether two nulls are maximally similar
    #[serde(default = "default_true")]
    pub null_equals_null: bool,

    /// Run the left scan of each build on the rayon pool
    #[serde(default = "default_true")]
    pub parallel: bool,

    pub pairs: Vec<PairConfig>,
}

fn default_version() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

impl ProfileConfig {
    pub fn new(pairs: Vec<PairConfig>) -> Self {
        Self {
            version: 1,
            min_boundary: 0.0,
            null_equals_null: true,
            parallel: true,
            pairs,
        }
    }

    /// Load and validate a JSON config file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        let config: Self = serde_json::from_str(&data).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the config
    /// - At least one pair
    /// - Boundary within the similarity scale
    /// - Every measure accepts its declared type and normalization
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pairs.is_empty() {
            return Err(ConfigError::EmptyConfig);
        }
        if !(MIN_SIMILARITY..=MAX_SIMILARITY).contains(&self.min_boundary) {
            return Err(ConfigError::InvalidBoundary(self.min_boundary));
        }
        for pair in &self.pairs {
            pair.measure.build().map_err(|e| ConfigError::InvalidMeasure {
                pair: pair.label(),
                reason: e.to_string(),
            })?;
        }
        Ok(())
    }

    /// Index builder carrying the configured boundary and policies
    pub fn builder(&self) -> IndexBuilder {
        IndexBuilder::new(self.min_boundary, self.null_equals_null).parallel(self.parallel)
    }
}

/// One column pair to index; `right` is the clustered side
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PairConfig {
    pub left: String,
    pub right: String,
    pub measure: MeasureConfig,
}

impl PairConfig {
    pub fn new(left: impl Into<String>, right: impl Into<String>, measure: MeasureConfig) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
            measure,
        }
    }

    pub fn label(&self) -> String {
        format!("{} ~ {}", self.left, self.right)
    }
}

/// Declarative form of a built-in measure
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MeasureConfig {
    pub kind: MeasureKind,

    /// Column type the measure is declared over
    #[serde(rename = "type")]
    pub arg_type: ValueType,

    /// Only read by numeric distance
    #[serde(default)]
    pub normalization: Normalization,
}

impl MeasureConfig {
    pub fn new(kind: MeasureKind, arg_type: ValueType) -> Self {
        Self {
            kind,
            arg_type,
            normalization: Normalization::default(),
        }
    }

    pub fn with_normalization(mut self, normalization: Normalization) -> Self {
        self.normalization = normalization;
        self
    }

    /// Construct the measure, surfacing type errors at setup time
    pub fn build(&self) -> Result<SimilarityMeasure, IndexError> {
        SimilarityMeasure::new(self.kind, self.arg_type)?.with_normalization(self.normalization)
    }
}

/// Errors that can occur while loading or validating a config
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("Config must declare at least one column pair")]
    EmptyConfig,

    #[error("Minimum boundary {0} is outside [0, 1]")]
    InvalidBoundary(f64),

    #[error("Invalid measure for pair '{pair}': {reason}")]
    InvalidMeasure { pair: String, reason: String },

    #[error("Cannot read config: {0}")]
    Io(String),

    #[error("Cannot parse config: {0}")]
    Parse(String),
}
