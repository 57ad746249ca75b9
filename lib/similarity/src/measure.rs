//! Similarity measures
//!
//! A [`SimilarityMeasure`] maps a pair of non-null values to a score in
//! `[MIN_SIMILARITY, MAX_SIMILARITY]`. Built-in variants are dispatched by
//! [`MeasureKind`] tag; the only indirect call is a caller-supplied distance
//! function wrapped by [`SimilarityMeasure::distance`].

use crate::distance::{
    jaro_winkler_similarity, levenshtein_similarity, numeric_distance, token_jaccard_similarity,
    trigram_similarity,
};
use crate::error::{IndexError, Result};
use matchdep_core::{Value, ValueDictionary, ValueType};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Lowest score any measure produces
pub const MIN_SIMILARITY: f64 = 0.0;
/// Highest score any measure produces
pub const MAX_SIMILARITY: f64 = 1.0;

/// Caller-supplied distance function for [`SimilarityMeasure::distance`]
///
/// Returns a raw, non-negative distance (or a similarity when paired with
/// [`Normalization::Identity`]); `Err` carries the reason the pair cannot be scored.
pub type DistanceFn = dyn Fn(&Value, &Value) -> std::result::Result<f64, String> + Send + Sync;

/// Built-in measure variants
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MeasureKind {
    /// 1 if values are equal, 0 otherwise
    Equality,
    /// Normalized absolute difference of numbers
    NumericDistance,
    /// Normalized Levenshtein edit distance
    Levenshtein,
    /// Jaro-Winkler similarity
    JaroWinkler,
    /// Jaccard index of whitespace tokens
    TokenJaccard,
    /// Jaccard index of character trigrams
    Trigram,
}

impl MeasureKind {
    /// Whether the scoring function is defined for values of `value_type`
    pub fn accepts(self, value_type: ValueType) -> bool {
        match self {
            MeasureKind::Equality => true,
            MeasureKind::NumericDistance => value_type.is_numeric(),
            MeasureKind::Levenshtein
            | MeasureKind::JaroWinkler
            | MeasureKind::TokenJaccard
            | MeasureKind::Trigram => value_type == ValueType::String,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MeasureKind::Equality => "equality",
            MeasureKind::NumericDistance => "numeric_distance",
            MeasureKind::Levenshtein => "levenshtein",
            MeasureKind::JaroWinkler => "jaro_winkler",
            MeasureKind::TokenJaccard => "token_jaccard",
            MeasureKind::Trigram => "trigram",
        }
    }
}

/// How a raw distance becomes a similarity score
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Normalization {
    /// `1 - d / scale`, clipped to `[0, 1]`
    Fixed { scale: f64 },
    /// Like `Fixed`, with `scale` the value range of both columns combined
    #[default]
    ColumnRange,
    /// The function already returns a similarity in `[0, 1]`
    Identity,
}

impl Normalization {
    fn validate(self) -> Result<()> {
        match self {
            Normalization::Fixed { scale } if !(scale.is_finite() && scale > 0.0) => Err(
                IndexError::config(format!("normalization scale must be finite and positive, got {}", scale)),
            ),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Normalization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Normalization::Fixed { scale } => write!(f, "fixed:{}", scale),
            Normalization::ColumnRange => write!(f, "column_range"),
            Normalization::Identity => write!(f, "identity"),
        }
    }
}

#[derive(Clone)]
enum Scorer {
    Builtin(MeasureKind),
    Custom(Arc<DistanceFn>),
}

/// A named, typed similarity function
///
/// Constructed once at configuration time and shared by reference across all
/// index builds of matching column types. The decision boundary is never
/// stored here; it is supplied per build.
#[derive(Clone)]
pub struct SimilarityMeasure {
    name: String,
    arg_type: ValueType,
    scorer: Scorer,
    normalization: Normalization,
}

impl fmt::Debug for SimilarityMeasure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimilarityMeasure")
            .field("name", &self.name)
            .field("arg_type", &self.arg_type)
            .field("normalization", &self.normalization)
            .finish()
    }
}

impl SimilarityMeasure {
    /// Create a built-in measure over columns of `arg_type`
    ///
    /// Numeric distance starts with [`Normalization::ColumnRange`]; use
    /// [`with_normalization`](Self::with_normalization) to pick another.
    pub fn new(kind: MeasureKind, arg_type: ValueType) -> Result<Self> {
        if !kind.accepts(arg_type) {
            return Err(IndexError::config(format!(
                "measure {} does not accept {} values",
                kind.as_str(),
                arg_type
            )));
        }
        let normalization = Normalization::ColumnRange;
        let name = match kind {
            MeasureKind::NumericDistance => format!("{}({})", kind.as_str(), normalization),
            _ => kind.as_str().to_string(),
        };
        Ok(Self {
            name,
            arg_type,
            scorer: Scorer::Builtin(kind),
            normalization,
        })
    }

    /// Numeric distance with an explicit normalization
    pub fn numeric(arg_type: ValueType, normalization: Normalization) -> Result<Self> {
        Self::new(MeasureKind::NumericDistance, arg_type)?.with_normalization(normalization)
    }

    /// Wrap a caller-supplied distance function
    ///
    /// `ColumnRange` normalization needs numeric columns to derive a range.
    pub fn distance<F>(
        name: impl Into<String>,
        arg_type: ValueType,
        normalization: Normalization,
        func: F,
    ) -> Result<Self>
    where
        F: Fn(&Value, &Value) -> std::result::Result<f64, String> + Send + Sync + 'static,
    {
        normalization.validate()?;
        if normalization == Normalization::ColumnRange && !arg_type.is_numeric() {
            return Err(IndexError::config(format!(
                "column range normalization needs numeric columns, got {}",
                arg_type
            )));
        }
        Ok(Self {
            name: name.into(),
            arg_type,
            scorer: Scorer::Custom(Arc::new(func)),
            normalization,
        })
    }

    /// Replace the normalization of a distance-derived measure
    ///
    /// Has no effect on measures that score similarity directly.
    pub fn with_normalization(mut self, normalization: Normalization) -> Result<Self> {
        normalization.validate()?;
        if let Scorer::Builtin(MeasureKind::NumericDistance) = self.scorer {
            if normalization == Normalization::Identity {
                return Err(IndexError::config(
                    "numeric distance cannot use identity normalization",
                ));
            }
            self.name = format!("{}({})", MeasureKind::NumericDistance.as_str(), normalization);
        }
        self.normalization = normalization;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arg_type(&self) -> ValueType {
        self.arg_type
    }

    /// Built-in kind, `None` for custom distance functions
    pub fn kind(&self) -> Option<MeasureKind> {
        match self.scorer {
            Scorer::Builtin(kind) => Some(kind),
            Scorer::Custom(_) => None,
        }
    }

    pub fn normalization(&self) -> Normalization {
        self.normalization
    }

    #[inline]
    pub fn min(&self) -> f64 {
        MIN_SIMILARITY
    }

    #[inline]
    pub fn max(&self) -> f64 {
        MAX_SIMILARITY
    }

    /// Check that both columns have the declared argument type
    pub fn check_columns(&self, left: ValueType, right: ValueType) -> Result<()> {
        if left != self.arg_type || right != self.arg_type {
            return Err(IndexError::config(format!(
                "measure {} expects {} columns, got {} and {}",
                self.name, self.arg_type, left, right
            )));
        }
        Ok(())
    }

    /// Resolve column-dependent parameters for one column pair
    pub fn prepare<'m>(
        &'m self,
        left: &ValueDictionary,
        right: &ValueDictionary,
    ) -> Result<PreparedMeasure<'m>> {
        self.check_columns(left.value_type(), right.value_type())?;
        let scale = match self.normalization {
            Normalization::Fixed { scale } => Scale::Linear(scale),
            Normalization::Identity => Scale::Identity,
            Normalization::ColumnRange => {
                let range = match (left.numeric_range(), right.numeric_range()) {
                    (Some((l_lo, l_hi)), Some((r_lo, r_hi))) => l_hi.max(r_hi) - l_lo.min(r_lo),
                    (Some((lo, hi)), None) | (None, Some((lo, hi))) => hi - lo,
                    (None, None) => 0.0,
                };
                if !range.is_finite() {
                    return Err(IndexError::Computation {
                        left: "column range".to_string(),
                        right: "column range".to_string(),
                        reason: "value range overflows".to_string(),
                    });
                }
                Scale::Linear(range)
            }
        };
        Ok(PreparedMeasure {
            measure: self,
            scale,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Scale {
    Linear(f64),
    Identity,
}

/// A measure bound to one column pair
///
/// Holds the resolved normalization scale; produced by
/// [`SimilarityMeasure::prepare`].
#[derive(Debug, Clone, Copy)]
pub struct PreparedMeasure<'m> {
    measure: &'m SimilarityMeasure,
    scale: Scale,
}

impl<'m> PreparedMeasure<'m> {
    pub fn measure(&self) -> &'m SimilarityMeasure {
        self.measure
    }

    /// Resolved linear scale, `None` for identity normalization
    pub fn scale(&self) -> Option<f64> {
        match self.scale {
            Scale::Linear(s) => Some(s),
            Scale::Identity => None,
        }
    }

    /// Score two non-null values
    #[inline]
    pub fn compute(&self, left: &Value, right: &Value) -> Result<f64> {
        self.score(left, right).map_err(|reason| IndexError::Computation {
            left: left.to_string(),
            right: right.to_string(),
            reason,
        })
    }

    fn score(&self, left: &Value, right: &Value) -> std::result::Result<f64, String> {
        match &self.measure.scorer {
            Scorer::Builtin(kind) => match kind {
                MeasureKind::Equality => Ok(if left == right { MAX_SIMILARITY } else { MIN_SIMILARITY }),
                MeasureKind::NumericDistance => {
                    let d = numeric_distance(left, right).ok_or_else(|| match (left, right) {
                        (Value::Int(_), Value::Int(_)) => "integer difference overflows".to_string(),
                        (Value::Double(_), Value::Double(_)) => "difference is not finite".to_string(),
                        _ => "operands are not numbers of one type".to_string(),
                    })?;
                    self.normalize(d)
                }
                MeasureKind::Levenshtein => Ok(levenshtein_similarity(text(left)?, text(right)?)),
                MeasureKind::JaroWinkler => Ok(jaro_winkler_similarity(text(left)?, text(right)?)),
                MeasureKind::TokenJaccard => Ok(token_jaccard_similarity(text(left)?, text(right)?)),
                MeasureKind::Trigram => Ok(trigram_similarity(text(left)?, text(right)?)),
            },
            Scorer::Custom(func) => {
                let d = func(left, right)?;
                self.normalize(d)
            }
        }
    }

    fn normalize(&self, d: f64) -> std::result::Result<f64, String> {
        if !d.is_finite() || d < 0.0 {
            return Err(format!("distance {} is not a finite non-negative number", d));
        }
        match self.scale {
            Scale::Linear(scale) if scale > 0.0 => {
                Ok((1.0 - d / scale).clamp(MIN_SIMILARITY, MAX_SIMILARITY))
            }
            // Degenerate range: only identical values are similar
            Scale::Linear(_) => Ok(if d == 0.0 { MAX_SIMILARITY } else { MIN_SIMILARITY }),
            Scale::Identity if d <= MAX_SIMILARITY => Ok(d),
            Scale::Identity => Err(format!("similarity {} is outside [0, 1]", d)),
        }
    }

    /// Upper bound on the distance of any pair that can still reach `boundary`
    ///
    /// Only defined for the built-in numeric distance with a positive boundary,
    /// where the score is monotone in the distance. The bound is slightly
    /// loose to absorb rounding in the score.
    pub(crate) fn numeric_window(&self, boundary: f64) -> Option<f64> {
        if self.measure.kind() != Some(MeasureKind::NumericDistance) || boundary <= MIN_SIMILARITY {
            return None;
        }
        match self.scale {
            Scale::Linear(scale) if scale > 0.0 => Some((MAX_SIMILARITY - boundary) * scale + scale * 1e-9),
            Scale::Linear(_) => Some(0.0),
            Scale::Identity => None,
        }
    }
}

fn text(value: &Value) -> std::result::Result<&str, String> {
    value
        .as_str()
        .ok_or_else(|| format!("expected a string, got {}", value))
}
