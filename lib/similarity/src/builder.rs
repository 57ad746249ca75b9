//! Similarity index construction
//!
//! Scores every left dictionary entry against the right dictionary, keeps the
//! clusters reaching the decision boundary and assembles a
//! [`ColumnMatchSimilarityIndex`]. The result is the naive filtered cross
//! product; numeric distance skips pairs outside the boundary window, and the
//! left scan may run on the rayon pool.

use crate::error::{IndexError, Result};
use crate::index::{ClusterMatch, ColumnMatchSimilarityIndex};
use crate::measure::{PreparedMeasure, SimilarityMeasure};
use matchdep_core::{ClusterId, ClusterTable, EncodedColumn, Value, ValueDictionary, ValueId, ValueType};
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Integers beyond this magnitude lose precision as `f64`
const EXACT_F64_INT: f64 = 9_007_199_254_740_992.0;

/// Cooperative cancellation flag shared with a running build
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Inputs of one index build
#[derive(Debug, Clone, Copy)]
pub struct ColumnPair<'a> {
    pub left: &'a ValueDictionary,
    pub right: &'a ValueDictionary,
    pub clusters: &'a ClusterTable,
    pub measure: &'a SimilarityMeasure,
}

impl<'a> ColumnPair<'a> {
    /// Pair two encoded columns; clusters come from the right column
    pub fn new(left: &'a EncodedColumn, right: &'a EncodedColumn, measure: &'a SimilarityMeasure) -> Self {
        Self {
            left: &left.dictionary,
            right: &right.dictionary,
            clusters: &right.clusters,
            measure,
        }
    }
}

/// Builds column-match similarity indexes at one decision boundary
#[derive(Debug, Clone)]
pub struct IndexBuilder {
    boundary: f64,
    null_equals_null: bool,
    parallel: bool,
    cancel: Option<CancellationToken>,
}

impl Default for IndexBuilder {
    fn default() -> Self {
        Self {
            boundary: 0.0,
            null_equals_null: true,
            parallel: true,
            cancel: None,
        }
    }
}

/// Where the candidates of one left value come from
enum Strategy {
    /// Score every right entry
    Full,
    /// Score right entries within `window` of the left value
    Window { window: f64, sorted: Vec<(f64, ValueId)> },
}

impl IndexBuilder {
    /// Builder with the given decision boundary and null policy
    pub fn new(boundary: f64, null_equals_null: bool) -> Self {
        Self {
            boundary,
            null_equals_null,
            ..Self::default()
        }
    }

    /// Run the left scan on the rayon pool (default) or on the calling thread
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn boundary(&self) -> f64 {
        self.boundary
    }

    pub fn null_equals_null(&self) -> bool {
        self.null_equals_null
    }

    /// Build the index for one column pair
    ///
    /// Shape and configuration are checked before any pair is scored. A
    /// scoring failure aborts the whole build.
    pub fn build(&self, pair: &ColumnPair<'_>) -> Result<ColumnMatchSimilarityIndex> {
        let ColumnPair { left, right, clusters, measure } = *pair;

        if clusters.len() != right.len() {
            return Err(IndexError::InputShape {
                dictionary: right.len(),
                clusters: clusters.len(),
            });
        }
        measure.check_columns(left.value_type(), right.value_type())?;
        if !self.boundary.is_finite() || self.boundary < measure.min() || self.boundary > measure.max() {
            return Err(IndexError::config(format!(
                "decision boundary {} outside [{}, {}] of measure {}",
                self.boundary,
                measure.min(),
                measure.max(),
                measure.name()
            )));
        }

        let prepared = measure.prepare(left, right)?;
        let strategy = self.strategy(&prepared, left, right);
        debug!(
            measure = measure.name(),
            boundary = self.boundary,
            left = left.len(),
            right = right.len(),
            windowed = matches!(strategy, Strategy::Window { .. }),
            "building similarity index"
        );

        let score_left = |left_id: ValueId| -> Result<(ValueId, Vec<ClusterMatch>)> {
            if self.cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
                return Err(IndexError::Cancelled);
            }
            let value = &left.values()[left_id];
            let matches = self.score_value(&prepared, &strategy, value, right)?;
            Ok((left_id, matches))
        };

        let rows: Vec<(ValueId, Vec<ClusterMatch>)> = if self.parallel {
            (0..left.len()).into_par_iter().map(score_left).collect::<Result<_>>()?
        } else {
            (0..left.len()).map(score_left).collect::<Result<_>>()?
        };

        let index = ColumnMatchSimilarityIndex::from_matches(self.boundary, self.null_equals_null, rows);
        debug!(
            measure = measure.name(),
            entries = index.len(),
            matches = index.match_count(),
            "similarity index built"
        );
        Ok(index)
    }

    /// Build many independent indexes in parallel
    ///
    /// Each pair gets its own result, so one failing pair does not affect
    /// the others.
    pub fn build_all(&self, pairs: &[ColumnPair<'_>]) -> Vec<Result<ColumnMatchSimilarityIndex>> {
        pairs
            .par_iter()
            .map(|pair| {
                let result = self.build(pair);
                if let Err(e) = &result {
                    warn!(measure = pair.measure.name(), error = %e, "index build failed");
                }
                result
            })
            .collect()
    }

    fn strategy(&self, prepared: &PreparedMeasure<'_>, left: &ValueDictionary, right: &ValueDictionary) -> Strategy {
        let Some(window) = prepared.numeric_window(self.boundary) else {
            return Strategy::Full;
        };

        // The window must select a superset of the naive matches. Values that
        // do not round-trip through f64, NaN (which no window contains), or
        // ranges whose distances could overflow take the full scan so that
        // errors surface identically.
        let exact = |v: f64| v.abs() <= EXACT_F64_INT;
        let numbers = || left.values().iter().chain(right.values()).filter_map(Value::as_f64);
        if numbers().any(f64::is_nan) {
            return Strategy::Full;
        }
        let (lo, hi) = numbers().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
        let int_column = left.value_type() == ValueType::Int;
        if (int_column && !numbers().all(exact)) || !(hi - lo).is_finite() {
            return Strategy::Full;
        }

        let mut sorted: Vec<(f64, ValueId)> = right
            .iter()
            .filter_map(|(id, v)| v.as_f64().map(|x| (x, id)))
            .collect();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        Strategy::Window { window, sorted }
    }

    fn score_value(
        &self,
        prepared: &PreparedMeasure<'_>,
        strategy: &Strategy,
        value: &Value,
        right: &ValueDictionary,
    ) -> Result<Vec<ClusterMatch>> {
        let mut matches = Vec::new();
        match strategy {
            Strategy::Full => {
                for (cluster, other) in right.iter() {
                    self.push_pair(prepared, value, other, cluster, &mut matches)?;
                }
            }
            Strategy::Window { window, sorted } => match value.as_f64() {
                // Window strategy implies a positive boundary, so a null only
                // ever matches the other null.
                None => {
                    if let Some(null_id) = right.null_id() {
                        self.push_pair(prepared, value, &Value::Null, null_id, &mut matches)?;
                    }
                }
                Some(x) => {
                    let slack = (window + x.abs()) * 1e-9 + f64::MIN_POSITIVE;
                    let (from, to) = (x - window - slack, x + window + slack);
                    let start = sorted.partition_point(|(v, _)| *v < from);
                    for &(v, cluster) in sorted[start..].iter().take_while(|(v, _)| *v <= to) {
                        debug_assert!(v >= from);
                        let other = &right.values()[cluster];
                        self.push_pair(prepared, value, other, cluster, &mut matches)?;
                    }
                }
            },
        }
        Ok(matches)
    }

    /// Score one pair under the null policy and keep it if it qualifies
    #[inline]
    fn push_pair(
        &self,
        prepared: &PreparedMeasure<'_>,
        left: &Value,
        right: &Value,
        cluster: ClusterId,
        out: &mut Vec<ClusterMatch>,
    ) -> Result<()> {
        let measure = prepared.measure();
        let score = match (left.is_null(), right.is_null()) {
            (false, false) => prepared.compute(left, right)?,
            (true, true) if self.null_equals_null => measure.max(),
            // Two nulls are not comparable when the policy is off
            (true, true) => return Ok(()),
            _ => measure.min(),
        };
        if score >= self.boundary {
            out.push(ClusterMatch::new(cluster, score));
        }
        Ok(())
    }
}

/// Build one index with default options
///
/// `min_sim` is the decision boundary; `is_null_equal_null` selects the null
/// policy.
pub fn make_indexes(
    left: &ValueDictionary,
    right: &ValueDictionary,
    clusters_right: &ClusterTable,
    measure: &SimilarityMeasure,
    min_sim: f64,
    is_null_equal_null: bool,
) -> Result<ColumnMatchSimilarityIndex> {
    IndexBuilder::new(min_sim, is_null_equal_null).build(&ColumnPair {
        left,
        right,
        clusters: clusters_right,
        measure,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::{MeasureKind, Normalization};
    
    fn ints(values: &[Option<i64>]) -> EncodedColumn {
        EncodedColumn::encode(
            ValueType::Int,
            values.iter().map(|v| v.map_or(Value::Null, Value::Int)),
        )
        .unwrap()
    }

    fn strings(values: &[&str]) -> EncodedColumn {
        EncodedColumn::encode(ValueType::String, values.iter().map(|s| Value::from(*s))).unwrap()
    }

    fn doubles(values: &[Option<f64>]) -> EncodedColumn {
        EncodedColumn::encode(
            ValueType::Double,
            values.iter().map(|v| v.map_or(Value::Null, Value::double)),
        )
        .unwrap()
    }

    fn distance30() -> SimilarityMeasure {
        SimilarityMeasure::numeric(ValueType::Int, Normalization::Fixed { scale: 30.0 }).unwrap()
    }

    #[test]
    fn test_numeric_example() {
        let left = ints(&[Some(10), Some(12), Some(20)]);
        let right = ints(&[Some(11), Some(25)]);
        let measure = distance30();

        let index = IndexBuilder::new(0.9, true)
            .build(&ColumnPair::new(&left, &right, &measure))
            .unwrap();

        assert_eq!(index.len(), 2);
        let m10 = index.matches(0);
        assert_eq!(m10.len(), 1);
        assert_eq!(m10[0].cluster, 0);
        assert!((m10[0].similarity - 0.9667).abs() < 1e-3);

        let m12 = index.matches(1);
        assert_eq!(m12.len(), 1);
        assert!((m12[0].similarity - 0.9333).abs() < 1e-3);

        assert!(index.matches(2).is_empty());
        assert!(!index.contains(2));
    }

    #[test]
    fn test_sorted_descending_with_tie_break() {
        let left = ints(&[Some(10)]);
        let right = ints(&[Some(13), Some(7), Some(10), Some(12)]);
        let measure = distance30();

        let index = make_indexes(
            &left.dictionary,
            &right.dictionary,
            &right.clusters,
            &measure,
            0.5,
            false,
        )
        .unwrap();

        // 10 first, then 12, then the 13 / 7 tie by cluster id
        let clusters: Vec<_> = index.matches(0).iter().map(|m| m.cluster).collect();
        assert_eq!(clusters, vec![2, 3, 0, 1]);
    }

    #[test]
    fn test_null_equals_null_at_zero_boundary() {
        let left = ints(&[Some(1), None]);
        let right = ints(&[None, Some(100)]);
        let measure = distance30();

        let index = IndexBuilder::new(0.0, true)
            .build(&ColumnPair::new(&left, &right, &measure))
            .unwrap();

        // Null pair present with maximum similarity
        assert_eq!(index.similarity(1, 0), Some(1.0));
        // Null against a value scores the minimum, which qualifies at boundary 0
        assert_eq!(index.similarity(1, 1), Some(0.0));
        assert_eq!(index.similarity(0, 0), Some(0.0));
        // Clipped distance still qualifies at boundary 0
        assert_eq!(index.similarity(0, 1), Some(0.0));
    }

    #[test]
    fn test_null_policy_disabled() {
        let left = ints(&[None, Some(5)]);
        let right = ints(&[None, Some(5)]);
        let measure = distance30();

        for boundary in [0.0, 0.5, 1.0] {
            let index = IndexBuilder::new(boundary, false)
                .build(&ColumnPair::new(&left, &right, &measure))
                .unwrap();
            assert_eq!(index.similarity(0, 0), None);
            assert_eq!(index.similarity(1, 1), Some(1.0));
        }
    }

    #[test]
    fn test_null_policy_enabled_any_boundary() {
        let left = ints(&[None]);
        let right = ints(&[Some(3), None]);
        let measure = distance30();

        for boundary in [0.3, 1.0] {
            let index = IndexBuilder::new(boundary, true)
                .build(&ColumnPair::new(&left, &right, &measure))
                .unwrap();
            assert_eq!(index.matches(0), &[ClusterMatch::new(1, 1.0)]);
        }
    }

    #[test]
    fn test_input_shape_error() {
        let left = ints(&[Some(1)]);
        let right = ints(&[Some(1), Some(2)]);
        let measure = distance30();
        let short = ClusterTable::from_rows(vec![vec![0]]);

        let result = make_indexes(&left.dictionary, &right.dictionary, &short, &measure, 0.5, true);
        assert!(matches!(
            result,
            Err(IndexError::InputShape { dictionary: 2, clusters: 1 })
        ));
    }

    #[test]
    fn test_type_and_boundary_config_errors() {
        let left = ints(&[Some(1)]);
        let right = strings(&["a"]);
        let measure = distance30();
        let result = IndexBuilder::new(0.5, true).build(&ColumnPair::new(&left, &right, &measure));
        assert!(matches!(result, Err(IndexError::Configuration(_))));

        for boundary in [-0.1, 1.1, f64::NAN] {
            let result = IndexBuilder::new(boundary, true).build(&ColumnPair::new(&left, &left, &measure));
            assert!(matches!(result, Err(IndexError::Configuration(_))));
        }
    }

    #[test]
    fn test_overflow_aborts_build() {
        let left = ints(&[Some(i64::MAX)]);
        let right = ints(&[Some(-5), Some(i64::MAX)]);
        let measure = distance30();

        let result = IndexBuilder::new(0.5, true).build(&ColumnPair::new(&left, &right, &measure));
        assert!(matches!(result, Err(IndexError::Computation { .. })));
    }

    #[test]
    fn test_custom_error_aborts_build() {
        let measure = SimilarityMeasure::distance(
            "picky",
            ValueType::String,
            Normalization::Identity,
            |a, _| match a.as_str() {
                Some("bad") => Err("cannot score".to_string()),
                _ => Ok(1.0),
            },
        )
        .unwrap();
        let left = strings(&["ok", "bad"]);
        let right = strings(&["x"]);

        for parallel in [true, false] {
            let result = IndexBuilder::new(0.5, true)
                .parallel(parallel)
                .build(&ColumnPair::new(&left, &right, &measure));
            assert!(matches!(result, Err(IndexError::Computation { .. })));
        }
    }

    #[test]
    fn test_cancelled_build() {
        let left = ints(&[Some(1), Some(2)]);
        let measure = distance30();
        let token = CancellationToken::new();
        token.cancel();

        let result = IndexBuilder::new(0.5, true)
            .cancel_token(token)
            .build(&ColumnPair::new(&left, &left, &measure));
        assert!(matches!(result, Err(IndexError::Cancelled)));
    }

    #[test]
    fn test_window_matches_full_scan() {
        let values: Vec<Option<i64>> = (0..60).map(|i| Some((i * 37) % 101 - 50)).chain([None]).collect();
        let left = ints(&values);
        let right = ints(&values[10..]);

        for norm in [Normalization::Fixed { scale: 30.0 }, Normalization::ColumnRange] {
            let numeric = SimilarityMeasure::numeric(ValueType::Int, norm).unwrap();
            let closure_scale = numeric.prepare(&left.dictionary, &right.dictionary).unwrap().scale().unwrap();
            // Same scoring through a custom function forces the full scan
            let custom = SimilarityMeasure::distance(
                "abs",
                ValueType::Int,
                Normalization::Fixed { scale: closure_scale },
                |a, b| Ok((a.as_f64().unwrap_or(0.0) - b.as_f64().unwrap_or(0.0)).abs()),
            )
            .unwrap();

            for boundary in [0.0, 0.5, 0.9, 0.97, 1.0] {
                for nulls in [true, false] {
                    let builder = IndexBuilder::new(boundary, nulls);
                    let windowed = builder.build(&ColumnPair::new(&left, &right, &numeric)).unwrap();
                    let full = builder.build(&ColumnPair::new(&left, &right, &custom)).unwrap();
                    assert_eq!(windowed, full, "boundary {} nulls {}", boundary, nulls);
                }
            }
        }
    }

    #[test]
    fn test_double_window_matches_full_scan() {
        // Fractional values on or near the window edges, plus a large magnitude
        let left = doubles(&[Some(0.1), Some(0.3), Some(1.7), Some(-2.25), Some(1e6), None]);
        let right = doubles(&[Some(0.2), Some(0.7), Some(1.9), Some(-2.0), Some(1e6 + 0.5), None]);

        for norm in [Normalization::Fixed { scale: 2.0 }, Normalization::ColumnRange] {
            let numeric = SimilarityMeasure::numeric(ValueType::Double, norm).unwrap();
            let scale = numeric.prepare(&left.dictionary, &right.dictionary).unwrap().scale().unwrap();
            let custom = SimilarityMeasure::distance(
                "abs",
                ValueType::Double,
                Normalization::Fixed { scale },
                |a, b| Ok((a.as_f64().unwrap_or(0.0) - b.as_f64().unwrap_or(0.0)).abs()),
            )
            .unwrap();

            for boundary in [0.0, 0.5, 0.8, 0.9, 0.95, 1.0] {
                let builder = IndexBuilder::new(boundary, true);
                let windowed = builder.build(&ColumnPair::new(&left, &right, &numeric)).unwrap();
                let full = builder.build(&ColumnPair::new(&left, &right, &custom)).unwrap();
                assert_eq!(windowed, full, "{} at boundary {}", norm, boundary);
            }
        }
    }

    #[test]
    fn test_non_finite_double_cannot_be_encoded() {
        for bad in [f64::NAN, f64::INFINITY] {
            let result = EncodedColumn::encode(ValueType::Double, vec![Value::double(1.0), Value::double(bad)]);
            assert!(matches!(result, Err(matchdep_core::Error::InvalidValue { .. })));
        }
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let left = strings(&["jon", "john", "jonathan", "joan", "mary", "marie"]);
        let right = strings(&["john", "mary", "joanna", "maria"]);
        let measure = SimilarityMeasure::new(MeasureKind::JaroWinkler, ValueType::String).unwrap();

        let pair = ColumnPair::new(&left, &right, &measure);
        let parallel = IndexBuilder::new(0.7, true).build(&pair).unwrap();
        let sequential = IndexBuilder::new(0.7, true).parallel(false).build(&pair).unwrap();
        assert_eq!(parallel, sequential);
        assert!(parallel.similarity(1, 0) == Some(1.0));
    }

    #[test]
    fn test_build_all_isolates_failures() {
        let numbers = ints(&[Some(1), Some(2)]);
        let names = strings(&["a", "b"]);
        let numeric = distance30();
        let equality = SimilarityMeasure::new(MeasureKind::Equality, ValueType::String).unwrap();

        let pairs = [
            ColumnPair::new(&numbers, &numbers, &numeric),
            ColumnPair::new(&numbers, &names, &numeric),
            ColumnPair::new(&names, &names, &equality),
        ];
        let results = IndexBuilder::new(0.9, true).build_all(&pairs);

        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(IndexError::Configuration(_))));
        let eq = results[2].as_ref().unwrap();
        assert_eq!(eq.matches(0), &[ClusterMatch::new(0, 1.0)]);
        assert_eq!(eq.matches(1), &[ClusterMatch::new(1, 1.0)]);
    }
}
