//! Profiling run over a table
//!
//! Encodes the configured columns, builds every configured index and turns
//! the results into serializable reports with values and row ids resolved.

use crate::{
    ColumnMatchSimilarityIndex, ColumnPair, EncodedColumn, IndexError, ProfileConfig, RowId,
    SimilarityMeasure, Table, Value,
};
use ahash::AHashMap;
use serde::Serialize;
use tracing::info;

/// Result of profiling all configured column pairs
#[derive(Debug, Clone, Serialize)]
pub struct ProfileReport {
    pub min_boundary: f64,
    pub null_equals_null: bool,
    pub indexes: Vec<PairReport>,
}

impl ProfileReport {
    /// Number of pairs whose index could not be built
    pub fn failures(&self) -> usize {
        self.indexes.iter().filter(|p| p.error.is_some()).count()
    }
}

/// Index of one column pair, or the reason it is missing
#[derive(Debug, Clone, Serialize)]
pub struct PairReport {
    pub left: String,
    pub right: String,
    pub measure: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub entries: Vec<EntryReport>,
    /// Distinct similarities in the index, descending
    pub natural_boundaries: Vec<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntryReport {
    pub value: Value,
    pub matches: Vec<MatchReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MatchReport {
    pub value: Value,
    pub rows: Vec<RowId>,
    pub similarity: f64,
}

impl PairReport {
    fn failed(left: &str, right: &str, measure: String, error: String) -> Self {
        Self {
            left: left.to_string(),
            right: right.to_string(),
            measure,
            error: Some(error),
            entries: Vec::new(),
            natural_boundaries: Vec::new(),
        }
    }

    /// Resolve value and cluster ids of a built index
    pub fn from_index(
        left_name: &str,
        right_name: &str,
        measure: &SimilarityMeasure,
        left: &EncodedColumn,
        right: &EncodedColumn,
        index: &ColumnMatchSimilarityIndex,
    ) -> Self {
        let entries = index
            .iter()
            .map(|(left_id, matches)| EntryReport {
                value: left.dictionary.values()[left_id].clone(),
                matches: matches
                    .iter()
                    .map(|m| MatchReport {
                        value: right.dictionary.values()[m.cluster].clone(),
                        rows: right
                            .clusters
                            .get(m.cluster)
                            .map(|c| c.rows().to_vec())
                            .unwrap_or_default(),
                        similarity: m.similarity,
                    })
                    .collect(),
            })
            .collect();

        Self {
            left: left_name.to_string(),
            right: right_name.to_string(),
            measure: measure.name().to_string(),
            error: None,
            entries,
            natural_boundaries: index.natural_boundaries(),
        }
    }
}

/// Build every index declared by `config` over `table`
///
/// Pairs fail independently: a missing column, an incompatible measure or a
/// scoring failure is recorded in that pair's report.
pub fn profile(table: &Table, config: &ProfileConfig) -> ProfileReport {
    let mut columns: AHashMap<&str, Result<EncodedColumn, String>> = AHashMap::new();
    for pair in &config.pairs {
        for name in [pair.left.as_str(), pair.right.as_str()] {
            columns.entry(name).or_insert_with(|| {
                table
                    .column(name)
                    .and_then(|c| c.encode())
                    .map_err(|e| e.to_string())
            });
        }
    }

    let measures: Vec<Result<SimilarityMeasure, IndexError>> =
        config.pairs.iter().map(|p| p.measure.build()).collect();

    // Resolve inputs; pairs that cannot even start keep their error
    let mut reports: Vec<Option<PairReport>> = Vec::with_capacity(config.pairs.len());
    let mut runnable = Vec::new();
    for (i, (pair, measure)) in config.pairs.iter().zip(&measures).enumerate() {
        let resolved = match measure {
            Ok(measure) => lookup(&columns, &pair.left)
                .and_then(|left| Ok((left, lookup(&columns, &pair.right)?)))
                .map(|(left, right)| (left, right, ColumnPair::new(left, right, measure))),
            Err(e) => Err(e.to_string()),
        };
        match resolved {
            Ok(inputs) => {
                runnable.push((i, inputs));
                reports.push(None);
            }
            Err(e) => {
                let name = pair.measure.kind.as_str().to_string();
                reports.push(Some(PairReport::failed(&pair.left, &pair.right, name, e)));
            }
        }
    }

    let pairs: Vec<ColumnPair<'_>> = runnable.iter().map(|(_, (_, _, p))| *p).collect();
    let results = config.builder().build_all(&pairs);

    for ((i, (left, right, column_pair)), result) in runnable.iter().zip(results) {
        let pair = &config.pairs[*i];
        let measure = column_pair.measure;
        reports[*i] = Some(match result {
            Ok(index) => PairReport::from_index(&pair.left, &pair.right, measure, left, right, &index),
            Err(e) => PairReport::failed(&pair.left, &pair.right, measure.name().to_string(), e.to_string()),
        });
    }

    let report = ProfileReport {
        min_boundary: config.min_boundary,
        null_equals_null: config.null_equals_null,
        indexes: reports.into_iter().flatten().collect(),
    };
    info!(
        pairs = report.indexes.len(),
        failures = report.failures(),
        "profiling finished"
    );
    report
}

fn lookup<'c>(
    columns: &'c AHashMap<&str, Result<EncodedColumn, String>>,
    name: &str,
) -> Result<&'c EncodedColumn, String> {
    match columns.get(name) {
        Some(Ok(column)) => Ok(column),
        Some(Err(e)) => Err(format!("column '{}': {}", name, e)),
        None => Err(format!("column '{}' not configured", name)),
    }
}
