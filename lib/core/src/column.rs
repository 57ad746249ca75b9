//! Dictionary encoding of typed columns
//!
//! Turns a column of cells into its [`ValueDictionary`] and the index-aligned
//! [`ClusterTable`]. Also provides a small JSON table format used to feed the
//! command line driver.

use crate::cluster::{ClusterTable, RowCluster};
use crate::dictionary::{ValueDictionary, ValueId};
use crate::value::{Value, ValueType};
use crate::{Error, Result};
use ahash::AHashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// A dictionary-encoded column, shareable between index builds
#[derive(Debug, Clone)]
pub struct EncodedColumn {
    pub dictionary: Arc<ValueDictionary>,
    pub clusters: Arc<ClusterTable>,
}

impl EncodedColumn {
    /// Encode already-typed values; row ids are the positions in `values`
    pub fn encode<I>(value_type: ValueType, values: I) -> Result<Self>
    where
        I: IntoIterator<Item = Value>,
    {
        let mut distinct: Vec<Value> = Vec::new();
        let mut ids: AHashMap<Value, ValueId> = AHashMap::new();
        let mut clusters: Vec<RowCluster> = Vec::new();

        for (row, value) in values.into_iter().enumerate() {
            if let Some(t) = value.value_type() {
                if t != value_type {
                    return Err(Error::TypeMismatch {
                        expected: value_type.to_string(),
                        actual: value.to_string(),
                    });
                }
            }
            let id = match ids.get(&value) {
                Some(&id) => id,
                None => {
                    let id = distinct.len();
                    ids.insert(value.clone(), id);
                    distinct.push(value);
                    clusters.push(RowCluster::default());
                    id
                }
            };
            clusters[id].push(row);
        }

        Ok(Self {
            dictionary: Arc::new(ValueDictionary::new(value_type, distinct)?),
            clusters: Arc::new(ClusterTable::new(clusters)),
        })
    }

    /// Number of encoded rows
    pub fn row_count(&self) -> usize {
        self.clusters.row_count()
    }
}

/// A column of raw cells; `None` is a null cell
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    pub values: Vec<Option<String>>,
}

impl Column {
    /// Parse every cell with the column type and encode the result
    pub fn encode(&self) -> Result<EncodedColumn> {
        let parsed = self
            .values
            .iter()
            .map(|raw| self.value_type.parse(raw.as_deref()))
            .collect::<Result<Vec<_>>>()?;
        EncodedColumn::encode(self.value_type, parsed)
    }
}

/// A table of named, typed columns
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Table {
    pub columns: Vec<Column>,
}

impl Table {
    /// Load a table from a JSON file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| Error::UnknownColumn(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_encode_groups_rows_by_value() {
        let column = EncodedColumn::encode(
            ValueType::Int,
            vec![Value::Int(7), Value::Int(3), Value::Int(7), Value::Null, Value::Int(3)],
        )
        .unwrap();

        assert_eq!(
            column.dictionary.values(),
            &[Value::Int(7), Value::Int(3), Value::Null]
        );
        assert_eq!(column.clusters.len(), column.dictionary.len());
        assert_eq!(column.clusters.get(0).unwrap().rows(), &[0, 2]);
        assert_eq!(column.clusters.get(1).unwrap().rows(), &[1, 4]);
        assert_eq!(column.clusters.get(2).unwrap().rows(), &[3]);
        assert_eq!(column.row_count(), 5);
    }

    #[test]
    fn test_encode_rejects_wrong_type() {
        let result = EncodedColumn::encode(ValueType::Int, vec![Value::from("x")]);
        assert!(matches!(result, Err(Error::TypeMismatch { .. })));
    }

    #[test]
    fn test_encode_rejects_non_finite_double() {
        let result = EncodedColumn::encode(
            ValueType::Double,
            vec![Value::double(0.5), Value::Null, Value::double(f64::NAN)],
        );
        assert!(matches!(result, Err(Error::InvalidValue { .. })));
    }

    #[test]
    fn test_column_parse_and_encode() {
        let column = Column {
            name: "price".to_string(),
            value_type: ValueType::Double,
            values: vec![Some("1.5".into()), None, Some("1.50".into())],
        };
        let encoded = column.encode().unwrap();
        assert_eq!(encoded.dictionary.len(), 2);
        assert_eq!(encoded.clusters.get(0).unwrap().rows(), &[0, 2]);
    }

    #[test]
    fn test_table_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"columns": [{{"name": "a", "type": "string", "values": ["x", null]}}]}}"#
        )
        .unwrap();

        let table = Table::from_path(file.path()).unwrap();
        assert_eq!(table.columns.len(), 1);
        assert_eq!(table.column("a").unwrap().values[1], None);
        assert!(matches!(table.column("b"), Err(Error::UnknownColumn(_))));
    }
}
