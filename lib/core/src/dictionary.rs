//! Per-column value dictionary
//!
//! A dictionary holds the distinct values of one column in order of first
//! occurrence. The position of a value is its [`ValueId`] and stays stable for
//! the lifetime of the dictionary.

use crate::value::{Value, ValueType};
use crate::{Error, Result};
use ahash::AHashSet;

/// Position of a value inside its column's dictionary
pub type ValueId = usize;

/// Immutable, deduplicated list of one column's distinct values
#[derive(Debug, Clone, PartialEq)]
pub struct ValueDictionary {
    value_type: ValueType,
    values: Vec<Value>,
    null_id: Option<ValueId>,
}

impl ValueDictionary {
    /// Create a dictionary from already-distinct values
    ///
    /// Fails if a value has a type other than `value_type`, is a non-finite
    /// double, or appears twice.
    pub fn new(value_type: ValueType, values: Vec<Value>) -> Result<Self> {
        let mut seen: AHashSet<&Value> = AHashSet::with_capacity(values.len());
        let mut null_id = None;

        for (id, value) in values.iter().enumerate() {
            match value.value_type() {
                None => null_id = Some(id),
                Some(t) if t != value_type => {
                    return Err(Error::TypeMismatch {
                        expected: value_type.to_string(),
                        actual: value.to_string(),
                    });
                }
                Some(_) => {}
            }
            if let Value::Double(d) = value {
                if !d.0.is_finite() {
                    return Err(Error::InvalidValue {
                        value_type: value_type.to_string(),
                        raw: value.to_string(),
                    });
                }
            }
            if !seen.insert(value) {
                return Err(Error::DuplicateValue(value.to_string()));
            }
        }

        Ok(Self {
            value_type,
            values,
            null_id,
        })
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    pub fn get(&self, id: ValueId) -> Option<&Value> {
        self.values.get(id)
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Iterate `(id, value)` pairs in dictionary order
    pub fn iter(&self) -> impl Iterator<Item = (ValueId, &Value)> + '_ {
        self.values.iter().enumerate()
    }

    /// Id of the null entry, if the column contains nulls
    pub fn null_id(&self) -> Option<ValueId> {
        self.null_id
    }

    /// Smallest and largest numeric value, ignoring nulls
    ///
    /// Returns `None` for string columns and for columns without non-null values.
    pub fn numeric_range(&self) -> Option<(f64, f64)> {
        self.values
            .iter()
            .filter_map(Value::as_f64)
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dictionary_keeps_order() {
        let dict = ValueDictionary::new(
            ValueType::String,
            vec![Value::from("b"), Value::from("a"), Value::Null],
        )
        .unwrap();
        assert_eq!(dict.len(), 3);
        assert_eq!(dict.get(0), Some(&Value::from("b")));
        assert_eq!(dict.null_id(), Some(2));
        let ids: Vec<_> = dict.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_duplicate_rejected() {
        let result = ValueDictionary::new(ValueType::Int, vec![Value::Int(1), Value::Int(1)]);
        assert!(matches!(result, Err(Error::DuplicateValue(_))));

        let result = ValueDictionary::new(ValueType::Int, vec![Value::Null, Value::Null]);
        assert!(matches!(result, Err(Error::DuplicateValue(_))));
    }

    #[test]
    fn test_type_mismatch_rejected() {
        let result = ValueDictionary::new(ValueType::Int, vec![Value::from("x")]);
        assert!(matches!(result, Err(Error::TypeMismatch { .. })));
    }

    #[test]
    fn test_non_finite_double_rejected() {
        for bad in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let result = ValueDictionary::new(ValueType::Double, vec![Value::double(1.0), Value::double(bad)]);
            assert!(matches!(result, Err(Error::InvalidValue { .. })), "{} accepted", bad);
        }
    }

    #[test]
    fn test_numeric_range() {
        let dict = ValueDictionary::new(
            ValueType::Double,
            vec![Value::double(3.0), Value::Null, Value::double(-1.5), Value::double(7.0)],
        )
        .unwrap();
        assert_eq!(dict.numeric_range(), Some((-1.5, 7.0)));

        let strings = ValueDictionary::new(ValueType::String, vec![Value::from("a")]).unwrap();
        assert_eq!(strings.numeric_range(), None);
    }
}
