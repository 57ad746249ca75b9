use crate::{Error, Result};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared type of a column
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// 64-bit signed integer
    Int,
    /// 64-bit float, finite values only
    Double,
    /// UTF-8 string
    String,
}

impl ValueType {
    /// Whether values of this type carry a numeric distance
    pub fn is_numeric(self) -> bool {
        matches!(self, ValueType::Int | ValueType::Double)
    }

    /// Parse a raw cell into a typed value
    ///
    /// `None` is the null cell. Strings are taken verbatim, numbers are
    /// trimmed before parsing and must be finite.
    pub fn parse(self, raw: Option<&str>) -> Result<Value> {
        let Some(raw) = raw else {
            return Ok(Value::Null);
        };
        let invalid = || Error::InvalidValue {
            value_type: self.to_string(),
            raw: raw.to_string(),
        };
        match self {
            ValueType::Int => raw.trim().parse::<i64>().map(Value::Int).map_err(|_| invalid()),
            ValueType::Double => {
                let v = raw.trim().parse::<f64>().map_err(|_| invalid())?;
                if v.is_finite() {
                    Ok(Value::Double(OrderedFloat(v)))
                } else {
                    Err(invalid())
                }
            }
            ValueType::String => Ok(Value::String(raw.to_string())),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Int => write!(f, "int"),
            ValueType::Double => write!(f, "double"),
            ValueType::String => write!(f, "string"),
        }
    }
}

/// A single typed cell value
///
/// Doubles are wrapped in [`OrderedFloat`] so that values can be deduplicated
/// and hashed by the dictionary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Int(i64),
    Double(OrderedFloat<f64>),
    String(String),
}

impl Value {
    pub fn double(v: f64) -> Self {
        Value::Double(OrderedFloat(v))
    }

    pub fn string(s: impl Into<String>) -> Self {
        Value::String(s.into())
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Type of this value, `None` for null
    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            Value::Null => None,
            Value::Int(_) => Some(ValueType::Int),
            Value::Double(_) => Some(ValueType::Double),
            Value::String(_) => Some(ValueType::String),
        }
    }

    /// Numeric view used for range computations and window pruning
    #[inline]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Double(d) => Some(d.0),
            _ => None,
        }
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Int(i) => write!(f, "{}", i),
            Value::Double(d) => write!(f, "{}", d.0),
            Value::String(s) => write!(f, "{:?}", s),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::double(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}
