//! # matchdep Core
//!
//! Core data model for the matchdep similarity index engine.
//!
//! This crate provides the inputs every index build consumes:
//!
//! - [`Value`] / [`ValueType`] - Typed cell values
//! - [`ValueDictionary`] - Distinct values of one column in first-occurrence order
//! - [`ClusterTable`] - Rows grouped by value, index-aligned with the dictionary
//! - [`EncodedColumn`] - Dictionary plus clusters, shareable across builds
//!
//! ## Example
//!
//! ```rust
//! use matchdep_core::{EncodedColumn, Value, ValueType};
//!
//! let column = EncodedColumn::encode(
//!     ValueType::Int,
//!     vec![Value::Int(10), Value::Int(12), Value::Int(10)],
//! ).unwrap();
//!
//! assert_eq!(column.dictionary.len(), 2);
//! assert_eq!(column.clusters.get(0).unwrap().rows(), &[0, 2]);
//! ```

pub mod error;
pub mod value;
pub mod dictionary;
pub mod cluster;
pub mod column;

pub use error::{Error, Result};
pub use value::{Value, ValueType};
pub use dictionary::{ValueDictionary, ValueId};
pub use cluster::{ClusterId, ClusterTable, RowCluster, RowId};
pub use column::{Column, EncodedColumn, Table};
