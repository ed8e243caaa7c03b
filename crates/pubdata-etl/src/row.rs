//! Canonical rows
//!
//! A [`Row`] always carries every column of its dataset in descriptor order.
//! Rows are only built through [`RowBuilder`], which starts every column as a
//! typed null so a missing source field can never drop a column.

use crate::dataset::{ColumnKind, DatasetDescriptor};
use crate::value::{self, RawValue};
use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;

/// A typed column value; `None` is SQL NULL of that type
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(Option<String>),
    Float(Option<f64>),
    Int(Option<i64>),
    Date(Option<NaiveDate>),
    Timestamp(Option<DateTime<Utc>>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        match self {
            Value::Text(v) => v.is_none(),
            Value::Float(v) => v.is_none(),
            Value::Int(v) => v.is_none(),
            Value::Date(v) => v.is_none(),
            Value::Timestamp(v) => v.is_none(),
        }
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            Value::Text(_) => ColumnKind::Text,
            Value::Float(_) => ColumnKind::Float,
            Value::Int(_) => ColumnKind::Int,
            Value::Date(_) => ColumnKind::Date,
            Value::Timestamp(_) => ColumnKind::Timestamp,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(v) => v.as_deref(),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(v) => *v,
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => *v,
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(v) => *v,
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Timestamp(v) => *v,
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(Some(v)) => write!(f, "{v}"),
            Value::Float(Some(v)) => write!(f, "{v}"),
            Value::Int(Some(v)) => write!(f, "{v}"),
            Value::Date(Some(v)) => write!(f, "{}", v.format("%Y-%m-%d")),
            Value::Timestamp(Some(v)) => write!(f, "{}", v.to_rfc3339()),
            _ => write!(f, "NULL"),
        }
    }
}

/// One canonical record, ready for a destination
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    values: Vec<(&'static str, Value)>,
}

impl Row {
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(name, _)| *name == column)
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Value)> + '_ {
        self.values.iter().map(|(name, v)| (*name, v))
    }

    pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.values.iter().map(|(name, _)| *name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Rendered key values, or `None` when any key column is null or absent
    pub fn key(&self, dataset: &DatasetDescriptor) -> Option<Vec<String>> {
        dataset
            .key_columns
            .iter()
            .map(|col| {
                self.get(col)
                    .filter(|v| !v.is_null())
                    .map(ToString::to_string)
            })
            .collect()
    }

    /// Copy of `self` with the named columns taken from `incoming`
    pub fn refreshed_from(&self, incoming: &Row, columns: &[&str]) -> Row {
        let values = self
            .values
            .iter()
            .map(|(name, v)| {
                let value = if columns.contains(name) {
                    incoming.get(name).cloned().unwrap_or_else(|| v.clone())
                } else {
                    v.clone()
                };
                (*name, value)
            })
            .collect();
        Row { values }
    }
}

/// Builds a [`Row`] for one dataset
pub struct RowBuilder {
    dataset: &'static DatasetDescriptor,
    values: Vec<(&'static str, Value)>,
}

impl RowBuilder {
    pub fn new(dataset: &'static DatasetDescriptor) -> Self {
        let values = dataset
            .columns
            .iter()
            .map(|col| (col.name, col.kind.null()))
            .collect();
        Self { dataset, values }
    }

    fn set(mut self, column: &str, value: Value) -> Self {
        match self.values.iter_mut().find(|(name, _)| *name == column) {
            Some(slot) => {
                debug_assert_eq!(
                    slot.1.kind(),
                    value.kind(),
                    "column {}.{} has a different type",
                    self.dataset.table,
                    column
                );
                slot.1 = value;
            },
            None => debug_assert!(false, "unknown column {}.{}", self.dataset.table, column),
        }
        self
    }

    pub fn text(self, column: &str, value: Option<String>) -> Self {
        self.set(column, Value::Text(value))
    }

    pub fn float(self, column: &str, value: Option<f64>) -> Self {
        self.set(column, Value::Float(value))
    }

    pub fn int(self, column: &str, value: Option<i64>) -> Self {
        self.set(column, Value::Int(value))
    }

    pub fn date(self, column: &str, value: Option<NaiveDate>) -> Self {
        self.set(column, Value::Date(value))
    }

    pub fn timestamp(self, column: &str, value: Option<DateTime<Utc>>) -> Self {
        self.set(column, Value::Timestamp(value))
    }

    /// Convert a raw value using the column's declared kind
    pub fn raw(self, column: &str, raw: &RawValue) -> Self {
        let Some(kind) = self.dataset.column(column).map(|c| c.kind) else {
            debug_assert!(false, "unknown column {}.{}", self.dataset.table, column);
            return self;
        };
        let value = match kind {
            ColumnKind::Text => Value::Text(value::to_text(raw)),
            ColumnKind::Float => Value::Float(value::to_float(raw)),
            ColumnKind::Int => Value::Int(value::to_int(raw)),
            ColumnKind::Date => Value::Date(value::to_date(raw)),
            ColumnKind::Timestamp => Value::Timestamp(value::to_timestamp(raw)),
        };
        self.set(column, value)
    }

    pub fn build(self) -> Row {
        Row {
            values: self.values,
        }
    }
}
