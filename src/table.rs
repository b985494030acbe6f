//! Typed row/column access for the query engines.
//!
//! Every table-producing stage exposes its rows through a [`RowAdapter`]: an
//! ordered list of column names, a parallel list of kinds, and a total `get`
//! accessor. Filter, sort and group specs are validated against the adapter
//! once, before any row is touched, so bad column names surface as
//! [`QueryError::UnknownColumn`] instead of failing mid-pipeline.

use crate::record::AllocationRecord;
use std::fmt;
use thiserror::Error;

/// Errors raised while compiling or running query specs. Shared by the
/// filter, sort, aggregate, predicate and transform engines.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("unknown column: {column}")]
    UnknownColumn { column: String },

    #[error("bad spec '{spec}': {reason}")]
    SpecSyntax { spec: String, reason: String },

    #[error("bad regex '{pattern}': {source}")]
    BadRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("column {column} expects a number, got '{value}'")]
    ValueFormat { column: String, value: String },
}

pub type Result<T> = std::result::Result<T, QueryError>;

/// Compile a user pattern with full-match semantics: the whole candidate
/// string must match, not just a substring of it.
pub(crate) fn compile_full_match(pattern: &str) -> Result<regex::Regex> {
    regex::Regex::new(&format!("^(?:{})$", pattern)).map_err(|source| QueryError::BadRegex {
        pattern: pattern.to_string(),
        source,
    })
}

/// Declared kind of a column. Selects integer vs lexicographic comparison
/// in the filter and sort engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Numeric,
    Text,
}

/// One cell value handed out by an adapter.
///
/// The derived ordering compares integers numerically and text
/// lexicographically; a column always yields one variant, so the cross-kind
/// branch of the derive never decides a real comparison.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Value {
    Int(i64),
    Text(String),
}

impl Value {
    /// Integer view of the value; `Text` is parsed. `column` only labels
    /// the error.
    pub fn as_i64(&self, column: &str) -> Result<i64> {
        match self {
            Value::Int(n) => Ok(*n),
            Value::Text(s) => s.parse().map_err(|_| QueryError::ValueFormat {
                column: column.to_string(),
                value: s.clone(),
            }),
        }
    }
}

impl fmt::Display for Value {
    /// Canonical string form: the one grouping keys, substring tests and
    /// regex matches all see.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Ordered, typed column access over one row type.
pub trait RowAdapter<T> {
    /// Declared column names, in display order.
    fn columns(&self) -> &'static [&'static str];

    /// Column kinds, parallel to [`RowAdapter::columns`].
    fn kinds(&self) -> &'static [ColumnKind];

    /// Value of `column` for `row`. Total over the declared columns;
    /// callers validate names via [`RowAdapter::kind_of`] first.
    fn get(&self, row: &T, column: &str) -> Value;

    /// Kind of `column`, or `UnknownColumn` for spec validation.
    fn kind_of(&self, column: &str) -> Result<ColumnKind> {
        let idx = self
            .columns()
            .iter()
            .position(|c| *c == column)
            .ok_or_else(|| QueryError::UnknownColumn {
                column: column.to_string(),
            })?;
        Ok(self.kinds()[idx])
    }
}

/// Column view over decoded allocation records.
///
/// `stackTrace` stringifies the whole trace (`[frame1, frame2]`) and
/// `allocator` the innermost frame (empty string for an empty trace), so
/// both are filterable text like any other column.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllocColumns;

impl RowAdapter<AllocationRecord> for AllocColumns {
    fn columns(&self) -> &'static [&'static str] {
        &["id", "allocatedClass", "size", "thread", "stackTrace", "allocator"]
    }

    fn kinds(&self) -> &'static [ColumnKind] {
        &[
            ColumnKind::Numeric,
            ColumnKind::Text,
            ColumnKind::Numeric,
            ColumnKind::Numeric,
            ColumnKind::Text,
            ColumnKind::Text,
        ]
    }

    fn get(&self, row: &AllocationRecord, column: &str) -> Value {
        match column {
            "id" => Value::Int(i64::from(row.sequence_id)),
            "allocatedClass" => Value::Text(row.allocated_class.clone()),
            "size" => Value::Int(i64::from(row.size_bytes)),
            "thread" => Value::Int(i64::from(row.thread_id)),
            "stackTrace" => Value::Text(row.trace_string()),
            "allocator" => {
                Value::Text(row.allocator().map(|f| f.to_string()).unwrap_or_default())
            }
            other => unreachable!("column '{}' was not validated against AllocColumns", other),
        }
    }
}
