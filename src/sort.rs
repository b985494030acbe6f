//! Multi-key, directional, stable sorting over adapter columns.
//!
//! No ordering is imposed when no spec is given; what the caller passed in
//! is what comes back. Deterministic aggregate output therefore requires an
//! explicit sort, which the CLI layer injects when the operator gave none.

use crate::table::{QueryError, Result, RowAdapter};
use std::cmp::Ordering;

/// One sort key: column plus direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub column: String,
    pub descending: bool,
}

impl SortSpec {
    /// Parse a comma-separated sort list; a `-` prefix sorts that key
    /// descending.
    pub fn parse_list(spec: &str) -> Result<Vec<SortSpec>> {
        let mut out = Vec::new();
        for item in spec.split(',') {
            if item.is_empty() || item == "-" {
                return Err(QueryError::SpecSyntax {
                    spec: spec.to_string(),
                    reason: "empty sort column".to_string(),
                });
            }
            match item.strip_prefix('-') {
                Some(column) => out.push(SortSpec {
                    column: column.to_string(),
                    descending: true,
                }),
                None => out.push(SortSpec {
                    column: item.to_string(),
                    descending: false,
                }),
            }
        }
        Ok(out)
    }
}

/// Stable multi-key sort; the first spec is the primary key. Column names
/// are validated up front, so rows are only touched once the whole spec
/// list is known good.
pub fn sort_rows<T, A: RowAdapter<T>>(
    mut rows: Vec<T>,
    adapter: &A,
    specs: &[SortSpec],
) -> Result<Vec<T>> {
    for spec in specs {
        adapter.kind_of(&spec.column)?;
    }
    if specs.is_empty() {
        return Ok(rows);
    }
    rows.sort_by(|a, b| {
        for spec in specs {
            let mut ord = adapter
                .get(a, &spec.column)
                .cmp(&adapter.get(b, &spec.column));
            if spec.descending {
                ord = ord.reverse();
            }
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
    Ok(rows)
}
