//! Group-by and aggregation over adapter columns.
//!
//! Rows group by the canonical string form of the grouping column, so
//! numeric and text columns both group by exact display equality. The
//! first-seen typed value is kept alongside the key, which lets the output
//! `group` column stay genuinely numeric for numeric sources instead of
//! degrading to text.

use crate::table::{ColumnKind, Result, RowAdapter, Value};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};

/// How the weight column reduces within each group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationKind {
    /// Number of rows in the group.
    Count,
    /// Sum of the weight column as integers.
    Sum,
    /// Number of distinct stringified weight values.
    Unique,
}

impl AggregationKind {
    /// Reduction used for a given weight column: `size` sums, `id` counts,
    /// anything else counts distinct values.
    pub fn for_weight(weight_column: &str) -> AggregationKind {
        match weight_column {
            "size" => AggregationKind::Sum,
            "id" => AggregationKind::Count,
            _ => AggregationKind::Unique,
        }
    }
}

/// One output row of the group/aggregate stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateRow {
    pub weight: i64,
    pub group: Value,
}

/// Adapter for aggregate rows: columns `weight` and `group`, the latter
/// mirroring the source grouping column's declared kind.
#[derive(Debug, Clone, Copy)]
pub struct AggregateColumns {
    pub group_kind: ColumnKind,
}

impl RowAdapter<AggregateRow> for AggregateColumns {
    fn columns(&self) -> &'static [&'static str] {
        &["weight", "group"]
    }

    fn kinds(&self) -> &'static [ColumnKind] {
        match self.group_kind {
            ColumnKind::Numeric => &[ColumnKind::Numeric, ColumnKind::Numeric],
            ColumnKind::Text => &[ColumnKind::Numeric, ColumnKind::Text],
        }
    }

    fn get(&self, row: &AggregateRow, column: &str) -> Value {
        match column {
            "weight" => Value::Int(row.weight),
            "group" => row.group.clone(),
            other => unreachable!("column '{}' was not validated against AggregateColumns", other),
        }
    }
}

struct GroupAccum {
    group: Value,
    rows: i64,
    sum: i64,
    distinct: HashSet<String>,
}

impl GroupAccum {
    fn new(group: Value) -> Self {
        GroupAccum {
            group,
            rows: 0,
            sum: 0,
            distinct: HashSet::new(),
        }
    }
}

/// Partition `rows` by the stringified `group_by` value and reduce
/// `weight_column` per group.
///
/// Output arrives in first-encounter order; callers wanting a particular
/// order sort the result explicitly. Only `Sum` parses weights, so a text
/// weight column is fine under `Count` and `Unique`.
pub fn group_and_aggregate<T, A: RowAdapter<T>>(
    rows: &[T],
    adapter: &A,
    group_by: &str,
    weight_column: &str,
    kind: AggregationKind,
) -> Result<Vec<AggregateRow>> {
    adapter.kind_of(group_by)?;
    adapter.kind_of(weight_column)?;

    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, GroupAccum> = HashMap::new();

    for row in rows {
        let group_value = adapter.get(row, group_by);
        let accum = match groups.entry(group_value.to_string()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                order.push(entry.key().clone());
                entry.insert(GroupAccum::new(group_value))
            }
        };
        accum.rows += 1;
        match kind {
            AggregationKind::Count => {}
            AggregationKind::Sum => {
                accum.sum += adapter.get(row, weight_column).as_i64(weight_column)?;
            }
            AggregationKind::Unique => {
                accum
                    .distinct
                    .insert(adapter.get(row, weight_column).to_string());
            }
        }
    }

    let mut out = Vec::with_capacity(order.len());
    for key in order {
        if let Some(accum) = groups.remove(&key) {
            let weight = match kind {
                AggregationKind::Count => accum.rows,
                AggregationKind::Sum => accum.sum,
                AggregationKind::Unique => accum.distinct.len() as i64,
            };
            out.push(AggregateRow {
                weight,
                group: accum.group,
            });
        }
    }
    tracing::debug!("aggregated {} rows into {} groups", rows.len(), out.len());
    Ok(out)
}
