//! Column filters: `operator:value` specs compiled into row predicates.
//!
//! A spec is tied to one column; the column's declared kind decides whether
//! ordering operators compare as integers or lexicographically. Substring
//! and regex operators always test the stringified value, whatever the
//! kind. Regex operators use full-match semantics. Multiple filters narrow
//! sequentially, so the result is their conjunction.

use crate::table::{compile_full_match, ColumnKind, QueryError, Result, RowAdapter};
use regex::Regex;
use std::cmp::Ordering;

/// Filter operator, as written by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    ReMatch,
    NotReMatch,
    Contains,
    NotContains,
}

/// One parsed filter: column, operator, right-hand side text.
#[derive(Debug, Clone)]
pub struct FilterSpec {
    pub column: String,
    pub op: FilterOp,
    pub rhs: String,
}

impl FilterSpec {
    /// Parse the value side of a per-column filter flag: `prefix:value` or
    /// a bare value (implicit equals). A value containing `:` whose head is
    /// not a known prefix is rejected rather than guessed at; spell such
    /// values `eq:...`.
    pub fn parse(column: &str, value: &str) -> Result<Self> {
        let (op, rhs) = match value.split_once(':') {
            None => (FilterOp::Eq, value),
            Some((prefix, rest)) => match op_for_prefix(prefix) {
                Some(op) => (op, rest),
                None => {
                    return Err(QueryError::SpecSyntax {
                        spec: format!("{}:{}", column, value),
                        reason: format!("unknown operator prefix '{}'", prefix),
                    })
                }
            },
        };
        Ok(FilterSpec {
            column: column.to_string(),
            op,
            rhs: rhs.to_string(),
        })
    }
}

fn op_for_prefix(prefix: &str) -> Option<FilterOp> {
    match prefix {
        "eq" => Some(FilterOp::Eq),
        "ne" | "neq" => Some(FilterOp::Ne),
        "lt" | "l" => Some(FilterOp::Lt),
        "le" | "leq" => Some(FilterOp::Le),
        "gt" | "g" => Some(FilterOp::Gt),
        "ge" | "geq" => Some(FilterOp::Ge),
        "re" => Some(FilterOp::ReMatch),
        "nre" => Some(FilterOp::NotReMatch),
        "contains" | "ss" => Some(FilterOp::Contains),
        "notcontains" | "nss" => Some(FilterOp::NotContains),
        _ => None,
    }
}

/// Ordering comparisons shared by the six relational operators.
#[derive(Debug, Clone, Copy)]
enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    fn from_filter(op: FilterOp) -> Option<CmpOp> {
        match op {
            FilterOp::Eq => Some(CmpOp::Eq),
            FilterOp::Ne => Some(CmpOp::Ne),
            FilterOp::Lt => Some(CmpOp::Lt),
            FilterOp::Le => Some(CmpOp::Le),
            FilterOp::Gt => Some(CmpOp::Gt),
            FilterOp::Ge => Some(CmpOp::Ge),
            _ => None,
        }
    }

    fn accepts(self, ord: Ordering) -> bool {
        match self {
            CmpOp::Eq => ord == Ordering::Equal,
            CmpOp::Ne => ord != Ordering::Equal,
            CmpOp::Lt => ord == Ordering::Less,
            CmpOp::Le => ord != Ordering::Greater,
            CmpOp::Gt => ord == Ordering::Greater,
            CmpOp::Ge => ord != Ordering::Less,
        }
    }
}

enum CompiledTest {
    OrderInt { op: CmpOp, rhs: i64 },
    OrderText { op: CmpOp, rhs: String },
    Pattern { re: Regex, negated: bool },
    Substring { rhs: String, negated: bool },
}

/// A filter bound to an adapter's column, with the right-hand side already
/// parsed or compiled. Construction surfaces every way a spec string can be
/// invalid: unknown column, non-integer rhs for a numeric comparison,
/// malformed regex.
pub struct CompiledFilter {
    column: String,
    test: CompiledTest,
}

impl CompiledFilter {
    pub fn compile<T, A: RowAdapter<T>>(spec: &FilterSpec, adapter: &A) -> Result<Self> {
        let kind = adapter.kind_of(&spec.column)?;
        let test = match CmpOp::from_filter(spec.op) {
            Some(op) => match kind {
                ColumnKind::Numeric => CompiledTest::OrderInt {
                    op,
                    rhs: spec.rhs.parse().map_err(|_| QueryError::ValueFormat {
                        column: spec.column.clone(),
                        value: spec.rhs.clone(),
                    })?,
                },
                ColumnKind::Text => CompiledTest::OrderText {
                    op,
                    rhs: spec.rhs.clone(),
                },
            },
            None => match spec.op {
                FilterOp::ReMatch => CompiledTest::Pattern {
                    re: compile_full_match(&spec.rhs)?,
                    negated: false,
                },
                FilterOp::NotReMatch => CompiledTest::Pattern {
                    re: compile_full_match(&spec.rhs)?,
                    negated: true,
                },
                FilterOp::Contains => CompiledTest::Substring {
                    rhs: spec.rhs.clone(),
                    negated: false,
                },
                FilterOp::NotContains => CompiledTest::Substring {
                    rhs: spec.rhs.clone(),
                    negated: true,
                },
                // from_filter returned None, so op is not relational.
                FilterOp::Eq
                | FilterOp::Ne
                | FilterOp::Lt
                | FilterOp::Le
                | FilterOp::Gt
                | FilterOp::Ge => unreachable!("relational op handled above"),
            },
        };
        Ok(CompiledFilter {
            column: spec.column.clone(),
            test,
        })
    }

    /// Whether `row` passes. Fallible: a numeric comparison over a value
    /// that only stringifies to a non-integer reports `ValueFormat`.
    pub fn matches<T, A: RowAdapter<T>>(&self, adapter: &A, row: &T) -> Result<bool> {
        let value = adapter.get(row, &self.column);
        Ok(match &self.test {
            CompiledTest::OrderInt { op, rhs } => {
                let lhs = value.as_i64(&self.column)?;
                op.accepts(lhs.cmp(rhs))
            }
            CompiledTest::OrderText { op, rhs } => {
                op.accepts(value.to_string().as_str().cmp(rhs.as_str()))
            }
            CompiledTest::Pattern { re, negated } => re.is_match(&value.to_string()) != *negated,
            CompiledTest::Substring { rhs, negated } => {
                value.to_string().contains(rhs.as_str()) != *negated
            }
        })
    }
}

/// Keep the rows passing every filter, preserving order.
pub fn apply_filters<T, A: RowAdapter<T>>(
    rows: Vec<T>,
    adapter: &A,
    filters: &[CompiledFilter],
) -> Result<Vec<T>> {
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        let mut keep = true;
        for filter in filters {
            if !filter.matches(adapter, &row)? {
                keep = false;
                break;
            }
        }
        if keep {
            out.push(row);
        }
    }
    Ok(out)
}
