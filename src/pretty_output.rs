//! Human-readable output for query results.
//!
//! Allocation rows print a one-line summary followed by the indented stack
//! trace; aggregate rows print as a two-column table, group left-aligned
//! and weight right-aligned, with widths sized to the longest value.

use crate::aggregate::AggregateRow;
use crate::query::QueryOutput;
use crate::record::AllocationRecord;

/// Render a whole query result.
pub fn render(output: &QueryOutput) -> String {
    match output {
        QueryOutput::Allocs(rows) => {
            let mut out = String::new();
            for row in rows {
                out.push_str(&format_record(row));
            }
            out
        }
        QueryOutput::Aggregates { rows, .. } => {
            let formatter = PrettyAggregateOutput::new(rows);
            let mut out = String::new();
            for row in rows {
                out.push_str(&formatter.format_row(row));
            }
            out
        }
    }
}

/// One allocation record: summary line plus one indented line per frame.
pub fn format_record(record: &AllocationRecord) -> String {
    let mut out = format!(
        "Alloc#: {}, Allocated Class: {}, Size: {}, Thread: {}\n",
        record.sequence_id, record.allocated_class, record.size_bytes, record.thread_id
    );
    for frame in &record.stack_trace {
        out.push_str(&format!("       {}\n", frame));
    }
    out
}

/// Aggregate-row formatter with column widths fixed up front, so every row
/// of one result lines up.
pub struct PrettyAggregateOutput {
    group_cols: usize,
    weight_cols: usize,
}

impl PrettyAggregateOutput {
    /// Size both columns to the longest value in `rows`, plus two.
    pub fn new(rows: &[AggregateRow]) -> Self {
        let mut group_cols = 0;
        let mut weight_cols = 0;
        for row in rows {
            group_cols = group_cols.max(row.group.to_string().len());
            weight_cols = weight_cols.max(row.weight.to_string().len());
        }
        PrettyAggregateOutput {
            group_cols: group_cols + 2,
            weight_cols: weight_cols + 2,
        }
    }

    /// `group | weight`, group padded right and weight padded left.
    pub fn format_row(&self, row: &AggregateRow) -> String {
        format!(
            "{:<gw$} | {:>ww$}\n",
            row.group.to_string(),
            row.weight,
            gw = self.group_cols,
            ww = self.weight_cols
        )
    }
}
