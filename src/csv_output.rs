//! CSV output format for query results.
//!
//! The header row is the adapter's declared column list; every cell is the
//! canonical stringified value, quoted when it contains a comma, quote or
//! newline.

use crate::aggregate::AggregateColumns;
use crate::query::QueryOutput;
use crate::table::{AllocColumns, RowAdapter};

/// Render a whole query result as CSV.
pub fn render(output: &QueryOutput) -> String {
    match output {
        QueryOutput::Allocs(rows) => to_csv(rows, &AllocColumns),
        QueryOutput::Aggregates { rows, group_kind } => to_csv(
            rows,
            &AggregateColumns {
                group_kind: *group_kind,
            },
        ),
    }
}

/// Header plus one line per row, over the adapter's declared columns.
pub fn to_csv<T, A: RowAdapter<T>>(rows: &[T], adapter: &A) -> String {
    let mut output = String::new();

    output.push_str(&adapter.columns().join(","));
    output.push('\n');

    for row in rows {
        let fields: Vec<String> = adapter
            .columns()
            .iter()
            .map(|column| escape_field(&adapter.get(row, column).to_string()))
            .collect();
        output.push_str(&fields.join(","));
        output.push('\n');
    }

    output
}

/// Escape CSV field (handle commas, quotes, newlines)
fn escape_field(field: &str) -> String {
    // If field contains comma, quote, or newline, wrap in quotes and escape quotes
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
