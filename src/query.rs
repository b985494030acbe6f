//! The end-to-end query pipeline over decoded allocation records.
//!
//! Stage order is fixed: trace transforms, then the optional frame split,
//! then filters, then optional group/aggregate, then sort. Every spec is
//! validated (and every rhs parsed or regex compiled) before the first row
//! is touched, so a bad spec can never leave a half-processed table.

use crate::aggregate::{self, AggregateColumns, AggregateRow, AggregationKind};
use crate::filter::{apply_filters, CompiledFilter, FilterSpec};
use crate::record::AllocationRecord;
use crate::sort::{sort_rows, SortSpec};
use crate::table::{AllocColumns, ColumnKind, Result, RowAdapter};
use crate::transform::{rewrite_traces, split_by_trace, TraceTransform};

/// One query run's worth of parameters, assembled by the CLI layer with
/// all syntax already parsed. `weight` is only consulted when `group_by`
/// is set.
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    /// Trace transforms, applied left to right before any other stage.
    pub transforms: Vec<TraceTransform>,
    /// Explode each record into one row per remaining frame.
    pub split_by_trace: bool,
    /// Filters, conjoined in declaration order.
    pub filters: Vec<FilterSpec>,
    /// Sort keys over the output table (aggregate columns when grouping).
    pub sort: Vec<SortSpec>,
    /// Group rows by this column and aggregate the weight column.
    pub group_by: Option<String>,
    /// Weight column for aggregation; its name picks the reduction.
    pub weight: String,
}

/// Result of a query run: the ordered rows plus their declared columns,
/// which is all a formatter needs.
#[derive(Debug)]
pub enum QueryOutput {
    Allocs(Vec<AllocationRecord>),
    Aggregates {
        rows: Vec<AggregateRow>,
        group_kind: ColumnKind,
    },
}

impl QueryOutput {
    /// Declared column names of the output table.
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            QueryOutput::Allocs(_) => AllocColumns.columns(),
            QueryOutput::Aggregates { group_kind, .. } => AggregateColumns {
                group_kind: *group_kind,
            }
            .columns(),
        }
    }

    /// Declared column kinds, parallel to [`QueryOutput::columns`].
    pub fn kinds(&self) -> &'static [ColumnKind] {
        match self {
            QueryOutput::Allocs(_) => AllocColumns.kinds(),
            QueryOutput::Aggregates { group_kind, .. } => AggregateColumns {
                group_kind: *group_kind,
            }
            .kinds(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            QueryOutput::Allocs(rows) => rows.len(),
            QueryOutput::Aggregates { rows, .. } => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Run the pipeline over already-decoded records.
pub fn run_query(records: Vec<AllocationRecord>, params: &QueryParams) -> Result<QueryOutput> {
    let alloc = AllocColumns;

    // Compile and validate every spec up front.
    let mut filters = Vec::with_capacity(params.filters.len());
    for spec in &params.filters {
        filters.push(CompiledFilter::compile(spec, &alloc)?);
    }
    let grouping = match &params.group_by {
        Some(column) => {
            let group_kind = alloc.kind_of(column)?;
            alloc.kind_of(&params.weight)?;
            let agg_adapter = AggregateColumns { group_kind };
            for spec in &params.sort {
                agg_adapter.kind_of(&spec.column)?;
            }
            Some((column.clone(), group_kind, agg_adapter))
        }
        None => {
            for spec in &params.sort {
                alloc.kind_of(&spec.column)?;
            }
            None
        }
    };

    let mut rows = if params.transforms.is_empty() {
        records
    } else {
        rewrite_traces(&records, &params.transforms)
    };
    if params.split_by_trace {
        rows = split_by_trace(&rows);
        tracing::debug!("split produced {} single-frame rows", rows.len());
    }
    rows = apply_filters(rows, &alloc, &filters)?;
    tracing::debug!("{} rows after {} filters", rows.len(), filters.len());

    match grouping {
        Some((column, group_kind, agg_adapter)) => {
            let kind = AggregationKind::for_weight(&params.weight);
            let groups =
                aggregate::group_and_aggregate(&rows, &alloc, &column, &params.weight, kind)?;
            let groups = sort_rows(groups, &agg_adapter, &params.sort)?;
            Ok(QueryOutput::Aggregates {
                rows: groups,
                group_kind,
            })
        }
        None => {
            let rows = sort_rows(rows, &alloc, &params.sort)?;
            Ok(QueryOutput::Allocs(rows))
        }
    }
}
