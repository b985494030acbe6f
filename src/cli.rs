//! CLI argument parsing for Desglose

use crate::filter::FilterSpec;
use crate::query::QueryParams;
use crate::sort::SortSpec;
use crate::table::Result;
use crate::transform::TraceTransform;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for query results
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Pretty,
    /// CSV format for spreadsheet analysis
    Csv,
    /// JSON format for machine parsing
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "desglose")]
#[command(version)]
#[command(about = "Analyzer for Android allocation-tracker dumps", long_about = None)]
pub struct Cli {
    /// Enable debug logging to stderr
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Work with allocation-tracker dumps
    Allocs {
        #[command(subcommand)]
        action: AllocsCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum AllocsCommand {
    /// Decode a dump file and query the allocation records
    Parse(ParseArgs),
}

#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Path to the binary allocation dump
    pub file: PathBuf,

    /// Sort columns, comma separated; prefix a column with - for descending
    /// (e.g. --sort -size,allocatedClass)
    #[arg(long, value_name = "COLS", allow_hyphen_values = true)]
    pub sort: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value = "pretty")]
    pub format: OutputFormat,

    /// Group rows by this column and aggregate the weight column
    #[arg(long = "groupBy", value_name = "COLUMN")]
    pub group_by: Option<String>,

    /// Aggregate column when grouping: size sums, id counts, any other
    /// column counts distinct values
    #[arg(long, value_name = "COLUMN", default_value = "size")]
    pub weight: String,

    /// Explode each record into one row per stack frame
    #[arg(long = "splitByTrace")]
    pub split_by_trace: bool,

    /// Stack-trace transform, applied in order before any other stage
    /// (e.g. --traceTransform prune:underPackage:java.util); repeatable
    #[arg(long = "traceTransform", value_name = "SPEC")]
    pub trace_transform: Vec<String>,

    /// Filter on the id column (operator:value, or a bare value for equals)
    #[arg(long, value_name = "FILTER")]
    pub id: Vec<String>,

    /// Filter on the allocatedClass column
    #[arg(long = "allocatedClass", value_name = "FILTER")]
    pub allocated_class: Vec<String>,

    /// Filter on the size column
    #[arg(long, value_name = "FILTER")]
    pub size: Vec<String>,

    /// Filter on the thread column
    #[arg(long, value_name = "FILTER")]
    pub thread: Vec<String>,

    /// Filter on the stackTrace column
    #[arg(long = "stackTrace", value_name = "FILTER")]
    pub stack_trace: Vec<String>,

    /// Filter on the allocator column
    #[arg(long, value_name = "FILTER")]
    pub allocator: Vec<String>,
}

impl ParseArgs {
    /// Assemble the query pipeline parameters, parsing every spec the
    /// operator wrote. All syntax errors surface here, before the dump is
    /// even opened.
    pub fn query_params(&self) -> Result<QueryParams> {
        let mut transforms = Vec::with_capacity(self.trace_transform.len());
        for spec in &self.trace_transform {
            transforms.push(TraceTransform::parse(spec)?);
        }

        let mut filters = Vec::new();
        for (column, values) in [
            ("id", &self.id),
            ("allocatedClass", &self.allocated_class),
            ("size", &self.size),
            ("thread", &self.thread),
            ("stackTrace", &self.stack_trace),
            ("allocator", &self.allocator),
        ] {
            for value in values {
                filters.push(FilterSpec::parse(column, value)?);
            }
        }

        // Grouped output has no inherent order; default to heaviest group
        // first unless the operator asked for something else.
        let sort = match &self.sort {
            Some(spec) => SortSpec::parse_list(spec)?,
            None if self.group_by.is_some() => SortSpec::parse_list("-weight,group")?,
            None => Vec::new(),
        };

        Ok(QueryParams {
            transforms,
            split_by_trace: self.split_by_trace,
            filters,
            sort,
            group_by: self.group_by.clone(),
            weight: self.weight.clone(),
        })
    }
}
