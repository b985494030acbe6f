//! Desglose - Android allocation-tracker dump analyzer
//!
//! This library provides the core functionality for decoding binary
//! allocation-tracker dumps and slicing the decoded records: filtering by
//! column predicates, multi-key sorting, grouping with aggregation, and
//! stack-trace rewriting via a small frame-predicate language.

pub mod aggregate;
pub mod cli;
pub mod csv_output;
pub mod dump;
pub mod filter;
pub mod json_output;
pub mod predicate;
pub mod pretty_output;
pub mod query;
pub mod record;
pub mod sort;
pub mod table;
pub mod transform;
