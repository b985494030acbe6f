//! Stack-trace rewriting: prune/keep operations and the split stage.
//!
//! Traces are ordered innermost-first, so "above" means toward the
//! allocation site (lower indices) and "below" toward the outermost caller
//! (higher indices). Every operation returns a new trace; records are
//! rebuilt via [`AllocationRecord::with_trace`], never edited.

use crate::predicate::FramePredicate;
use crate::record::{AllocationRecord, StackFrame};
use crate::table::{QueryError, Result};

/// One compiled trace transform, applied per record.
#[derive(Debug, Clone)]
pub enum TraceTransform {
    /// Drop every frame matching the predicate.
    Prune(FramePredicate),
    /// Keep only frames matching the predicate.
    Keep(FramePredicate),
    /// Keep the first (innermost) match and everything below it; empty
    /// when nothing matches.
    PruneAbove(FramePredicate),
    /// Keep the last (outermost) match and everything above it; empty when
    /// nothing matches.
    PruneBelow(FramePredicate),
    /// Keep everything strictly above the first match; unchanged when
    /// nothing matches.
    KeepAbove(FramePredicate),
    /// Keep everything strictly below the last match; empty when nothing
    /// matches.
    KeepBelow(FramePredicate),
    /// Collapse each run of consecutive frames sharing class+method to its
    /// innermost frame.
    PruneRecursion,
}

impl TraceTransform {
    /// Parse `name` or `name:predicate`. `pruneRecursion` takes no
    /// predicate; every other transform requires one.
    pub fn parse(spec: &str) -> Result<Self> {
        let (name, arg) = match spec.split_once(':') {
            Some((name, arg)) => (name, Some(arg)),
            None => (spec, None),
        };

        if name == "pruneRecursion" {
            return match arg {
                None => Ok(TraceTransform::PruneRecursion),
                Some(_) => Err(QueryError::SpecSyntax {
                    spec: spec.to_string(),
                    reason: "pruneRecursion takes no predicate".to_string(),
                }),
            };
        }

        let arg = match arg {
            Some(arg) => arg,
            None => {
                return Err(QueryError::SpecSyntax {
                    spec: spec.to_string(),
                    reason: format!("transform '{}' requires a predicate argument", name),
                })
            }
        };
        let pred = FramePredicate::parse(arg)?;
        match name {
            "prune" => Ok(TraceTransform::Prune(pred)),
            "keep" => Ok(TraceTransform::Keep(pred)),
            "pruneAbove" => Ok(TraceTransform::PruneAbove(pred)),
            "pruneBelow" => Ok(TraceTransform::PruneBelow(pred)),
            "keepAbove" => Ok(TraceTransform::KeepAbove(pred)),
            "keepBelow" => Ok(TraceTransform::KeepBelow(pred)),
            other => Err(QueryError::SpecSyntax {
                spec: spec.to_string(),
                reason: format!("unknown trace transform '{}'", other),
            }),
        }
    }

    /// Apply to one trace, returning the rewritten copy.
    pub fn apply(&self, trace: &[StackFrame]) -> Vec<StackFrame> {
        match self {
            TraceTransform::Prune(pred) => {
                trace.iter().filter(|f| !pred.matches(f)).cloned().collect()
            }
            TraceTransform::Keep(pred) => {
                trace.iter().filter(|f| pred.matches(f)).cloned().collect()
            }
            TraceTransform::PruneAbove(pred) => match trace.iter().position(|f| pred.matches(f)) {
                Some(first) => trace[first..].to_vec(),
                None => Vec::new(),
            },
            TraceTransform::PruneBelow(pred) => match trace.iter().rposition(|f| pred.matches(f)) {
                Some(last) => trace[..=last].to_vec(),
                None => Vec::new(),
            },
            TraceTransform::KeepAbove(pred) => match trace.iter().position(|f| pred.matches(f)) {
                Some(first) => trace[..first].to_vec(),
                None => trace.to_vec(),
            },
            TraceTransform::KeepBelow(pred) => match trace.iter().rposition(|f| pred.matches(f)) {
                Some(last) => trace[last + 1..].to_vec(),
                None => Vec::new(),
            },
            TraceTransform::PruneRecursion => {
                let mut out = trace.to_vec();
                out.dedup_by(|next, kept| {
                    next.class_name == kept.class_name && next.method_name == kept.method_name
                });
                out
            }
        }
    }
}

/// Apply `transforms` left to right to every record, producing new records.
pub fn rewrite_traces(
    records: &[AllocationRecord],
    transforms: &[TraceTransform],
) -> Vec<AllocationRecord> {
    records
        .iter()
        .map(|rec| {
            let mut trace = rec.stack_trace.clone();
            for transform in transforms {
                trace = transform.apply(&trace);
            }
            rec.with_trace(trace)
        })
        .collect()
}

/// Explode each record into one record per remaining frame, each with a
/// singleton trace and all other fields preserved. Records whose trace has
/// emptied contribute no rows.
pub fn split_by_trace(records: &[AllocationRecord]) -> Vec<AllocationRecord> {
    let mut out = Vec::new();
    for rec in records {
        for frame in &rec.stack_trace {
            out.push(rec.with_trace(vec![frame.clone()]));
        }
    }
    out
}
