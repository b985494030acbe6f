//! Textual predicate language over single stack frames.
//!
//! Specs like `underPackage:com.example` or `siteRe:.*<init>` compile to a
//! [`FramePredicate`]; comma-separated terms within one spec conjoin. The
//! trace transforms in `transform` take these as arguments, which keeps the
//! predicate language independent of any row representation.

use crate::record::StackFrame;
use crate::table::{compile_full_match, QueryError, Result};
use regex::Regex;

/// Compiled predicate over one stack frame.
#[derive(Debug, Clone)]
pub enum FramePredicate {
    /// The stringified frame contains the text.
    Contains(String),
    /// Class lives under the package, at any depth.
    UnderPackage(String),
    /// Class is a direct member of the package (no sub-package).
    InPackage(String),
    ClassContains(String),
    ClassEq(String),
    ClassRe(Regex),
    MethodContains(String),
    MethodEq(String),
    MethodRe(Regex),
    /// `site` is `class.method`.
    SiteContains(String),
    SiteEq(String),
    SiteRe(Regex),
    /// Conjunction of all inner predicates.
    All(Vec<FramePredicate>),
}

impl FramePredicate {
    /// Parse a predicate spec: comma-separated terms, each `operator:arg`
    /// or bare text (frame-contains).
    pub fn parse(spec: &str) -> Result<Self> {
        let mut terms = Vec::new();
        for term in spec.split(',') {
            terms.push(Self::parse_term(spec, term)?);
        }
        if terms.len() == 1 {
            Ok(terms.remove(0))
        } else {
            Ok(FramePredicate::All(terms))
        }
    }

    fn parse_term(spec: &str, term: &str) -> Result<Self> {
        if term.is_empty() {
            return Err(QueryError::SpecSyntax {
                spec: spec.to_string(),
                reason: "empty predicate term".to_string(),
            });
        }
        let (op, arg) = match term.split_once(':') {
            None => return Ok(FramePredicate::Contains(term.to_string())),
            Some(pair) => pair,
        };
        match op {
            "contains" => Ok(FramePredicate::Contains(arg.to_string())),
            "underPackage" => Ok(FramePredicate::UnderPackage(arg.to_string())),
            "inPackage" => Ok(FramePredicate::InPackage(arg.to_string())),
            "class" => Ok(FramePredicate::ClassContains(arg.to_string())),
            "classEq" => Ok(FramePredicate::ClassEq(arg.to_string())),
            "classRe" => Ok(FramePredicate::ClassRe(compile_full_match(arg)?)),
            "method" => Ok(FramePredicate::MethodContains(arg.to_string())),
            "methodEq" => Ok(FramePredicate::MethodEq(arg.to_string())),
            "methodRe" => Ok(FramePredicate::MethodRe(compile_full_match(arg)?)),
            "site" => Ok(FramePredicate::SiteContains(arg.to_string())),
            "siteEq" => Ok(FramePredicate::SiteEq(arg.to_string())),
            "siteRe" => Ok(FramePredicate::SiteRe(compile_full_match(arg)?)),
            other => Err(QueryError::SpecSyntax {
                spec: spec.to_string(),
                reason: format!("unknown predicate operator '{}'", other),
            }),
        }
    }

    /// Evaluate against one frame.
    pub fn matches(&self, frame: &StackFrame) -> bool {
        match self {
            FramePredicate::Contains(text) => frame.to_string().contains(text.as_str()),
            FramePredicate::UnderPackage(pkg) => package_rest(&frame.class_name, pkg).is_some(),
            FramePredicate::InPackage(pkg) => {
                package_rest(&frame.class_name, pkg).is_some_and(|rest| !rest.contains('.'))
            }
            FramePredicate::ClassContains(s) => frame.class_name.contains(s.as_str()),
            FramePredicate::ClassEq(s) => frame.class_name == *s,
            FramePredicate::ClassRe(re) => re.is_match(&frame.class_name),
            FramePredicate::MethodContains(s) => frame.method_name.contains(s.as_str()),
            FramePredicate::MethodEq(s) => frame.method_name == *s,
            FramePredicate::MethodRe(re) => re.is_match(&frame.method_name),
            FramePredicate::SiteContains(s) => frame.site().contains(s.as_str()),
            FramePredicate::SiteEq(s) => frame.site() == *s,
            FramePredicate::SiteRe(re) => re.is_match(&frame.site()),
            FramePredicate::All(preds) => preds.iter().all(|p| p.matches(frame)),
        }
    }
}

/// The part of `class_name` after `package.`, or `None` when the class is
/// not under that package.
fn package_rest<'a>(class_name: &'a str, package: &str) -> Option<&'a str> {
    class_name.strip_prefix(package)?.strip_prefix('.')
}
