//! Rule evaluation against parsed documents.
//!
//! Iteration order is fixed and observable in the output: rules in
//! declaration order, then units in document order, then assertions in
//! declaration order, then predicates (`not_matches`, `must_include`,
//! `equals`). Bad paths and bad regexes only cost their own findings.

use crate::models::rule::{Assertion, RemediationKind, Rule};
use crate::models::Finding;
use crate::query::{self, QueryOutcome};
use log::debug;
use regex::Regex;
use serde_json::Value as Json;
use std::borrow::Borrow;

/// Split a dynamic document into units: an array is a list of documents,
/// `Null` is no document, anything else is a single document.
pub fn units_of(document: &Json) -> Vec<&Json> {
    match document {
        Json::Null => Vec::new(),
        Json::Array(docs) => docs.iter().collect(),
        other => vec![other],
    }
}

/// Apply `rules` to a document (see `units_of` for how units are derived).
pub fn apply_rules(document: &Json, rules: &[Rule]) -> Vec<Finding> {
    evaluate_units(&units_of(document), rules)
}

/// Apply `rules` to an explicit list of units.
pub fn evaluate_units<U: Borrow<Json>>(units: &[U], rules: &[Rule]) -> Vec<Finding> {
    let mut findings = Vec::new();
    for rule in rules {
        let kind = rule.remediation_kind();
        let compiled: Vec<CompiledAssertion> = rule
            .assertions
            .iter()
            .filter_map(|a| CompiledAssertion::new(rule, a))
            .collect();
        for unit in units {
            let unit: &Json = unit.borrow();
            if !rule.applies_to(unit) {
                continue;
            }
            for assertion in &compiled {
                assertion.check(rule, kind, unit, &mut findings);
            }
        }
    }
    findings
}

/// An assertion with its regex compiled once per rule.
struct CompiledAssertion<'r> {
    path: &'r str,
    forbidden: Option<Regex>,
    required: Option<&'r str>,
    expected: Option<&'r Json>,
}

impl<'r> CompiledAssertion<'r> {
    fn new(rule: &Rule, assertion: &'r Assertion) -> Option<Self> {
        let Some(path) = assertion.query_path() else {
            debug!("rule {}: assertion without path skipped", rule.id);
            return None;
        };
        let forbidden = assertion
            .not_matches
            .as_deref()
            .and_then(|pat| match Regex::new(pat) {
                Ok(re) => Some(re),
                Err(e) => {
                    debug!("rule {}: invalid not_matches pattern {:?}: {}", rule.id, pat, e);
                    None
                }
            });
        Some(Self {
            path,
            forbidden,
            required: assertion.must_include.as_deref(),
            expected: assertion.equals.as_ref(),
        })
    }

    fn check(&self, rule: &Rule, kind: RemediationKind, unit: &Json, out: &mut Vec<Finding>) {
        let values = match query::query(unit, self.path) {
            QueryOutcome::Matched(values) => values,
            QueryOutcome::Unmatched => return,
            QueryOutcome::Error(detail) => {
                debug!("rule {}: path {:?} not evaluated: {}", rule.id, self.path, detail);
                return;
            }
        };

        if let Some(re) = &self.forbidden {
            let bad = collect(&values, |v| v.as_str().is_some_and(|s| re.is_match(s)));
            if !bad.is_empty() {
                out.push(finding(
                    rule,
                    kind,
                    self.path,
                    format!("Value matched forbidden pattern: {}", re.as_str()),
                    bad,
                ));
            }
        }

        if let Some(req) = self.required {
            let bad = collect(&values, |v| v.as_str().is_some_and(|s| !s.contains(req)));
            if !bad.is_empty() {
                out.push(finding(rule, kind, self.path, format!("Value must include '{}'", req), bad));
            }
        }

        if let Some(want) = self.expected {
            let bad = collect(&values, |v| !query::values_equal(v, want));
            if !bad.is_empty() {
                out.push(finding(rule, kind, self.path, format!("Value must equal {}", want), bad));
            }
        }
    }
}

fn collect(values: &[Json], violates: impl Fn(&Json) -> bool) -> Vec<Json> {
    values.iter().filter(|v| violates(v)).cloned().collect()
}

fn finding(rule: &Rule, kind: RemediationKind, path: &str, message: String, values: Vec<Json>) -> Finding {
    Finding {
        rule_id: rule.id.clone(),
        severity: rule.severity,
        path: path.to_string(),
        message,
        values,
        remediation: rule.remediation.clone(),
        remediation_kind: kind,
        file: None,
        line: None,
        snippet: None,
    }
}
