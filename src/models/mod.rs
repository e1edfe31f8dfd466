//! Shared data models for findings, suggestions, and validation output.

pub mod rule;

use crate::locate::Location;
use rule::RemediationKind;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
/// Rule severity as declared by the policy author.
pub enum Severity {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
/// A single policy violation.
///
/// `values` is never empty. Location fields are filled in after evaluation
/// and never change the evaluation fields.
pub struct Finding {
    pub rule_id: String,
    pub severity: Severity,
    pub path: String,
    pub message: String,
    pub values: Vec<Json>,
    pub remediation: Option<String>,
    /// Fix family of the owning rule, classified once per rule.
    #[serde(default)]
    pub remediation_kind: RemediationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

impl Finding {
    /// Attach the owning file and a resolved location.
    pub fn with_location(mut self, file: &str, location: Location) -> Self {
        self.file = Some(file.to_string());
        self.line = location.line;
        self.snippet = location.snippet;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// A pre-rendered text edit for one file.
pub struct Suggestion {
    pub title: String,
    pub rationale: String,
    /// Full replacement content for the file.
    pub patched_text: String,
    /// Unified diff of original vs. patched text.
    pub diff: String,
    /// Between 0 and 1.
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// A file that could not be read or parsed.
pub struct FileError {
    pub file: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
/// Finding counts per severity, plus the number of files evaluated.
pub struct Summary {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub files: usize,
}

impl Summary {
    pub fn count(&mut self, severity: Severity) {
        match severity {
            Severity::Critical => self.critical += 1,
            Severity::High => self.high += 1,
            Severity::Medium => self.medium += 1,
            Severity::Low => self.low += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.critical + self.high + self.medium + self.low
    }
}

#[derive(Debug, Clone, Serialize)]
/// Validation results container.
pub struct ValidateResult {
    pub ok: bool,
    pub findings: Vec<Finding>,
    pub errors: Vec<FileError>,
    pub summary: Summary,
}
