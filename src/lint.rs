//! Validation pipeline: parse, evaluate, locate.
//!
//! Files are processed in parallel; reports are re-sorted by file so output
//! is deterministic. Within a file, finding order is exactly the evaluator's.

use crate::checks::evaluate_units;
use crate::loader::{self, ParseError};
use crate::locate::locate;
use crate::models::rule::Rule;
use crate::models::{FileError, Finding, Summary, ValidateResult};
use crate::utils;
use log::warn;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

/// Per-file outcome of validation. The source is kept for the fix runner.
#[derive(Debug, Clone)]
pub struct FileReport {
    pub file: String,
    pub path: PathBuf,
    pub source: Option<String>,
    pub findings: Vec<Finding>,
    pub error: Option<String>,
}

/// Evaluate `rules` against one source text and attach locations.
pub fn validate_text(file: &str, text: &str, rules: &[Rule]) -> Result<Vec<Finding>, ParseError> {
    let units = loader::load_units(text)?;
    Ok(evaluate_units(&units, rules)
        .into_iter()
        .map(|f| {
            let location = locate(text, &f.path, &f.values);
            f.with_location(file, location)
        })
        .collect())
}

fn validate_file(path: &Path, rules: &[Rule]) -> FileReport {
    let file = utils::rel_to_wd(path);
    let mut report = FileReport {
        file,
        path: path.to_path_buf(),
        source: None,
        findings: Vec::new(),
        error: None,
    };
    let text = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            warn!("{}: cannot read: {}", report.file, e);
            report.error = Some(format!("READ_ERROR: {}", e));
            return report;
        }
    };
    match validate_text(&report.file, &text, rules) {
        Ok(findings) => report.findings = findings,
        Err(e) => {
            warn!("{}: {}", report.file, e);
            report.error = Some(e.to_string());
        }
    }
    report.source = Some(text);
    report
}

/// Validate each file in parallel; reports come back sorted by file.
pub fn validate_files(paths: &[PathBuf], rules: &[Rule]) -> Vec<FileReport> {
    let mut reports: Vec<FileReport> = paths
        .par_iter()
        .map(|p| validate_file(p, rules))
        .collect();
    reports.sort_by(|a, b| a.file.cmp(&b.file));
    reports
}

/// Fold file reports into the overall result.
pub fn summarize(reports: &[FileReport]) -> ValidateResult {
    let mut summary = Summary {
        files: reports.len(),
        ..Summary::default()
    };
    let mut findings = Vec::new();
    let mut errors = Vec::new();
    for r in reports {
        for f in &r.findings {
            summary.count(f.severity);
            findings.push(f.clone());
        }
        if let Some(message) = &r.error {
            errors.push(FileError {
                file: r.file.clone(),
                message: message.clone(),
            });
        }
    }
    ValidateResult {
        ok: findings.is_empty(),
        findings,
        errors,
        summary,
    }
}

/// Validate `paths` and return the reports together with the summary.
pub fn run_validate(paths: &[PathBuf], rules: &[Rule]) -> (Vec<FileReport>, ValidateResult) {
    let reports = validate_files(paths, rules);
    let result = summarize(&reports);
    (reports, result)
}
