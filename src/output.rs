//! Output rendering for validation findings and fix suggestions.
//!
//! Supports `human` (default) and `json` outputs. The JSON form is a single
//! object: `ok`, `findings`, `errors`, `summary`, plus `suggestions` when
//! suggestions were requested.

use crate::fix::FileFix;
use crate::models::{Finding, Severity, ValidateResult};
use owo_colors::OwoColorize;
use serde_json::json;
use serde_json::Value as JsonVal;

fn use_colors(output: &str) -> bool {
    output != "json" && std::env::var_os("NO_COLOR").is_none()
}

/// Print the validation result (and suggestions, if any) in the requested format.
pub fn print_report(res: &ValidateResult, fixes: Option<&[FileFix]>, output: &str) {
    match output {
        "json" => match serde_json::to_string_pretty(&compose_report_json(res, fixes)) {
            Ok(s) => println!("{}", s),
            Err(e) => eprintln!("{} {}", crate::utils::error_prefix(), e),
        },
        _ => {
            print_findings(res, output);
            if let Some(fixes) = fixes {
                print_fixes(fixes, output);
            }
            print_summary(res, fixes, output);
        }
    }
}

fn severity_tag(sev: Severity, color: bool) -> (String, String) {
    let label = format!("⟦{}⟧", sev.as_str());
    if !color {
        let icon = match sev {
            Severity::Critical | Severity::High => "✖",
            Severity::Medium => "▲",
            Severity::Low => "◆",
        };
        return (icon.to_string(), label);
    }
    match sev {
        Severity::Critical | Severity::High => ("✖".red().to_string(), label.red().bold().to_string()),
        Severity::Medium => ("▲".yellow().to_string(), label.yellow().bold().to_string()),
        Severity::Low => ("◆".blue().to_string(), label.blue().bold().to_string()),
    }
}

fn location(f: &Finding) -> String {
    let file = f.file.as_deref().unwrap_or("<input>");
    match f.line {
        Some(line) => format!("{}:{}", file, line),
        None => file.to_string(),
    }
}

fn print_findings(res: &ValidateResult, output: &str) {
    let color = use_colors(output);
    for f in &res.findings {
        let (icon, sev) = severity_tag(f.severity, color);
        let loc = if color {
            location(f).bold().to_string()
        } else {
            location(f)
        };
        println!("{} {} {} ❲{}❳ — {}", icon, sev, loc, f.rule_id, f.message);
        if let Some(snippet) = &f.snippet {
            for line in snippet.lines() {
                if color {
                    println!("    {}", line.bright_black());
                } else {
                    println!("    {}", line);
                }
            }
        }
        if let Some(hint) = &f.remediation {
            println!("    hint: {}", hint);
        }
    }
    for e in &res.errors {
        eprintln!("{} {}: {}", crate::utils::error_prefix(), e.file, e.message);
    }
}

/// Print suggestions, one block per suggestion with its diff.
pub fn print_fixes(fixes: &[FileFix], output: &str) {
    let color = use_colors(output);
    for fx in fixes {
        for s in &fx.suggestions {
            let head = format!("{} ({:.2})", s.title, s.confidence);
            if color {
                println!("{} {} {}", "💡 suggestion:".cyan().bold(), fx.file.bold(), head);
            } else {
                println!("💡 suggestion: {} {}", fx.file, head);
            }
            println!("    {}", s.rationale);
            print!("{}", s.diff);
        }
        if fx.wrote {
            if color {
                println!("{} {}", "✏️  fixed:".green().bold(), fx.file.bold());
            } else {
                println!("✏️  fixed: {}", fx.file);
            }
        }
        if let Some(err) = &fx.error {
            eprintln!("{} {}", crate::utils::error_prefix(), err);
        }
    }
}

fn print_summary(res: &ValidateResult, fixes: Option<&[FileFix]>, output: &str) {
    let mut summary = format!(
        "— Summary — critical={} high={} medium={} low={} files={}",
        res.summary.critical, res.summary.high, res.summary.medium, res.summary.low, res.summary.files
    );
    if let Some(fixes) = fixes {
        summary.push_str(&format!(
            " fixable={} fixed={}",
            fixes.iter().filter(|f| f.changed).count(),
            fixes.iter().filter(|f| f.wrote).count()
        ));
    }
    if use_colors(output) {
        println!("{}", summary.bold());
    } else {
        println!("{}", summary);
    }
}

/// Compose suggestion items (pure) for testing/snapshot purposes.
pub fn compose_fix_json(fixes: &[FileFix]) -> JsonVal {
    let items: Vec<_> = fixes
        .iter()
        .flat_map(|fx| {
            fx.suggestions.iter().map(move |s| {
                json!({
                    "file": fx.file,
                    "title": s.title,
                    "rationale": s.rationale,
                    "diff": s.diff,
                    "confidence": s.confidence,
                })
            })
        })
        .collect();
    JsonVal::Array(items)
}

/// Compose the full JSON report (pure) for testing/snapshot purposes.
pub fn compose_report_json(res: &ValidateResult, fixes: Option<&[FileFix]>) -> JsonVal {
    let mut out = serde_json::to_value(res).unwrap_or_default();
    if let (Some(fixes), JsonVal::Object(map)) = (fixes, &mut out) {
        map.insert("suggestions".to_string(), compose_fix_json(fixes));
        map.insert(
            "fixed".to_string(),
            json!(fixes.iter().filter(|f| f.wrote).map(|f| f.file.as_str()).collect::<Vec<_>>()),
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::rule::RemediationKind;
    use crate::models::{FileError, Suggestion, Summary};

    fn result() -> ValidateResult {
        ValidateResult {
            ok: false,
            findings: vec![Finding {
                rule_id: "NO_LATEST".into(),
                severity: Severity::High,
                path: "$.spec.containers[*].image".into(),
                message: "Value matched forbidden pattern: .*:latest$".into(),
                values: vec![json!("nginx:latest")],
                remediation: Some("Pin the tag".into()),
                remediation_kind: RemediationKind::TagPin,
                file: Some("pod.yaml".into()),
                line: Some(8),
                snippet: None,
            }],
            errors: vec![FileError {
                file: "bad.yaml".into(),
                message: "YAML_PARSE_ERROR: x".into(),
            }],
            summary: Summary {
                high: 1,
                files: 2,
                ..Summary::default()
            },
        }
    }

    #[test]
    fn test_compose_report_json_shape() {
        let out = compose_report_json(&result(), None);
        assert_eq!(out["ok"], false);
        assert_eq!(out["summary"]["high"], 1);
        assert_eq!(out["findings"][0]["rule_id"], "NO_LATEST");
        assert_eq!(out["findings"][0]["line"], 8);
        assert!(out["findings"][0].get("snippet").is_none());
        assert_eq!(out["errors"][0]["file"], "bad.yaml");
        assert!(out.get("suggestions").is_none());
    }

    #[test]
    fn test_compose_report_json_with_suggestions() {
        let fixes = vec![FileFix {
            file: "pod.yaml".into(),
            suggestions: vec![Suggestion {
                title: "Pin image tag (avoid :latest)".into(),
                rationale: "r".into(),
                patched_text: "image: nginx:1.0\n".into(),
                diff: "--- a/pod.yaml\n+++ b/pod.yaml\n".into(),
                confidence: 0.75,
            }],
            changed: true,
            wrote: true,
            error: None,
        }];
        let out = compose_report_json(&result(), Some(&fixes));
        let s = &out["suggestions"][0];
        assert_eq!(s["file"], "pod.yaml");
        assert_eq!(s["confidence"], 0.75);
        assert!(s.get("patched_text").is_none());
        assert_eq!(out["fixed"][0], "pod.yaml");
        let keys: Vec<_> = s.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["file", "title", "rationale", "diff", "confidence"]);
    }
}
