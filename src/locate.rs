//! Best-effort mapping from a query path and offending values back to a
//! line in the original source text.
//!
//! Matchers are tried in two tiers: first `<key>: ...<value>...` lines for
//! every value (when a key can be inferred from the path's last segment),
//! then any line containing the value. Within a matcher the first line in
//! source order wins. A miss returns an empty `Location`.

use regex::RegexBuilder;
use serde_json::Value as Json;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Resolved position of a finding: 1-based line plus surrounding lines.
pub struct Location {
    pub line: Option<usize>,
    pub snippet: Option<String>,
}

/// Infer the mapping key a path ends on.
///
/// `$.spec.containers[*].image` and `$.spec.containers[*].image[*]` both
/// give `image`; paths ending in an index, filter, or wildcard give none.
pub fn key_hint(path: &str) -> Option<&str> {
    let path = path.trim();
    let path = path.strip_suffix("[*]").unwrap_or(path);
    let dot = path.rfind('.')?;
    let key = &path[dot + 1..];
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    valid.then_some(key)
}

/// Text used to search for an offending value, if it has a one-line form.
fn search_text(value: &Json) -> Option<String> {
    match value {
        Json::String(s) => Some(s.clone()),
        Json::Number(n) => Some(n.to_string()),
        Json::Bool(b) => Some(b.to_string()),
        Json::Null => Some("null".to_string()),
        Json::Array(_) | Json::Object(_) => None,
    }
}

enum Matcher {
    KeyValue(regex::Regex),
    Contains(String),
}

impl Matcher {
    fn is_match(&self, line: &str) -> bool {
        match self {
            Matcher::KeyValue(re) => re.is_match(line),
            Matcher::Contains(needle) => line.contains(needle.as_str()),
        }
    }
}

fn build_matchers(path: &str, values: &[Json]) -> Vec<Matcher> {
    let texts: Vec<String> = values.iter().filter_map(search_text).collect();
    let mut matchers = Vec::with_capacity(texts.len() * 2);
    if let Some(key) = key_hint(path) {
        for text in &texts {
            let pattern = format!(
                r"^\s*(?:-\s+)?{}\s*:.*{}",
                regex::escape(key),
                regex::escape(text)
            );
            if let Ok(re) = RegexBuilder::new(&pattern).case_insensitive(true).build() {
                matchers.push(Matcher::KeyValue(re));
            }
        }
    }
    for text in texts {
        if !text.is_empty() {
            matchers.push(Matcher::Contains(text));
        }
    }
    matchers
}

/// Locate the line that most likely holds one of `values`.
pub fn locate(text: &str, path: &str, values: &[Json]) -> Location {
    let lines: Vec<&str> = text.lines().collect();
    for matcher in build_matchers(path, values) {
        if let Some(idx) = lines.iter().position(|l| matcher.is_match(l)) {
            let lo = idx.saturating_sub(1);
            let hi = (idx + 2).min(lines.len());
            return Location {
                line: Some(idx + 1),
                snippet: Some(lines[lo..hi].join("\n")),
            };
        }
    }
    Location::default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const POD: &str = "apiVersion: v1\nkind: Pod\nmetadata:\n  name: web\n  annotations:\n    note: nginx:latest is bad\nspec:\n  containers:\n    - name: web\n      image: nginx:latest\n";

    #[test]
    fn test_key_hint_from_path_tail() {
        assert_eq!(key_hint("$.spec.containers[*].image"), Some("image"));
        assert_eq!(key_hint("$.spec.containers[*].args[*]"), Some("args"));
        assert_eq!(key_hint("$.metadata.name"), Some("name"));
        assert_eq!(key_hint("$..*"), None);
        assert_eq!(key_hint("$.items[0]"), None);
        assert_eq!(key_hint("image"), None);
    }

    #[test]
    fn test_key_value_beats_earlier_value_only_line() {
        let loc = locate(POD, "$.spec.containers[*].image", &[json!("nginx:latest")]);
        assert_eq!(loc.line, Some(10));
        assert_eq!(
            loc.snippet.as_deref(),
            Some("    - name: web\n      image: nginx:latest")
        );
    }

    #[test]
    fn test_value_only_fallback_without_key_hint() {
        let loc = locate(POD, "$..*", &[json!("nginx:latest")]);
        assert_eq!(loc.line, Some(6));
        assert_eq!(
            loc.snippet.as_deref(),
            Some("  annotations:\n    note: nginx:latest is bad\nspec:")
        );
    }

    #[test]
    fn test_any_keyed_value_beats_first_value_mention() {
        let text = "metadata:\n  annotations:\n    note: nginx:1.0 was retired\nspec:\n  containers:\n    - image: redis:latest\n";
        let values = [json!("nginx:1.0"), json!("redis:latest")];
        let loc = locate(text, "$.spec.containers[*].image", &values);
        assert_eq!(loc.line, Some(6));
        assert_eq!(
            loc.snippet.as_deref(),
            Some("  containers:\n    - image: redis:latest")
        );
        // Without a key hint the first value's mention wins.
        assert_eq!(locate(text, "$..*", &values).line, Some(3));
    }

    #[test]
    fn test_key_match_is_case_insensitive() {
        let text = "Image: NGINX:LATEST\n";
        let loc = locate(text, "$.image", &[json!("nginx:latest")]);
        assert_eq!(loc.line, Some(1));
        assert_eq!(loc.snippet.as_deref(), Some("Image: NGINX:LATEST"));
    }

    #[test]
    fn test_list_item_key_line_and_numbers() {
        let text = "ports:\n  - port: 80\n  - port: 8080\n";
        let loc = locate(text, "$.ports[*].port", &[json!(8080)]);
        assert_eq!(loc.line, Some(3));
    }

    #[test]
    fn test_miss_returns_none_and_is_idempotent() {
        let a = locate(POD, "$.spec.containers[*].image", &[json!("busybox")]);
        assert_eq!(a, Location::default());
        let b = locate(POD, "$.metadata.name", &[json!("web")]);
        let c = locate(POD, "$.metadata.name", &[json!("web")]);
        assert_eq!(b, c);
        assert_eq!(b.line, Some(4));
    }

    #[test]
    fn test_snippet_clamped_at_file_start() {
        let loc = locate("token: abc\nother: 1\n", "$.token", &[json!("abc")]);
        assert_eq!(loc.line, Some(1));
        assert_eq!(loc.snippet.as_deref(), Some("token: abc\nother: 1"));
    }
}
