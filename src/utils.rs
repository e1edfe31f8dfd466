//! Supporting helpers: diff rendering, path display and expansion, and
//! colored message prefixes for stderr.

use owo_colors::OwoColorize;
use similar::TextDiff;
use std::path::{Path, PathBuf};

/// Unified diff of `before` vs `after` with `a/<path>` and `b/<path>` headers
/// and three lines of context. Empty when the texts are identical.
pub fn unified_diff(before: &str, after: &str, path: &str) -> String {
    if before == after {
        return String::new();
    }
    let old = format!("a/{}", path.trim_start_matches('/'));
    let new = format!("b/{}", path.trim_start_matches('/'));
    TextDiff::from_lines(before, after)
        .unified_diff()
        .context_radius(3)
        .header(&old, &new)
        .to_string()
}

/// Display `p` relative to the working directory when possible.
pub fn rel_to_wd(p: &Path) -> String {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    match pathdiff::diff_paths(p, &cwd) {
        Some(rel) if !rel.as_os_str().is_empty() && !rel.starts_with("..") => {
            rel.to_string_lossy().to_string()
        }
        _ => p.to_string_lossy().to_string(),
    }
}

/// Expand CLI inputs into concrete files.
///
/// A directory contributes every `*.yaml`/`*.yml` beneath it; anything else
/// is treated as a glob (a plain file path is a glob matching itself).
/// Output is sorted and de-duplicated.
pub fn expand_paths(inputs: &[String]) -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = Vec::new();
    for input in inputs {
        let p = Path::new(input);
        let patterns: Vec<String> = if p.is_dir() {
            ["**/*.yaml", "**/*.yml"]
                .iter()
                .map(|g| p.join(g).to_string_lossy().to_string())
                .collect()
        } else {
            vec![input.clone()]
        };
        for pattern in patterns {
            match glob::glob(&pattern) {
                Ok(paths) => out.extend(paths.flatten().filter(|p| p.is_file())),
                Err(e) => log::warn!("invalid path pattern {:?}: {}", pattern, e),
            }
        }
    }
    out.sort();
    out.dedup();
    out
}

fn use_colors() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}

pub fn error_prefix() -> String {
    if use_colors() {
        "error:".red().bold().to_string()
    } else {
        "error:".to_string()
    }
}

pub fn note_prefix() -> String {
    if use_colors() {
        "note:".yellow().bold().to_string()
    } else {
        "note:".to_string()
    }
}

pub fn info_prefix() -> String {
    if use_colors() {
        "info:".blue().bold().to_string()
    } else {
        "info:".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_unified_diff_headers_and_hunk() {
        let before = "a: 1\nimage: nginx:latest\nb: 2\n";
        let after = "a: 1\nimage: nginx:1.0\nb: 2\n";
        let d = unified_diff(before, after, "k8s/pod.yaml");
        assert!(d.starts_with("--- a/k8s/pod.yaml\n+++ b/k8s/pod.yaml\n"));
        assert!(d.contains("@@ -1,3 +1,3 @@"));
        assert!(d.contains("-image: nginx:latest\n"));
        assert!(d.contains("+image: nginx:1.0\n"));
        assert!(d.contains(" a: 1\n"));
    }

    #[test]
    fn test_unified_diff_identical_is_empty() {
        assert_eq!(unified_diff("x\n", "x\n", "f.yaml"), "");
    }

    #[test]
    fn test_expand_paths_dir_and_glob() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("k8s/nested")).unwrap();
        std::fs::write(root.join("k8s/a.yaml"), "a: 1").unwrap();
        std::fs::write(root.join("k8s/nested/b.yml"), "b: 1").unwrap();
        std::fs::write(root.join("k8s/readme.md"), "#").unwrap();

        let found = expand_paths(&[root.join("k8s").to_string_lossy().to_string()]);
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|p| p.extension().is_some_and(|e| e == "yaml" || e == "yml")));

        let globbed = expand_paths(&[
            root.join("k8s/*.yaml").to_string_lossy().to_string(),
            root.join("k8s/a.yaml").to_string_lossy().to_string(),
        ]);
        assert_eq!(globbed, vec![root.join("k8s/a.yaml")]);
    }
}
