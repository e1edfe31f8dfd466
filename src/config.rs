//! Configuration discovery and effective settings resolution.
//!
//! yamlguard reads `yamlguard.toml|yaml|yml` from the repository root (or
//! closest ancestor) and merges it with CLI flags to produce an `Effective`
//! config.
//! Defaults:
//! - `rules`: none (must come from `--rules` or config)
//! - `paths`: none
//! - `output`: `human`
//! - `fix.suggest|combine|autofix|check`: false
//!
//! Overrides precedence: CLI > config file > defaults.

use log::warn;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_NAMES: [&str; 3] = ["yamlguard.toml", "yamlguard.yaml", "yamlguard.yml"];

#[derive(Debug, Default, Deserialize, Clone)]
/// Fix-related configuration section under `[fix]`.
pub struct FixCfg {
    pub suggest: Option<bool>,
    pub combine: Option<bool>,
    pub autofix: Option<bool>,
    pub check: Option<bool>,
}

#[derive(Debug, Default, Deserialize, Clone)]
/// Root configuration loaded from `yamlguard.toml|yaml`.
pub struct YamlGuardConfig {
    pub rules: Option<String>,
    #[serde(default)]
    pub paths: Option<Vec<String>>,
    pub output: Option<String>,
    pub fix: Option<FixCfg>,
}

/// Flags as given on the command line; `None` means "not passed".
#[derive(Debug, Default, Clone)]
pub struct CliFlags<'a> {
    pub repo_root: Option<&'a str>,
    pub rules: Option<&'a str>,
    pub paths: &'a [String],
    pub output: Option<&'a str>,
    pub suggest: Option<bool>,
    pub combine: Option<bool>,
    pub autofix: Option<bool>,
    pub check: Option<bool>,
}

#[derive(Debug, Clone)]
/// Fully-resolved configuration used by commands after applying precedence.
pub struct Effective {
    pub repo_root: PathBuf,
    /// Rules file, resolved against the repo root when it came from config.
    pub rules: Option<PathBuf>,
    pub paths: Vec<String>,
    pub output: String,
    pub suggest: bool,
    pub combine: bool,
    pub autofix: bool,
    pub check: bool,
    pub config_found: bool,
}

/// Walk upward from `start` to detect the repository root.
///
/// Stops when a `yamlguard.toml|yaml|yml` or a `.git` directory is found.
pub fn detect_repo_root(start: &Path) -> PathBuf {
    let mut cur = start;
    loop {
        if CONFIG_NAMES.iter().any(|n| cur.join(n).exists()) || cur.join(".git").exists() {
            return cur.to_path_buf();
        }
        match cur.parent() {
            Some(p) => cur = p,
            None => return start.to_path_buf(),
        }
    }
}

/// Load `YamlGuardConfig` from the first config file present under `root`.
pub fn load_config(root: &Path) -> Option<YamlGuardConfig> {
    let name = CONFIG_NAMES.iter().find(|n| root.join(n).exists())?;
    let path = root.join(name);
    let s = fs::read_to_string(&path).ok()?;
    let parsed = if name.ends_with(".toml") {
        toml::from_str::<YamlGuardConfig>(&s).map_err(|e| e.to_string())
    } else {
        serde_yaml::from_str::<YamlGuardConfig>(&s).map_err(|e| e.to_string())
    };
    match parsed {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            warn!("ignoring {}: {}", path.to_string_lossy(), e);
            None
        }
    }
}

/// Resolve `Effective` by merging CLI flags, discovered config, and defaults.
pub fn resolve_effective(cli: &CliFlags<'_>) -> Effective {
    let start = PathBuf::from(cli.repo_root.unwrap_or("."));
    let repo_root = detect_repo_root(&start);
    let loaded = load_config(&repo_root);
    let config_found = loaded.is_some();
    let cfg = loaded.unwrap_or_default();
    let fix = cfg.fix.unwrap_or_default();

    let rules = match cli.rules {
        Some(r) => Some(PathBuf::from(r)),
        None => cfg.rules.map(|r| repo_root.join(r)),
    };

    let paths = if !cli.paths.is_empty() {
        cli.paths.to_vec()
    } else {
        cfg.paths
            .unwrap_or_default()
            .into_iter()
            .map(|p| repo_root.join(p).to_string_lossy().to_string())
            .collect()
    };

    let output = cli
        .output
        .map(|s| s.to_string())
        .or(cfg.output)
        .unwrap_or_else(|| "human".to_string());

    Effective {
        rules,
        paths,
        output,
        suggest: cli.suggest.or(fix.suggest).unwrap_or(false),
        combine: cli.combine.or(fix.combine).unwrap_or(false),
        autofix: cli.autofix.or(fix.autofix).unwrap_or(false),
        check: cli.check.or(fix.check).unwrap_or(false),
        repo_root,
        config_found,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_detect_and_load_toml() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        let mut f = fs::File::create(root.join("yamlguard.toml")).unwrap();
        writeln!(
            f,
            "{}",
            r#"
rules = "policy/rules.yaml"
paths = ["k8s"]
output = "json"
[fix]
suggest = true
combine = true
    "#
        )
        .unwrap();

        // Resolve using explicit repo_root to avoid global CWD races
        let eff = resolve_effective(&CliFlags {
            repo_root: root.to_str(),
            ..CliFlags::default()
        });
        assert!(eff.config_found);
        assert_eq!(eff.rules, Some(root.join("policy/rules.yaml")));
        assert_eq!(eff.paths, vec![root.join("k8s").to_string_lossy().to_string()]);
        assert_eq!(eff.output, "json");
        assert!(eff.suggest && eff.combine);
        assert!(!eff.autofix && !eff.check);
    }

    #[test]
    fn test_load_yaml_and_defaults() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("yamlguard.yml"), "rules: rules.yaml\nfix:\n  autofix: true\n").unwrap();

        let eff = resolve_effective(&CliFlags {
            repo_root: root.to_str(),
            ..CliFlags::default()
        });
        assert_eq!(eff.output, "human");
        assert!(eff.paths.is_empty());
        assert!(eff.autofix);
        assert!(!eff.suggest);
    }

    #[test]
    fn test_cli_overrides_config() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(
            root.join("yamlguard.toml"),
            "rules = \"cfg.yaml\"\npaths = [\"a\"]\noutput = \"json\"\n[fix]\ncheck = true\n",
        )
        .unwrap();
        let paths = vec!["b.yaml".to_string()];
        let eff = resolve_effective(&CliFlags {
            repo_root: root.to_str(),
            rules: Some("cli.yaml"),
            paths: &paths,
            output: Some("human"),
            check: Some(false),
            ..CliFlags::default()
        });
        assert_eq!(eff.rules, Some(PathBuf::from("cli.yaml")));
        assert_eq!(eff.paths, paths);
        assert_eq!(eff.output, "human");
        assert!(!eff.check);
    }

    #[test]
    fn test_walks_up_to_git_root() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join(".git")).unwrap();
        fs::create_dir_all(root.join("deploy/k8s")).unwrap();
        assert_eq!(detect_repo_root(&root.join("deploy/k8s")), root.to_path_buf());
        let eff = resolve_effective(&CliFlags {
            repo_root: root.join("deploy/k8s").to_str(),
            ..CliFlags::default()
        });
        assert!(!eff.config_found);
        assert!(eff.rules.is_none());
    }

    #[test]
    fn test_invalid_config_is_ignored() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("yamlguard.toml"), "output = [").unwrap();
        assert!(load_config(dir.path()).is_none());
    }
}
