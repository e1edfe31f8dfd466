//! CLI argument parsing via `clap`.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "yamlguard",
    version,
    about = "Policy checks and targeted fixes for YAML configuration",
    long_about = "yamlguard — validate YAML configuration (Kubernetes manifests, CI workflows) against declarative rules and suggest minimal fixes.\n\nConfiguration precedence: CLI > yamlguard.toml > defaults.",
    after_help = "Examples:\n  yamlguard validate k8s/ --rules policy/rules.yaml\n  yamlguard validate deploy.yaml --rules rules.yaml --suggest --combine\n  yamlguard validate k8s/ --rules rules.yaml --autofix --check",
    arg_required_else_help = true
)]
/// Top-level CLI options and subcommands.
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
/// Supported subcommands.
pub enum Commands {
    /// Show version
    #[command(about = "Show version", long_about = "Print the current yamlguard version.")]
    Version,
    /// Validate YAML files against rules
    #[command(
        about = "Validate YAML files",
        long_about = "Evaluate rules against every document in the given files. Exits 1 when findings exist, 2 on configuration or rule-file errors.",
        after_help = "Examples:\n  yamlguard validate k8s/ --rules rules.yaml\n  yamlguard validate 'deploy/**/*.yml' --rules rules.yaml --output json"
    )]
    Validate {
        #[arg(help = "Files, directories or globs (default: [paths] from config)")]
        paths: Vec<String>,
        #[arg(long, help = "Repository root (default: current dir)")]
        repo_root: Option<String>,
        #[arg(long, help = "Path to rules file (YAML or JSON list of rules)")]
        rules: Option<String>,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Print fix suggestions with diffs")]
        suggest: bool,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Combine all fixes per file into one patch (implies --suggest)")]
        combine: bool,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Write fixes back to files (disabled by --check)")]
        autofix: bool,
        #[arg(long, action = clap::ArgAction::SetTrue, help = "Exit non-zero if fixes would change files (implies write=false)")]
        check: bool,
    },
}

/// Map a set flag to `Some(true)` so unset flags fall through to config.
pub fn flag(v: bool) -> Option<bool> {
    v.then_some(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_validate_flags() {
        let cli = Cli::try_parse_from([
            "yamlguard", "validate", "k8s", "a.yaml", "--rules", "r.yaml", "--combine", "--check",
        ])
        .unwrap();
        match cli.cmd {
            Commands::Validate { paths, rules, combine, check, suggest, autofix, .. } => {
                assert_eq!(paths, vec!["k8s", "a.yaml"]);
                assert_eq!(rules.as_deref(), Some("r.yaml"));
                assert!(combine && check);
                assert!(!suggest && !autofix);
            }
            Commands::Version => panic!("expected validate"),
        }
        assert_eq!(flag(false), None);
        assert_eq!(flag(true), Some(true));
    }
}
