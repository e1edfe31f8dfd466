//! yamlguard CLI binary entry point.
//! Resolves configuration, delegates to the library and sets the exit code.

use clap::Parser;
use yamlguard::cli::{self, Cli, Commands};
use yamlguard::config::{self, CliFlags};
use yamlguard::fix::{self, FixOptions};
use yamlguard::{lint, loader, output, utils};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    match cli.cmd {
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::Validate {
            paths,
            repo_root,
            rules,
            output,
            suggest,
            combine,
            autofix,
            check,
        } => {
            let eff = config::resolve_effective(&CliFlags {
                repo_root: repo_root.as_deref(),
                rules: rules.as_deref(),
                paths: &paths,
                output: output.as_deref(),
                suggest: cli::flag(suggest),
                combine: cli::flag(combine),
                autofix: cli::flag(autofix),
                check: cli::flag(check),
            });
            if !eff.config_found && eff.output != "json" {
                eprintln!("{} No yamlguard.toml found; using defaults.", utils::note_prefix());
            }
            let Some(rules_path) = eff.rules.as_ref() else {
                eprintln!(
                    "{} Rules are not configured. Pass --rules or add yamlguard.toml.",
                    utils::error_prefix()
                );
                std::process::exit(2);
            };
            let rules = match loader::load_rules_file(rules_path) {
                Ok(r) => r,
                Err(e) => {
                    eprintln!("{} {}", utils::error_prefix(), e);
                    std::process::exit(2);
                }
            };
            if eff.paths.is_empty() {
                eprintln!(
                    "{} No input paths. Pass files/directories or set `paths` in yamlguard.toml.",
                    utils::error_prefix()
                );
                std::process::exit(2);
            }
            let files = utils::expand_paths(&eff.paths);
            if files.is_empty() && eff.output != "json" {
                eprintln!("{} No YAML files matched {:?}", utils::info_prefix(), eff.paths);
            }

            let (reports, result) = lint::run_validate(&files, &rules);
            let wants_fixes = eff.suggest || eff.combine || eff.autofix || eff.check;
            let fixes = wants_fixes.then(|| {
                fix::fix_reports(
                    &reports,
                    &FixOptions {
                        combine: eff.combine,
                        autofix: eff.autofix,
                        check: eff.check,
                    },
                )
            });
            output::print_report(&result, fixes.as_deref(), &eff.output);

            let would_change = fixes
                .as_deref()
                .is_some_and(|fx| fx.iter().any(|f| f.changed));
            if eff.check && would_change {
                std::process::exit(1);
            }
            if !result.ok {
                std::process::exit(1);
            }
        }
    }
}
