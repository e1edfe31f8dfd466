//! yamlguard core library.
//!
//! Validates YAML configuration against declarative rules and proposes
//! minimal text fixes for what it finds.
//!
//! High-level modules:
//! - `loader`: YAML sources into document units; rule files into `Rule`s.
//! - `query`: JSONPath-style queries over document trees.
//! - `checks`: Rule evaluation producing ordered findings.
//! - `locate`: Mapping findings back to source lines.
//! - `suggest`: Remediation steps, per-finding and combined patches.
//! - `lint`: File-level validation pipeline.
//! - `fix`: Suggestion runner with optional write-back.
//! - `config`: Discovery and effective configuration resolution.
//! - `models`: Rule schema and output structs.
//! - `output`: Human/JSON printers.
//! - `cli`: CLI argument parsing (binary uses this).
//! - `utils`: Supporting helpers.
pub mod checks;
pub mod cli;
pub mod config;
pub mod fix;
pub mod lint;
pub mod loader;
pub mod locate;
pub mod models;
pub mod output;
pub mod query;
pub mod suggest;
pub mod utils;
