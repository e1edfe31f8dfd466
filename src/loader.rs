//! YAML source and rule-file loading.
//!
//! Sources may hold several documents separated by `---`; each becomes an
//! independent unit. Rule files are a YAML (or JSON) list of rule objects,
//! optionally wrapped in a `rules:` key. A rule element that cannot be read
//! is skipped with a warning so one typo does not disable a whole policy.

use crate::models::rule::Rule;
use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value as Json;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("YAML_PARSE_ERROR: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Error, Debug)]
pub enum RulesError {
    #[error("Failed to read rules file {file}: {source}")]
    Read {
        file: PathBuf,
        source: std::io::Error,
    },
    #[error("Rules are not valid YAML/JSON: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Rules must be a list (or a mapping with a `rules` list)")]
    NotAList,
}

/// Parse `text` into its ordered list of units.
///
/// Empty input, or a single empty document, yields no units. Any syntax
/// error fails the whole text; no partial tree is returned.
pub fn load_units(text: &str) -> Result<Vec<Json>, ParseError> {
    let mut docs = Vec::new();
    for de in serde_yaml::Deserializer::from_str(text) {
        docs.push(Json::deserialize(de)?);
    }
    if docs.len() == 1 && docs[0].is_null() {
        docs.clear();
    }
    Ok(docs)
}

/// Parse `text` into the dynamic document shape: `Null` when empty, the
/// document itself when there is one, an array of documents otherwise.
pub fn parse_document(text: &str) -> Result<Json, ParseError> {
    let mut units = load_units(text)?;
    Ok(match units.len() {
        0 => Json::Null,
        1 => units.remove(0),
        _ => Json::Array(units),
    })
}

/// Load rules from YAML or JSON text.
pub fn load_rules(text: &str) -> Result<Vec<Rule>, RulesError> {
    let raw: Json = serde_yaml::from_str(text)?;
    let items = match raw {
        Json::Null => Vec::new(),
        Json::Array(items) => items,
        Json::Object(mut obj) => match obj.remove("rules") {
            Some(Json::Array(items)) => items,
            Some(Json::Null) | None => Vec::new(),
            Some(_) => return Err(RulesError::NotAList),
        },
        _ => return Err(RulesError::NotAList),
    };
    let mut rules = Vec::with_capacity(items.len());
    for (idx, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<Rule>(item) {
            Ok(rule) => rules.push(rule),
            Err(e) => warn!("skipping rule #{}: {}", idx + 1, e),
        }
    }
    debug!("loaded {} rule(s)", rules.len());
    Ok(rules)
}

/// Read and load a rules file.
pub fn load_rules_file(path: &Path) -> Result<Vec<Rule>, RulesError> {
    let text = fs::read_to_string(path).map_err(|source| RulesError::Read {
        file: path.to_path_buf(),
        source,
    })?;
    load_rules(&text)
}
