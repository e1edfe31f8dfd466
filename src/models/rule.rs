//! Rule schema consumed by the evaluator.
//!
//! Rules are plain data, usually loaded from a YAML or JSON list:
//! - `id`: identifier reported on findings; also classifies the remediation
//!   strategy used by the suggestion generator (see `RemediationKind`).
//! - `severity`: `low|medium|high|critical` (default `medium`).
//! - `when.kind`: optional gate on the unit's top-level `kind` field.
//! - `assert`: ordered list of assertions (`path` plus predicates).
//! - `remediation`: optional free-form hint copied onto findings.

use super::Severity;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as Json;

fn default_rule_id() -> String {
    "RULE".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
/// A declarative policy rule.
pub struct Rule {
    #[serde(default = "default_rule_id")]
    pub id: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub when: Option<When>,
    #[serde(default, rename = "assert")]
    pub assertions: Vec<Assertion>,
    #[serde(default)]
    pub remediation: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
/// Applicability gate for a rule.
pub struct When {
    #[serde(default)]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
/// One path plus the predicates checked against every value it selects.
///
/// Predicates are independent: an assertion carrying both `not_matches` and
/// `must_include` can produce two findings. An assertion without any
/// predicate never produces a finding.
pub struct Assertion {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default, deserialize_with = "scalar_as_string")]
    pub not_matches: Option<String>,
    #[serde(default, deserialize_with = "scalar_as_string")]
    pub must_include: Option<String>,
    /// Present-but-null is kept as `Some(Null)` so `equals: null` is a real check.
    #[serde(default, deserialize_with = "present_value")]
    pub equals: Option<Json>,
}

impl Rule {
    /// Kind gate from `when.kind`; an empty string does not gate.
    pub fn kind_gate(&self) -> Option<&str> {
        self.when
            .as_ref()
            .and_then(|w| w.kind.as_deref())
            .filter(|k| !k.is_empty())
    }

    /// Whether this rule should run against `unit`.
    ///
    /// A gated rule only applies to mappings whose `kind` equals the gate.
    pub fn applies_to(&self, unit: &Json) -> bool {
        match self.kind_gate() {
            None => true,
            Some(kind) => match unit {
                Json::Object(obj) => obj.get("kind").and_then(Json::as_str) == Some(kind),
                _ => false,
            },
        }
    }

    /// Remediation family of this rule, derived from its id.
    pub fn remediation_kind(&self) -> RemediationKind {
        RemediationKind::classify(&self.id)
    }
}

impl Assertion {
    /// The query path, or `None` when missing/empty (assertion is skipped).
    pub fn query_path(&self) -> Option<&str> {
        self.path.as_deref().filter(|p| !p.is_empty())
    }
}

/// Closed set of remediation strategies, selected by rule-id family.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RemediationKind {
    /// Floating `:latest` tags on `image:` lines.
    TagPin,
    /// Images referenced without an immutable digest.
    DigestPin,
    /// Containers missing `resources.limits`.
    ResourceLimits,
    /// Hardcoded secret literals.
    SecretMask,
    /// No automatic fix known for this rule id.
    #[default]
    Unclassified,
}

impl RemediationKind {
    /// Classify a rule id into its remediation family.
    ///
    /// Ids are compared after uppercasing and mapping `_` to `-`, so
    /// `NO_LATEST` and `K8S-NO-LATEST-TAG` land in the same family.
    pub fn classify(rule_id: &str) -> Self {
        let id = rule_id.trim().to_ascii_uppercase().replace('_', "-");
        if id.starts_with("SECRET-") {
            RemediationKind::SecretMask
        } else if id.contains("NO-LATEST") {
            RemediationKind::TagPin
        } else if id.contains("PIN-DIGEST") {
            RemediationKind::DigestPin
        } else if id.contains("RESOURCES-LIMITS") || id.contains("RESOURCE-LIMITS") {
            RemediationKind::ResourceLimits
        } else {
            RemediationKind::Unclassified
        }
    }

    /// Position in the combined-patch fold. Line-targeted edits run first;
    /// literal secret masking always runs last.
    pub fn precedence(self) -> u8 {
        match self {
            RemediationKind::TagPin => 0,
            RemediationKind::DigestPin => 1,
            RemediationKind::ResourceLimits => 2,
            RemediationKind::Unclassified => 3,
            RemediationKind::SecretMask => 4,
        }
    }
}

/// Accept any scalar for string predicates (`must_include: 443` is `"443"`).
fn scalar_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Json::deserialize(deserializer)?;
    match value {
        Json::Null => Ok(None),
        Json::String(s) => Ok(Some(s)),
        Json::Bool(b) => Ok(Some(b.to_string())),
        Json::Number(n) => Ok(Some(n.to_string())),
        other => Err(serde::de::Error::custom(format!(
            "expected a scalar predicate, found {}",
            other
        ))),
    }
}

fn present_value<'de, D>(deserializer: D) -> Result<Option<Json>, D::Error>
where
    D: Deserializer<'de>,
{
    Json::deserialize(deserializer).map(Some)
}
