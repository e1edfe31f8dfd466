//! Targeted text fixes for findings.
//!
//! Each finding maps (via its rule-id family) to a `RemediationStep`, a pure
//! `text -> text` edit. Line-targeted steps rewrite only the `image:` lines
//! they fix and leave every other byte alone; the resource-limits step is the
//! exception and re-serializes the document.
//!
//! A per-file patch is a left fold of steps over the original text, ordered
//! by family precedence (tag, digest, resources, then secrets last) so the
//! literal secret mask cannot clobber a line another step already rewrote.

use crate::models::rule::RemediationKind;
use crate::models::{Finding, Suggestion};
use crate::utils;
use log::debug;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value as Json;
use serde_yaml::{Mapping, Value as Yaml};

pub const PINNED_TAG: &str = "1.0";
pub const DIGEST_PLACEHOLDER: &str = "@sha256:REPLACE_WITH_REAL_DIGEST";
pub const SECRET_MASK: &str = "*****";
pub const DEFAULT_CPU_LIMIT: &str = "100m";
pub const DEFAULT_MEMORY_LIMIT: &str = "128Mi";

const COMBINED_TITLE: &str = "Apply recommended hardening (pin tags/digests, add limits, mask secrets)";

/// One fix, ready to run against any version of the file text.
#[derive(Debug, Clone, PartialEq)]
pub struct RemediationStep {
    pub kind: RemediationKind,
    /// Offending values from the finding, used by the literal strategies.
    pub values: Vec<Json>,
}

impl RemediationStep {
    /// Build the step for `finding`; `None` when its family has no fix.
    pub fn for_finding(finding: &Finding) -> Option<Self> {
        match finding.remediation_kind {
            RemediationKind::Unclassified => None,
            kind => Some(Self {
                kind,
                values: finding.values.clone(),
            }),
        }
    }

    /// Apply the fix. Returns `Some` only when the text actually changed.
    pub fn apply(&self, text: &str) -> Option<String> {
        let patched = match self.kind {
            RemediationKind::TagPin => pin_tag(text, &self.values),
            RemediationKind::DigestPin => rewrite_image_lines(text, append_digest),
            RemediationKind::ResourceLimits => add_resource_limits(text),
            RemediationKind::SecretMask => mask_literals(text, &self.values),
            RemediationKind::Unclassified => None,
        }?;
        (patched != text).then_some(patched)
    }

    pub fn title(&self) -> &'static str {
        match self.kind {
            RemediationKind::TagPin => "Pin image tag (avoid :latest)",
            RemediationKind::DigestPin => "Pin image by digest",
            RemediationKind::ResourceLimits => "Add resource limits",
            RemediationKind::SecretMask => "Remove hardcoded secret",
            RemediationKind::Unclassified => "",
        }
    }

    pub fn rationale(&self) -> &'static str {
        match self.kind {
            RemediationKind::TagPin => {
                "Floating tags break reproducibility. Replace ':latest' with a pinned version; ideally also add a digest."
            }
            RemediationKind::DigestPin => "Use immutable digests to guarantee exact image contents.",
            RemediationKind::ResourceLimits => {
                "Define CPU/Memory limits for each container to prevent noisy-neighbor issues."
            }
            RemediationKind::SecretMask => {
                "Delete hardcoded credentials and reference a secret (e.g., GitHub Actions `${{ secrets.MY_TOKEN }}` or K8s Secret)."
            }
            RemediationKind::Unclassified => "",
        }
    }

    pub fn confidence(&self) -> f64 {
        match self.kind {
            RemediationKind::TagPin => 0.75,
            RemediationKind::DigestPin => 0.8,
            RemediationKind::ResourceLimits => 0.7,
            RemediationKind::SecretMask => 0.9,
            RemediationKind::Unclassified => 0.0,
        }
    }
}

/// Outcome of folding steps over a text.
#[derive(Debug, Clone, PartialEq)]
pub struct Composition {
    pub text: String,
    /// Steps that changed the text, in application order.
    pub applied: Vec<RemediationStep>,
}

/// Left fold: each step sees the previous step's output.
pub fn compose(original: &str, steps: &[RemediationStep]) -> Composition {
    steps.iter().fold(
        Composition {
            text: original.to_string(),
            applied: Vec::new(),
        },
        |mut acc, step| {
            if let Some(next) = step.apply(&acc.text) {
                acc.text = next;
                acc.applied.push(step.clone());
            }
            acc
        },
    )
}

/// Stable sort of findings by family precedence.
pub fn order_by_precedence(findings: &[Finding]) -> Vec<&Finding> {
    let mut ordered: Vec<&Finding> = findings.iter().collect();
    ordered.sort_by_key(|f| f.remediation_kind.precedence());
    ordered
}

/// Suggest a fix for a single finding against `original`.
pub fn suggest_for_finding(file_path: &str, finding: &Finding, original: &str) -> Option<Suggestion> {
    let step = RemediationStep::for_finding(finding)?;
    let Some(patched) = step.apply(original) else {
        debug!("{}: no applicable fix for {}", file_path, finding.rule_id);
        return None;
    };
    Some(Suggestion {
        title: step.title().to_string(),
        rationale: step.rationale().to_string(),
        diff: utils::unified_diff(original, &patched, file_path),
        patched_text: patched,
        confidence: step.confidence(),
    })
}

/// Combine every applicable fix for one file into a single patch.
pub fn suggest_for_file(file_path: &str, findings: &[Finding], original: &str) -> Option<Suggestion> {
    let steps: Vec<RemediationStep> = order_by_precedence(findings)
        .into_iter()
        .filter_map(RemediationStep::for_finding)
        .collect();
    let composed = compose(original, &steps);
    if composed.applied.is_empty() {
        return None;
    }
    let mut rationales: Vec<&str> = Vec::new();
    for step in &composed.applied {
        if !rationales.contains(&step.rationale()) {
            rationales.push(step.rationale());
        }
    }
    let confidence = composed
        .applied
        .iter()
        .map(RemediationStep::confidence)
        .fold(0.0, f64::max);
    Some(Suggestion {
        title: COMBINED_TITLE.to_string(),
        rationale: rationales.join(" "),
        diff: utils::unified_diff(original, &composed.text, file_path),
        patched_text: composed.text,
        confidence,
    })
}

/// Rewrite the scalar of every `image:` line with `f`, keeping indentation,
/// quotes, trailing comments and line endings. `None` when nothing changed.
fn rewrite_image_lines(text: &str, f: impl Fn(&str) -> String) -> Option<String> {
    let Ok(line_re) = Regex::new(r"^(\s*(?:-\s+)?image\s*:\s*)(\S.*)$") else {
        return None;
    };
    let mut out = String::with_capacity(text.len() + 64);
    let mut changed = false;
    for raw in text.split_inclusive('\n') {
        let (body, eol) = split_eol(raw);
        let rewritten = line_re.captures(body).and_then(|caps| {
            let prefix = caps.get(1)?.as_str();
            let value = caps.get(2)?.as_str();
            let (open, core, close) = split_scalar(value);
            if core.is_empty() {
                return None;
            }
            let new_core = f(core);
            (new_core != core).then(|| format!("{}{}{}{}", prefix, open, new_core, close))
        });
        match rewritten {
            Some(line) => {
                out.push_str(&line);
                changed = true;
            }
            None => out.push_str(body),
        }
        out.push_str(eol);
    }
    changed.then_some(out)
}

fn split_eol(raw: &str) -> (&str, &str) {
    if let Some(body) = raw.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = raw.strip_suffix('\n') {
        (body, "\n")
    } else {
        (raw, "")
    }
}

/// Split an inline scalar into (opening quote, content, closing quote plus
/// any trailing comment/whitespace).
fn split_scalar(value: &str) -> (&str, &str, &str) {
    let first = value.chars().next();
    if let Some(q @ ('"' | '\'')) = first {
        if let Some(end) = value[1..].find(q) {
            let close_at = 1 + end;
            return (&value[..1], &value[1..close_at], &value[close_at..]);
        }
        return ("", value, "");
    }
    let end = value.find(" #").unwrap_or(value.len());
    let core = value[..end].trim_end();
    (&value[..0], core, &value[core.len()..])
}

fn has_digest(image: &str) -> bool {
    image.contains("@sha256:")
}

fn append_digest(image: &str) -> String {
    if has_digest(image) {
        image.to_string()
    } else {
        format!("{}{}", image, DIGEST_PLACEHOLDER)
    }
}

fn replace_latest(image: &str) -> String {
    match Regex::new(r":latest(@|$)") {
        Ok(re) => re
            .replace(image, format!(":{}$1", PINNED_TAG).as_str())
            .into_owned(),
        Err(_) => image.to_string(),
    }
}

fn pin_image(image: &str) -> String {
    append_digest(&replace_latest(image))
}

fn pin_tag(text: &str, values: &[Json]) -> Option<String> {
    if let Some(patched) = rewrite_image_lines(text, pin_image) {
        return Some(patched);
    }
    // No `image:` line to rewrite: fall back to the first offending literal.
    let first = values.first()?.as_str().filter(|s| !s.is_empty())?;
    text.contains(first)
        .then(|| text.replace(first, &pin_image(first)))
}

fn mask_literals(text: &str, values: &[Json]) -> Option<String> {
    let mut patched = text.to_string();
    for value in values {
        let literal = match value {
            Json::String(s) => s.clone(),
            Json::Number(n) => n.to_string(),
            Json::Bool(b) => b.to_string(),
            Json::Null | Json::Array(_) | Json::Object(_) => continue,
        };
        if literal.is_empty() || literal == SECRET_MASK {
            continue;
        }
        patched = patched.replace(&literal, SECRET_MASK);
    }
    Some(patched)
}

/// Ensure `resources.limits.{cpu,memory}` on every `spec.containers[*]` of
/// every document, then re-serialize. Formatting and comments are lost.
fn add_resource_limits(text: &str) -> Option<String> {
    let mut docs: Vec<Yaml> = Vec::new();
    for de in serde_yaml::Deserializer::from_str(text) {
        match Yaml::deserialize(de) {
            Ok(doc) => docs.push(doc),
            Err(e) => {
                debug!("resource limits: source not parseable: {}", e);
                return None;
            }
        }
    }
    let mut changed = false;
    for doc in docs.iter_mut() {
        let containers = doc
            .get_mut("spec")
            .and_then(|spec| spec.get_mut("containers"))
            .and_then(Yaml::as_sequence_mut);
        let Some(containers) = containers else { continue };
        for container in containers.iter_mut() {
            if let Some(c) = container.as_mapping_mut() {
                changed |= ensure_limits(c);
            }
        }
    }
    if !changed {
        return None;
    }
    let mut rendered = Vec::with_capacity(docs.len());
    for doc in &docs {
        match serde_yaml::to_string(doc) {
            Ok(s) => rendered.push(s),
            Err(e) => {
                debug!("resource limits: serialization failed: {}", e);
                return None;
            }
        }
    }
    Some(rendered.join("---\n"))
}

fn ensure_limits(container: &mut Mapping) -> bool {
    let resources = child_mapping(container, "resources");
    let Some(resources) = resources else { return false };
    let Some(limits) = child_mapping(resources, "limits") else {
        return false;
    };
    let mut inserted = false;
    for (key, default) in [("cpu", DEFAULT_CPU_LIMIT), ("memory", DEFAULT_MEMORY_LIMIT)] {
        if !limits.contains_key(key) {
            limits.insert(Yaml::from(key), Yaml::from(default));
            inserted = true;
        }
    }
    inserted
}

/// Mutable child mapping at `key`, created when absent or null. `None` when
/// the key holds something that is not a mapping.
fn child_mapping<'m>(parent: &'m mut Mapping, key: &str) -> Option<&'m mut Mapping> {
    let needs_init = match parent.get(key) {
        None | Some(Yaml::Null) => true,
        Some(_) => false,
    };
    if needs_init {
        parent.insert(Yaml::from(key), Yaml::Mapping(Mapping::new()));
    }
    parent.get_mut(key).and_then(Yaml::as_mapping_mut)
}
