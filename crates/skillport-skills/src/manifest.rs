//! Manifest validation.
//!
//! `manifest.json` comes from a host we do not control, so it is checked
//! structurally before any field is trusted.  Checks run in a fixed order and
//! the first violation is returned; there is no best-effort manifest.
//!
//! Rule paths get special attention: any `..` or a leading `/` would let a
//! manifest point rule downloads anywhere, so such entries reject the whole
//! manifest.

use serde_json::{Map, Value};

use crate::error::ManifestError;
use crate::types::Manifest;

/// Validate an untrusted JSON document into a [`Manifest`].
///
/// Unknown fields are preserved; valid fields are neither reordered nor
/// rewritten.  Optional fields outside the checks below never fail
/// validation: a value of the wrong type reads as the field's default.
pub fn validate_manifest(data: Value) -> Result<Manifest, ManifestError> {
    let Value::Object(obj) = &data else {
        return Err(ManifestError::NotAnObject);
    };

    let Some(Value::Array(skills)) = obj.get("skills") else {
        return Err(ManifestError::MissingSkills);
    };

    for (index, raw) in skills.iter().enumerate() {
        validate_skill(index, raw)?;
    }

    serde_json::from_value(data).map_err(|e| ManifestError::Malformed(e.to_string()))
}

/// Parse manifest text and validate it.
pub fn parse_manifest(text: &str) -> Result<Manifest, ManifestError> {
    let value: Value = serde_json::from_str(text).map_err(|_| ManifestError::NotAnObject)?;
    validate_manifest(value)
}

/// Whether a rule path could escape the skill directory.  Any `..` is
/// rejected, not only whole segments.
pub fn is_suspicious_rule_path(path: &str) -> bool {
    path.starts_with('/') || path.starts_with('\\') || path.contains("..")
}

fn validate_skill(index: usize, raw: &Value) -> Result<(), ManifestError> {
    let Value::Object(skill) = raw else {
        return Err(ManifestError::BadSkillShape { index });
    };

    let id = require_fields(index, skill)?;

    if let Some(rules) = skill.get("rules") {
        validate_rule_paths(id, rules)?;
    }

    Ok(())
}

fn require_fields(index: usize, skill: &Map<String, Value>) -> Result<&str, ManifestError> {
    let id = match skill.get("id") {
        Some(Value::String(id)) if !id.is_empty() => id.as_str(),
        _ => return Err(ManifestError::MissingId { index }),
    };
    if !matches!(skill.get("name"), Some(Value::String(_))) {
        return Err(ManifestError::MissingName { id: id.to_owned() });
    }
    if !matches!(skill.get("version"), Some(Value::String(_))) {
        return Err(ManifestError::MissingVersion { id: id.to_owned() });
    }
    Ok(id)
}

fn validate_rule_paths(id: &str, rules: &Value) -> Result<(), ManifestError> {
    let Value::Array(rules) = rules else {
        return Err(ManifestError::RulesNotArray { id: id.to_owned() });
    };

    for rule in rules {
        let Value::String(path) = rule else {
            return Err(ManifestError::RuleNotString { id: id.to_owned() });
        };
        if is_suspicious_rule_path(path) {
            return Err(ManifestError::SuspiciousRulePath {
                id: id.to_owned(),
                path: path.clone(),
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
