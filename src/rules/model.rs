//! Redirect rule schema.
//!
//! Rule documents are JSON arrays. Each entry pairs a condition with a
//! redirect target:
//!
//! ```json
//! {
//!   "condition": { "key": { "type": "prefixMatch", "value": "legacy/" } },
//!   "redirect": { "statusCode": 301, "uri": { "path": "/archive/" } }
//! }
//! ```
//!
//! The flattened condition form `{ "type": ..., "value": ... }` is accepted
//! as well. Condition kinds outside `exactMatch`, `prefixMatch` and `regexp`
//! deserialize into [`Condition::Unsupported`] and never match.

use std::sync::Arc;

use axum::http::StatusCode;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

/// Errors raised while turning a JSON document into a [`RuleSet`].
#[derive(Debug, Error)]
pub enum RuleDocumentError {
    #[error("rule document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("rule document has no key `{0}`")]
    MissingKey(String),

    #[error("rule document is not an array (found {0})")]
    NotAnArray(&'static str),

    #[error("rule #{index} is malformed: {source}")]
    InvalidRule {
        index: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// When a rule applies.
#[derive(Debug, Clone)]
pub enum Condition {
    /// Normalized path equals the value.
    ExactMatch(String),
    /// Normalized path starts with the value.
    PrefixMatch(String),
    /// Normalized path matches the pattern. `regex` is `None` when the
    /// pattern failed to compile; such a condition never matches.
    Regexp { pattern: String, regex: Option<Regex> },
    /// Unknown or missing condition type.
    Unsupported { kind: String },
}

impl Condition {
    /// Stable name used in logs and metrics.
    pub fn kind(&self) -> &str {
        match self {
            Condition::ExactMatch(_) => "exactMatch",
            Condition::PrefixMatch(_) => "prefixMatch",
            Condition::Regexp { .. } => "regexp",
            Condition::Unsupported { kind } => kind,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCondition {
    Keyed { key: RawConditionKey },
    Flat(RawConditionKey),
}

#[derive(Deserialize)]
struct RawConditionKey {
    #[serde(rename = "type", default)]
    kind: Option<Value>,
    #[serde(default)]
    value: Option<Value>,
}

impl RawConditionKey {
    fn string_value<E: serde::de::Error>(self, kind: &str) -> Result<String, E> {
        match self.value {
            Some(Value::String(value)) => Ok(value),
            _ => Err(E::custom(format!("`{kind}` condition needs a string value"))),
        }
    }
}

impl<'de> Deserialize<'de> for Condition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let key = match RawCondition::deserialize(deserializer)? {
            RawCondition::Keyed { key } => key,
            RawCondition::Flat(key) => key,
        };

        let kind = match &key.kind {
            Some(Value::String(kind)) => kind.clone(),
            Some(other) => other.to_string(),
            None => String::new(),
        };

        let condition = match kind.as_str() {
            "exactMatch" => Condition::ExactMatch(key.string_value::<D::Error>(&kind)?),
            "prefixMatch" => Condition::PrefixMatch(key.string_value::<D::Error>(&kind)?),
            "regexp" => {
                let pattern = key.string_value::<D::Error>(&kind)?;
                let regex = match Regex::new(&pattern) {
                    Ok(re) => Some(re),
                    Err(e) => {
                        tracing::warn!(pattern = %pattern, error = %e, "Invalid regexp condition, rule disabled");
                        None
                    }
                };
                Condition::Regexp { pattern, regex }
            }
            _ => Condition::Unsupported { kind },
        };
        Ok(condition)
    }
}

/// Where a matched request is sent.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RedirectTarget {
    /// Used verbatim (or as a replacement template for `regexp` rules).
    Uri(String),
    /// Structured target; `origin` falls back to the request origin.
    Location(TargetLocation),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TargetLocation {
    pub path: String,
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub querystring: Option<String>,
}

impl TargetLocation {
    /// Explicit origin, ignoring empty strings.
    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref().filter(|o| !o.is_empty())
    }

    /// Extra query string, ignoring empty strings.
    pub fn querystring(&self) -> Option<&str> {
        self.querystring.as_deref().filter(|q| !q.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Redirect {
    #[serde(rename = "statusCode", deserialize_with = "deserialize_status")]
    pub status_code: StatusCode,
    pub uri: RedirectTarget,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedirectRule {
    pub condition: Condition,
    pub redirect: Redirect,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawStatus {
    Number(u16),
    Text(String),
}

/// Accepts `301` or `"301"`; only 3xx codes are valid redirects.
fn deserialize_status<'de, D: Deserializer<'de>>(deserializer: D) -> Result<StatusCode, D::Error> {
    use serde::de::Error;

    let code = match RawStatus::deserialize(deserializer)? {
        RawStatus::Number(n) => n,
        RawStatus::Text(s) => s
            .trim()
            .parse::<u16>()
            .map_err(|_| D::Error::custom(format!("statusCode `{s}` is not a number")))?,
    };

    match StatusCode::from_u16(code) {
        Ok(status) if status.is_redirection() => Ok(status),
        _ => Err(D::Error::custom(format!("statusCode {code} is not a 3xx redirect"))),
    }
}

/// An ordered, immutable list of redirect rules. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Arc<[RedirectRule]>,
}

impl RuleSet {
    pub fn new(rules: Vec<RedirectRule>) -> Self {
        Self { rules: rules.into() }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a rule document from raw JSON text.
    pub fn from_json_str(text: &str, json_key: Option<&str>) -> Result<Self, RuleDocumentError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_json_value(value, json_key)
    }

    /// Build a rule set from a parsed document, optionally descending into
    /// `json_key` first. The selected value must be an array and every entry
    /// must be a well-formed rule.
    pub fn from_json_value(value: Value, json_key: Option<&str>) -> Result<Self, RuleDocumentError> {
        let value = match json_key.filter(|k| !k.is_empty()) {
            Some(key) => match value {
                Value::Object(mut map) => map
                    .remove(key)
                    .ok_or_else(|| RuleDocumentError::MissingKey(key.to_string()))?,
                _ => return Err(RuleDocumentError::MissingKey(key.to_string())),
            },
            None => value,
        };

        let entries = match value {
            Value::Array(entries) => entries,
            other => return Err(RuleDocumentError::NotAnArray(json_type(&other))),
        };

        let rules = entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| {
                serde_json::from_value(entry)
                    .map_err(|source| RuleDocumentError::InvalidRule { index, source })
            })
            .collect::<Result<Vec<RedirectRule>, _>>()?;

        Ok(Self::new(rules))
    }

    pub fn iter(&self) -> impl Iterator<Item = &RedirectRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
