//! Provider entries: parsing one raw deploy mapping into a [`ProviderSpec`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProviderError;

/// Keys with meaning to the compiler; never forwarded to the deploy tool.
pub const RESERVED_KEYS: &[&str] = &[
    "provider",
    "on",
    "allow_failure",
    "app",
    "before_deploy",
    "after_deploy",
];

/// A raw deploy mapping, keys in declared order.
pub type RawProvider = IndexMap<String, Value>;

/// A list of strings that may also be written as a single string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "OneOrMany")]
pub struct StringList(pub Vec<String>);

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl From<OneOrMany> for StringList {
    fn from(value: OneOrMany) -> Self {
        match value {
            OneOrMany::One(s) => StringList(vec![s]),
            OneOrMany::Many(v) => StringList(v),
        }
    }
}

impl StringList {
    /// Entries with empty strings dropped.
    pub fn non_empty(&self) -> Vec<String> {
        self.0
            .iter()
            .filter(|s| !s.trim().is_empty())
            .cloned()
            .collect()
    }
}

/// A custom `on.condition`: one shell test used verbatim, or a list of
/// tests each grouped and AND-ed. The shape is kept because it changes how
/// the gate renders.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Condition {
    One(String),
    Many(Vec<String>),
}

impl Condition {
    /// The gate clause, or `None` when nothing non-blank was given.
    ///
    /// `"a"` renders `a`; `["a", "b"]` renders `(a) && (b)`; `["a"]` renders `(a)`.
    pub fn clause(&self) -> Option<String> {
        match self {
            Condition::One(text) if text.trim().is_empty() => None,
            Condition::One(text) => Some(text.clone()),
            Condition::Many(items) => {
                let grouped: Vec<String> = items
                    .iter()
                    .filter(|c| !c.trim().is_empty())
                    .map(|c| format!("({c})"))
                    .collect();
                (!grouped.is_empty()).then(|| grouped.join(" && "))
            }
        }
    }
}

/// The `on:` block of a provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct On {
    /// Explicit branch list; overrides `app` keys and the default branch.
    #[serde(default)]
    pub branch: Option<StringList>,
    /// Require a tag to be set.
    #[serde(default)]
    pub tags: bool,
    /// Custom shell condition(s), AND-ed together.
    #[serde(default)]
    pub condition: Option<Condition>,
}

/// One deployment target, normalized and immutable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderSpec {
    pub provider: String,
    /// Deploy-tool parameters in declared order, reserved keys excluded.
    pub params: IndexMap<String, String>,
    pub on: On,
    pub allow_failure: bool,
    /// Keys of an `app:` mapping, in declared order. Empty when `app` is absent or a plain string.
    pub app_branches: Vec<String>,
}

impl ProviderSpec {
    /// Build a spec from a raw mapping. `index` is the entry's position, used in errors.
    pub fn from_mapping(index: usize, raw: &RawProvider) -> Result<Self, ProviderError> {
        let provider = match raw.get("provider") {
            Some(Value::String(p)) if !p.trim().is_empty() => p.clone(),
            _ => return Err(ProviderError::MissingProvider { index }),
        };

        let invalid = |key: &str, reason: String| ProviderError::InvalidField {
            index,
            provider: provider.clone(),
            key: key.into(),
            reason,
        };

        let on = match raw.get("on") {
            None | Some(Value::Null) => On::default(),
            Some(v) => On::deserialize(v).map_err(|e| invalid("on", e.to_string()))?,
        };

        let allow_failure = match raw.get("allow_failure") {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(other) => return Err(invalid("allow_failure", format!("expected a boolean, got {other}"))),
        };

        let app_branches = match raw.get("app") {
            Some(Value::Object(apps)) => apps.keys().cloned().collect(),
            _ => Vec::new(),
        };

        let params = raw
            .iter()
            .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()))
            .filter_map(|(key, value)| param_value(value).map(|v| (key.clone(), v)))
            .collect();

        Ok(Self {
            provider,
            params,
            on,
            allow_failure,
            app_branches,
        })
    }
}

/// Text passed to the deploy tool for a parameter value; `None` drops the parameter.
fn param_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Scripts taken from a raw mapping under `key` (string or list), if well-formed.
pub(crate) fn scripts_in(raw: &RawProvider, key: &str) -> Vec<String> {
    raw.get(key)
        .and_then(|v| StringList::deserialize(v).ok())
        .map(|list| list.0)
        .unwrap_or_default()
}
