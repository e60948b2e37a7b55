//! Error types for deploy configuration compilation.

use thiserror::Error;

/// A single provider entry that could not be compiled.
///
/// Nothing is emitted for the entry; other entries are unaffected.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// The entry has no usable `provider` key.
    #[error("deploy entry {index}: missing required `provider` key")]
    MissingProvider { index: usize },

    /// A reserved key holds a value of the wrong shape.
    #[error("deploy entry {index} ({provider}): invalid `{key}`: {reason}")]
    InvalidField {
        index: usize,
        provider: String,
        key: String,
        reason: String,
    },
}

impl ProviderError {
    /// Position of the offending entry in the declared provider list.
    pub fn index(&self) -> usize {
        match self {
            ProviderError::MissingProvider { index } | ProviderError::InvalidField { index, .. } => *index,
        }
    }
}

/// Errors produced while compiling a deploy configuration.
#[derive(Debug, Error)]
pub enum DeployError {
    /// The deploy value is neither a mapping nor a list of mappings.
    #[error("deploy configuration must be a mapping or a list of mappings, got {found}")]
    Shape { found: String },

    /// The input document could not be parsed.
    #[error("invalid deploy input: {0}")]
    Input(#[from] serde_json::Error),

    /// One or more provider entries were rejected; the rest were compiled.
    #[error("{}", summarize(.0))]
    Providers(Vec<ProviderError>),
}

fn summarize(errors: &[ProviderError]) -> String {
    let noun = if errors.len() == 1 { "entry" } else { "entries" };
    let details: Vec<String> = errors.iter().map(ToString::to_string).collect();
    format!("{} deploy {noun} rejected: {}", errors.len(), details.join("; "))
}

/// Convenience result alias.
pub type DeployResult<T> = std::result::Result<T, DeployError>;
