use serde::{Deserialize, Serialize};

/// Facts about the build being compiled for, supplied by the caller.
///
/// The compiled script re-checks all of these in the shell; here they only
/// drive the predicted outcome that gets logged.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BuildFacts {
    /// Currently checked-out branch.
    #[serde(default = "default_branch")]
    pub branch: String,
    /// Whether the build is for a pull request.
    #[serde(default)]
    pub pull_request: bool,
    /// Tag being built, if any.
    #[serde(default)]
    pub tag: Option<String>,
}

fn default_branch() -> String {
    "master".into()
}

impl Default for BuildFacts {
    fn default() -> Self {
        Self::push(default_branch())
    }
}

impl BuildFacts {
    /// A plain push build on `branch`.
    pub fn push(branch: impl Into<String>) -> Self {
        Self {
            branch: branch.into(),
            pull_request: false,
            tag: None,
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn as_pull_request(mut self) -> Self {
        self.pull_request = true;
        self
    }

    pub fn has_tag(&self) -> bool {
        self.tag.as_deref().is_some_and(|t| !t.is_empty())
    }
}
