//! Deploy-tool invocations for a provider.

use crate::config::Config;

use super::ProviderSpec;

/// Builds the install and deploy command lines.
#[derive(Debug, Clone)]
pub struct CommandCompiler {
    selector: String,
    tool: String,
    installer: String,
    flags: Vec<String>,
}

impl CommandCompiler {
    pub fn from_config(config: &Config) -> Self {
        Self {
            selector: config.runtime.selector.clone(),
            tool: config.tool.name.clone(),
            installer: config.tool.installer.clone(),
            flags: config.tool.flags.clone(),
        }
    }

    /// Install the deploy tool under the selected runtime. Provider parameters play no part.
    pub fn install(&self) -> String {
        self.prefixed(&self.installer)
    }

    /// `<selector> <tool> --provider="p" --key="value"... <flags>`
    pub fn deploy(&self, spec: &ProviderSpec) -> String {
        let mut words = vec![self.tool.clone(), option("provider", &spec.provider)];
        words.extend(spec.params.iter().map(|(k, v)| option(k, v)));
        words.extend(self.flags.iter().cloned());
        self.prefixed(&words.join(" "))
    }

    fn prefixed(&self, command: &str) -> String {
        if self.selector.is_empty() {
            command.to_string()
        } else {
            format!("{} {command}", self.selector)
        }
    }
}

/// Values are wrapped in double quotes as-is.
fn option(key: &str, value: &str) -> String {
    format!("--{key}=\"{value}\"")
}
