//! Deploy addon: compiles every configured provider into a gated script block.
//!
//! For each provider, in declared order:
//! 1. [`ProviderSpec::from_mapping`] validates and normalizes the raw mapping.
//! 2. [`Gate::compile`] derives the conjuncts guarding the deploy.
//! 3. [`ScriptAssembler`] builds the `If` node, with commands from [`CommandCompiler`].
//! 4. The node is appended to the caller's [`Builder`].

/// Install and deploy command lines.
pub mod command;
/// Raw mapping parsing and the normalized provider type.
pub mod provider;
/// Per-provider `If` node with skip diagnostics.
pub mod script;

pub use command::CommandCompiler;
pub use provider::{Condition, On, ProviderSpec, RawProvider, StringList};
pub use script::ScriptAssembler;

use serde::Deserialize;
use serde_json::Value;

use crate::config::Config;
use crate::error::{DeployError, DeployResult, ProviderError};
use crate::gate::{BuildFacts, Gate};
use crate::shell::Builder;

/// User scripts run around the deploy command, shared by every provider block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scripts {
    pub before_deploy: Vec<String>,
    pub after_deploy: Vec<String>,
}

/// The document the CLI reads: deploy config, shared scripts and build facts.
#[derive(Debug, Deserialize)]
pub struct DeployInput {
    pub deploy: Value,
    #[serde(default)]
    pub before_deploy: StringList,
    #[serde(default)]
    pub after_deploy: StringList,
    #[serde(default)]
    pub build: BuildFacts,
}

impl DeployInput {
    pub fn from_json(json: &str) -> DeployResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Normalize a deploy value (one mapping or a list) into raw provider mappings.
///
/// List entries that are not mappings are kept as empty mappings so they
/// fail provider validation at their own index.
pub fn normalize(deploy: &Value) -> DeployResult<Vec<RawProvider>> {
    let to_raw = |v: &Value| -> RawProvider {
        match v {
            Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            _ => RawProvider::new(),
        }
    };
    match deploy {
        Value::Object(_) => Ok(vec![to_raw(deploy)]),
        Value::Array(entries) => Ok(entries.iter().map(to_raw).collect()),
        other => Err(DeployError::Shape {
            found: json_kind(other).into(),
        }),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

/// Drives compilation of a whole deploy configuration.
pub struct DeployAddon<'a> {
    config: &'a Config,
    providers: Vec<Result<ProviderSpec, ProviderError>>,
    scripts: Scripts,
    facts: BuildFacts,
}

impl<'a> DeployAddon<'a> {
    /// Validates every entry up front. `scripts` are the top-level
    /// before/after lists; scripts found inside valid provider mappings are
    /// appended to them in provider order. Rejected entries contribute none.
    pub fn new(config: &'a Config, raws: Vec<RawProvider>, mut scripts: Scripts, facts: BuildFacts) -> Self {
        let providers = raws
            .iter()
            .enumerate()
            .map(|(index, raw)| -> Result<ProviderSpec, ProviderError> {
                let spec = ProviderSpec::from_mapping(index, raw)?;
                scripts
                    .before_deploy
                    .extend(provider::scripts_in(raw, "before_deploy"));
                scripts
                    .after_deploy
                    .extend(provider::scripts_in(raw, "after_deploy"));
                Ok(spec)
            })
            .collect();
        Self {
            config,
            providers,
            scripts,
            facts,
        }
    }

    /// Build an addon from a parsed input document.
    pub fn from_input(config: &'a Config, input: DeployInput) -> DeployResult<Self> {
        let providers = normalize(&input.deploy)?;
        let scripts = Scripts {
            before_deploy: input.before_deploy.0,
            after_deploy: input.after_deploy.0,
        };
        Ok(Self::new(config, providers, scripts, input.build))
    }

    pub fn scripts(&self) -> &Scripts {
        &self.scripts
    }

    /// Compile every provider and append its block to `sh`.
    ///
    /// Invalid entries emit nothing; the others are still appended in order.
    /// Returns the number of blocks appended, or every rejected entry.
    pub fn deploy(&self, sh: &mut Builder) -> DeployResult<usize> {
        let commands = CommandCompiler::from_config(self.config);
        let assembler = ScriptAssembler::new(&commands, &self.scripts, self.config.tool.terminate_code);

        let mut emitted = 0;
        let mut errors: Vec<ProviderError> = Vec::new();

        for (index, entry) in self.providers.iter().enumerate() {
            let spec = match entry {
                Ok(spec) => spec,
                Err(e) => {
                    log::warn!("skipping {e}");
                    errors.push(e.clone());
                    continue;
                }
            };

            let gate = Gate::compile(spec, &self.config.settings.default_branch);
            log::info!("deploy[{index}] {}: if {}", spec.provider, gate.expression());
            log::debug!(
                "deploy[{index}] {}: predicted {} on branch {}",
                spec.provider,
                gate.classify(&self.facts, true).as_str(),
                self.facts.branch
            );

            sh.append(assembler.assemble(spec, &gate));
            emitted += 1;
        }

        if errors.is_empty() {
            Ok(emitted)
        } else {
            Err(DeployError::Providers(errors))
        }
    }
}
