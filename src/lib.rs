//! deploy-gate: compiles CI deploy configuration into gated shell script trees.
//!
//! A deploy configuration names one or more providers. Each provider becomes
//! one `if` block: the condition is a gate expression built from implicit
//! rules (no pull requests, allowed branches) and the provider's `on:` block
//! (tags, custom conditions); the body installs and runs the deploy tool
//! between the user's before/after scripts; the `else` branch explains, in a
//! fixed priority order, why the deploy was skipped.
//!
//! # Architecture
//!
//! - **[`gate`]**: Condition compiler: build facts, conjuncts, gate expression, outcome classification.
//! - **[`deploy`]**: Provider parsing, command compiler, script assembler, addon driver.
//! - **[`shell`]**: Script tree nodes and the append-only builder.
//! - **[`config`]**: Tool configuration: embedded defaults + user overlay merge.
//! - **[`logging`]**: `simplelog` setup for the CLI.

/// Tool configuration, loading, and overlay merge logic.
pub mod config;
/// Provider compilation and the deploy addon driver.
pub mod deploy;
/// Error types.
pub mod error;
/// Gate expressions and skip classification.
pub mod gate;
/// Logger initialization.
pub mod logging;
/// Script tree and builder.
pub mod shell;

pub use error::{DeployError, ProviderError};

use deploy::{DeployAddon, DeployInput};
use shell::Builder;

/// Compile an input document with the default configuration.
///
/// This is the main entry point for tests and simple usage. Any rejected
/// provider makes the whole call fail; use [`DeployAddon`] directly to keep
/// the blocks of the valid providers.
pub fn compile(input: DeployInput) -> Result<Builder, DeployError> {
    let config = config::Config::default_config();
    let addon = DeployAddon::from_input(&config, input)?;
    let mut sh = Builder::new();
    addon.deploy(&mut sh)?;
    Ok(sh)
}

/// [`compile`] from a JSON document.
pub fn compile_json(json: &str) -> Result<Builder, DeployError> {
    compile(DeployInput::from_json(json)?)
}
