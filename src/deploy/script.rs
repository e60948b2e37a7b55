//! Assembles the gated script block for one provider.

use crate::gate::Gate;
use crate::shell::{CmdOptions, Color, Node};

use super::{CommandCompiler, ProviderSpec, Scripts};

const FAILED_TO_DEPLOY: &str = "Failed to deploy.";

/// Builds `If(gate, then = deploy steps, else = skip diagnostics)` per provider.
pub struct ScriptAssembler<'a> {
    commands: &'a CommandCompiler,
    scripts: &'a Scripts,
    terminate_code: i32,
}

impl<'a> ScriptAssembler<'a> {
    pub fn new(commands: &'a CommandCompiler, scripts: &'a Scripts, terminate_code: i32) -> Self {
        Self {
            commands,
            scripts,
            terminate_code,
        }
    }

    pub fn assemble(&self, spec: &ProviderSpec, gate: &Gate) -> Node {
        Node::if_then(
            gate.expression(),
            self.deploy_steps(spec),
            diagnostics(gate, &spec.provider).map(|chain| vec![chain]),
        )
    }

    /// before scripts, install, deploy, failure guard, after scripts.
    fn deploy_steps(&self, spec: &ProviderSpec) -> Vec<Node> {
        let mut steps: Vec<Node> = self
            .scripts
            .before_deploy
            .iter()
            .map(|s| Node::cmd(s.as_str(), CmdOptions::SCRIPT))
            .collect();
        steps.push(Node::cmd(self.commands.install(), CmdOptions::TOOL));
        steps.push(Node::cmd(self.commands.deploy(spec), CmdOptions::TOOL));
        if !spec.allow_failure {
            steps.push(self.terminate_on_failure());
        }
        steps.extend(
            self.scripts
                .after_deploy
                .iter()
                .map(|s| Node::cmd(s.as_str(), CmdOptions::SCRIPT)),
        );
        steps
    }

    fn terminate_on_failure(&self) -> Node {
        Node::if_then(
            "$? -ne 0",
            vec![
                Node::echo(FAILED_TO_DEPLOY, Some(Color::Red)),
                Node::cmd(
                    format!("travis_terminate {}", self.terminate_code),
                    CmdOptions::default(),
                ),
            ],
            None,
        )
    }
}

/// Nested ifs over the negated conjuncts: the first failing clause echoes its message.
fn diagnostics(gate: &Gate, provider: &str) -> Option<Node> {
    gate.diagnostics(provider)
        .into_iter()
        .rev()
        .fold(None::<Node>, |inner, (negated, message)| {
            Some(Node::if_then(
                negated,
                vec![Node::echo(message, Some(Color::Red))],
                inner.map(|n| vec![n]),
            ))
        })
}
