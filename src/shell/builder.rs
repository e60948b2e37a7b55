use serde_json::{Value, json};

use super::node::{CmdOptions, Color, Node};

/// Append-only collector of top-level script nodes.
///
/// The compiler only ever appends; once a node is handed over it is not
/// touched again. Rendering to shell text happens elsewhere.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Builder {
    nodes: Vec<Node>,
}

impl Builder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, node: Node) {
        self.nodes.push(node);
    }

    pub fn cmd(&mut self, text: impl Into<String>, options: CmdOptions) {
        self.append(Node::cmd(text, options));
    }

    pub fn echo(&mut self, text: impl Into<String>, color: Option<Color>) {
        self.append(Node::echo(text, color));
    }

    pub fn if_then(&mut self, condition: impl Into<String>, then: Vec<Node>, otherwise: Option<Vec<Node>>) {
        self.append(Node::if_then(condition, then, otherwise));
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn into_nodes(self) -> Vec<Node> {
        self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// First `If` anywhere in the script with exactly this condition.
    pub fn find_if(&self, condition: &str) -> Option<&Node> {
        self.nodes.iter().find_map(|n| n.find_if(condition))
    }

    /// Whether `needle` occurs anywhere in the script.
    pub fn contains(&self, needle: &Node) -> bool {
        self.nodes.iter().any(|n| n.contains(needle))
    }

    /// The whole script as `["cmds", [...]]`.
    pub fn to_sexp(&self) -> Value {
        json!(["cmds", self.nodes.iter().map(Node::to_sexp).collect::<Vec<_>>()])
    }
}
