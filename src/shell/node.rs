//! Script tree produced by the deploy compiler and consumed by a text renderer.

use serde_json::{Value, json};

/// ANSI color applied to an echoed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
}

impl Color {
    pub fn as_str(self) -> &'static str {
        match self {
            Color::Red => "red",
        }
    }
}

/// Rendering options for a single command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CmdOptions {
    /// Abort the build when the command exits non-zero.
    pub assert: bool,
    /// Print the command before running it.
    pub echo: bool,
    /// Wrap the command in timing markers.
    pub timing: bool,
}

impl CmdOptions {
    /// Asserted, echoed and timed: used for user-supplied scripts.
    pub const SCRIPT: CmdOptions = CmdOptions {
        assert: true,
        echo: true,
        timing: true,
    };

    /// Asserted and timed, not echoed: used for tool invocations.
    pub const TOOL: CmdOptions = CmdOptions {
        assert: true,
        echo: false,
        timing: true,
    };

    fn to_sexp(self) -> Option<Value> {
        let mut opts = serde_json::Map::new();
        if self.assert {
            opts.insert("assert".into(), Value::Bool(true));
        }
        if self.echo {
            opts.insert("echo".into(), Value::Bool(true));
        }
        if self.timing {
            opts.insert("timing".into(), Value::Bool(true));
        }
        (!opts.is_empty()).then_some(Value::Object(opts))
    }
}

/// A node in the script tree.
///
/// `then` and `otherwise` of an `If` are always [`Node::Cmds`] when built by
/// this crate, so renderers can treat them as blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    If {
        condition: String,
        then: Box<Node>,
        otherwise: Option<Box<Node>>,
    },
    Cmds(Vec<Node>),
    Cmd {
        text: String,
        options: CmdOptions,
    },
    Echo {
        text: String,
        color: Option<Color>,
    },
}

impl Node {
    pub fn cmd(text: impl Into<String>, options: CmdOptions) -> Self {
        Node::Cmd {
            text: text.into(),
            options,
        }
    }

    pub fn echo(text: impl Into<String>, color: Option<Color>) -> Self {
        Node::Echo {
            text: text.into(),
            color,
        }
    }

    /// Build an `If` whose branches are wrapped in `Cmds` blocks.
    pub fn if_then(condition: impl Into<String>, then: Vec<Node>, otherwise: Option<Vec<Node>>) -> Self {
        Node::If {
            condition: condition.into(),
            then: Box::new(Node::Cmds(then)),
            otherwise: otherwise.map(|nodes| Box::new(Node::Cmds(nodes))),
        }
    }

    /// Direct children of this node, in order.
    pub fn children(&self) -> Vec<&Node> {
        match self {
            Node::If {
                then, otherwise, ..
            } => std::iter::once(&**then)
                .chain(otherwise.as_deref())
                .collect(),
            Node::Cmds(nodes) => nodes.iter().collect(),
            Node::Cmd { .. } | Node::Echo { .. } => Vec::new(),
        }
    }

    /// Depth-first search for the first `If` with exactly this condition.
    pub fn find_if(&self, condition: &str) -> Option<&Node> {
        if let Node::If { condition: c, .. } = self
            && c == condition
        {
            return Some(self);
        }
        self.children()
            .into_iter()
            .find_map(|child| child.find_if(condition))
    }

    /// Whether `needle` occurs anywhere in this subtree (including the node itself).
    pub fn contains(&self, needle: &Node) -> bool {
        self == needle || self.children().into_iter().any(|c| c.contains(needle))
    }

    /// The `else` block of an `If`, if any.
    pub fn otherwise(&self) -> Option<&Node> {
        match self {
            Node::If { otherwise, .. } => otherwise.as_deref(),
            _ => None,
        }
    }

    /// Export as an s-expression made of JSON arrays:
    /// `["if", cond, ["then", ...], ["else", ...]]`, `["cmds", [...]]`,
    /// `["cmd", text, {opts}]`, `["echo", text, {"ansi": color}]`.
    pub fn to_sexp(&self) -> Value {
        match self {
            Node::If {
                condition,
                then,
                otherwise,
            } => {
                let mut sexp = vec![json!("if"), json!(condition), json!(["then", then.to_sexp()])];
                if let Some(otherwise) = otherwise {
                    sexp.push(json!(["else", otherwise.to_sexp()]));
                }
                Value::Array(sexp)
            }
            Node::Cmds(nodes) => {
                json!(["cmds", nodes.iter().map(Node::to_sexp).collect::<Vec<_>>()])
            }
            Node::Cmd { text, options } => match options.to_sexp() {
                Some(opts) => json!(["cmd", text, opts]),
                None => json!(["cmd", text]),
            },
            Node::Echo { text, color } => match color {
                Some(color) => json!(["echo", text, { "ansi": color.as_str() }]),
                None => json!(["echo", text]),
            },
        }
    }
}
