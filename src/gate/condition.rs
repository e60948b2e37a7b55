use crate::deploy::ProviderSpec;

use super::{BuildFacts, GateOutcome};

/// One AND-ed clause of a gate expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conjunct {
    /// `-z $TRAVIS_PULL_REQUEST`
    NotPullRequest,
    /// `$TRAVIS_BRANCH = a || $TRAVIS_BRANCH = b`
    Branch(Vec<String>),
    /// `-n $TRAVIS_TAG`
    Tag,
    /// User condition text, already grouped when it came from a list.
    Custom(String),
}

impl Conjunct {
    /// Clause text without the surrounding parentheses.
    pub fn expr(&self) -> String {
        match self {
            Conjunct::NotPullRequest => "-z $TRAVIS_PULL_REQUEST".into(),
            Conjunct::Branch(branches) => branches
                .iter()
                .map(|b| format!("$TRAVIS_BRANCH = {b}"))
                .collect::<Vec<_>>()
                .join(" || "),
            Conjunct::Tag => "-n $TRAVIS_TAG".into(),
            Conjunct::Custom(text) => text.clone(),
        }
    }

    /// Condition that holds exactly when this clause fails. Clauses with a
    /// top-level `&&`/`||` are grouped so the `!` covers all of them.
    pub fn negated(&self) -> String {
        let compound = match self {
            Conjunct::NotPullRequest | Conjunct::Tag => false,
            Conjunct::Branch(branches) => branches.len() > 1,
            Conjunct::Custom(text) => has_top_level_operator(text),
        };
        let expr = self.expr();
        if compound {
            format!("(! ({expr}))")
        } else {
            format!("(! {expr})")
        }
    }

    /// The outcome reported when this is the first clause to fail.
    pub fn outcome(&self) -> GateOutcome {
        match self {
            Conjunct::NotPullRequest => GateOutcome::PullRequest,
            Conjunct::Branch(_) => GateOutcome::Branch,
            Conjunct::Tag => GateOutcome::TagMissing,
            Conjunct::Custom(_) => GateOutcome::Condition,
        }
    }

    /// Whether the clause holds for `facts`. Custom conditions can only be
    /// evaluated by the shell, so the caller supplies their result.
    fn holds(&self, facts: &BuildFacts, condition_met: bool) -> bool {
        match self {
            Conjunct::NotPullRequest => !facts.pull_request,
            Conjunct::Branch(branches) => branches.iter().any(|b| *b == facts.branch),
            Conjunct::Tag => facts.has_tag(),
            Conjunct::Custom(_) => condition_met,
        }
    }
}

/// Compiled gate for one provider: an ordered list of conjuncts.
///
/// Order is fixed: pull request, branch, tag, custom condition. The same
/// order decides which skip diagnostic wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gate {
    conjuncts: Vec<Conjunct>,
}

impl Gate {
    /// Compile the gate for `spec`. `default_branch` applies when the
    /// provider names no branches through `on.branch` or an `app` mapping.
    pub fn compile(spec: &ProviderSpec, default_branch: &str) -> Self {
        let mut conjuncts = vec![
            Conjunct::NotPullRequest,
            Conjunct::Branch(allowed_branches(spec, default_branch)),
        ];
        if spec.on.tags {
            conjuncts.push(Conjunct::Tag);
        }
        if let Some(custom) = custom_condition(spec) {
            conjuncts.push(Conjunct::Custom(custom));
        }
        Self { conjuncts }
    }

    pub fn conjuncts(&self) -> &[Conjunct] {
        &self.conjuncts
    }

    /// The shell expression guarding the deploy, e.g.
    /// `(-z $TRAVIS_PULL_REQUEST) && ($TRAVIS_BRANCH = master)`.
    pub fn expression(&self) -> String {
        self.conjuncts
            .iter()
            .map(|c| format!("({})", c.expr()))
            .collect::<Vec<_>>()
            .join(" && ")
    }

    /// Negated condition and skip message for each diagnosable conjunct, in priority order.
    pub fn diagnostics(&self, provider: &str) -> Vec<(String, String)> {
        self.conjuncts
            .iter()
            .filter_map(|c| c.outcome().message(provider).map(|msg| (c.negated(), msg)))
            .collect()
    }

    /// Predict the outcome for `facts`: the first failing conjunct, or `Pass`.
    pub fn classify(&self, facts: &BuildFacts, condition_met: bool) -> GateOutcome {
        self.conjuncts
            .iter()
            .find(|c| !c.holds(facts, condition_met))
            .map_or(GateOutcome::Pass, Conjunct::outcome)
    }
}

fn allowed_branches(spec: &ProviderSpec, default_branch: &str) -> Vec<String> {
    if let Some(explicit) = &spec.on.branch {
        let explicit = explicit.non_empty();
        if !explicit.is_empty() {
            return explicit;
        }
    }
    if !spec.app_branches.is_empty() {
        return spec.app_branches.clone();
    }
    vec![default_branch.to_string()]
}

fn custom_condition(spec: &ProviderSpec) -> Option<String> {
    spec.on.condition.as_ref()?.clause()
}

/// Whether `text` has `&&` or `||` outside quotes and parentheses.
fn has_top_level_operator(text: &str) -> bool {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut prev: Option<char> = None;
    for c in text.chars() {
        if escaped {
            escaped = false;
            prev = None;
            continue;
        }
        match (quote, c) {
            (Some('\''), '\'') => quote = None,
            (Some('\''), _) => {}
            (_, '\\') => escaped = true,
            (Some(_), '"') => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, '&' | '|') if depth == 0 && prev == Some(c) => return true,
            _ => {}
        }
        prev = Some(c);
    }
    false
}
