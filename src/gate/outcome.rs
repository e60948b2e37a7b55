/// Why a provider's gate let the deploy through or not.
///
/// Variants are listed in diagnostic priority order: when several conjuncts
/// fail, the earliest one decides the outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum GateOutcome {
    Pass,
    PullRequest,
    Branch,
    TagMissing,
    Condition,
}

impl GateOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            GateOutcome::Pass => "pass",
            GateOutcome::PullRequest => "pull_request",
            GateOutcome::Branch => "branch",
            GateOutcome::TagMissing => "tag_missing",
            GateOutcome::Condition => "condition",
        }
    }

    /// Reason clause for the skip message. `None` means the skip is silent.
    pub fn skip_reason(self) -> Option<&'static str> {
        match self {
            GateOutcome::PullRequest => Some("the current build is a pull request"),
            GateOutcome::Branch => Some("this branch is not permitted to deploy as per configuration"),
            GateOutcome::Condition => Some("a custom condition was not met"),
            GateOutcome::Pass | GateOutcome::TagMissing => None,
        }
    }

    /// Message echoed when a deploy with `provider` is skipped for this reason.
    pub fn message(self, provider: &str) -> Option<String> {
        self.skip_reason().map(|reason| {
            format!("Skipping deployment with the {provider} provider because {reason}.")
        })
    }
}
