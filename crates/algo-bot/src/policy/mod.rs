mod human;
mod max_entropy;
mod max_probability;

pub use human::{HumanPolicy, render_view};
pub use max_entropy::{MaxEntropyPolicy, SelfInformation};
pub use max_probability::MaxProbabilityPolicy;

pub use algo_core::game::policy::{DecisionContext, Policy};

use crate::params::{MaxEntropyParams, MaxProbabilityParams};
use algo_core::error::{GameError, ProtocolViolation};
use algo_core::game::action::Action;
use tracing::{Level, event};

/// Automated strategies that can be built from configuration alone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PolicySpec {
    MaxProbability(MaxProbabilityParams),
    MaxEntropy(MaxEntropyParams),
}

impl PolicySpec {
    pub fn label(&self) -> &'static str {
        match self {
            PolicySpec::MaxProbability(_) => "max_probability",
            PolicySpec::MaxEntropy(_) => "max_entropy",
        }
    }

    /// Applies `ALGO_*` overrides read through `read` to whichever params this spec holds.
    pub fn with_overrides<F>(self, read: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        match self {
            PolicySpec::MaxProbability(params) => {
                PolicySpec::MaxProbability(params.with_overrides(read))
            }
            PolicySpec::MaxEntropy(params) => PolicySpec::MaxEntropy(params.with_overrides(read)),
        }
    }

    pub fn validate(&self) -> Result<(), GameError> {
        match self {
            PolicySpec::MaxProbability(params) => params.validate(),
            PolicySpec::MaxEntropy(params) => params.validate(),
        }
    }

    /// A fresh policy whose random choices are driven by `seed`.
    pub fn spawn(&self, seed: u64) -> Box<dyn Policy> {
        match self {
            PolicySpec::MaxProbability(params) => {
                Box::new(MaxProbabilityPolicy::new(*params, seed))
            }
            PolicySpec::MaxEntropy(params) => Box::new(MaxEntropyPolicy::new(*params, seed)),
        }
    }
}

/// What to do when no attack is available: stop if allowed, otherwise it is a bug.
pub(crate) fn fallback(ctx: &DecisionContext<'_>) -> Result<Action, GameError> {
    if ctx.can_skip() {
        Ok(Action::Skip)
    } else {
        Err(ProtocolViolation::NoLegalAttack { player: ctx.me }.into())
    }
}

pub(crate) struct DecisionLog<'a> {
    pub policy: &'a str,
    pub action: &'a Action,
    pub estimate: Option<f64>,
    pub worlds: usize,
    pub candidates: usize,
    pub nodes: usize,
    pub reason: &'a str,
}

pub(crate) fn log_decision(ctx: &DecisionContext<'_>, log: DecisionLog<'_>) {
    if !tracing::enabled!(target: "algo_bot::decide", Level::DEBUG) {
        return;
    }
    let action = log.action.to_string();
    event!(
        target: "algo_bot::decide",
        Level::DEBUG,
        policy = log.policy,
        player = ctx.me.index(),
        turn = ctx.public.turn,
        has_succeeded = ctx.has_succeeded,
        drawn = ctx.drawn.is_some(),
        worlds = log.worlds,
        candidates = log.candidates,
        nodes = log.nodes,
        estimate = ?log.estimate,
        action = %action,
        reason = log.reason,
    );
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::test_support::opening;
    use algo_core::model::rules::Rules;

    #[test]
    fn spec_spawns_named_policies() {
        let specs = [
            PolicySpec::MaxProbability(MaxProbabilityParams::default()),
            PolicySpec::MaxEntropy(MaxEntropyParams::default()),
        ];
        for spec in specs {
            spec.validate().unwrap();
            assert_eq!(spec.spawn(1).name(), spec.label());
        }
    }

    #[test]
    fn overrides_reach_the_wrapped_params() {
        let read = |key: &str| (key == "ALGO_DEPTH").then(|| "3".to_string());
        let spec = PolicySpec::MaxEntropy(MaxEntropyParams::default()).with_overrides(read);
        assert!(matches!(spec, PolicySpec::MaxEntropy(params) if params.depth == 3));

        let spec = PolicySpec::MaxProbability(MaxProbabilityParams::default()).with_overrides(read);
        assert_eq!(spec, PolicySpec::MaxProbability(MaxProbabilityParams::default()));
    }

    #[test]
    fn fallback_never_skips_before_success() {
        let (game, turn) = opening(Rules::default(), 4);
        let opponents = game.opponent_views(game.attacker());
        let ctx = game.context(&turn, &opponents).unwrap();
        assert!(fallback(&ctx).unwrap_err().is_protocol());
    }
}
