use super::{DecisionContext, DecisionLog, Policy, fallback, log_decision};
use crate::params::MaxProbabilityParams;
use algo_core::belief::estimate_probabilities;
use algo_core::belief::probability::most_likely;
use algo_core::error::GameError;
use algo_core::game::action::Action;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Attacks the most likely (slot, guess) pair; after a success, stops with
/// probability epsilon.
#[derive(Debug, Clone)]
pub struct MaxProbabilityPolicy {
    params: MaxProbabilityParams,
    rng: SmallRng,
    last_estimate: Option<f64>,
}

impl MaxProbabilityPolicy {
    pub fn new(params: MaxProbabilityParams, seed: u64) -> Self {
        Self {
            params,
            rng: SmallRng::seed_from_u64(seed),
            last_estimate: None,
        }
    }

    pub fn params(&self) -> MaxProbabilityParams {
        self.params
    }
}

impl Policy for MaxProbabilityPolicy {
    fn name(&self) -> &str {
        "max_probability"
    }

    fn decide(&mut self, ctx: &DecisionContext<'_>) -> Result<Action, GameError> {
        self.last_estimate = None;
        if ctx.has_succeeded && self.rng.gen_bool(self.params.epsilon.clamp(0.0, 1.0)) {
            let action = Action::Skip;
            log_decision(
                ctx,
                DecisionLog {
                    policy: self.name(),
                    action: &action,
                    estimate: None,
                    worlds: 0,
                    candidates: 0,
                    nodes: 0,
                    reason: "explore",
                },
            );
            return Ok(action);
        }

        let belief = ctx.belief()?;
        let candidates = estimate_probabilities(&belief);
        let best = most_likely(&candidates);
        let Some(choice) = best.choose(&mut self.rng).copied() else {
            return fallback(ctx);
        };

        let action = Action::Attack(choice.attack());
        self.last_estimate = Some(choice.probability);
        log_decision(
            ctx,
            DecisionLog {
                policy: self.name(),
                action: &action,
                estimate: self.last_estimate,
                worlds: belief.world_count(),
                candidates: candidates.len(),
                nodes: 0,
                reason: "argmax",
            },
        );
        Ok(action)
    }

    fn last_estimate(&self) -> Option<f64> {
        self.last_estimate
    }
}
