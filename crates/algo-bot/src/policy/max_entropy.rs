//! Information-gain play with a bounded lookahead.
//!
//! Each of the K most likely attacks is scored by an expected gain that mixes
//! the surprisal of the attack itself, a recursive value of the follow-up
//! position, and what a miss would leak about our own hand. Stopping is scored
//! by what keeping the drawn card closed hides. The search is pruned in breadth
//! (top K), in depth (D), and by a node budget, and the leak estimate is
//! sampled, so the result is a heuristic rather than optimal play.

use super::{DecisionContext, DecisionLog, Policy, fallback, log_decision};
use crate::params::MaxEntropyParams;
use crate::search::SearchBudget;
use algo_core::belief::enumerator::{BeliefState, count_worlds};
use algo_core::belief::estimate_probabilities;
use algo_core::belief::probability::{AttackCandidate, TIE_TOLERANCE, is_certain, top_k};
use algo_core::error::GameError;
use algo_core::game::action::Action;
use algo_core::model::card::{Card, CardId};
use algo_core::model::content::Content;
use algo_core::model::hand::HandView;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::seq::index::sample;
use std::collections::BTreeSet;

/// Mean log-shrink of an opponent's view of our hand once the drawn card is
/// merged opened (`opened`) or closed (`closed`).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SelfInformation {
    pub opened: f64,
    pub closed: f64,
}

#[derive(Debug, Clone)]
pub struct MaxEntropyPolicy {
    params: MaxEntropyParams,
    rng: SmallRng,
    last_estimate: Option<f64>,
}

impl MaxEntropyPolicy {
    pub fn new(params: MaxEntropyParams, seed: u64) -> Self {
        Self {
            params,
            rng: SmallRng::seed_from_u64(seed),
            last_estimate: None,
        }
    }

    pub fn params(&self) -> MaxEntropyParams {
        self.params
    }

    /// Estimates how much our own hand would give away, from sampled opponent seats.
    pub fn self_information(
        &mut self,
        ctx: &DecisionContext<'_>,
        belief: &BeliefState,
    ) -> Result<SelfInformation, GameError> {
        let Some(drawn) = ctx.drawn else {
            return Ok(SelfInformation::default());
        };
        if belief.world_count() == 0 || self.params.entropy_samples == 0 {
            return Ok(SelfInformation::default());
        }

        let simulated = Card::new(CardId::SIMULATED, drawn, ctx.me);
        let (closed_hand, _) = ctx.hand.insert(simulated)?;
        let (opened_hand, _) = ctx.hand.insert(simulated.open()?)?;
        let before = [ctx.own_view()];
        let after_closed = [HandView::of(ctx.me, &closed_hand)];
        let after_opened = [HandView::of(ctx.me, &opened_hand)];

        let picks = self.params.entropy_samples.min(belief.world_count());
        let worlds = sample(&mut self.rng, belief.world_count(), picks);

        let mut opened_sum = 0.0;
        let mut closed_sum = 0.0;
        let mut samples = 0usize;
        for world in worlds.iter() {
            for view in ctx.opponents {
                // What this opponent would know: the table plus its own sampled hand.
                let mut excluded: BTreeSet<Content> = ctx.public.opened.iter().copied().collect();
                excluded.extend(view.opened.iter().map(|slot| slot.content));
                excluded.extend(
                    belief
                        .assignment(world, view.player)
                        .into_iter()
                        .map(|(_, content)| content),
                );

                let base = count_worlds(ctx.rules, &excluded, &before, ctx.history);
                let closed = count_worlds(ctx.rules, &excluded, &after_closed, ctx.history);
                excluded.insert(drawn);
                let opened = count_worlds(ctx.rules, &excluded, &after_opened, ctx.history);
                if base == 0 || closed == 0 || opened == 0 {
                    continue;
                }
                let base = base as f64;
                opened_sum += (base / opened as f64).ln();
                closed_sum += (base / closed as f64).ln();
                samples += 1;
            }
        }
        if samples == 0 {
            return Ok(SelfInformation::default());
        }
        Ok(SelfInformation {
            opened: opened_sum / samples as f64,
            closed: closed_sum / samples as f64,
        })
    }

    fn attack_gain(
        &self,
        belief: &BeliefState,
        candidate: &AttackCandidate,
        info: SelfInformation,
        depth: usize,
        budget: &mut SearchBudget,
    ) -> f64 {
        let descendant = self.descendant_value(belief, candidate, info, depth, budget);
        let p = candidate.probability;
        if is_certain(p) {
            return descendant;
        }
        p * (-p.ln() + descendant) + (1.0 - p) * (-(1.0 - p).ln() - info.opened)
    }

    /// Value of the position reached if `candidate` lands.
    fn descendant_value(
        &self,
        belief: &BeliefState,
        candidate: &AttackCandidate,
        info: SelfInformation,
        depth: usize,
        budget: &mut SearchBudget,
    ) -> f64 {
        budget.tick();
        if depth == 0 || budget.exhausted() {
            return self.params.terminal_bonus;
        }
        let next = belief.resolve(candidate.column, candidate.guess);
        let candidates = estimate_probabilities(&next);
        if candidates.is_empty() || candidates.iter().all(AttackCandidate::is_certain) {
            return self.params.terminal_bonus;
        }
        top_k(&candidates, self.params.branching)
            .iter()
            .map(|follow_up| self.attack_gain(&next, follow_up, info, depth - 1, budget))
            .fold(-info.closed, f64::max)
    }

    /// Gains of the top-K attacks, plus stopping (`None`) when the turn allows it.
    fn score_actions(
        &self,
        belief: &BeliefState,
        candidates: &[AttackCandidate],
        info: SelfInformation,
        can_skip: bool,
        budget: &mut SearchBudget,
    ) -> Vec<(Option<AttackCandidate>, f64)> {
        let mut scored: Vec<(Option<AttackCandidate>, f64)> =
            top_k(candidates, self.params.branching.max(1))
                .into_iter()
                .map(|candidate| {
                    let gain =
                        self.attack_gain(belief, &candidate, info, self.params.depth, budget);
                    (Some(candidate), gain)
                })
                .collect();
        if can_skip {
            scored.push((None, -info.closed));
        }
        scored
    }

    /// Uniform pick among the entries within [`TIE_TOLERANCE`] of the best gain.
    fn pick_best(
        &mut self,
        scored: &[(Option<AttackCandidate>, f64)],
    ) -> Option<Option<AttackCandidate>> {
        let best = scored
            .iter()
            .map(|(_, gain)| *gain)
            .fold(f64::NEG_INFINITY, f64::max);
        let maximizers: Vec<Option<AttackCandidate>> = scored
            .iter()
            .filter(|(_, gain)| best - gain <= TIE_TOLERANCE)
            .map(|(candidate, _)| *candidate)
            .collect();
        maximizers.choose(&mut self.rng).copied()
    }
}

impl Policy for MaxEntropyPolicy {
    fn name(&self) -> &str {
        "max_entropy"
    }

    fn decide(&mut self, ctx: &DecisionContext<'_>) -> Result<Action, GameError> {
        self.last_estimate = None;
        let belief = ctx.belief()?;
        let candidates = estimate_probabilities(&belief);
        if candidates.is_empty() {
            return fallback(ctx);
        }

        if candidates.iter().all(AttackCandidate::is_certain) {
            let Some(choice) = candidates.choose(&mut self.rng).copied() else {
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
                    reason: "certain",
                },
            );
            return Ok(action);
        }

        let info = self.self_information(ctx, &belief)?;
        let mut budget = SearchBudget::new(self.params.node_budget, self.params.time_cap_ms);
        let scored = self.score_actions(&belief, &candidates, info, ctx.can_skip(), &mut budget);
        let Some(choice) = self.pick_best(&scored) else {
            return fallback(ctx);
        };

        let action = match choice {
            Some(candidate) => {
                self.last_estimate = Some(candidate.probability);
                Action::Attack(candidate.attack())
            }
            None => Action::Skip,
        };
        log_decision(
            ctx,
            DecisionLog {
                policy: self.name(),
                action: &action,
                estimate: self.last_estimate,
                worlds: belief.world_count(),
                candidates: candidates.len(),
                nodes: budget.nodes(),
                reason: if budget.exhausted() { "budget" } else { "lookahead" },
            },
        );
        Ok(action)
    }

    fn last_estimate(&self) -> Option<f64> {
        self.last_estimate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::test_support::opening;
    use algo_core::model::color::Color;
    use algo_core::model::rules::Rules;

    fn small_rules() -> Rules {
        Rules {
            min_rank: 0,
            max_rank: 5,
            hand_size: 3,
            ..Rules::default()
        }
    }

    #[test]
    fn first_action_is_an_attack() {
        for seed in 0..6u64 {
            let (game, turn) = opening(small_rules(), seed);
            let opponents = game.opponent_views(game.attacker());
            let ctx = game.context(&turn, &opponents).unwrap();
            let mut policy = MaxEntropyPolicy::new(MaxEntropyParams::default(), seed);
            let action = policy.decide(&ctx).unwrap();
            assert!(action.attack().is_some(), "seed {seed} skipped first");
            assert!(policy.last_estimate().is_some());
        }
    }

    #[test]
    fn same_seed_same_choice() {
        let (game, turn) = opening(small_rules(), 3);
        let opponents = game.opponent_views(game.attacker());
        let ctx = game.context(&turn, &opponents).unwrap();
        let mut a = MaxEntropyPolicy::new(MaxEntropyParams::default(), 77);
        let mut b = MaxEntropyPolicy::new(MaxEntropyParams::default(), 77);
        assert_eq!(a.decide(&ctx).unwrap(), b.decide(&ctx).unwrap());
    }

    #[test]
    fn opening_a_card_never_hides_more_than_keeping_it_closed() {
        let (game, turn) = opening(small_rules(), 8);
        let opponents = game.opponent_views(game.attacker());
        let ctx = game.context(&turn, &opponents).unwrap();
        let belief = ctx.belief().unwrap();
        let mut policy = MaxEntropyPolicy::new(MaxEntropyParams::default(), 1);
        let info = policy.self_information(&ctx, &belief).unwrap();
        assert!(info.opened >= info.closed);
        assert!(info.opened >= 0.0);
    }

    #[test]
    fn no_drawn_card_means_no_leak() {
        let (game, turn) = opening(small_rules(), 8);
        let opponents = game.opponent_views(game.attacker());
        let mut ctx = game.context(&turn, &opponents).unwrap();
        ctx.drawn = None;
        let belief = ctx.belief().unwrap();
        let mut policy = MaxEntropyPolicy::new(MaxEntropyParams::default(), 1);
        assert_eq!(
            policy.self_information(&ctx, &belief).unwrap(),
            SelfInformation::default()
        );
    }

    fn uncertain_candidates(belief: &BeliefState) -> Vec<AttackCandidate> {
        estimate_probabilities(belief)
            .into_iter()
            .filter(|candidate| !candidate.is_certain())
            .collect()
    }

    #[test]
    fn depth_zero_gain_matches_the_closed_form() {
        let (game, turn) = opening(small_rules(), 8);
        let opponents = game.opponent_views(game.attacker());
        let ctx = game.context(&turn, &opponents).unwrap();
        let belief = ctx.belief().unwrap();
        let params = MaxEntropyParams {
            depth: 0,
            terminal_bonus: 0.5,
            ..MaxEntropyParams::default()
        };
        let policy = MaxEntropyPolicy::new(params, 2);
        let info = SelfInformation {
            opened: 0.3,
            closed: 0.1,
        };
        let mut budget = SearchBudget::new(100, None);

        let candidate = uncertain_candidates(&belief)[0];
        let p = candidate.probability;
        let expected = p * (-p.ln() + 0.5) + (1.0 - p) * (-(1.0 - p).ln() - 0.3);
        let gain = policy.attack_gain(&belief, &candidate, info, 0, &mut budget);
        assert!((gain - expected).abs() < 1e-12, "{gain} vs {expected}");

        let certain = AttackCandidate {
            probability: 1.0,
            ..candidate
        };
        let gain = policy.attack_gain(&belief, &certain, info, 0, &mut budget);
        assert!((gain - 0.5).abs() < 1e-12);
    }

    #[test]
    fn fully_determined_hand_is_attacked_correctly() {
        // Four black cards split between two players: the opponent's hand is forced.
        let rules = Rules {
            colors: vec![Color::Black],
            min_rank: 0,
            max_rank: 3,
            hand_size: 2,
            ..Rules::default()
        };
        let (game, turn) = opening(rules, 4);
        assert!(turn.drawn().is_none());
        let opponents = game.opponent_views(game.attacker());
        let ctx = game.context(&turn, &opponents).unwrap();
        let mut policy = MaxEntropyPolicy::new(MaxEntropyParams::default(), 4);

        let action = policy.decide(&ctx).unwrap();
        let attack = action.attack().expect("attack");
        assert_eq!(policy.last_estimate(), Some(1.0));
        let card = game.hands()[attack.target.index()].card(attack.slot).unwrap();
        assert_eq!(card.content(attack.target).unwrap(), attack.guess);
    }

    #[test]
    fn stopping_wins_when_a_closed_card_hides_enough() {
        let (game, turn) = opening(small_rules(), 8);
        let opponents = game.opponent_views(game.attacker());
        let ctx = game.context(&turn, &opponents).unwrap();
        let belief = ctx.belief().unwrap();
        let candidates = uncertain_candidates(&belief);
        let mut policy = MaxEntropyPolicy::new(MaxEntropyParams::default(), 3);
        let info = SelfInformation {
            opened: 0.0,
            closed: -1_000.0,
        };
        let mut budget = SearchBudget::new(10_000, None);

        let scored = policy.score_actions(&belief, &candidates, info, true, &mut budget);
        assert_eq!(scored.last(), Some(&(None, 1_000.0)));
        assert!(
            scored
                .iter()
                .filter(|(attack, _)| attack.is_some())
                .all(|(_, gain)| *gain < 1_000.0)
        );
        assert_eq!(policy.pick_best(&scored), Some(None));
    }

    #[test]
    fn stopping_is_not_scored_before_a_hit() {
        let (game, turn) = opening(small_rules(), 8);
        let opponents = game.opponent_views(game.attacker());
        let ctx = game.context(&turn, &opponents).unwrap();
        assert!(!ctx.can_skip());
        let belief = ctx.belief().unwrap();
        let candidates = uncertain_candidates(&belief);
        let policy = MaxEntropyPolicy::new(MaxEntropyParams::default(), 3);
        let info = SelfInformation {
            opened: 0.0,
            closed: -1_000.0,
        };
        let mut budget = SearchBudget::new(10_000, None);

        let scored =
            policy.score_actions(&belief, &candidates, info, ctx.can_skip(), &mut budget);
        assert!(!scored.is_empty());
        assert!(scored.iter().all(|(attack, _)| attack.is_some()));
    }

    #[test]
    fn tiny_budget_still_decides() {
        let (game, turn) = opening(small_rules(), 5);
        let opponents = game.opponent_views(game.attacker());
        let ctx = game.context(&turn, &opponents).unwrap();
        let params = MaxEntropyParams {
            node_budget: 1,
            ..MaxEntropyParams::default()
        };
        let mut policy = MaxEntropyPolicy::new(params, 5);
        assert!(policy.decide(&ctx).unwrap().attack().is_some());
    }
}
