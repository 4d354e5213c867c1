//! Marginal success probabilities for every (closed slot, guess) pair.

use super::enumerator::BeliefState;
use crate::game::action::Attack;
use crate::model::card::CardId;
use crate::model::content::Content;
use crate::model::player::PlayerId;
use std::collections::BTreeMap;

/// Probabilities closer than this are treated as tied when ranking attacks.
pub const TIE_TOLERANCE: f64 = 1e-4;

const CERTAINTY_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackCandidate {
    /// Column of the slot inside the belief state's worlds.
    pub column: usize,
    pub target: PlayerId,
    pub slot: usize,
    pub card_id: CardId,
    pub guess: Content,
    pub probability: f64,
}

impl AttackCandidate {
    pub fn attack(&self) -> Attack {
        Attack {
            target: self.target,
            slot: self.slot,
            guess: self.guess,
        }
    }

    pub fn is_certain(&self) -> bool {
        is_certain(self.probability)
    }
}

pub fn is_certain(probability: f64) -> bool {
    (probability - 1.0).abs() <= CERTAINTY_TOLERANCE
}

/// One candidate per (slot, content) with non-zero support, ordered by column
/// then content. Probabilities for each slot sum to 1.
pub fn estimate_probabilities(belief: &BeliefState) -> Vec<AttackCandidate> {
    let total = belief.world_count();
    if total == 0 {
        return Vec::new();
    }
    let total = total as f64;

    let mut candidates = Vec::new();
    for (column, slot_ref) in belief.slots().iter().enumerate() {
        let mut counts: BTreeMap<Content, usize> = BTreeMap::new();
        for world in belief.worlds() {
            if let Some(content) = world.get(column) {
                *counts.entry(*content).or_insert(0) += 1;
            }
        }
        candidates.extend(counts.into_iter().map(|(guess, count)| AttackCandidate {
            column,
            target: slot_ref.player,
            slot: slot_ref.slot,
            card_id: slot_ref.card_id,
            guess,
            probability: count as f64 / total,
        }));
    }
    candidates
}

/// Candidates whose probability is within [`TIE_TOLERANCE`] of the best one.
pub fn most_likely(candidates: &[AttackCandidate]) -> Vec<AttackCandidate> {
    let best = candidates
        .iter()
        .map(|candidate| candidate.probability)
        .fold(f64::NEG_INFINITY, f64::max);
    candidates
        .iter()
        .filter(|candidate| best - candidate.probability <= TIE_TOLERANCE)
        .copied()
        .collect()
}

/// The `k` most likely candidates, highest first. Ties keep enumeration order.
pub fn top_k(candidates: &[AttackCandidate], k: usize) -> Vec<AttackCandidate> {
    let mut ranked = candidates.to_vec();
    ranked.sort_by(|a, b| b.probability.total_cmp(&a.probability));
    ranked.truncate(k);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::belief::enumerator::{enumerate_with_exclusions, enumerate_worlds};
    use crate::game::history::History;
    use crate::model::card::Card;
    use crate::model::color::Color;
    use crate::model::deck::Deck;
    use crate::model::hand::{Hand, HandView};
    use crate::model::rules::Rules;
    use std::collections::BTreeSet;

    fn c(color: Color, rank: u8) -> Content {
        Content::new(color, rank)
    }

    fn hand(owner: usize, faces: &[(u32, Content)]) -> Hand {
        let cards = faces
            .iter()
            .map(|(id, content)| Card::new(CardId::new(*id), *content, PlayerId::new(owner)))
            .collect();
        Hand::with_cards(cards).unwrap()
    }

    #[test]
    fn last_unknown_slot_is_certain() {
        let rules = Rules {
            min_rank: 0,
            max_rank: 1,
            hand_size: 2,
            ..Rules::default()
        };
        let target = hand(1, &[(2, c(Color::Black, 1)), (3, c(Color::White, 1))]);
        let (target, opened) = target.open(0).unwrap();
        let view = HandView::of(PlayerId::new(1), &target);
        let belief = enumerate_worlds(
            &rules,
            PlayerId::new(0),
            &[c(Color::Black, 0), c(Color::White, 0)],
            std::slice::from_ref(&view),
            &[opened],
            None,
            &History::new(),
        )
        .unwrap();
        let candidates = estimate_probabilities(&belief);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].guess, c(Color::White, 1));
        assert!(candidates[0].is_certain());
    }

    #[test]
    fn probabilities_per_slot_sum_to_one() {
        let rules = Rules {
            min_rank: 0,
            max_rank: 7,
            hand_size: 3,
            ..Rules::default()
        };
        for seed in 0..8u64 {
            let mut deck = Deck::shuffled_with_seed(&rules, seed);
            let mut mine = Vec::new();
            let mut theirs = Hand::new();
            for _ in 0..rules.hand_size {
                mine.push(deck.draw(PlayerId::new(0)).unwrap().face());
                let (next, _) = theirs.insert(deck.draw(PlayerId::new(1)).unwrap()).unwrap();
                theirs = next;
            }
            let view = HandView::of(PlayerId::new(1), &theirs);
            let belief = enumerate_worlds(
                &rules,
                PlayerId::new(0),
                &mine,
                std::slice::from_ref(&view),
                &[],
                None,
                &History::new(),
            )
            .unwrap();
            let candidates = estimate_probabilities(&belief);
            for column in 0..belief.slots().len() {
                let sum: f64 = candidates
                    .iter()
                    .filter(|candidate| candidate.column == column)
                    .map(|candidate| candidate.probability)
                    .sum();
                assert!((sum - 1.0).abs() < 1e-9, "seed {seed} column {column}: {sum}");
            }
        }
    }

    #[test]
    fn ranking_helpers_respect_tolerance() {
        let rules = Rules {
            min_rank: 0,
            max_rank: 3,
            hand_size: 1,
            ..Rules::default()
        };
        let target = hand(1, &[(0, c(Color::Black, 2))]);
        let view = HandView::of(PlayerId::new(1), &target);
        let belief = enumerate_with_exclusions(
            &rules,
            None,
            &BTreeSet::new(),
            std::slice::from_ref(&view),
            &History::new(),
        )
        .unwrap();
        let candidates = estimate_probabilities(&belief);
        assert_eq!(candidates.len(), 4);
        assert_eq!(most_likely(&candidates).len(), 4);
        let best = top_k(&candidates, 2);
        assert_eq!(best.len(), 2);
        assert_eq!(best[0].guess, c(Color::Black, 0));
    }
}
