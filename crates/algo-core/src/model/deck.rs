use crate::model::card::{Card, CardId};
use crate::model::content::Content;
use crate::model::player::PlayerId;
use crate::model::rules::Rules;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Single-copy draw pile. Identities are handed out in draw order.
#[derive(Debug, Clone)]
pub struct Deck {
    contents: Vec<Content>,
    next_id: u32,
}

impl Deck {
    pub fn ordered(rules: &Rules) -> Self {
        Self::from_contents(rules.all_contents())
    }

    /// Draw order is back to front: the last content is drawn first.
    pub fn from_contents(contents: Vec<Content>) -> Self {
        Self {
            contents,
            next_id: 0,
        }
    }

    pub fn shuffled<R: rand::Rng + ?Sized>(rules: &Rules, rng: &mut R) -> Self {
        let mut deck = Self::ordered(rules);
        deck.contents.shuffle(rng);
        deck
    }

    pub fn shuffled_with_seed(rules: &Rules, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::shuffled(rules, &mut rng)
    }

    /// Next card for `owner`, or `None` once the pile is exhausted.
    pub fn draw(&mut self, owner: PlayerId) -> Option<Card> {
        let content = self.contents.pop()?;
        let id = CardId::new(self.next_id);
        self.next_id += 1;
        Some(Card::new(id, content, owner))
    }

    pub fn remaining(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }

    pub fn contents(&self) -> &[Content] {
        &self.contents
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ordered_deck_has_one_card_per_content() {
        let rules = Rules::default();
        let deck = Deck::ordered(&rules);
        let unique: HashSet<_> = deck.contents().iter().collect();
        assert_eq!(unique.len(), rules.deck_size());
    }

    #[test]
    fn shuffle_with_seed_is_deterministic() {
        let rules = Rules::default();
        let deck_a = Deck::shuffled_with_seed(&rules, 42);
        let deck_b = Deck::shuffled_with_seed(&rules, 42);
        assert_eq!(deck_a.contents(), deck_b.contents());
        let deck_c = Deck::shuffled_with_seed(&rules, 43);
        assert_ne!(deck_a.contents(), deck_c.contents());
    }

    #[test]
    fn draw_assigns_fresh_ids_until_exhausted() {
        let rules = Rules {
            min_rank: 0,
            max_rank: 1,
            hand_size: 1,
            ..Rules::default()
        };
        let mut deck = Deck::ordered(&rules);
        let owner = PlayerId::new(1);
        let mut ids = Vec::new();
        while let Some(card) = deck.draw(owner) {
            assert_eq!(card.owner(), owner);
            assert!(!card.is_opened());
            ids.push(card.id());
        }
        assert_eq!(ids.len(), 4);
        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), 4);
        assert!(deck.draw(owner).is_none());
    }
}
