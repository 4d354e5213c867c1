use crate::error::{GameError, ProtocolViolation};
use crate::model::card::{Card, CardId};
use crate::model::color::Color;
use crate::model::content::Content;
use crate::model::player::PlayerId;
use core::fmt;
use serde::Serialize;

/// Cards held by one player, kept sorted by (rank, color) after every update.
///
/// Updates never mutate in place: `insert` and `open` hand back a new `Hand`,
/// so speculative copies taken by search code can never leak into the table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hand {
    cards: Vec<Card>,
}

/// A face-down slot as seen by anyone: position, identity, and color only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClosedSlot {
    pub slot: usize,
    pub card_id: CardId,
    pub color: Color,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OpenedSlot {
    pub slot: usize,
    pub content: Content,
}

impl Hand {
    pub fn new() -> Self {
        Self { cards: Vec::new() }
    }

    pub fn with_cards(cards: Vec<Card>) -> Result<Self, GameError> {
        cards
            .into_iter()
            .try_fold(Hand::new(), |hand, card| hand.insert(card).map(|(next, _)| next))
    }

    /// Inserts `card` at its sorted position and returns the new hand with that slot index.
    pub fn insert(&self, card: Card) -> Result<(Hand, usize), GameError> {
        let face = card.face();
        if self.cards.iter().any(|existing| existing.face() == face) {
            return Err(ProtocolViolation::DuplicateContent { content: face }.into());
        }
        let slot = self.cards.partition_point(|existing| existing.face() < face);
        let mut cards = Vec::with_capacity(self.cards.len() + 1);
        cards.extend_from_slice(&self.cards[..slot]);
        cards.push(card);
        cards.extend_from_slice(&self.cards[slot..]);
        Ok((Hand { cards }, slot))
    }

    /// Opens the card at `slot`, returning the new hand and the revealed content.
    pub fn open(&self, slot: usize) -> Result<(Hand, Content), GameError> {
        let card = self.card(slot).ok_or(ProtocolViolation::SlotOutOfRange {
            slot,
            len: self.cards.len(),
        })?;
        let opened = card.open()?;
        let mut cards = self.cards.clone();
        cards[slot] = opened;
        Ok((Hand { cards }, opened.face()))
    }

    pub fn card(&self, slot: usize) -> Option<&Card> {
        self.cards.get(slot)
    }

    pub fn slot_of(&self, id: CardId) -> Option<usize> {
        self.cards.iter().position(|card| card.id() == id)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn closed_slots(&self) -> Vec<ClosedSlot> {
        self.cards
            .iter()
            .enumerate()
            .filter(|(_, card)| !card.is_opened())
            .map(|(slot, card)| ClosedSlot {
                slot,
                card_id: card.id(),
                color: card.color(),
            })
            .collect()
    }

    pub fn opened_slots(&self) -> Vec<OpenedSlot> {
        self.cards
            .iter()
            .enumerate()
            .filter(|(_, card)| card.is_opened())
            .map(|(slot, card)| OpenedSlot {
                slot,
                content: card.face(),
            })
            .collect()
    }

    /// Every content in the hand, as read by `requested_by`.
    pub fn contents(&self, requested_by: PlayerId) -> Result<Vec<Content>, GameError> {
        self.cards
            .iter()
            .map(|card| card.content(requested_by))
            .collect()
    }

    pub fn is_eliminated(&self) -> bool {
        self.cards.iter().all(Card::is_opened)
    }

    /// Owner's-eye rendering with every rank visible.
    pub fn reveal_all(&self) -> String {
        self.cards
            .iter()
            .map(|card| card.face().to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self
            .cards
            .iter()
            .map(|card| card.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        f.write_str(&rendered)
    }
}

/// What every player can see of one hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandView {
    pub player: PlayerId,
    pub len: usize,
    pub closed: Vec<ClosedSlot>,
    pub opened: Vec<OpenedSlot>,
}

impl HandView {
    pub fn of(player: PlayerId, hand: &Hand) -> Self {
        Self {
            player,
            len: hand.len(),
            closed: hand.closed_slots(),
            opened: hand.opened_slots(),
        }
    }

    pub fn closed_slot(&self, slot: usize) -> Option<&ClosedSlot> {
        self.closed.iter().find(|closed| closed.slot == slot)
    }

    pub fn is_eliminated(&self) -> bool {
        self.closed.is_empty()
    }
}
