use crate::model::card::CardId;
use crate::model::content::Content;
use crate::model::player::PlayerId;
use serde::{Deserialize, Serialize};

/// One resolved attack, keyed by the target card's identity rather than its slot,
/// since slots shift whenever a drawn card is inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackRecord {
    pub turn: u32,
    pub attacker: PlayerId,
    pub target: PlayerId,
    pub slot: usize,
    pub card_id: CardId,
    pub guess: Content,
    pub success: bool,
}

/// Append-only log of every attack in the game.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    records: Vec<AttackRecord>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<AttackRecord>) -> Self {
        Self { records }
    }

    pub(crate) fn push(&mut self, record: AttackRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[AttackRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Contents already guessed wrong against the card `card_id`.
    pub fn failed_guesses(&self, card_id: CardId) -> impl Iterator<Item = Content> + '_ {
        self.records
            .iter()
            .filter(move |record| record.card_id == card_id && !record.success)
            .map(|record| record.guess)
    }
}
