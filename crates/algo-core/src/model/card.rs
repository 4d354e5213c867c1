use crate::error::{GameError, ProtocolViolation};
use crate::model::color::Color;
use crate::model::content::Content;
use crate::model::player::PlayerId;
use core::fmt;
use serde::{Deserialize, Serialize};

/// Identity assigned when a card is drawn. Survives every reordering of the hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(u32);

impl CardId {
    /// Placeholder identity for cards that only exist inside a simulation.
    pub const SIMULATED: CardId = CardId(u32::MAX);

    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Card {
    id: CardId,
    content: Content,
    owner: PlayerId,
    opened: bool,
}

impl Card {
    /// A freshly drawn, closed card.
    pub const fn new(id: CardId, content: Content, owner: PlayerId) -> Self {
        Self {
            id,
            content,
            owner,
            opened: false,
        }
    }

    pub const fn id(&self) -> CardId {
        self.id
    }

    pub const fn owner(&self) -> PlayerId {
        self.owner
    }

    pub const fn is_opened(&self) -> bool {
        self.opened
    }

    pub const fn color(&self) -> Color {
        self.content.color
    }

    pub fn rank(&self, requested_by: PlayerId) -> Result<u8, GameError> {
        if !self.opened && requested_by != self.owner {
            return Err(GameError::AccessViolation {
                card: self.id,
                owner: self.owner,
                requested_by,
            });
        }
        Ok(self.content.rank)
    }

    pub fn content(&self, requested_by: PlayerId) -> Result<Content, GameError> {
        let rank = self.rank(requested_by)?;
        Ok(Content::new(self.color(), rank))
    }

    /// Returns the opened copy of this card. Opening twice is a protocol defect.
    pub fn open(&self) -> Result<Card, GameError> {
        if self.opened {
            return Err(ProtocolViolation::AlreadyOpened { card: self.id }.into());
        }
        Ok(Card {
            opened: true,
            ..*self
        })
    }

    /// True face, for the hand's own ordering bookkeeping.
    pub(crate) const fn face(&self) -> Content {
        self.content
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.opened {
            write!(f, "{}", self.content)
        } else {
            write!(f, "{}??", self.content.color)
        }
    }
}
