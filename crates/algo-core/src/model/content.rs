use crate::model::color::Color;
use core::fmt;
use serde::{Deserialize, Serialize};

/// Face value of a card. Exactly one card per content exists in a game.
///
/// Ordering is by rank first, with color breaking ties, which is the order
/// every hand is kept in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Content {
    pub rank: u8,
    pub color: Color,
}

impl Content {
    pub const fn new(color: Color, rank: u8) -> Self {
        Self { rank, color }
    }
}

impl fmt::Display for Content {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:02}", self.color, self.rank)
    }
}
