use core::fmt;
use serde::{Deserialize, Serialize};

/// Seat index of a player, stable for the whole game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(usize);

impl PlayerId {
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    pub const fn index(self) -> usize {
        self.0
    }

    /// Next seat in round-robin order among `players` seats.
    pub const fn next(self, players: usize) -> PlayerId {
        PlayerId((self.0 + 1) % players)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Player{}", self.0)
    }
}
