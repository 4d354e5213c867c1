use crate::model::content::Content;
use crate::model::player::PlayerId;
use core::fmt;
use serde::Serialize;

/// A declared guess against one slot of an opponent's hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Attack {
    pub target: PlayerId,
    pub slot: usize,
    pub guess: Content,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    Attack(Attack),
    /// Stop attacking and keep the drawn card closed. Only legal after a success.
    Skip,
}

impl Action {
    pub fn attack(&self) -> Option<&Attack> {
        match self {
            Action::Attack(attack) => Some(attack),
            Action::Skip => None,
        }
    }
}

impl fmt::Display for Attack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at slot {} of {}", self.guess, self.slot, self.target)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Attack(attack) => write!(f, "attack {attack}"),
            Action::Skip => f.write_str("skip"),
        }
    }
}
