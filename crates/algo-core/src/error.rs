//! Fatal contract violations surfaced by the engine.
//!
//! None of these are retryable: each one means a caller, policy, or the
//! bookkeeping itself broke an invariant.

use crate::model::card::CardId;
use crate::model::content::Content;
use crate::model::player::PlayerId;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    /// Malformed table configuration or a content outside it.
    Configuration { message: String },
    /// A closed card's rank was read by someone other than its owner.
    AccessViolation {
        card: CardId,
        owner: PlayerId,
        requested_by: PlayerId,
    },
    Protocol(ProtocolViolation),
    /// No hidden assignment is consistent with what the viewer knows.
    BeliefContradiction {
        viewer: Option<PlayerId>,
        hand: PlayerId,
    },
    /// The external input source of an interactive player went away.
    Interrupted { player: PlayerId, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolViolation {
    AlreadyOpened { card: CardId },
    SkipBeforeSuccess { player: PlayerId },
    DuplicateContent { content: Content },
    SlotOutOfRange { slot: usize, len: usize },
    UnknownPlayer { player: PlayerId },
    SelfTarget { player: PlayerId },
    NoLegalAttack { player: PlayerId },
}

impl GameError {
    pub fn configuration(message: impl Into<String>) -> Self {
        GameError::Configuration {
            message: message.into(),
        }
    }

    pub fn is_protocol(&self) -> bool {
        matches!(self, GameError::Protocol(_))
    }
}

impl From<ProtocolViolation> for GameError {
    fn from(violation: ProtocolViolation) -> Self {
        GameError::Protocol(violation)
    }
}

impl fmt::Display for GameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameError::Configuration { message } => write!(f, "configuration error: {message}"),
            GameError::AccessViolation {
                card,
                owner,
                requested_by,
            } => write!(
                f,
                "{requested_by} tried to read the closed card {card} owned by {owner}"
            ),
            GameError::Protocol(violation) => write!(f, "protocol violation: {violation}"),
            GameError::BeliefContradiction { viewer, hand } => match viewer {
                Some(viewer) => write!(
                    f,
                    "no consistent assignment for {hand}'s hand from {viewer}'s point of view"
                ),
                None => write!(f, "no consistent assignment for {hand}'s hand"),
            },
            GameError::Interrupted { player, reason } => {
                write!(f, "input for {player} interrupted: {reason}")
            }
        }
    }
}

impl fmt::Display for ProtocolViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolViolation::AlreadyOpened { card } => {
                write!(f, "card {card} is already opened")
            }
            ProtocolViolation::SkipBeforeSuccess { player } => write!(
                f,
                "{player} cannot stop attacking before a successful attack this turn"
            ),
            ProtocolViolation::DuplicateContent { content } => {
                write!(f, "content {content} would appear twice")
            }
            ProtocolViolation::SlotOutOfRange { slot, len } => {
                write!(f, "slot {slot} is out of range for a hand of {len}")
            }
            ProtocolViolation::UnknownPlayer { player } => write!(f, "{player} is not seated"),
            ProtocolViolation::SelfTarget { player } => write!(f, "{player} attacked itself"),
            ProtocolViolation::NoLegalAttack { player } => {
                write!(f, "{player} has no closed slot left to attack")
            }
        }
    }
}

impl std::error::Error for GameError {}

impl std::error::Error for ProtocolViolation {}
