//! Structured notifications emitted by the turn loop.
//!
//! The engine never prints; presenters, loggers and statistics collectors
//! subscribe through [`GameObserver`].

use crate::game::action::Attack;
use crate::game::history::AttackRecord;
use crate::game::protocol::GameOutcome;
use crate::model::card::CardId;
use crate::model::color::Color;
use crate::model::content::Content;
use crate::model::player::PlayerId;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    TurnStarted {
        turn: u32,
        attacker: PlayerId,
    },
    /// Only the color is public; the rank stays with the drawer.
    CardDrawn {
        turn: u32,
        player: PlayerId,
        card_id: CardId,
        color: Color,
    },
    DeckExhausted {
        turn: u32,
        player: PlayerId,
    },
    AttackAttempted {
        turn: u32,
        attacker: PlayerId,
        attack: Attack,
        /// Success probability the policy reported for this attack, if any.
        estimate: Option<f64>,
    },
    AttackResolved {
        record: AttackRecord,
    },
    /// A failed attack exposed the attacker's drawn card.
    DrawnCardRevealed {
        turn: u32,
        player: PlayerId,
        content: Content,
    },
    CardInserted {
        turn: u32,
        player: PlayerId,
        slot: usize,
        card_id: CardId,
        opened: bool,
    },
    Skipped {
        turn: u32,
        player: PlayerId,
    },
    PlayerEliminated {
        turn: u32,
        player: PlayerId,
    },
    GameOver {
        outcome: GameOutcome,
    },
}

pub trait GameObserver {
    fn on_event(&mut self, event: &GameEvent);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl GameObserver for NullObserver {
    fn on_event(&mut self, _event: &GameEvent) {}
}

/// Keeps a copy of every event in order.
impl GameObserver for Vec<GameEvent> {
    fn on_event(&mut self, event: &GameEvent) {
        self.push(event.clone());
    }
}
