use crate::error::GameError;
use crate::model::color::Color;
use crate::model::content::Content;
use crate::model::player::PlayerId;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

const DEFAULT_MIN_RANK: u8 = 0;
const DEFAULT_MAX_RANK: u8 = 11;
const DEFAULT_HAND_SIZE: usize = 4;
const DEFAULT_PLAYERS: usize = 2;
const DEFAULT_MAX_TURNS: u32 = 200;
const MAX_PLAYERS: usize = 6;

/// Table configuration shared by the deck, the belief engine, and the turn protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rules {
    pub colors: Vec<Color>,
    pub min_rank: u8,
    pub max_rank: u8,
    pub hand_size: usize,
    pub players: usize,
    pub max_turns: u32,
    pub start_attacker: usize,
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            colors: Color::ALL.to_vec(),
            min_rank: DEFAULT_MIN_RANK,
            max_rank: DEFAULT_MAX_RANK,
            hand_size: DEFAULT_HAND_SIZE,
            players: DEFAULT_PLAYERS,
            max_turns: DEFAULT_MAX_TURNS,
            start_attacker: 0,
        }
    }
}

impl Rules {
    pub fn validate(&self) -> Result<(), GameError> {
        if self.colors.is_empty() {
            return Err(GameError::configuration("at least one color is required"));
        }
        let mut unique = self.colors.clone();
        unique.sort();
        unique.dedup();
        if unique.len() != self.colors.len() {
            return Err(GameError::configuration("colors must not repeat"));
        }
        if self.min_rank > self.max_rank {
            return Err(GameError::configuration(format!(
                "rank range {}..={} is empty",
                self.min_rank, self.max_rank
            )));
        }
        if !(2..=MAX_PLAYERS).contains(&self.players) {
            return Err(GameError::configuration(format!(
                "player count must be between 2 and {MAX_PLAYERS}, got {}",
                self.players
            )));
        }
        if self.hand_size == 0 {
            return Err(GameError::configuration("hand size must be at least 1"));
        }
        let dealt = self.players.checked_mul(self.hand_size);
        if dealt.is_none_or(|dealt| dealt > self.deck_size()) {
            return Err(GameError::configuration(format!(
                "{} players x {} cards exceeds the {}-card deck",
                self.players,
                self.hand_size,
                self.deck_size()
            )));
        }
        if self.start_attacker >= self.players {
            return Err(GameError::configuration(format!(
                "start attacker {} is not seated",
                self.start_attacker
            )));
        }
        if self.max_turns == 0 {
            return Err(GameError::configuration("turn cap must be greater than zero"));
        }
        Ok(())
    }

    /// Validating constructor for contents coming from outside the engine.
    pub fn content(&self, color: Color, rank: u8) -> Result<Content, GameError> {
        if !self.has_color(color) {
            return Err(GameError::configuration(format!(
                "color {color} is not in play"
            )));
        }
        if !self.ranks().contains(&rank) {
            return Err(GameError::configuration(format!(
                "rank {rank} is outside {}..={}",
                self.min_rank, self.max_rank
            )));
        }
        Ok(Content::new(color, rank))
    }

    pub fn has_color(&self, color: Color) -> bool {
        self.colors.contains(&color)
    }

    pub fn ranks(&self) -> RangeInclusive<u8> {
        self.min_rank..=self.max_rank
    }

    pub fn deck_size(&self) -> usize {
        self.colors.len() * self.ranks().count()
    }

    /// Every content in play, ascending.
    pub fn all_contents(&self) -> Vec<Content> {
        let mut contents: Vec<Content> = self
            .colors
            .iter()
            .flat_map(|&color| self.ranks().map(move |rank| Content::new(color, rank)))
            .collect();
        contents.sort();
        contents
    }

    pub fn seats(&self) -> impl Iterator<Item = PlayerId> + '_ {
        (0..self.players).map(PlayerId::new)
    }
}
