//! Free-text command grammar for an interactive player: `<slot> <color><rank> [<target>]`,
//! or a blank line to stop attacking.

use crate::game::action::{Action, Attack};
use crate::game::policy::DecisionContext;
use crate::model::color::Color;
use crate::model::content::Content;
use crate::model::player::PlayerId;
use crate::model::rules::Rules;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HumanCommand {
    Skip,
    Attack {
        slot: usize,
        guess: Content,
        /// Omitted targets are allowed when only one opponent is left.
        target: Option<PlayerId>,
    },
}

/// Malformed or currently-illegal input. Always answered with a re-prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    Arity { found: usize },
    InvalidSlot { token: String },
    InvalidContent { token: String },
    InvalidColor { symbol: char },
    RankOutOfRange { rank: u8, min: u8, max: u8 },
    InvalidTarget { token: String },
    SkipNotAllowed,
    TargetRequired,
    UnknownTarget { player: PlayerId },
    SlotOutOfRange { slot: usize, len: usize },
    SlotAlreadyOpened { slot: usize },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Arity { found } => write!(
                f,
                "expected `<slot> <color><rank> [<player>]`, got {found} tokens"
            ),
            ParseError::InvalidSlot { token } => write!(f, "`{token}` is not a slot number"),
            ParseError::InvalidContent { token } => {
                write!(f, "`{token}` is not a card such as B05")
            }
            ParseError::InvalidColor { symbol } => write!(f, "color `{symbol}` is not in play"),
            ParseError::RankOutOfRange { rank, min, max } => {
                write!(f, "rank {rank} is outside {min}..={max}")
            }
            ParseError::InvalidTarget { token } => write!(f, "`{token}` is not a player number"),
            ParseError::SkipNotAllowed => {
                f.write_str("you must land one attack before you can stop")
            }
            ParseError::TargetRequired => {
                f.write_str("several opponents remain; name the target player")
            }
            ParseError::UnknownTarget { player } => {
                write!(f, "{player} is not an opponent still in the game")
            }
            ParseError::SlotOutOfRange { slot, len } => {
                write!(f, "slot {slot} does not exist (hand has {len} slots)")
            }
            ParseError::SlotAlreadyOpened { slot } => write!(f, "slot {slot} is already open"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Parses one line of input. Only syntax and configured ranges are checked here;
/// legality against the table is checked by [`HumanCommand::into_action`].
pub fn parse_human_input(text: &str, rules: &Rules) -> Result<HumanCommand, ParseError> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.is_empty() {
        return Ok(HumanCommand::Skip);
    }
    if !(2..=3).contains(&tokens.len()) {
        return Err(ParseError::Arity {
            found: tokens.len(),
        });
    }

    let slot = parse_digits::<usize>(tokens[0]).ok_or_else(|| ParseError::InvalidSlot {
        token: tokens[0].to_string(),
    })?;
    let guess = parse_content(tokens[1], rules)?;
    let target = tokens
        .get(2)
        .map(|token| {
            parse_digits::<usize>(token)
                .map(PlayerId::new)
                .ok_or_else(|| ParseError::InvalidTarget {
                    token: token.to_string(),
                })
        })
        .transpose()?;

    Ok(HumanCommand::Attack {
        slot,
        guess,
        target,
    })
}

fn parse_content(token: &str, rules: &Rules) -> Result<Content, ParseError> {
    let invalid = || ParseError::InvalidContent {
        token: token.to_string(),
    };
    let mut chars = token.chars();
    let symbol = chars.next().ok_or_else(invalid)?;
    let color = Color::from_symbol(symbol).ok_or_else(invalid)?;
    let rank = parse_digits::<u8>(chars.as_str()).ok_or_else(invalid)?;
    if !rules.has_color(color) {
        return Err(ParseError::InvalidColor { symbol });
    }
    if !rules.ranks().contains(&rank) {
        return Err(ParseError::RankOutOfRange {
            rank,
            min: rules.min_rank,
            max: rules.max_rank,
        });
    }
    Ok(Content::new(color, rank))
}

/// Plain ASCII digits only; `str::parse` would also take a leading `+`.
fn parse_digits<T: std::str::FromStr>(token: &str) -> Option<T> {
    if token.is_empty() || !token.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    token.parse().ok()
}

impl HumanCommand {
    /// Resolves the command against the current decision, rejecting moves the
    /// turn loop would refuse.
    pub fn into_action(self, ctx: &DecisionContext<'_>) -> Result<Action, ParseError> {
        match self {
            HumanCommand::Skip if ctx.can_skip() => Ok(Action::Skip),
            HumanCommand::Skip => Err(ParseError::SkipNotAllowed),
            HumanCommand::Attack {
                slot,
                guess,
                target,
            } => {
                let target = match target {
                    Some(player) => player,
                    None => match ctx.opponents {
                        [only] => only.player,
                        _ => return Err(ParseError::TargetRequired),
                    },
                };
                let view = ctx
                    .opponent(target)
                    .ok_or(ParseError::UnknownTarget { player: target })?;
                if slot >= view.len {
                    return Err(ParseError::SlotOutOfRange {
                        slot,
                        len: view.len,
                    });
                }
                if view.closed_slot(slot).is_none() {
                    return Err(ParseError::SlotAlreadyOpened { slot });
                }
                Ok(Action::Attack(Attack {
                    target,
                    slot,
                    guess,
                }))
            }
        }
    }
}
