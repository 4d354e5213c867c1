//! Console play: one human seat against the configured bots.

use std::io::{self, BufRead, Write};

use algo_bot::HumanPolicy;
use algo_core::error::GameError;
use algo_core::game::event::{GameEvent, GameObserver};
use algo_core::game::policy::Policy;
use algo_core::game::protocol::{Game, GameOutcome};
use thiserror::Error;

use crate::config::{AgentKind, BenchmarkConfig};
use crate::tournament::{AgentBlueprint, AgentError};

#[derive(Debug, Error)]
pub enum InteractiveError {
    #[error("seat {seat} is not at the table ({players} players)")]
    SeatOutOfRange { seat: usize, players: usize },
    #[error("no automated agents configured to fill the other seats")]
    NoOpponents,
    #[error("{0}")]
    Agent(#[from] AgentError),
    #[error("{0}")]
    Game(#[from] GameError),
    #[error("console output failed: {0}")]
    Output(#[source] io::Error),
}

/// Prints public events as they happen. The human's own draw is shown by the prompt.
///
/// Observers cannot fail, so the first write error is parked and later events are
/// dropped until the caller collects it with [`ConsolePresenter::take_error`].
pub struct ConsolePresenter<W> {
    out: W,
    failed: Option<io::Error>,
}

impl<W: Write> ConsolePresenter<W> {
    pub fn new(out: W) -> Self {
        Self { out, failed: None }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn take_error(&mut self) -> Option<io::Error> {
        self.failed.take()
    }

    fn write_line(&mut self, text: &str) {
        if self.failed.is_some() {
            return;
        }
        if let Err(err) = writeln!(self.out, "{text}") {
            self.failed = Some(err);
        }
    }

    fn line(game_event: &GameEvent) -> String {
        match game_event {
            GameEvent::TurnStarted { turn, attacker } => {
                format!("== Turn {turn}: {attacker} attacks ==")
            }
            GameEvent::CardDrawn { player, color, .. } => {
                format!("{player} draws a {color} card")
            }
            GameEvent::DeckExhausted { player, .. } => {
                format!("The deck is empty; {player} attacks without a draw")
            }
            GameEvent::AttackAttempted {
                attacker, attack, ..
            } => format!("{attacker} guesses {attack}"),
            GameEvent::AttackResolved { record } => {
                if record.success {
                    "  hit".to_string()
                } else {
                    "  miss".to_string()
                }
            }
            GameEvent::DrawnCardRevealed {
                player, content, ..
            } => format!("{player} must reveal the drawn {content}"),
            GameEvent::CardInserted {
                player,
                slot,
                opened,
                ..
            } => format!(
                "{player} places a {} card at slot {slot}",
                if *opened { "revealed" } else { "hidden" }
            ),
            GameEvent::Skipped { player, .. } => format!("{player} stops attacking"),
            GameEvent::PlayerEliminated { player, .. } => format!("{player} is out"),
            GameEvent::GameOver { outcome } => match outcome {
                GameOutcome::Winner { player, turns } => {
                    format!("{player} wins after {turns} turns")
                }
                GameOutcome::TurnLimit { turns } => {
                    format!("Turn limit reached after {turns} turns; nobody wins")
                }
            },
        }
    }
}

impl<W: Write> GameObserver for ConsolePresenter<W> {
    fn on_event(&mut self, game_event: &GameEvent) {
        self.write_line(&Self::line(game_event));
    }
}

/// Seats a human at `seat` and fills the rest with the config's automated agents
/// in order, cycling when there are fewer agents than seats.
pub fn play_interactive<R, W, P>(
    config: &BenchmarkConfig,
    seat: usize,
    input: R,
    output: W,
    presenter: &mut ConsolePresenter<P>,
) -> Result<GameOutcome, InteractiveError>
where
    R: BufRead + Send + 'static,
    W: Write + Send + 'static,
    P: Write,
{
    let players = config.rules.players;
    if seat >= players {
        return Err(InteractiveError::SeatOutOfRange { seat, players });
    }

    let bots = config
        .agents
        .iter()
        .filter(|agent| agent.kind != AgentKind::Human)
        .map(AgentBlueprint::from_config)
        .collect::<Result<Vec<_>, _>>()?;
    if bots.is_empty() {
        return Err(InteractiveError::NoOpponents);
    }

    let seed = config.games.seed.unwrap_or(0);
    let mut human = Some(HumanPolicy::new("human", input, output));
    let mut bot_iter = bots.iter().cycle();
    let mut policies: Vec<Box<dyn Policy>> = Vec::with_capacity(players);
    for index in 0..players {
        if index == seat
            && let Some(policy) = human.take()
        {
            policies.push(Box::new(policy));
            continue;
        }
        let bot = bot_iter.next().ok_or(InteractiveError::NoOpponents)?;
        policies.push(bot.spec.spawn(seed.wrapping_add(index as u64)));
    }

    let mut game = Game::new(config.rules.clone(), seed)?;
    let played = game.play(&mut policies, presenter);
    if let Some(err) = presenter.take_error() {
        return Err(InteractiveError::Output(err));
    }
    let outcome = played?;

    for (index, hand) in game.hands().iter().enumerate() {
        presenter.write_line(&format!("Seat {index}: {}", hand.reveal_all()));
    }
    match presenter.take_error() {
        Some(err) => Err(InteractiveError::Output(err)),
        None => Ok(outcome),
    }
}
