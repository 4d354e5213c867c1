//! Turn loop: draw, attack until a miss or a skip, merge the drawn card, rotate.

use crate::error::{GameError, ProtocolViolation};
use crate::game::action::{Action, Attack};
use crate::game::event::{GameEvent, GameObserver};
use crate::game::history::{AttackRecord, History};
use crate::game::policy::{DecisionContext, Policy};
use crate::game::view::{PublicKnowledge, PublicView};
use crate::model::card::Card;
use crate::model::deck::Deck;
use crate::model::hand::{Hand, HandView};
use crate::model::player::PlayerId;
use crate::model::rules::Rules;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GameOutcome {
    /// Every other hand was fully opened after `turns` turns.
    Winner { player: PlayerId, turns: u32 },
    /// The turn cap was reached first.
    TurnLimit { turns: u32 },
}

impl GameOutcome {
    pub fn winner(&self) -> Option<PlayerId> {
        match self {
            GameOutcome::Winner { player, .. } => Some(*player),
            GameOutcome::TurnLimit { .. } => None,
        }
    }

    pub fn turns(&self) -> u32 {
        match self {
            GameOutcome::Winner { turns, .. } | GameOutcome::TurnLimit { turns } => *turns,
        }
    }
}

/// What the loop does after an action has been applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    EndTurn,
    GameOver(GameOutcome),
}

/// Per-turn scratch state: the drawn card and whether an attack already landed.
#[derive(Debug, Clone, Default)]
pub struct TurnState {
    drawn: Option<Card>,
    has_succeeded: bool,
}

impl TurnState {
    pub fn drawn(&self) -> Option<&Card> {
        self.drawn.as_ref()
    }

    pub fn has_succeeded(&self) -> bool {
        self.has_succeeded
    }
}

#[derive(Debug, Clone)]
pub struct Game {
    rules: Rules,
    deck: Deck,
    hands: Vec<Hand>,
    public: PublicKnowledge,
    history: History,
    attacker: PlayerId,
    turn: u32,
    outcome: Option<GameOutcome>,
}

impl Game {
    /// Validates `rules`, shuffles with `seed`, and deals every hand.
    pub fn new(rules: Rules, seed: u64) -> Result<Self, GameError> {
        rules.validate()?;
        let deck = Deck::shuffled_with_seed(&rules, seed);
        Self::with_deck(rules, deck)
    }

    /// Deals from a prepared deck, one card per seat per round.
    pub fn with_deck(rules: Rules, mut deck: Deck) -> Result<Self, GameError> {
        rules.validate()?;
        let mut hands = vec![Hand::new(); rules.players];
        for _ in 0..rules.hand_size {
            for (seat, hand) in hands.iter_mut().enumerate() {
                let card = deck
                    .draw(PlayerId::new(seat))
                    .ok_or_else(|| GameError::configuration("deck ran out while dealing"))?;
                let (next, _) = hand.insert(card)?;
                *hand = next;
            }
        }
        let attacker = PlayerId::new(rules.start_attacker);
        Ok(Self {
            rules,
            deck,
            hands,
            public: PublicKnowledge::new(),
            history: History::new(),
            attacker,
            turn: 0,
            outcome: None,
        })
    }

    pub fn rules(&self) -> &Rules {
        &self.rules
    }

    pub fn hands(&self) -> &[Hand] {
        &self.hands
    }

    pub fn hand(&self, player: PlayerId) -> Option<&Hand> {
        self.hands.get(player.index())
    }

    pub fn public(&self) -> &PublicKnowledge {
        &self.public
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn attacker(&self) -> PlayerId {
        self.attacker
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn outcome(&self) -> Option<GameOutcome> {
        self.outcome
    }

    pub fn deck_remaining(&self) -> usize {
        self.deck.remaining()
    }

    /// Public views of every non-eliminated player other than `player`, in seat order.
    pub fn opponent_views(&self, player: PlayerId) -> Vec<HandView> {
        self.rules
            .seats()
            .filter(|seat| *seat != player)
            .filter_map(|seat| self.hand(seat).map(|hand| HandView::of(seat, hand)))
            .filter(|view| !view.is_eliminated())
            .collect()
    }

    /// Decision context for the current attacker. `opponents` comes from
    /// [`Game::opponent_views`].
    pub fn context<'a>(
        &'a self,
        turn: &TurnState,
        opponents: &'a [HandView],
    ) -> Result<DecisionContext<'a>, GameError> {
        let hand = self.hand(self.attacker).ok_or(ProtocolViolation::UnknownPlayer {
            player: self.attacker,
        })?;
        let drawn = turn
            .drawn
            .map(|card| card.content(self.attacker))
            .transpose()?;
        Ok(DecisionContext {
            rules: &self.rules,
            public: PublicView {
                opened: self.public.contents(),
                turn: self.turn,
                attacker: self.attacker,
            },
            me: self.attacker,
            hand,
            opponents,
            drawn,
            history: &self.history,
            has_succeeded: turn.has_succeeded,
        })
    }

    /// Runs turns until a winner emerges or the cap is hit. One policy per seat.
    pub fn play(
        &mut self,
        policies: &mut [Box<dyn Policy>],
        observer: &mut dyn GameObserver,
    ) -> Result<GameOutcome, GameError> {
        if policies.len() != self.rules.players {
            return Err(GameError::configuration(format!(
                "{} policies supplied for {} seats",
                policies.len(),
                self.rules.players
            )));
        }
        loop {
            if let Some(outcome) = self.play_turn(policies, observer)? {
                return Ok(outcome);
            }
        }
    }

    /// Plays one full turn. Returns the outcome once the game has ended.
    pub fn play_turn(
        &mut self,
        policies: &mut [Box<dyn Policy>],
        observer: &mut dyn GameObserver,
    ) -> Result<Option<GameOutcome>, GameError> {
        if self.outcome.is_some() {
            return Ok(self.outcome);
        }
        let mut turn = self.begin_turn(observer);
        loop {
            let attacker = self.attacker;
            let policy = policies
                .get_mut(attacker.index())
                .ok_or(ProtocolViolation::UnknownPlayer { player: attacker })?;
            let opponents = self.opponent_views(attacker);
            let action = {
                let ctx = self.context(&turn, &opponents)?;
                policy.decide(&ctx)?
            };
            let estimate = policy.last_estimate();
            match self.apply_action(&mut turn, action, estimate, observer)? {
                Step::Continue => {}
                Step::EndTurn => return self.end_turn(turn, observer),
                Step::GameOver(outcome) => return Ok(Some(outcome)),
            }
        }
    }

    /// Draws for the current attacker. An empty deck is not an error.
    pub fn begin_turn(&mut self, observer: &mut dyn GameObserver) -> TurnState {
        let attacker = self.attacker;
        observer.on_event(&GameEvent::TurnStarted {
            turn: self.turn,
            attacker,
        });
        let drawn = self.deck.draw(attacker);
        match drawn {
            Some(card) => observer.on_event(&GameEvent::CardDrawn {
                turn: self.turn,
                player: attacker,
                card_id: card.id(),
                color: card.color(),
            }),
            None => observer.on_event(&GameEvent::DeckExhausted {
                turn: self.turn,
                player: attacker,
            }),
        }
        TurnState {
            drawn,
            has_succeeded: false,
        }
    }

    pub fn apply_action(
        &mut self,
        turn: &mut TurnState,
        action: Action,
        estimate: Option<f64>,
        observer: &mut dyn GameObserver,
    ) -> Result<Step, GameError> {
        match action {
            Action::Skip => {
                if !turn.has_succeeded {
                    return Err(ProtocolViolation::SkipBeforeSuccess {
                        player: self.attacker,
                    }
                    .into());
                }
                observer.on_event(&GameEvent::Skipped {
                    turn: self.turn,
                    player: self.attacker,
                });
                Ok(Step::EndTurn)
            }
            Action::Attack(attack) => self.resolve_attack(turn, attack, estimate, observer),
        }
    }

    /// Merges the drawn card, advances the counter and rotates the attacker.
    pub fn end_turn(
        &mut self,
        mut turn: TurnState,
        observer: &mut dyn GameObserver,
    ) -> Result<Option<GameOutcome>, GameError> {
        self.merge_drawn(turn.drawn.take(), observer)?;
        self.turn += 1;
        if self.turn >= self.rules.max_turns {
            let outcome = GameOutcome::TurnLimit { turns: self.turn };
            self.finish(outcome, observer);
            return Ok(Some(outcome));
        }
        self.attacker = self.next_attacker();
        Ok(None)
    }

    fn resolve_attack(
        &mut self,
        turn: &mut TurnState,
        attack: Attack,
        estimate: Option<f64>,
        observer: &mut dyn GameObserver,
    ) -> Result<Step, GameError> {
        let attacker = self.attacker;
        let target = attack.target;
        if target == attacker {
            return Err(ProtocolViolation::SelfTarget { player: attacker }.into());
        }
        let hand = self
            .hands
            .get(target.index())
            .ok_or(ProtocolViolation::UnknownPlayer { player: target })?;
        let card = *hand
            .card(attack.slot)
            .ok_or(ProtocolViolation::SlotOutOfRange {
                slot: attack.slot,
                len: hand.len(),
            })?;
        if card.is_opened() {
            return Err(ProtocolViolation::AlreadyOpened { card: card.id() }.into());
        }

        observer.on_event(&GameEvent::AttackAttempted {
            turn: self.turn,
            attacker,
            attack,
            estimate,
        });

        // Judged against the true card, read with the owner's authority.
        let truth = card.content(card.owner())?;
        let success = truth == attack.guess;
        let record = AttackRecord {
            turn: self.turn,
            attacker,
            target,
            slot: attack.slot,
            card_id: card.id(),
            guess: attack.guess,
            success,
        };
        self.history.push(record);
        observer.on_event(&GameEvent::AttackResolved { record });

        if !success {
            if let Some(drawn) = turn.drawn.take() {
                let opened = drawn.open()?;
                let content = opened.content(attacker)?;
                self.public.reveal(content);
                observer.on_event(&GameEvent::DrawnCardRevealed {
                    turn: self.turn,
                    player: attacker,
                    content,
                });
                turn.drawn = Some(opened);
            }
            return Ok(Step::EndTurn);
        }

        let (opened_hand, content) = hand.open(attack.slot)?;
        let eliminated = opened_hand.is_eliminated();
        self.hands[target.index()] = opened_hand;
        self.public.reveal(content);
        turn.has_succeeded = true;
        if eliminated {
            observer.on_event(&GameEvent::PlayerEliminated {
                turn: self.turn,
                player: target,
            });
        }

        if let Some(winner) = self.sole_survivor() {
            self.merge_drawn(turn.drawn.take(), observer)?;
            let outcome = GameOutcome::Winner {
                player: winner,
                turns: self.turn + 1,
            };
            self.finish(outcome, observer);
            return Ok(Step::GameOver(outcome));
        }
        Ok(Step::Continue)
    }

    fn merge_drawn(
        &mut self,
        drawn: Option<Card>,
        observer: &mut dyn GameObserver,
    ) -> Result<(), GameError> {
        let Some(card) = drawn else {
            return Ok(());
        };
        let owner = card.owner();
        let hand = self
            .hands
            .get(owner.index())
            .ok_or(ProtocolViolation::UnknownPlayer { player: owner })?;
        let (next, slot) = hand.insert(card)?;
        self.hands[owner.index()] = next;
        observer.on_event(&GameEvent::CardInserted {
            turn: self.turn,
            player: owner,
            slot,
            card_id: card.id(),
            opened: card.is_opened(),
        });
        Ok(())
    }

    fn finish(&mut self, outcome: GameOutcome, observer: &mut dyn GameObserver) {
        self.outcome = Some(outcome);
        observer.on_event(&GameEvent::GameOver { outcome });
    }

    fn sole_survivor(&self) -> Option<PlayerId> {
        let mut alive = self
            .rules
            .seats()
            .filter(|seat| self.hand(*seat).is_some_and(|hand| !hand.is_eliminated()));
        let first = alive.next()?;
        alive.next().is_none().then_some(first)
    }

    fn next_attacker(&self) -> PlayerId {
        let players = self.rules.players;
        let mut seat = self.attacker;
        for _ in 0..players {
            seat = seat.next(players);
            if self.hand(seat).is_some_and(|hand| !hand.is_eliminated()) {
                return seat;
            }
        }
        self.attacker
    }
}
