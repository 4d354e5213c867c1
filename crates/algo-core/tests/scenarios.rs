use algo_core::belief::probability::top_k;
use algo_core::belief::{enumerate_worlds, estimate_probabilities};
use algo_core::error::{GameError, ProtocolViolation};
use algo_core::game::action::Action;
use algo_core::game::event::GameEvent;
use algo_core::game::history::History;
use algo_core::game::policy::{DecisionContext, Policy};
use algo_core::game::protocol::Game;
use algo_core::model::card::{Card, CardId};
use algo_core::model::color::Color;
use algo_core::model::content::Content;
use algo_core::model::hand::{Hand, HandView};
use algo_core::model::player::PlayerId;
use algo_core::model::rules::Rules;

fn c(color: Color, rank: u8) -> Content {
    Content::new(color, rank)
}

fn card(id: u32, content: Content, owner: usize) -> Card {
    Card::new(CardId::new(id), content, PlayerId::new(owner))
}

/// Always attacks the most likely candidate and never stops voluntarily.
struct Greedy;

impl Policy for Greedy {
    fn name(&self) -> &str {
        "greedy"
    }

    fn decide(&mut self, ctx: &DecisionContext<'_>) -> Result<Action, GameError> {
        let belief = ctx.belief()?;
        for world in belief.worlds() {
            assert_eq!(world.len(), belief.slots().len());
        }
        let candidates = estimate_probabilities(&belief);
        top_k(&candidates, 1)
            .first()
            .map(|candidate| Action::Attack(candidate.attack()))
            .ok_or_else(|| ProtocolViolation::NoLegalAttack { player: ctx.me }.into())
    }
}

#[test]
fn equal_ranks_break_ties_by_color() {
    let hand = Hand::with_cards(vec![
        card(0, c(Color::Black, 1), 0),
        card(1, c(Color::White, 1), 0),
        card(2, c(Color::White, 4), 0),
    ])
    .unwrap();
    let (hand, slot) = hand.insert(card(3, c(Color::Black, 4), 0)).unwrap();
    assert_eq!(slot, 2);
    assert_eq!(hand.reveal_all(), "B01 W01 B04 W04");
}

#[test]
fn opened_flag_is_one_way() {
    let hand = Hand::with_cards(vec![card(0, c(Color::Black, 1), 0)]).unwrap();
    let (hand, content) = hand.open(0).unwrap();
    assert_eq!(content, c(Color::Black, 1));
    let err = hand.open(0).unwrap_err();
    assert!(matches!(
        err,
        GameError::Protocol(ProtocolViolation::AlreadyOpened { .. })
    ));
    assert!(hand.card(0).unwrap().is_opened());
    assert!(hand.is_eliminated());
}

#[test]
fn exhausted_contents_force_certainty() {
    let rules = Rules {
        min_rank: 0,
        max_rank: 1,
        hand_size: 2,
        ..Rules::default()
    };
    let opponent = Hand::with_cards(vec![card(5, c(Color::White, 1), 1)]).unwrap();
    let view = HandView::of(PlayerId::new(1), &opponent);
    let belief = enumerate_worlds(
        &rules,
        PlayerId::new(0),
        &[c(Color::Black, 0), c(Color::White, 0)],
        std::slice::from_ref(&view),
        &[],
        Some(c(Color::Black, 1)),
        &History::new(),
    )
    .unwrap();
    let candidates = estimate_probabilities(&belief);
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].guess, c(Color::White, 1));
    assert!(candidates[0].is_certain());
}

#[test]
fn seeded_games_stay_consistent_to_the_end() {
    let rules = Rules {
        min_rank: 0,
        max_rank: 5,
        hand_size: 3,
        max_turns: 500,
        ..Rules::default()
    };
    for seed in 0..12u64 {
        let mut game = Game::new(rules.clone(), seed).unwrap();
        let mut policies: Vec<Box<dyn Policy>> = vec![Box::new(Greedy), Box::new(Greedy)];
        let mut events = Vec::new();
        let outcome = game
            .play(&mut policies, &mut events)
            .unwrap_or_else(|err| panic!("seed {seed}: {err}"));

        let winner = outcome.winner().expect("greedy play always finishes");
        let loser = PlayerId::new(1 - winner.index());
        assert!(game.hand(loser).unwrap().is_eliminated());
        assert!(!game.hand(winner).unwrap().is_eliminated());

        let resolved = events
            .iter()
            .filter(|event| matches!(event, GameEvent::AttackResolved { .. }))
            .count();
        assert_eq!(resolved, game.history().len());
        assert!(matches!(events.last(), Some(GameEvent::GameOver { .. })));
    }
}
