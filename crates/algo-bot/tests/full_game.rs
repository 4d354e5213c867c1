use algo_bot::{MaxEntropyParams, MaxProbabilityParams, Policy, PolicySpec};
use algo_core::error::{GameError, ProtocolViolation};
use algo_core::game::action::Action;
use algo_core::game::event::{GameEvent, NullObserver};
use algo_core::game::policy::DecisionContext;
use algo_core::game::protocol::{Game, GameOutcome};
use algo_core::model::player::PlayerId;
use algo_core::model::rules::Rules;

fn compact_rules() -> Rules {
    Rules {
        min_rank: 0,
        max_rank: 5,
        hand_size: 3,
        max_turns: 500,
        ..Rules::default()
    }
}

fn play(spec_a: PolicySpec, spec_b: PolicySpec, seed: u64) -> (Game, GameOutcome, Vec<GameEvent>) {
    let mut game = Game::new(compact_rules(), seed).unwrap();
    let mut policies = vec![spec_a.spawn(seed), spec_b.spawn(seed.wrapping_add(1))];
    let mut events = Vec::new();
    let outcome = game.play(&mut policies, &mut events).unwrap();
    (game, outcome, events)
}

#[test]
fn seeded_max_probability_game_finishes_with_one_survivor() {
    let spec = PolicySpec::MaxProbability(MaxProbabilityParams::default());
    let (game, outcome, _) = play(spec, spec, 2024);

    let winner = outcome.winner().expect("game should not hit the turn cap");
    assert!(outcome.turns() <= compact_rules().max_turns);
    let loser = PlayerId::new(1 - winner.index());
    assert!(game.hand(loser).unwrap().is_eliminated());
    assert!(!game.hand(winner).unwrap().is_eliminated());
}

#[test]
fn same_seed_replays_identically() {
    let spec = PolicySpec::MaxProbability(MaxProbabilityParams::default());
    let (_, first, first_events) = play(spec, spec, 99);
    let (_, second, second_events) = play(spec, spec, 99);
    assert_eq!(first, second);
    assert_eq!(first_events, second_events);
}

#[test]
fn entropy_and_probability_policies_can_share_a_table() {
    let entropy = PolicySpec::MaxEntropy(MaxEntropyParams::default());
    let probability = PolicySpec::MaxProbability(MaxProbabilityParams::default());
    for seed in 0..3u64 {
        let (_, outcome, events) = play(entropy, probability, seed);
        assert!(matches!(events.last(), Some(GameEvent::GameOver { .. })));
        assert!(outcome.turns() > 0);
    }
}

struct AlwaysSkip;

impl Policy for AlwaysSkip {
    fn name(&self) -> &str {
        "always_skip"
    }

    fn decide(&mut self, _ctx: &DecisionContext<'_>) -> Result<Action, GameError> {
        Ok(Action::Skip)
    }
}

#[test]
fn skipping_before_any_success_is_rejected_by_the_table() {
    let mut game = Game::new(compact_rules(), 1).unwrap();
    let mut policies: Vec<Box<dyn Policy>> = vec![Box::new(AlwaysSkip), Box::new(AlwaysSkip)];
    let err = game.play(&mut policies, &mut NullObserver).unwrap_err();
    assert_eq!(
        err,
        GameError::Protocol(ProtocolViolation::SkipBeforeSuccess {
            player: PlayerId::new(0)
        })
    );
}
