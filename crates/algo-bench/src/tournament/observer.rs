use algo_core::game::event::{GameEvent, GameObserver};
use tracing::{Level, event};

/// Per-seat attack statistics gathered from the event stream.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SeatStats {
    pub attacks: u32,
    pub successes: u32,
    /// Sum of the success probabilities the policy reported before attacking.
    pub estimate_sum: f64,
    /// Attacks that carried an estimate.
    pub estimated_attacks: u32,
    pub skips: u32,
}

/// Counts attacks per seat and, when asked, mirrors every event to `tracing`.
pub struct TournamentObserver {
    seats: Vec<SeatStats>,
    trace: bool,
    game_id: String,
}

impl TournamentObserver {
    pub fn new(seats: usize, trace: bool, game_id: impl Into<String>) -> Self {
        Self {
            seats: vec![SeatStats::default(); seats],
            trace,
            game_id: game_id.into(),
        }
    }

    pub fn into_stats(self) -> Vec<SeatStats> {
        self.seats
    }

    fn seat(&mut self, index: usize) -> Option<&mut SeatStats> {
        self.seats.get_mut(index)
    }
}

impl GameObserver for TournamentObserver {
    fn on_event(&mut self, game_event: &GameEvent) {
        match game_event {
            GameEvent::AttackAttempted {
                attacker, estimate, ..
            } => {
                if let Some(stats) = self.seat(attacker.index()) {
                    stats.attacks += 1;
                    if let Some(p) = estimate {
                        stats.estimate_sum += p;
                        stats.estimated_attacks += 1;
                    }
                }
            }
            GameEvent::AttackResolved { record } if record.success => {
                if let Some(stats) = self.seat(record.attacker.index()) {
                    stats.successes += 1;
                }
            }
            GameEvent::Skipped { player, .. } => {
                if let Some(stats) = self.seat(player.index()) {
                    stats.skips += 1;
                }
            }
            _ => {}
        }

        if self.trace && tracing::enabled!(target: "algo_bench::event", Level::INFO) {
            let payload = serde_json::to_string(game_event).unwrap_or_default();
            event!(
                target: "algo_bench::event",
                Level::INFO,
                game_id = %self.game_id,
                payload = %payload
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use algo_core::game::action::Attack;
    use algo_core::model::color::Color;
    use algo_core::model::content::Content;
    use algo_core::model::player::PlayerId;

    #[test]
    fn counts_attacks_and_skips_per_seat() {
        let mut observer = TournamentObserver::new(2, false, "G0");
        let attack = Attack {
            target: PlayerId::new(1),
            slot: 0,
            guess: Content::new(Color::Black, 3),
        };
        observer.on_event(&GameEvent::AttackAttempted {
            turn: 0,
            attacker: PlayerId::new(0),
            attack,
            estimate: Some(0.25),
        });
        observer.on_event(&GameEvent::AttackAttempted {
            turn: 0,
            attacker: PlayerId::new(0),
            attack,
            estimate: None,
        });
        observer.on_event(&GameEvent::Skipped {
            turn: 1,
            player: PlayerId::new(1),
        });

        let stats = observer.into_stats();
        assert_eq!(stats[0].attacks, 2);
        assert_eq!(stats[0].estimated_attacks, 1);
        assert!((stats[0].estimate_sum - 0.25).abs() < 1e-12);
        assert_eq!(stats[1].skips, 1);
        assert_eq!(stats[1].attacks, 0);
    }
}
