mod observer;
mod permutations;

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use algo_bot::PolicySpec;
use algo_core::error::GameError;
use algo_core::game::action::Action;
use algo_core::game::policy::{DecisionContext, Policy};
use algo_core::game::protocol::{Game, GameOutcome};
use rand::{RngCore, SeedableRng, rngs::StdRng};
use serde::Serialize;
use thiserror::Error;
use tracing::{Level, event};

use crate::analytics::{AnalyticsCollector, AnalyticsError};
use crate::config::{AgentConfig, AgentKind, BenchmarkConfig, ResolvedOutputs};

pub use observer::{SeatStats, TournamentObserver};
pub use permutations::{SeatPermutations, factorial};

const SEAT_SEED_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

/// Primary entry point for orchestrating tournaments.
pub struct TournamentRunner {
    config: BenchmarkConfig,
    outputs: ResolvedOutputs,
    agents: Vec<AgentBlueprint>,
    baseline: Option<AgentBlueprint>,
    seat_permutations: SeatPermutations,
    logging_enabled: bool,
}

/// Summary details returned after a run.
pub struct RunSummary {
    pub games_played: usize,
    pub permutations: usize,
    pub rows_written: usize,
    pub jsonl_path: PathBuf,
    pub summary_path: PathBuf,
    pub plot_path: Option<PathBuf>,
}

impl TournamentRunner {
    /// Build a runner from a validated configuration.
    pub fn new(config: BenchmarkConfig, outputs: ResolvedOutputs) -> Result<Self, RunnerError> {
        let agents = AgentBlueprint::from_configs(&config.agents)?;
        let seats = config.rules.players;

        if agents.len() != seats {
            return Err(RunnerError::SeatCount {
                found: agents.len(),
                expected: seats,
            });
        }

        let baseline = config.metrics.baseline.as_deref().and_then(|name| {
            agents
                .iter()
                .find(|agent| agent.name == name)
                .map(|agent| AgentBlueprint {
                    name: agent.name.clone(),
                    spec: agent.spec,
                })
        });
        let seat_permutations = SeatPermutations::new(seats, config.games.permutations);

        Ok(Self {
            logging_enabled: config.logging.enable_structured,
            config,
            outputs,
            agents,
            baseline,
            seat_permutations,
        })
    }

    /// The baseline replayed in the background of every other agent's seat.
    fn baseline_shadow(&self, seat: &SeatState<'_>) -> Option<Box<dyn Policy>> {
        self.baseline
            .as_ref()
            .filter(|baseline| baseline.name != seat.agent.name)
            .map(|baseline| baseline.spec.spawn(seat.policy_seed))
    }

    /// Execute the tournament, streaming JSONL rows to disk.
    pub fn run(&self) -> Result<RunSummary, RunnerError> {
        ensure_parent(self.outputs.jsonl.parent())?;
        ensure_parent(self.outputs.summary_md.parent())?;
        if !self.outputs.plots_dir.as_os_str().is_empty() {
            fs::create_dir_all(&self.outputs.plots_dir)?;
        }

        let mut writer = BufWriter::new(File::create(&self.outputs.jsonl)?);
        let permutations = self.seat_permutations.as_slice();
        let mut rng = StdRng::seed_from_u64(self.config.games.seed.unwrap_or(0));
        let mut rows_written = 0usize;
        let mut analytics = AnalyticsCollector::new(&self.config)?;

        for game_index in 0..self.config.games.count {
            let base_seed = rng.next_u64();

            for (perm_index, perm) in permutations.iter().enumerate() {
                let result = self.play_game(game_index, perm_index, base_seed, perm)?;
                analytics.record_game(&result)?;
                rows_written += write_game_rows(
                    &mut writer,
                    &self.config,
                    game_index,
                    perm_index,
                    base_seed,
                    &result,
                )?;
            }
        }

        writer.flush()?;

        let summary = analytics.finalize()?;
        summary.write_markdown(&self.outputs.summary_md)?;
        let plot_path = match summary.render_plot(&self.outputs.plots_dir) {
            Ok(path) => Some(path),
            Err(err) => {
                eprintln!("WARN: {}", err);
                None
            }
        };

        Ok(RunSummary {
            games_played: self.config.games.count,
            permutations: permutations.len(),
            rows_written,
            jsonl_path: self.outputs.jsonl.clone(),
            summary_path: self.outputs.summary_md.clone(),
            plot_path,
        })
    }

    fn play_game(
        &self,
        game_index: usize,
        permutation_index: usize,
        base_seed: u64,
        permutation: &[usize],
    ) -> Result<GameResult, RunnerError> {
        let game_id = game_id(game_index, permutation_index);
        let mut game = Game::new(self.config.rules.clone(), base_seed)?;

        let mut seats = Vec::with_capacity(permutation.len());
        for (seat_idx, agent_idx) in permutation.iter().enumerate() {
            let agent = self
                .agents
                .get(*agent_idx)
                .ok_or(RunnerError::InvalidPermutation {
                    index: seat_idx,
                    agent_index: *agent_idx,
                })?;
            seats.push(SeatState::new(seat_idx, agent, base_seed));
        }

        let mut policies: Vec<Box<dyn Policy>> = seats
            .iter()
            .map(|seat| {
                Box::new(TimedPolicy {
                    inner: seat.agent.spec.spawn(seat.policy_seed),
                    shadow: self.baseline_shadow(seat),
                    metrics: Arc::clone(&seat.metrics),
                    log: self.logging_enabled.then(|| DecisionTrace {
                        run_id: self.config.run_id.clone(),
                        game_id: game_id.clone(),
                        seat: seat.seat,
                    }),
                }) as Box<dyn Policy>
            })
            .collect();

        let mut observer =
            TournamentObserver::new(seats.len(), self.logging_enabled, game_id.clone());
        let outcome = game.play(&mut policies, &mut observer)?;
        drop(policies);
        let stats = observer.into_stats();

        let seating = seats
            .iter()
            .map(|seat| SeatSnapshot {
                seat: seat.seat,
                bot: seat.agent.name.clone(),
            })
            .collect();

        let mut seat_results = Vec::with_capacity(seats.len());
        for seat in seats {
            let metrics = seat
                .metrics
                .lock()
                .map(|metrics| metrics.summary())
                .unwrap_or_default();
            seat_results.push(SeatResult {
                agent_name: seat.agent.name.clone(),
                seat: seat.seat,
                won: outcome.winner().map(|p| p.index()) == Some(seat.seat),
                stats: stats.get(seat.seat).copied().unwrap_or_default(),
                metrics,
            });
        }

        Ok(GameResult {
            game_id,
            seating,
            seat_results,
            outcome,
        })
    }
}

fn ensure_parent(path: Option<&Path>) -> Result<(), RunnerError> {
    if let Some(dir) = path.filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

fn game_id(game_index: usize, permutation_index: usize) -> String {
    format!("G{game_index:05}_P{permutation_index:02}")
}

/// Per-seat policy seed; the same deal replays the same seat randomness.
fn seat_seed(base_seed: u64, seat: usize) -> u64 {
    base_seed ^ (seat as u64 + 1).wrapping_mul(SEAT_SEED_MIX)
}

fn write_game_rows(
    writer: &mut BufWriter<File>,
    config: &BenchmarkConfig,
    game_index: usize,
    permutation_index: usize,
    base_seed: u64,
    result: &GameResult,
) -> Result<usize, RunnerError> {
    let mut rows_written = 0usize;
    for seat_result in &result.seat_results {
        let row = GameLogRow {
            run_id: config.run_id.clone(),
            game_id: result.game_id.clone(),
            game_index,
            permutation_index,
            game_seed: base_seed,
            seat: seat_result.seat,
            bot: seat_result.agent_name.clone(),
            seating: result.seating.clone(),
            won: seat_result.won,
            outcome: result.outcome,
            turns: result.outcome.turns(),
            attacks: seat_result.stats.attacks,
            successes: seat_result.stats.successes,
            estimate_sum: seat_result.stats.estimate_sum,
            skips: seat_result.stats.skips,
            speed_ms_decision: seat_result.metrics.avg_ms_per_decision,
            decisions: seat_result.metrics.decisions,
            baseline_compared: seat_result.metrics.compared,
            baseline_disagreements: seat_result.metrics.disagreements,
        };

        serde_json::to_writer(&mut *writer, &row)?;
        writer.write_all(b"\n")?;
        rows_written += 1;
    }

    Ok(rows_written)
}

struct SeatState<'a> {
    seat: usize,
    agent: &'a AgentBlueprint,
    policy_seed: u64,
    metrics: Arc<Mutex<DecisionMetrics>>,
}

impl<'a> SeatState<'a> {
    fn new(seat: usize, agent: &'a AgentBlueprint, base_seed: u64) -> Self {
        Self {
            seat,
            agent,
            policy_seed: seat_seed(base_seed, seat),
            metrics: Arc::new(Mutex::new(DecisionMetrics::default())),
        }
    }
}

struct DecisionTrace {
    run_id: String,
    game_id: String,
    seat: usize,
}

/// Wraps a seat's policy to time every decision and, when a baseline shadow is
/// attached, to count the decisions where the baseline would have acted differently.
struct TimedPolicy {
    inner: Box<dyn Policy>,
    shadow: Option<Box<dyn Policy>>,
    metrics: Arc<Mutex<DecisionMetrics>>,
    log: Option<DecisionTrace>,
}

impl Policy for TimedPolicy {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn decide(&mut self, ctx: &DecisionContext<'_>) -> Result<Action, GameError> {
        let start = Instant::now();
        let action = self.inner.decide(ctx)?;
        let elapsed = start.elapsed();
        let baseline_action = match self.shadow.as_mut() {
            Some(shadow) => Some(shadow.decide(ctx)?),
            None => None,
        };
        let elapsed_ms = match self.metrics.lock() {
            Ok(mut metrics) => {
                if let Some(baseline_action) = baseline_action {
                    metrics.compare(baseline_action == action);
                }
                metrics.record(elapsed)
            }
            Err(_) => elapsed.as_secs_f64() * 1000.0,
        };

        if let Some(trace) = self.log.as_ref()
            && tracing::enabled!(target: "algo_bench::decision", Level::INFO)
        {
            let action_display = action.to_string();
            event!(
                target: "algo_bench::decision",
                Level::INFO,
                run_id = %trace.run_id,
                game_id = %trace.game_id,
                seat = trace.seat as u32,
                turn = ctx.public.turn,
                action = %action_display,
                estimate = ?self.inner.last_estimate(),
                elapsed_ms
            );
        }

        Ok(action)
    }

    fn last_estimate(&self) -> Option<f64> {
        self.inner.last_estimate()
    }
}

pub struct GameResult {
    pub game_id: String,
    pub seating: Vec<SeatSnapshot>,
    pub seat_results: Vec<SeatResult>,
    pub outcome: GameOutcome,
}

#[derive(Clone, Serialize)]
pub struct SeatSnapshot {
    pub seat: usize,
    pub bot: String,
}

pub struct SeatResult {
    pub agent_name: String,
    pub seat: usize,
    pub won: bool,
    pub stats: SeatStats,
    pub metrics: DecisionSummary,
}

#[derive(Default)]
struct DecisionMetrics {
    total: Duration,
    decisions: u32,
    compared: u32,
    disagreements: u32,
}

impl DecisionMetrics {
    fn record(&mut self, duration: Duration) -> f64 {
        self.total += duration;
        self.decisions += 1;
        duration.as_secs_f64() * 1000.0
    }

    fn compare(&mut self, agreed: bool) {
        self.compared += 1;
        if !agreed {
            self.disagreements += 1;
        }
    }

    fn summary(&self) -> DecisionSummary {
        let avg_ms = if self.decisions == 0 {
            0.0
        } else {
            self.total.as_secs_f64() * 1000.0 / f64::from(self.decisions)
        };

        DecisionSummary {
            decisions: self.decisions,
            avg_ms_per_decision: avg_ms,
            total_ms: self.total.as_secs_f64() * 1000.0,
            compared: self.compared,
            disagreements: self.disagreements,
        }
    }
}

#[derive(Clone, Copy, Default)]
pub struct DecisionSummary {
    pub decisions: u32,
    pub avg_ms_per_decision: f64,
    pub total_ms: f64,
    /// Decisions also put to the baseline, and how many of those it answered differently.
    pub compared: u32,
    pub disagreements: u32,
}

#[derive(Serialize)]
struct GameLogRow {
    run_id: String,
    game_id: String,
    game_index: usize,
    permutation_index: usize,
    game_seed: u64,
    seat: usize,
    bot: String,
    seating: Vec<SeatSnapshot>,
    won: bool,
    outcome: GameOutcome,
    turns: u32,
    attacks: u32,
    successes: u32,
    estimate_sum: f64,
    skips: u32,
    speed_ms_decision: f64,
    decisions: u32,
    baseline_compared: u32,
    baseline_disagreements: u32,
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("{0}")]
    Agent(#[from] AgentError),
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("failed to serialize log row: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
    #[error("game execution failed: {0}")]
    Game(#[from] GameError),
    #[error("configuration seats {expected} players but found {found} agents")]
    SeatCount { found: usize, expected: usize },
    #[error("permutation index {index} references invalid agent index {agent_index}")]
    InvalidPermutation { index: usize, agent_index: usize },
    #[error("analytics error: {0}")]
    Analytics(#[from] AnalyticsError),
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("unsupported agent kind {kind:?} for agent '{name}'")]
    UnsupportedKind { name: String, kind: AgentKind },
    #[error("invalid parameter for agent '{name}': {message}")]
    InvalidParam { name: String, message: String },
}

pub(crate) struct AgentBlueprint {
    pub(crate) name: String,
    pub(crate) spec: PolicySpec,
}

impl AgentBlueprint {
    fn from_configs(configs: &[AgentConfig]) -> Result<Vec<Self>, AgentError> {
        configs.iter().map(Self::from_config).collect()
    }

    /// Automated agents only; YAML params first, then `ALGO_*` overrides.
    pub(crate) fn from_config(config: &AgentConfig) -> Result<Self, AgentError> {
        let invalid = |message: String| AgentError::InvalidParam {
            name: config.name.clone(),
            message,
        };
        let spec = config
            .policy_spec()
            .map_err(|err| invalid(err.to_string()))?
            .ok_or_else(|| AgentError::UnsupportedKind {
                name: config.name.clone(),
                kind: config.kind,
            })?
            .with_overrides(|key| std::env::var(key).ok());
        spec.validate().map_err(|err| invalid(err.to_string()))?;

        Ok(Self {
            name: config.name.clone(),
            spec,
        })
    }
}
