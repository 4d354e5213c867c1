use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use plotters::prelude::*;
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};
use thiserror::Error;

use crate::config::{AgentConfig, AgentKind, BenchmarkConfig};
use crate::tournament::{DecisionSummary, GameResult, SeatStats};

const CONFIDENCE_Z: f64 = 1.96; // 95% CI

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("baseline agent '{0}' not present in tournament results")]
    MissingBaseline(String),
    #[error("agent '{0}' defined in results but missing from configuration")]
    UnknownAgent(String),
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to render plot: {0}")]
    Plot(String),
}

pub struct AnalyticsCollector {
    baseline: String,
    agents: HashMap<String, AgentAccumulator>,
    agent_order: Vec<String>,
    games: usize,
    turn_limited: usize,
}

impl AnalyticsCollector {
    pub fn new(config: &BenchmarkConfig) -> Result<Self, AnalyticsError> {
        let baseline = config
            .metrics
            .baseline
            .clone()
            .ok_or_else(|| AnalyticsError::MissingBaseline("<unset>".into()))?;

        let mut agents = HashMap::new();
        let mut order = Vec::new();
        for agent in &config.agents {
            agents.insert(agent.name.clone(), AgentAccumulator::new(agent.clone()));
            order.push(agent.name.clone());
        }

        if !agents.contains_key(&baseline) {
            return Err(AnalyticsError::MissingBaseline(baseline));
        }

        Ok(Self {
            baseline,
            agents,
            agent_order: order,
            games: 0,
            turn_limited: 0,
        })
    }

    pub fn record_game(&mut self, result: &GameResult) -> Result<(), AnalyticsError> {
        self.games += 1;
        if result.outcome.winner().is_none() {
            self.turn_limited += 1;
        }

        for seat in &result.seat_results {
            let acc = self
                .agents
                .get_mut(&seat.agent_name)
                .ok_or_else(|| AnalyticsError::UnknownAgent(seat.agent_name.clone()))?;
            acc.record_game(
                seat.won,
                result.outcome.turns(),
                &seat.stats,
                &seat.metrics,
            );
        }

        Ok(())
    }

    pub fn finalize(mut self) -> Result<AnalyticsSummary, AnalyticsError> {
        let mut reports = Vec::new();
        for name in &self.agent_order {
            if let Some(acc) = self.agents.remove(name) {
                reports.push(acc.into_report());
            }
        }

        let baseline = reports
            .iter()
            .find(|report| report.name == self.baseline)
            .map(|report| (report.wins, report.games))
            .ok_or_else(|| AnalyticsError::MissingBaseline(self.baseline.clone()))?;

        let comparisons = reports
            .iter()
            .map(|report| {
                let p_value = if report.name == self.baseline {
                    1.0
                } else {
                    two_proportion_p_value(report.wins, report.games, baseline.0, baseline.1)
                };
                ComparisonReport {
                    agent: report.name.clone(),
                    p_value,
                    sample_size: report.games,
                }
            })
            .collect();

        Ok(AnalyticsSummary {
            baseline: self.baseline,
            agents: reports,
            comparisons,
            games: self.games,
            turn_limited: self.turn_limited,
        }
        .enrich())
    }
}

struct AgentAccumulator {
    config: AgentConfig,
    games: usize,
    wins: usize,
    winning_turns: u64,
    outcomes: Vec<f64>,
    attacks: u64,
    successes: u64,
    estimate_sum: f64,
    estimated_attacks: u64,
    skips: u64,
    total_latency_ms: f64,
    total_decisions: u64,
    compared: u64,
    disagreements: u64,
}

impl AgentAccumulator {
    fn new(config: AgentConfig) -> Self {
        Self {
            config,
            games: 0,
            wins: 0,
            winning_turns: 0,
            outcomes: Vec::new(),
            attacks: 0,
            successes: 0,
            estimate_sum: 0.0,
            estimated_attacks: 0,
            skips: 0,
            total_latency_ms: 0.0,
            total_decisions: 0,
            compared: 0,
            disagreements: 0,
        }
    }

    fn record_game(&mut self, won: bool, turns: u32, stats: &SeatStats, metrics: &DecisionSummary) {
        self.games += 1;
        self.outcomes.push(if won { 1.0 } else { 0.0 });
        if won {
            self.wins += 1;
            self.winning_turns += u64::from(turns);
        }
        self.attacks += u64::from(stats.attacks);
        self.successes += u64::from(stats.successes);
        self.estimate_sum += stats.estimate_sum;
        self.estimated_attacks += u64::from(stats.estimated_attacks);
        self.skips += u64::from(stats.skips);
        self.total_latency_ms += metrics.total_ms;
        self.total_decisions += u64::from(metrics.decisions);
        self.compared += u64::from(metrics.compared);
        self.disagreements += u64::from(metrics.disagreements);
    }

    fn into_report(self) -> AgentReport {
        let win_rate = ratio(self.wins as f64, self.games as f64);
        // Predicted successes over observed ones; 1.0 is perfectly calibrated.
        let calibration = if self.successes == 0 || self.estimated_attacks == 0 {
            None
        } else {
            Some(self.estimate_sum / self.successes as f64)
        };
        // Share of decisions the baseline would have made differently.
        let disagreement_rate =
            (self.compared > 0).then(|| self.disagreements as f64 / self.compared as f64);

        AgentReport {
            name: self.config.name.clone(),
            kind: self.config.kind,
            params: self.config.params.clone(),
            games: self.games,
            wins: self.wins,
            win_rate,
            ci95: confidence_interval(&self.outcomes),
            avg_turns_to_win: ratio(self.winning_turns as f64, self.wins as f64),
            attacks: self.attacks,
            accuracy: ratio(self.successes as f64, self.attacks as f64),
            calibration,
            skips: self.skips,
            average_ms_per_decision: ratio(self.total_latency_ms, self.total_decisions as f64),
            disagreement_rate,
            delta_vs_baseline: 0.0,
        }
    }
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Two-sided pooled z-test for a difference in win rates.
fn two_proportion_p_value(wins_a: usize, n_a: usize, wins_b: usize, n_b: usize) -> f64 {
    if n_a == 0 || n_b == 0 {
        return 1.0;
    }
    let (na, nb) = (n_a as f64, n_b as f64);
    let pooled = (wins_a + wins_b) as f64 / (na + nb);
    let variance = pooled * (1.0 - pooled) * (1.0 / na + 1.0 / nb);
    if variance <= 0.0 {
        return 1.0;
    }
    let z = ((wins_a as f64 / na) - (wins_b as f64 / nb)).abs() / variance.sqrt();
    let Ok(normal) = Normal::new(0.0, 1.0) else {
        return 1.0;
    };
    (2.0 * (1.0 - normal.cdf(z))).clamp(0.0, 1.0)
}

#[derive(Debug, Serialize)]
pub struct AnalyticsSummary {
    pub baseline: String,
    pub agents: Vec<AgentReport>,
    pub comparisons: Vec<ComparisonReport>,
    pub games: usize,
    pub turn_limited: usize,
}

impl AnalyticsSummary {
    pub fn enrich(mut self) -> Self {
        let baseline_rate = self
            .agents
            .iter()
            .find(|agent| agent.name == self.baseline)
            .map(|agent| agent.win_rate)
            .unwrap_or(0.0);

        for agent in &mut self.agents {
            agent.delta_vs_baseline = agent.win_rate - baseline_rate;
        }

        self
    }

    pub fn write_markdown(&self, path: impl AsRef<Path>) -> Result<(), AnalyticsError> {
        let mut rows = String::new();
        rows.push_str("# Tournament Summary\n\n");
        rows.push_str(&format!(
            "Games: {} ({} hit the turn cap)\n\nBaseline: {}\n\n",
            self.games, self.turn_limited, self.baseline
        ));
        rows.push_str("| Agent | Kind | Games | Win % | Δ vs baseline | 95% CI | Avg turns to win | Accuracy | Calibration | Skips | Avg ms/decision | Disagreement | p-value |\n");
        rows.push_str("|-------|------|-------|-------|----------------|--------|------------------|----------|-------------|-------|------------------|--------------|---------|\n");

        for agent in &self.agents {
            let p_value = self
                .comparisons
                .iter()
                .find(|c| c.agent == agent.name)
                .map(|c| c.p_value)
                .unwrap_or(1.0);
            let calibration = agent
                .calibration
                .map(|value| format!("{value:.3}"))
                .unwrap_or_else(|| "n/a".to_string());
            let disagreement = agent
                .disagreement_rate
                .map(|rate| format!("{:.1}%", rate * 100.0))
                .unwrap_or_else(|| "-".to_string());

            rows.push_str(&format!(
                "| {name} | {kind:?} | {games} | {win:.1}% | {delta:+.1}% | [{ci_low:.3}, {ci_high:.3}] | {turns:.1} | {accuracy:.1}% | {calibration} | {skips} | {latency:.2} | {disagreement} | {pval:.3} |\n",
                name = agent.name,
                kind = agent.kind,
                games = agent.games,
                win = agent.win_rate * 100.0,
                delta = agent.delta_vs_baseline * 100.0,
                ci_low = agent.ci95.0,
                ci_high = agent.ci95.1,
                turns = agent.avg_turns_to_win,
                accuracy = agent.accuracy * 100.0,
                skips = agent.skips,
                latency = agent.average_ms_per_decision,
                pval = p_value,
            ));
        }

        fs::write(path.as_ref(), rows).map_err(|e| AnalyticsError::Io {
            context: "writing summary markdown",
            source: e,
        })?;
        Ok(())
    }

    pub fn render_plot(&self, dir: impl AsRef<Path>) -> Result<PathBuf, AnalyticsError> {
        let dir = dir.as_ref();
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir).map_err(|e| AnalyticsError::Io {
                context: "creating plots directory",
                source: e,
            })?;
        }

        let output_path = dir.join("win_rate.png");
        let baseline = self.baseline.clone();
        let agents = self.agents.clone();

        let prev_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(|_| {}));

        let plot_attempt = std::panic::catch_unwind(move || {
            let root = BitMapBackend::new(&output_path, (800, 480)).into_drawing_area();
            root.fill(&WHITE)
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            let mut chart = ChartBuilder::on(&root)
                .margin(20)
                .caption("Win rate with 95% CI", ("sans-serif", 22))
                .set_label_area_size(LabelAreaPosition::Left, 50)
                .set_label_area_size(LabelAreaPosition::Bottom, 60)
                .build_cartesian_2d(0..agents.len(), 0.0f64..1.0f64)
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            chart
                .configure_mesh()
                .disable_mesh()
                .y_desc("Win rate")
                .x_desc("Agent")
                .x_label_formatter(&|idx| {
                    agents
                        .get(*idx)
                        .map(|agent| agent.name.clone())
                        .unwrap_or_default()
                })
                .draw()
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            chart
                .draw_series(agents.iter().enumerate().map(|(idx, agent)| {
                    let color = if agent.name == baseline {
                        &BLUE
                    } else if agent.delta_vs_baseline >= 0.0 {
                        &GREEN
                    } else {
                        &RED
                    };
                    Rectangle::new([(idx, 0.0), (idx + 1, agent.win_rate)], color.filled())
                }))
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            chart
                .draw_series(agents.iter().enumerate().map(|(idx, agent)| {
                    let (low, high) = (agent.ci95.0.max(0.0), agent.ci95.1.min(1.0));
                    PathElement::new(vec![(idx, low), (idx, high)], BLACK.stroke_width(2))
                }))
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            drop(chart);

            root.present()
                .map_err(|e| AnalyticsError::Plot(e.to_string()))?;

            drop(root);

            Ok(output_path)
        });

        std::panic::set_hook(prev_hook);

        match plot_attempt {
            Ok(result) => result,
            Err(_) => Err(AnalyticsError::Plot(
                "plotters panicked while rendering (missing font support?)".into(),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentReport {
    pub name: String,
    pub kind: AgentKind,
    pub params: serde_yaml::Value,
    pub games: usize,
    pub wins: usize,
    pub win_rate: f64,
    pub ci95: (f64, f64),
    pub avg_turns_to_win: f64,
    pub attacks: u64,
    pub accuracy: f64,
    pub calibration: Option<f64>,
    pub skips: u64,
    pub average_ms_per_decision: f64,
    /// `None` for the baseline itself.
    pub disagreement_rate: Option<f64>,
    #[serde(skip)]
    pub delta_vs_baseline: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub agent: String,
    pub p_value: f64,
    pub sample_size: usize,
}

fn confidence_interval(points: &[f64]) -> (f64, f64) {
    if points.is_empty() {
        return (0.0, 0.0);
    }
    let mean = points.iter().sum::<f64>() / points.len() as f64;
    if points.len() == 1 {
        return (mean, mean);
    }
    let variance = points
        .iter()
        .map(|value| (value - mean).powi(2))
        .sum::<f64>()
        / (points.len() as f64 - 1.0);
    let std_error = (variance / points.len() as f64).sqrt();
    let margin = CONFIDENCE_Z * std_error;
    (mean - margin, mean + margin)
}
