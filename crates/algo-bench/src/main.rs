use std::io::{self, BufReader};
use std::path::PathBuf;

use clap::Parser;

use algo_bench::config::{BenchmarkConfig, ResolvedOutputs};
use algo_bench::interactive::{ConsolePresenter, play_interactive};
use algo_bench::logging::init_logging;
use algo_bench::tournament::TournamentRunner;

/// Tournament and console harness for Algo bots.
#[derive(Debug, Parser)]
#[command(
    name = "algo-bench",
    author,
    version,
    about = "Deterministic Algo tournament harness"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "bench/bench.yaml")]
    config: PathBuf,

    /// Override the run identifier (substitutes {run_id} templates).
    #[arg(long, value_name = "RUN_ID")]
    run_id: Option<String>,

    /// Override the number of games to play.
    #[arg(long, value_name = "GAMES")]
    games: Option<usize>,

    /// Override the RNG seed for deal generation.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Override the number of seat permutations per deal.
    #[arg(long, value_name = "COUNT")]
    permutations: Option<usize>,

    /// Exit after validating the configuration (no tournament is run).
    #[arg(long)]
    validate_only: bool,

    /// Play one game from the console in this seat instead of running the tournament.
    #[arg(long, value_name = "SEAT")]
    play_as: Option<usize>,

    /// Record every policy decision in the telemetry log.
    #[arg(long)]
    log_decisions: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = BenchmarkConfig::from_path(&cli.config)?;

    if let Some(run_id) = cli.run_id {
        config.run_id = run_id;
    }

    if let Some(games) = cli.games {
        config.games.count = games;
    }

    if let Some(seed) = cli.seed {
        config.games.seed = Some(seed);
    }

    if let Some(permutations) = cli.permutations {
        config.games.permutations = permutations;
    }

    if cli.log_decisions {
        config.logging.decision_details = true;
    }

    config.validate()?;

    if let Some(seat) = cli.play_as {
        let mut presenter = ConsolePresenter::new(io::stdout());
        let outcome = play_interactive(
            &config,
            seat,
            BufReader::new(io::stdin()),
            io::stdout(),
            &mut presenter,
        )?;
        let verdict = match outcome.winner() {
            Some(player) if player.index() == seat => "You win!",
            Some(_) => "You lose.",
            None => "Draw.",
        };
        println!("{verdict}");
        return Ok(());
    }

    let outputs: ResolvedOutputs = config.resolved_outputs();
    let agent_count = config.agents.len();
    let run_id = config.run_id.clone();
    let games = config.games.count;
    let permutations = config.games.permutations;

    println!(
        "Loaded configuration '{run_id}' with {agent_count} agent{} ({games} games, {permutations} permutations)",
        if agent_count == 1 { "" } else { "s" }
    );

    let logging_guard = init_logging(&config.logging, &outputs)?;
    let runner = TournamentRunner::new(config, outputs)?;

    if cli.validate_only {
        println!("Validation-only mode: tournament execution skipped.");
        return Ok(());
    }

    let summary = runner.run()?;
    println!(
        "Tournament complete for '{run_id}': {} games × {} permutations → {} rows at {}",
        summary.games_played,
        summary.permutations,
        summary.rows_written,
        summary.jsonl_path.display()
    );
    println!("Summary table: {}", summary.summary_path.display());
    if let Some(plot_path) = summary.plot_path.as_ref() {
        println!("Win rate plot: {}", plot_path.display());
    }
    if let Some(guard) = logging_guard.as_ref() {
        println!("Telemetry log: {}", guard.telemetry_path.display());
    }

    Ok(())
}
