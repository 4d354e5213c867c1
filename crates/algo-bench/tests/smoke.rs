use std::collections::HashMap;
use std::fs;
use std::path::Path;

use algo_bench::config::BenchmarkConfig;
use algo_bench::tournament::TournamentRunner;
use tempfile::tempdir;

fn load_config(output_dir: &Path) -> BenchmarkConfig {
    let yaml = format!(
        r#"
run_id: "test_smoke"
games:
  seed: 4242
  count: 3
  permutations: 2
rules:
  max_rank: 5
  hand_size: 3
agents:
  - name: "greedy"
    kind: "max_probability"
    params:
      epsilon: 0.2
  - name: "entropy"
    kind: "max_entropy"
    params:
      branching: 2
      depth: 1
      entropy_samples: 4
outputs:
  jsonl: "{jsonl}"
  summary_md: "{summary}"
  plots_dir: "{plots}"
metrics:
  baseline: "greedy"
logging:
  enable_structured: false
"#,
        jsonl = output_dir.join("games.jsonl").display(),
        summary = output_dir.join("summary.md").display(),
        plots = output_dir.join("plots").display()
    );

    let mut cfg: BenchmarkConfig = serde_yaml::from_str(&yaml).expect("valid yaml");
    cfg.validate().expect("config validates");
    cfg
}

fn run_normalized(dir: &Path) -> Vec<serde_json::Value> {
    let config = load_config(dir);
    let outputs = config.resolved_outputs();
    let runner = TournamentRunner::new(config, outputs).expect("runner created");
    let summary = runner.run().expect("tournament completes");

    assert_eq!(summary.games_played, 3);
    assert_eq!(summary.permutations, 2);
    assert_eq!(summary.rows_written, 3 * 2 * 2);

    let markdown = fs::read_to_string(&summary.summary_path).expect("summary readable");
    assert!(markdown.contains("# Tournament Summary"));
    assert!(markdown.contains("| greedy |"));
    assert!(markdown.contains("| entropy |"));
    assert!(markdown.contains("| Disagreement |"));

    let jsonl = fs::read_to_string(&summary.jsonl_path).expect("jsonl readable");
    jsonl
        .lines()
        .map(|line| {
            let mut value: serde_json::Value =
                serde_json::from_str(line).expect("row decodes to JSON");
            if let Some(obj) = value.as_object_mut() {
                obj.insert("speed_ms_decision".into(), serde_json::json!(0.0));
            }
            value
        })
        .collect()
}

#[test]
fn tournament_replays_identically_from_the_same_seed() {
    let first = tempdir().expect("temp dir");
    let second = tempdir().expect("temp dir");

    let rows_a = run_normalized(first.path());
    let rows_b = run_normalized(second.path());

    assert_eq!(rows_a, rows_b);
}

#[test]
fn every_game_has_at_most_one_winner_and_both_seatings() {
    let dir = tempdir().expect("temp dir");
    let rows = run_normalized(dir.path());

    let mut winners: HashMap<String, usize> = HashMap::new();
    let mut seats_per_game: HashMap<String, usize> = HashMap::new();
    for row in &rows {
        let game_id = row["game_id"].as_str().expect("game id").to_string();
        *seats_per_game.entry(game_id.clone()).or_default() += 1;
        if row["won"].as_bool().expect("won flag") {
            *winners.entry(game_id).or_default() += 1;
        }
        assert!(row["turns"].as_u64().expect("turns") >= 1);
    }

    assert_eq!(seats_per_game.len(), 6);
    assert!(seats_per_game.values().all(|&seats| seats == 2));
    assert!(winners.values().all(|&count| count == 1));

    // The second permutation swaps the agents on the same deal.
    let first = rows
        .iter()
        .find(|row| row["game_id"] == "G00000_P00" && row["seat"] == 0)
        .expect("first seating");
    let swapped = rows
        .iter()
        .find(|row| row["game_id"] == "G00000_P01" && row["seat"] == 0)
        .expect("swapped seating");
    assert_eq!(first["game_seed"], swapped["game_seed"]);
    assert_ne!(first["bot"], swapped["bot"]);
}

#[test]
fn only_challengers_are_compared_against_the_baseline() {
    let dir = tempdir().expect("temp dir");
    let rows = run_normalized(dir.path());

    for row in &rows {
        let decisions = row["decisions"].as_u64().expect("decisions");
        let compared = row["baseline_compared"].as_u64().expect("compared");
        let disagreements = row["baseline_disagreements"].as_u64().expect("disagreements");
        assert!(disagreements <= compared);
        if row["bot"] == "greedy" {
            assert_eq!(compared, 0);
        } else {
            assert_eq!(compared, decisions);
        }
    }
}
