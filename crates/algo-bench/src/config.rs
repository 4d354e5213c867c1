//! YAML benchmark configuration. Everything a run needs is checked up front so
//! a bad file fails before the first game is dealt.

use algo_bot::{MaxEntropyParams, MaxProbabilityParams, PolicySpec};
use algo_core::model::rules::Rules;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::Level;

use crate::tournament::factorial;

const DEFAULT_SEAT_PERMUTATIONS: usize = 2;
const RUN_ID_PLACEHOLDER: &str = "{run_id}";

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BenchmarkConfig {
    pub run_id: String,
    pub games: GamesConfig,
    #[serde(default)]
    pub rules: Rules,
    pub agents: Vec<AgentConfig>,
    pub outputs: OutputsConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BenchmarkConfig {
    /// Reads, parses and validates a YAML file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_path_buf();
        let text = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            source,
            path: path.clone(),
        })?;
        let mut cfg: BenchmarkConfig =
            serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
                source,
                path: path.clone(),
            })?;
        cfg.validate()
            .map_err(|source| ConfigError::Invalid { path, source })?;
        Ok(cfg)
    }

    /// Checks every block and fills in defaults. Performs no I/O, so CLI
    /// overrides can be applied first and validated afterwards.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        check_identifier("run_id", &self.run_id)?;
        self.rules
            .validate()
            .map_err(|err| ValidationError::field("rules", err))?;
        self.check_games()?;
        self.check_agents()?;
        self.check_baseline()?;
        self.check_outputs()?;
        if self.logging.tracing_level.trim().is_empty() {
            self.logging.tracing_level = default_tracing_level();
        }
        Ok(())
    }

    /// Output paths with every `{run_id}` placeholder substituted.
    pub fn resolved_outputs(&self) -> ResolvedOutputs {
        let resolve = |template: &str| resolve_template(&self.run_id, template);
        ResolvedOutputs {
            jsonl: resolve(&self.outputs.jsonl),
            summary_md: resolve(&self.outputs.summary_md),
            plots_dir: resolve(&self.outputs.plots_dir),
        }
    }

    fn check_games(&self) -> Result<(), ValidationError> {
        if self.games.count == 0 {
            return Err(ValidationError::field(
                "games.count",
                "at least one game must be played",
            ));
        }
        let seatings = factorial(self.rules.players);
        if !(1..=seatings).contains(&self.games.permutations) {
            return Err(ValidationError::field(
                "games.permutations",
                format!(
                    "must lie in 1..={seatings} for {} players, got {}",
                    self.rules.players, self.games.permutations
                ),
            ));
        }
        Ok(())
    }

    fn check_agents(&mut self) -> Result<(), ValidationError> {
        if self.agents.is_empty() {
            return Err(ValidationError::field("agents", "no agents configured"));
        }
        let mut names = BTreeSet::new();
        for agent in &mut self.agents {
            check_identifier("agents.name", &agent.name)?;
            if !names.insert(agent.name.clone()) {
                return Err(ValidationError::field(
                    "agents",
                    format!("agent name '{}' is used twice", agent.name),
                ));
            }
            if agent.params.is_null() {
                agent.params = serde_yaml::Value::Mapping(serde_yaml::Mapping::new());
            }
            agent.policy_spec()?;
        }
        Ok(())
    }

    fn check_baseline(&self) -> Result<(), ValidationError> {
        let baseline = self.metrics.baseline.as_deref().ok_or_else(|| {
            ValidationError::field("metrics.baseline", "a baseline agent is required")
        })?;
        match self.agents.iter().find(|agent| agent.name == baseline) {
            Some(agent) if agent.kind == AgentKind::Human => Err(ValidationError::field(
                "metrics.baseline",
                format!("baseline '{baseline}' is a human seat"),
            )),
            Some(_) => Ok(()),
            None => Err(ValidationError::field(
                "metrics.baseline",
                format!("baseline '{baseline}' is not one of the agents"),
            )),
        }
    }

    fn check_outputs(&self) -> Result<(), ValidationError> {
        let templates = [
            ("outputs.jsonl", &self.outputs.jsonl),
            ("outputs.summary_md", &self.outputs.summary_md),
            ("outputs.plots_dir", &self.outputs.plots_dir),
        ];
        for (field, template) in templates {
            if template.trim().is_empty() {
                return Err(ValidationError::field(field, "path is empty"));
            }
            if resolve_template(&self.run_id, template)
                .components()
                .next()
                .is_none()
            {
                return Err(ValidationError::field(field, "path resolves to nothing"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct GamesConfig {
    pub seed: Option<u64>,
    pub count: usize,
    /// Seatings each deal is replayed under, capped at `players!`.
    #[serde(default = "default_permutations")]
    pub permutations: usize,
}

fn default_permutations() -> usize {
    DEFAULT_SEAT_PERMUTATIONS
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AgentConfig {
    pub name: String,
    pub kind: AgentKind,
    #[serde(default)]
    pub params: serde_yaml::Value,
}

impl AgentConfig {
    /// Policy parameters as written in the file. Human seats have none.
    pub fn policy_spec(&self) -> Result<Option<PolicySpec>, ValidationError> {
        let spec = match self.kind {
            AgentKind::MaxProbability => {
                PolicySpec::MaxProbability(self.parse_params::<MaxProbabilityParams>()?)
            }
            AgentKind::MaxEntropy => {
                PolicySpec::MaxEntropy(self.parse_params::<MaxEntropyParams>()?)
            }
            AgentKind::Human => return Ok(None),
        };
        spec.validate()
            .map_err(|err| ValidationError::field(self.params_field(), err))?;
        Ok(Some(spec))
    }

    fn parse_params<T: DeserializeOwned>(&self) -> Result<T, ValidationError> {
        serde_yaml::from_value(self.params.clone())
            .map_err(|err| ValidationError::field(self.params_field(), err))
    }

    fn params_field(&self) -> String {
        format!("agents[{}].params", self.name)
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    MaxProbability,
    MaxEntropy,
    /// Console player; only usable with `--play-as`.
    Human,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OutputsConfig {
    pub jsonl: String,
    pub summary_md: String,
    pub plots_dir: String,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct MetricsConfig {
    /// Agent every other agent is compared against.
    #[serde(default)]
    pub baseline: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default)]
    pub enable_structured: bool,
    #[serde(default = "default_tracing_level")]
    pub tracing_level: String,
    /// Also record every policy decision (`algo_bot::decide` at debug level).
    #[serde(default)]
    pub decision_details: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_structured: false,
            tracing_level: default_tracing_level(),
            decision_details: false,
        }
    }
}

impl LoggingConfig {
    pub fn level(&self) -> Option<Level> {
        self.tracing_level.trim().parse().ok()
    }
}

fn default_tracing_level() -> String {
    "info".to_string()
}

/// Run ids and agent names end up in file names and table cells.
fn check_identifier(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::field(field, "must not be empty"));
    }
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-');
    if let Some(bad) = value.chars().find(|c| !allowed(*c)) {
        return Err(ValidationError::field(
            field,
            format!("'{value}' contains {bad:?}; use letters, digits, '.', '_' or '-'"),
        ));
    }
    Ok(())
}

fn resolve_template(run_id: &str, template: &str) -> PathBuf {
    PathBuf::from(template.replace(RUN_ID_PLACEHOLDER, run_id))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutputs {
    pub jsonl: PathBuf,
    pub summary_md: PathBuf,
    pub plots_dir: PathBuf,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("cannot parse {path:?}: {source}")]
    Parse {
        #[source]
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("{path:?} is invalid: {source}")]
    Invalid {
        path: PathBuf,
        source: ValidationError,
    },
}

impl ConfigError {
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::Invalid { path, .. } => path.as_path(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },
}

impl ValidationError {
    fn field(field: impl Into<String>, message: impl Display) -> Self {
        ValidationError::InvalidField {
            field: field.into(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASIC_YAML: &str = r#"
run_id: "stage0_smoke"
games:
  seed: 123
  count: 16
rules:
  max_rank: 7
  hand_size: 3
agents:
  - name: "greedy"
    kind: "max_probability"
    params:
      epsilon: 0.1
  - name: "entropy"
    kind: "max_entropy"
    params:
      branching: 2
      depth: 1
outputs:
  jsonl: "bench/out/{run_id}/games.jsonl"
  summary_md: "bench/out/{run_id}/summary.md"
  plots_dir: "bench/out/{run_id}/plots"
metrics:
  baseline: "greedy"
logging:
  enable_structured: true
  tracing_level: "debug"
"#;

    fn parse(yaml: &str) -> BenchmarkConfig {
        serde_yaml::from_str(yaml).expect("parse yaml")
    }

    fn failing_field(yaml: &str) -> String {
        match parse(yaml).validate() {
            Err(ValidationError::InvalidField { field, .. }) => field,
            Ok(()) => panic!("config should be rejected"),
        }
    }

    #[test]
    fn loads_and_validates_basic_config() {
        let mut cfg = parse(BASIC_YAML);
        cfg.validate().expect("validate");

        assert_eq!(cfg.games.permutations, DEFAULT_SEAT_PERMUTATIONS);
        assert!(cfg.logging.enable_structured);
        assert_eq!(cfg.logging.level(), Some(Level::DEBUG));
        assert!(!cfg.logging.decision_details);
        assert_eq!(cfg.rules.max_rank, 7);
        assert_eq!(cfg.rules.players, 2);
        assert_eq!(cfg.agents[1].kind, AgentKind::MaxEntropy);
        assert!(matches!(
            cfg.agents[1].policy_spec(),
            Ok(Some(PolicySpec::MaxEntropy(params))) if params.depth == 1
        ));

        let outputs = cfg.resolved_outputs();
        assert_eq!(
            outputs.jsonl,
            PathBuf::from("bench/out/stage0_smoke/games.jsonl")
        );
    }

    #[test]
    fn rejects_missing_baseline() {
        let yaml = BASIC_YAML.replace("baseline: \"greedy\"\n", "");
        assert_eq!(failing_field(&yaml), "metrics.baseline");
    }

    #[test]
    fn rejects_duplicate_agents() {
        let yaml = BASIC_YAML.replace("- name: \"entropy\"", "- name: \"greedy\"");
        assert_eq!(failing_field(&yaml), "agents");
    }

    #[test]
    fn rejects_invalid_run_id() {
        let yaml = BASIC_YAML.replace("stage0_smoke", "stage 0 smoke");
        assert_eq!(failing_field(&yaml), "run_id");
    }

    #[test]
    fn rejects_rules_that_cannot_deal() {
        let yaml = BASIC_YAML.replace("hand_size: 3", "hand_size: 9");
        assert_eq!(failing_field(&yaml), "rules");
    }

    #[test]
    fn rejects_agent_params_outside_their_range() {
        let yaml = BASIC_YAML.replace("epsilon: 0.1", "epsilon: 3.0");
        assert_eq!(failing_field(&yaml), "agents[greedy].params");

        let yaml = BASIC_YAML.replace("depth: 1", "depth: many");
        assert_eq!(failing_field(&yaml), "agents[entropy].params");
    }

    #[test]
    fn rejects_more_permutations_than_seatings() {
        let yaml = BASIC_YAML.replace("count: 16", "count: 16\n  permutations: 3");
        assert_eq!(failing_field(&yaml), "games.permutations");

        let yaml = BASIC_YAML.replace("count: 16", "count: 16\n  permutations: 0");
        assert_eq!(failing_field(&yaml), "games.permutations");
    }

    #[test]
    fn human_agents_carry_no_policy() {
        let yaml = BASIC_YAML.replace(
            "outputs:",
            "  - name: \"me\"\n    kind: \"human\"\noutputs:",
        );
        let mut cfg = parse(&yaml);
        cfg.validate().expect("valid");
        assert!(matches!(cfg.agents[2].policy_spec(), Ok(None)));
    }

    #[test]
    fn outputs_resolve_template_multiple_occurrences() {
        let yaml = BASIC_YAML.replace(
            "bench/out/{run_id}/plots",
            "bench/out/{run_id}/{run_id}/plots",
        );
        let mut cfg = parse(&yaml);
        cfg.validate().expect("valid");
        let outputs = cfg.resolved_outputs();
        assert_eq!(
            outputs.plots_dir,
            PathBuf::from("bench/out/stage0_smoke/stage0_smoke/plots")
        );
    }
}
