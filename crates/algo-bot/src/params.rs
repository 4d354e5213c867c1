//! Tunable policy parameters, with `ALGO_*` environment overrides.

use algo_core::error::GameError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaxProbabilityParams {
    /// Chance of stopping after a successful attack.
    pub epsilon: f64,
}

impl Default for MaxProbabilityParams {
    fn default() -> Self {
        Self { epsilon: 0.1 }
    }
}

impl MaxProbabilityParams {
    pub fn with_overrides<F>(mut self, mut read: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        if let Some(epsilon) = read("ALGO_EPSILON")
            .and_then(|raw| raw.trim().parse::<f64>().ok())
            .filter(|value| (0.0..=1.0).contains(value))
        {
            self.epsilon = epsilon;
        }
        self
    }

    pub fn validate(&self) -> Result<(), GameError> {
        if !(0.0..=1.0).contains(&self.epsilon) {
            return Err(GameError::configuration(format!(
                "epsilon must lie in [0, 1], got {}",
                self.epsilon
            )));
        }
        Ok(())
    }
}

/// Lookahead shape of the information-gain search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaxEntropyParams {
    /// Attacks expanded per node (K).
    pub branching: usize,
    /// Lookahead depth (D).
    pub depth: usize,
    /// Sampled opponent perspectives for the self-information term (S).
    pub entropy_samples: usize,
    /// Value assumed where the lookahead stops or every continuation is certain.
    pub terminal_bonus: f64,
    /// Hard cap on visited search nodes per decision.
    pub node_budget: usize,
    /// Optional wall-clock cap per decision. Makes play timing-dependent.
    pub time_cap_ms: Option<u64>,
}

impl Default for MaxEntropyParams {
    fn default() -> Self {
        Self {
            branching: 3,
            depth: 2,
            entropy_samples: 16,
            terminal_bonus: 1.0,
            node_budget: 20_000,
            time_cap_ms: None,
        }
    }
}

impl MaxEntropyParams {
    pub fn with_overrides<F>(mut self, mut read: F) -> Self
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut count = |key: &str| {
            read(key)
                .and_then(|raw| raw.trim().parse::<usize>().ok())
                .filter(|value| *value > 0)
        };
        if let Some(branching) = count("ALGO_BRANCHING") {
            self.branching = branching;
        }
        if let Some(depth) = count("ALGO_DEPTH") {
            self.depth = depth;
        }
        if let Some(samples) = count("ALGO_ENTROPY_SAMPLES") {
            self.entropy_samples = samples;
        }
        if let Some(budget) = count("ALGO_NODE_BUDGET") {
            self.node_budget = budget;
        }
        if let Some(cap) = count("ALGO_TIME_CAP_MS") {
            self.time_cap_ms = Some(cap as u64);
        }
        if let Some(bonus) = read("ALGO_TERMINAL_BONUS")
            .and_then(|raw| raw.trim().parse::<f64>().ok())
            .filter(|value| value.is_finite())
        {
            self.terminal_bonus = bonus;
        }
        self
    }

    pub fn validate(&self) -> Result<(), GameError> {
        if self.branching == 0 {
            return Err(GameError::configuration("branching must be at least 1"));
        }
        if self.node_budget == 0 {
            return Err(GameError::configuration("node budget must be at least 1"));
        }
        if !self.terminal_bonus.is_finite() {
            return Err(GameError::configuration("terminal bonus must be finite"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn reader(pairs: &[(&str, &str)]) -> impl FnMut(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn overrides_apply_valid_values_only() {
        let params = MaxEntropyParams::default().with_overrides(reader(&[
            ("ALGO_BRANCHING", "5"),
            ("ALGO_DEPTH", "zero"),
            ("ALGO_TERMINAL_BONUS", "0.25"),
            ("ALGO_TIME_CAP_MS", "40"),
        ]));
        assert_eq!(params.branching, 5);
        assert_eq!(params.depth, 2);
        assert_eq!(params.terminal_bonus, 0.25);
        assert_eq!(params.time_cap_ms, Some(40));
    }

    #[test]
    fn epsilon_outside_unit_interval_is_ignored() {
        let params =
            MaxProbabilityParams::default().with_overrides(reader(&[("ALGO_EPSILON", "1.5")]));
        assert_eq!(params.epsilon, 0.1);
        let params =
            MaxProbabilityParams::default().with_overrides(reader(&[("ALGO_EPSILON", "0")]));
        assert_eq!(params.epsilon, 0.0);
    }

    #[test]
    fn validate_rejects_degenerate_search() {
        let params = MaxEntropyParams {
            branching: 0,
            ..MaxEntropyParams::default()
        };
        assert!(params.validate().is_err());
        assert!(MaxProbabilityParams { epsilon: -0.1 }.validate().is_err());
    }

    #[test]
    fn params_deserialize_with_defaults() {
        let params: MaxEntropyParams = serde_json::from_str(r#"{"depth": 3}"#).unwrap();
        assert_eq!(params.depth, 3);
        assert_eq!(params.branching, 3);
    }
}
