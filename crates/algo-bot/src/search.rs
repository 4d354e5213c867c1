use std::time::{Duration, Instant};

/// Node and wall-clock budget for one lookahead decision.
#[derive(Debug, Clone)]
pub struct SearchBudget {
    node_cap: usize,
    time_cap: Option<Duration>,
    started: Instant,
    nodes: usize,
}

impl SearchBudget {
    pub fn new(node_cap: usize, time_cap_ms: Option<u64>) -> Self {
        Self {
            node_cap,
            time_cap: time_cap_ms.map(Duration::from_millis),
            started: Instant::now(),
            nodes: 0,
        }
    }

    pub fn tick(&mut self) {
        self.nodes = self.nodes.saturating_add(1);
    }

    pub fn exhausted(&self) -> bool {
        if self.nodes >= self.node_cap {
            return true;
        }
        self.time_cap
            .is_some_and(|cap| self.started.elapsed() >= cap)
    }

    pub fn nodes(&self) -> usize {
        self.nodes
    }
}
