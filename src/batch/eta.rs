// src/batch/eta.rs

use std::time::Duration;

/// Running mean of per-subject durations, projected over what is left.
#[derive(Debug, Clone, Default)]
pub struct EtaTracker {
    total: usize,
    completed: usize,
    mean_secs: f64,
}

impl EtaTracker {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            completed: 0,
            mean_secs: 0.0,
        }
    }

    pub fn record(&mut self, elapsed: Duration) {
        self.completed += 1;
        let n = self.completed as f64;
        self.mean_secs += (elapsed.as_secs_f64() - self.mean_secs) / n;
    }

    pub fn completed(&self) -> usize {
        self.completed
    }

    pub fn remaining(&self) -> usize {
        self.total.saturating_sub(self.completed)
    }

    pub fn mean(&self) -> Duration {
        Duration::from_secs_f64(self.mean_secs)
    }

    pub fn eta(&self) -> Duration {
        Duration::from_secs_f64(self.mean_secs * self.remaining() as f64)
    }
}
