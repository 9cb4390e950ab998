//! Engine-level settings that are not part of a scenario.
//!
//! Defaults can be overridden from the environment:
//! `KRIEGSPIEL_WORKERS`, `KRIEGSPIEL_BATCHES`, `KRIEGSPIEL_FAILURE_THRESHOLD`,
//! `KRIEGSPIEL_TIME_BUDGET_MS`.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

pub const DEFAULT_BATCHES: usize = 64;
pub const DEFAULT_FAILURE_THRESHOLD: f64 = 0.05;
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.90;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Worker threads. 0 uses the global Rayon pool.
    pub workers: usize,
    /// Number of independent sample streams. Fixes the partitioning, so results
    /// do not depend on `workers`.
    pub batches: usize,
    /// Largest tolerated share of requested iterations that fail evaluation.
    pub failure_threshold: f64,
    /// Overall similarity above which recommendations cite the best historical match.
    pub similarity_threshold: f64,
    /// Used when the scenario does not set its own budget.
    pub time_budget_ms: Option<u64>,
    /// Run batches on the worker pool; `false` runs them in order on the caller's thread.
    pub parallel: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            batches: DEFAULT_BATCHES,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            time_budget_ms: None,
            parallel: true,
        }
    }
}

impl EngineConfig {
    /// Defaults overlaid with `KRIEGSPIEL_*` environment variables.
    pub fn from_env() -> Self {
        Self::default().overlay(|key| std::env::var(key).ok())
    }

    /// Overlay values found through `lookup`. Unparseable values are logged and ignored.
    pub fn overlay<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(workers) = parse_var(&lookup, "KRIEGSPIEL_WORKERS") {
            self.workers = workers;
        }
        if let Some(batches) = parse_var(&lookup, "KRIEGSPIEL_BATCHES") {
            self.batches = batches;
        }
        if let Some(threshold) = parse_var(&lookup, "KRIEGSPIEL_FAILURE_THRESHOLD") {
            self.failure_threshold = threshold;
        }
        if let Some(budget) = parse_var(&lookup, "KRIEGSPIEL_TIME_BUDGET_MS") {
            self.time_budget_ms = Some(budget);
        }
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_batches(mut self, batches: usize) -> Self {
        self.batches = batches;
        self
    }

    pub fn with_failure_threshold(mut self, threshold: f64) -> Self {
        self.failure_threshold = threshold;
        self
    }

    pub fn with_time_budget_ms(mut self, budget: u64) -> Self {
        self.time_budget_ms = Some(budget);
        self
    }

    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.batches == 0 {
            return Err(ValidationError::InvalidSetting {
                field: "batches",
                constraint: " and >= 1",
                value: 0.0,
            });
        }
        for (field, value) in [
            ("failure_threshold", self.failure_threshold),
            ("similarity_threshold", self.similarity_threshold),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ValidationError::InvalidSetting {
                    field,
                    constraint: " and within [0, 1]",
                    value,
                });
            }
        }
        if self.time_budget_ms == Some(0) {
            return Err(ValidationError::InvalidSetting {
                field: "time_budget_ms",
                constraint: " and > 0",
                value: 0.0,
            });
        }
        Ok(())
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "ignoring unparseable setting");
            None
        }
    }
}
