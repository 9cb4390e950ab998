//! The value object handed back to the caller. Built once per run by
//! [ResultBuilder]; never mutated after it is returned.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::engine::state::{RunStage, RunState};
use crate::error::FailureReason;
use crate::history::ComparisonResult;
use crate::model::scenario::IntervalMethod;
use crate::stats::{ConfidenceInterval, FactorSensitivity, Statistics};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Success,
    /// The time budget truncated the run; statistics cover completed batches only.
    Partial,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedSource {
    Scenario,
    Entropy,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunMetadata {
    pub run_id: String,
    pub started_at: String,
    pub seed: u64,
    pub seed_source: SeedSource,
    pub iterations_requested: usize,
    /// Valid outcomes that entered the statistics.
    pub iterations_completed: usize,
    pub evaluation_failures: usize,
    pub batches_total: usize,
    pub batches_completed: usize,
    pub workers: usize,
    pub interval_method: IntervalMethod,
    pub time_horizon: Option<u32>,
    pub elapsed_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationResult {
    pub scenario_id: String,
    pub status: RunStatus,
    /// Every stage the run passed through, in order; ends in `complete` or `failed`.
    pub stages: Vec<RunStage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureReason>,
    pub success_probability: Option<f64>,
    pub confidence_interval: Option<ConfidenceInterval>,
    pub expected_value: Option<f64>,
    pub risk_metrics: BTreeMap<String, f64>,
    pub sensitivity: Vec<FactorSensitivity>,
    pub historical_comparison: ComparisonResult,
    pub recommendations: Vec<String>,
    pub warnings: Vec<String>,
    pub metadata: RunMetadata,
}

impl SimulationResult {
    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Success
    }

    /// Last stage that completed before the run finished or failed.
    pub fn last_stage(&self) -> RunStage {
        self.stages
            .iter()
            .rev()
            .copied()
            .find(|stage| *stage != RunStage::Failed && *stage != RunStage::Complete)
            .unwrap_or(RunStage::Created)
    }
}

/// Collects stage outputs as the run advances, so a failure at any point keeps
/// everything computed before it.
#[derive(Debug)]
pub(crate) struct ResultBuilder {
    scenario_id: String,
    state: RunState,
    statistics: Option<Statistics>,
    expected_value: Option<f64>,
    sensitivity: Vec<FactorSensitivity>,
    comparison: ComparisonResult,
    recommendations: Vec<String>,
    warnings: Vec<String>,
    metadata: RunMetadata,
}

impl ResultBuilder {
    pub(crate) fn new(scenario_id: &str, metadata: RunMetadata) -> Self {
        Self {
            scenario_id: scenario_id.to_string(),
            state: RunState::new(),
            statistics: None,
            expected_value: None,
            sensitivity: Vec::new(),
            comparison: ComparisonResult::default(),
            recommendations: Vec::new(),
            warnings: Vec::new(),
            metadata,
        }
    }

    pub(crate) fn advance(&mut self, expected: RunStage) {
        self.state.advance_to(expected);
    }

    pub(crate) fn stage(&self) -> RunStage {
        self.state.stage()
    }

    pub(crate) fn metadata_mut(&mut self) -> &mut RunMetadata {
        &mut self.metadata
    }

    pub(crate) fn set_statistics(&mut self, statistics: Statistics, expected_value: f64) {
        self.statistics = Some(statistics);
        self.expected_value = Some(expected_value);
    }

    pub(crate) fn set_sensitivity(&mut self, sensitivity: Vec<FactorSensitivity>) {
        self.sensitivity = sensitivity;
    }

    pub(crate) fn set_comparison(&mut self, comparison: ComparisonResult) {
        self.comparison = comparison;
    }

    pub(crate) fn set_recommendations(&mut self, recommendations: Vec<String>) {
        self.recommendations = recommendations;
    }

    pub(crate) fn warn(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub(crate) fn fail(mut self, reason: FailureReason) -> SimulationResult {
        self.state.fail();
        self.build(RunStatus::Failed, Some(reason))
    }

    pub(crate) fn finish(mut self, partial: bool) -> SimulationResult {
        self.state.advance_to(RunStage::Complete);
        let status = if partial {
            RunStatus::Partial
        } else {
            RunStatus::Success
        };
        self.build(status, None)
    }

    fn build(self, status: RunStatus, failure: Option<FailureReason>) -> SimulationResult {
        let risk_metrics = self
            .statistics
            .as_ref()
            .map(Statistics::risk_metrics)
            .unwrap_or_default();
        SimulationResult {
            scenario_id: self.scenario_id,
            status,
            stages: self.state.into_trail(),
            failure,
            success_probability: self.statistics.as_ref().map(|s| s.mean),
            confidence_interval: self.statistics.as_ref().map(|s| s.confidence_interval),
            expected_value: self.expected_value,
            risk_metrics,
            sensitivity: self.sensitivity,
            historical_comparison: self.comparison,
            recommendations: self.recommendations,
            warnings: self.warnings,
            metadata: self.metadata,
        }
    }
}
