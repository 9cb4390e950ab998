//! Simulation run orchestration.
//!
//! A run validates the scenario, fans the iteration range out over a fixed
//! number of batches on the worker pool, merges the per-batch accumulators in
//! batch order, and then walks the remaining stages (aggregate, compare,
//! recommend) on the caller's thread.

pub mod state;

use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use crate::config::EngineConfig;
use crate::error::{EvaluationError, FailureReason, SamplingError, ValidationError};
use crate::evaluation::{Evaluate, ScenarioEvaluator};
use crate::history::{compare, ComparisonResult, HistoricalOutcomeStore};
use crate::model::result::ResultBuilder;
use crate::model::{RunMetadata, Scenario, SeedSource, SimulationResult};
use crate::parallel::{batch_ranges, run_batches, WorkerPool};
use crate::recommend::{recommend, RecommendationConfig};
use crate::sampling::{ParameterSpace, Rng};
use crate::stats::OutcomeAccumulator;

pub use state::{RunStage, RunState};

/// Samples between deadline checks inside a batch.
const DEADLINE_CHECK_INTERVAL: usize = 256;

#[derive(Debug)]
enum BatchOutcome {
    Completed(OutcomeAccumulator),
    /// Hit the deadline before or while running; its samples are discarded.
    Expired,
    SamplingFailed(SamplingError),
}

/// Runs scenarios against a shared historical catalog.
#[derive(Debug, Clone)]
pub struct SimulationEngine<E: Evaluate = ScenarioEvaluator> {
    config: EngineConfig,
    pool: WorkerPool,
    store: Arc<HistoricalOutcomeStore>,
    evaluator: E,
}

impl SimulationEngine<ScenarioEvaluator> {
    pub fn new(config: EngineConfig, store: Arc<HistoricalOutcomeStore>) -> Self {
        Self::with_evaluator(config, store, ScenarioEvaluator::default())
    }
}

impl<E: Evaluate> SimulationEngine<E> {
    pub fn with_evaluator(config: EngineConfig, store: Arc<HistoricalOutcomeStore>, evaluator: E) -> Self {
        Self {
            pool: WorkerPool::with_workers(config.workers),
            config,
            store,
            evaluator,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &HistoricalOutcomeStore {
        &self.store
    }

    /// Run one simulation.
    ///
    /// Invalid input is returned as `Err` before any sampling. Every other
    /// problem ends up in the returned result: a FAILED status with its reason,
    /// a PARTIAL status when the time budget ran out, or warnings.
    pub fn run(&self, scenario: &Scenario) -> Result<SimulationResult, ValidationError> {
        self.config.validate()?;
        scenario.validate()?;
        let space = ParameterSpace::from_scenario(scenario)?;

        let started = Instant::now();
        let sim = &scenario.config;
        let (seed, seed_source) = match sim.seed {
            Some(seed) => (seed, SeedSource::Scenario),
            None => (entropy_seed(), SeedSource::Entropy),
        };
        let budget_ms = sim.time_budget_ms.or(self.config.time_budget_ms);
        let deadline = budget_ms.map(|ms| started + Duration::from_millis(ms));
        let ranges = batch_ranges(sim.iterations, self.config.batches);

        let metadata = RunMetadata {
            run_id: uuid::Uuid::new_v4().to_string(),
            started_at: chrono::Utc::now().to_rfc3339(),
            seed,
            seed_source,
            iterations_requested: sim.iterations,
            iterations_completed: 0,
            evaluation_failures: 0,
            batches_total: ranges.len(),
            batches_completed: 0,
            workers: if self.config.parallel {
                self.pool.effective_workers()
            } else {
                1
            },
            interval_method: sim.interval_method,
            time_horizon: sim.time_horizon,
            elapsed_ms: 0.0,
        };
        tracing::info!(
            scenario = %scenario.id,
            run_id = %metadata.run_id,
            seed,
            iterations = sim.iterations,
            batches = ranges.len(),
            workers = metadata.workers,
            "simulation started"
        );
        let mut builder = ResultBuilder::new(&scenario.id, metadata);

        let outcomes = run_batches(&ranges, &self.pool, self.config.parallel, |index, range| {
            self.run_batch(scenario, &space, seed, index, range, deadline)
        });

        let mut merged = OutcomeAccumulator::new();
        let mut completed = 0usize;
        for outcome in outcomes {
            match outcome {
                BatchOutcome::Completed(acc) => {
                    completed += 1;
                    merged.merge(acc);
                }
                BatchOutcome::Expired => {}
                BatchOutcome::SamplingFailed(err) => {
                    tracing::warn!(scenario = %scenario.id, %err, "sampling failed");
                    return Ok(finish_failed(builder, started, err.into()));
                }
            }
        }
        let partial = completed < ranges.len();
        {
            let meta = builder.metadata_mut();
            meta.batches_completed = completed;
            meta.iterations_completed = merged.len();
            meta.evaluation_failures = merged.failures();
        }
        if partial {
            tracing::warn!(
                scenario = %scenario.id,
                completed,
                total = ranges.len(),
                "time budget exhausted, aggregating completed batches"
            );
            builder.warn(format!(
                "time budget of {} ms exhausted: {completed} of {} batches completed",
                budget_ms.unwrap_or_default(),
                ranges.len()
            ));
        }
        builder.advance(RunStage::Sampled);

        let failure_rate = merged.failures() as f64 / sim.iterations as f64;
        if failure_rate > self.config.failure_threshold {
            let reason = FailureReason::EvaluationFailureRate {
                failures: merged.failures(),
                requested: sim.iterations,
                rate: failure_rate,
                threshold: self.config.failure_threshold,
                first_error: merged.first_failure().map(EvaluationError::to_string),
            };
            tracing::warn!(scenario = %scenario.id, %reason, "evaluation failure rate exceeded");
            return Ok(finish_failed(builder, started, reason));
        }
        if merged.failures() > 0 {
            builder.warn(format!(
                "{} of {} samples failed evaluation and were excluded",
                merged.failures(),
                sim.iterations
            ));
        }
        builder.advance(RunStage::Evaluated);

        let statistics = match merged.statistics(sim.confidence_level, sim.interval_method) {
            Ok(statistics) => statistics,
            Err(err) => {
                tracing::warn!(scenario = %scenario.id, %err, "aggregation failed");
                return Ok(finish_failed(builder, started, err.into()));
            }
        };
        let sensitivity = merged.sensitivity(space.names());
        let payoff = sim.payoff;
        let expected_value =
            payoff.on_failure + statistics.mean * (payoff.on_success - payoff.on_failure);
        builder.set_statistics(statistics.clone(), expected_value);
        builder.set_sensitivity(sensitivity.clone());
        builder.advance(RunStage::Aggregated);

        let comparison = self.compare_history(scenario, statistics.mean);
        for issue in &comparison.issues {
            tracing::warn!(scenario = %scenario.id, %issue, "historical comparison degraded");
            builder.warn(issue.to_string());
        }
        builder.advance(RunStage::Compared);

        let recommendation_config = RecommendationConfig {
            similarity_threshold: self.config.similarity_threshold,
            volatility_threshold: sim.risk_tolerance.volatility_threshold(),
        };
        builder.set_recommendations(recommend(
            &statistics,
            &comparison,
            &sensitivity,
            &recommendation_config,
        ));
        builder.set_comparison(comparison);
        builder.advance(RunStage::Recommended);

        builder.metadata_mut().elapsed_ms = elapsed_ms(started);
        let result = builder.finish(partial);
        tracing::info!(
            scenario = %scenario.id,
            status = ?result.status,
            success_probability = statistics.mean,
            completed = result.metadata.iterations_completed,
            elapsed_ms = result.metadata.elapsed_ms,
            "simulation finished"
        );
        Ok(result)
    }

    fn run_batch(
        &self,
        scenario: &Scenario,
        space: &ParameterSpace,
        seed: u64,
        index: usize,
        (start, end): (usize, usize),
        deadline: Option<Instant>,
    ) -> BatchOutcome {
        let expired = || deadline.is_some_and(|d| Instant::now() >= d);
        if expired() {
            return BatchOutcome::Expired;
        }
        let mut rng = Rng::for_stream(seed, index as u64);
        let mut sampler = space.sampler();
        let mut acc = OutcomeAccumulator::with_capacity(end - start);
        for (offset, sample_index) in (start..end).enumerate() {
            if offset > 0 && offset % DEADLINE_CHECK_INTERVAL == 0 && expired() {
                return BatchOutcome::Expired;
            }
            let sample = match sampler.draw(&mut rng, sample_index) {
                Ok(sample) => sample,
                Err(err) => return BatchOutcome::SamplingFailed(err),
            };
            match self.evaluator.success_rate(&sample, scenario) {
                Ok(score) if score.is_finite() => {
                    acc.record(score.clamp(0.0, 1.0), sample.into_values());
                }
                Ok(score) => {
                    acc.record_failure(sample_index, EvaluationError::NonFiniteScore(score));
                }
                Err(err) => acc.record_failure(sample_index, err),
            }
        }
        acc.seal();
        BatchOutcome::Completed(acc)
    }

    fn compare_history(&self, scenario: &Scenario, success_probability: f64) -> ComparisonResult {
        if !scenario.historical_outcomes.is_empty() {
            return compare(success_probability, &scenario.historical_outcomes);
        }
        let keywords: Vec<&str> = if scenario.keywords.is_empty() {
            scenario.category.as_deref().into_iter().collect()
        } else {
            scenario.keywords.iter().map(String::as_str).collect()
        };
        compare(success_probability, self.store.find_relevant(&keywords))
    }
}

fn finish_failed(mut builder: ResultBuilder, started: Instant, reason: FailureReason) -> SimulationResult {
    builder.metadata_mut().elapsed_ms = elapsed_ms(started);
    tracing::debug!(stage = ?builder.stage(), "run failed");
    builder.fail(reason)
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1_000.0
}

/// Seed from the OS; falls back to the clock if the OS source is unavailable.
fn entropy_seed() -> u64 {
    let mut buf = [0u8; 8];
    match getrandom::getrandom(&mut buf) {
        Ok(()) => u64::from_le_bytes(buf),
        Err(err) => {
            tracing::warn!(%err, "OS entropy unavailable, seeding from the clock");
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or_default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Parameter, RunStatus, SimulationConfig};

    fn scenario(seed: Option<u64>, iterations: usize) -> Scenario {
        Scenario::new(
            "ambush",
            "Valley ambush",
            vec![
                Parameter::uniform("terrain_advantage", 0.4, 0.9).unwrap(),
                Parameter::normal("enemy_morale", 0.5, 0.1, 0.0, 1.0).unwrap(),
            ],
        )
        .with_config(SimulationConfig {
            iterations,
            seed,
            ..SimulationConfig::default()
        })
    }

    fn engine(config: EngineConfig) -> SimulationEngine {
        SimulationEngine::new(config, HistoricalOutcomeStore::curated().shared())
    }

    #[test]
    fn completes_every_stage() {
        let result = engine(EngineConfig::default()).run(&scenario(Some(1), 2_000)).unwrap();
        assert_eq!(result.status, RunStatus::Success);
        assert_eq!(
            result.stages,
            vec![
                RunStage::Created,
                RunStage::Sampled,
                RunStage::Evaluated,
                RunStage::Aggregated,
                RunStage::Compared,
                RunStage::Recommended,
                RunStage::Complete,
            ]
        );
        assert_eq!(result.metadata.iterations_completed, 2_000);
        assert_eq!(result.metadata.seed_source, SeedSource::Scenario);
        assert!(!result.recommendations.is_empty());
    }

    #[test]
    fn unseeded_runs_record_their_seed() {
        let e = engine(EngineConfig::default());
        let first = e.run(&scenario(None, 500)).unwrap();
        assert_eq!(first.metadata.seed_source, SeedSource::Entropy);
        let replay = e.run(&scenario(Some(first.metadata.seed), 500)).unwrap();
        assert_eq!(first.success_probability, replay.success_probability);
        assert_eq!(first.risk_metrics, replay.risk_metrics);
    }

    #[test]
    fn invalid_scenarios_are_rejected_before_sampling() {
        let mut bad = scenario(Some(1), 100);
        bad.config.confidence_level = 1.0;
        assert_eq!(
            engine(EngineConfig::default()).run(&bad),
            Err(ValidationError::InvalidConfidenceLevel(1.0))
        );
        assert!(engine(EngineConfig::default().with_batches(0))
            .run(&scenario(Some(1), 100))
            .is_err());
    }

    #[test]
    fn sequential_and_parallel_runs_agree() {
        let s = scenario(Some(99), 3_000);
        let parallel = engine(EngineConfig::default().with_workers(4)).run(&s).unwrap();
        let sequential = engine(EngineConfig::default().sequential()).run(&s).unwrap();
        assert_eq!(parallel.success_probability, sequential.success_probability);
        assert_eq!(parallel.risk_metrics, sequential.risk_metrics);
        assert_eq!(parallel.sensitivity, sequential.sensitivity);
    }

    #[test]
    fn expected_value_uses_payoff() {
        let mut s = scenario(Some(5), 1_000);
        s.config.payoff = crate::model::Payoff {
            on_success: 100.0,
            on_failure: -50.0,
        };
        let result = engine(EngineConfig::default()).run(&s).unwrap();
        let p = result.success_probability.unwrap();
        let ev = result.expected_value.unwrap();
        assert!((ev - (-50.0 + p * 150.0)).abs() < 1e-9);
    }
}
