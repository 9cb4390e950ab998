//! Per-batch outcome accumulator.
//!
//! Each batch owns one, seals it (sorts its buffer) when the batch finishes,
//! and the engine merges the sealed buffers once, sequentially, after all
//! batches complete. Sorting under a total order makes the merged buffer
//! identical for any partitioning of the same sample set.

use std::cmp::Ordering;

use crate::error::{AggregationError, EvaluationError};
use crate::model::IntervalMethod;
use crate::stats::sensitivity::{self, FactorSensitivity};
use crate::stats::{statistics_from_sorted, Statistics};

#[derive(Debug, Clone, PartialEq)]
struct Observation {
    outcome: f64,
    factors: Vec<f64>,
}

fn observation_order(a: &Observation, b: &Observation) -> Ordering {
    a.outcome.total_cmp(&b.outcome).then_with(|| {
        a.factors
            .iter()
            .zip(&b.factors)
            .map(|(x, y)| x.total_cmp(y))
            .find(|o| o.is_ne())
            .unwrap_or_else(|| a.factors.len().cmp(&b.factors.len()))
    })
}

#[derive(Debug, Clone, Default)]
pub struct OutcomeAccumulator {
    observations: Vec<Observation>,
    sealed: bool,
    failures: usize,
    /// Failure with the lowest sample index, kept for the FAILED reason.
    first_failure: Option<(usize, EvaluationError)>,
}

impl OutcomeAccumulator {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            observations: Vec::with_capacity(capacity),
            sealed: true,
            failures: 0,
            first_failure: None,
        }
    }

    /// Record a valid outcome together with the factor values that produced it.
    pub fn record(&mut self, outcome: f64, factors: Vec<f64>) {
        self.observations.push(Observation { outcome, factors });
        self.sealed = false;
    }

    pub fn record_failure(&mut self, sample_index: usize, error: EvaluationError) {
        self.failures += 1;
        self.record_first_failure(sample_index, error);
    }

    /// Sort the buffer. Cheap to call twice.
    pub fn seal(&mut self) {
        if !self.sealed {
            self.observations.sort_by(observation_order);
            self.sealed = true;
        }
    }

    /// Fold `other` into `self`, merging the two sorted buffers.
    pub fn merge(&mut self, mut other: OutcomeAccumulator) {
        self.seal();
        other.seal();
        self.failures += other.failures;
        if let Some((index, error)) = other.first_failure {
            self.record_first_failure(index, error);
        }
        if other.observations.is_empty() {
            return;
        }
        if self.observations.is_empty() {
            self.observations = other.observations;
            return;
        }
        let left = std::mem::take(&mut self.observations);
        let mut merged = Vec::with_capacity(left.len() + other.observations.len());
        let mut left = left.into_iter().peekable();
        let mut right = other.observations.into_iter().peekable();
        loop {
            let take_left = match (left.peek(), right.peek()) {
                (Some(l), Some(r)) => observation_order(l, r) != Ordering::Greater,
                (Some(_), None) => true,
                (None, Some(_)) => false,
                (None, None) => break,
            };
            let next = if take_left { left.next() } else { right.next() };
            merged.extend(next);
        }
        self.observations = merged;
    }

    fn record_first_failure(&mut self, index: usize, error: EvaluationError) {
        let replace = self
            .first_failure
            .as_ref()
            .map_or(true, |(current, _)| index < *current);
        if replace {
            self.first_failure = Some((index, error));
        }
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn failures(&self) -> usize {
        self.failures
    }

    pub fn first_failure(&self) -> Option<&EvaluationError> {
        self.first_failure.as_ref().map(|(_, error)| error)
    }

    /// Sorted outcomes (requires a sealed accumulator for sorted order).
    pub fn outcomes(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.outcome).collect()
    }

    pub fn statistics(
        &mut self,
        confidence_level: f64,
        method: IntervalMethod,
    ) -> Result<Statistics, AggregationError> {
        self.seal();
        statistics_from_sorted(&self.outcomes(), confidence_level, method)
    }

    /// Correlation of each factor with the outcome, strongest first.
    pub fn sensitivity(&mut self, names: &[String]) -> Vec<FactorSensitivity> {
        self.seal();
        let outcomes = self.outcomes();
        let columns: Vec<Vec<f64>> = (0..names.len())
            .map(|j| {
                self.observations
                    .iter()
                    .map(|o| o.factors.get(j).copied().unwrap_or(0.0))
                    .collect()
            })
            .collect();
        sensitivity::rank(names, &columns, &outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(values: &[f64]) -> OutcomeAccumulator {
        let mut acc = OutcomeAccumulator::new();
        for (i, &v) in values.iter().enumerate() {
            acc.record(v, vec![v * 0.5, i as f64]);
        }
        acc
    }

    #[test]
    fn merge_is_partition_independent() {
        let values: Vec<f64> = (0..500).map(|i| ((i * 37) % 101) as f64 / 100.0).collect();
        let mut whole = OutcomeAccumulator::new();
        for (i, &v) in values.iter().enumerate() {
            whole.record(v, vec![v * 0.5, i as f64]);
        }

        for chunk in [1usize, 7, 64, 250] {
            let mut merged = OutcomeAccumulator::new();
            for (c, part) in values.chunks(chunk).enumerate() {
                let mut acc = OutcomeAccumulator::new();
                for (k, &v) in part.iter().enumerate() {
                    acc.record(v, vec![v * 0.5, (c * chunk + k) as f64]);
                }
                acc.seal();
                merged.merge(acc);
            }
            assert_eq!(
                merged.statistics(0.95, IntervalMethod::Percentile).unwrap(),
                whole.statistics(0.95, IntervalMethod::Percentile).unwrap(),
                "chunk={chunk}"
            );
        }
    }

    #[test]
    fn merge_counts_failures_and_keeps_lowest_index() {
        let mut a = fill(&[0.1, 0.2]);
        a.record_failure(9, EvaluationError::Rejected("nine".into()));
        let mut b = fill(&[0.3]);
        b.record_failure(4, EvaluationError::Rejected("four".into()));
        b.record_failure(12, EvaluationError::Rejected("twelve".into()));
        a.merge(b);
        assert_eq!(a.failures(), 3);
        assert_eq!(a.len(), 3);
        assert_eq!(a.first_failure(), Some(&EvaluationError::Rejected("four".into())));
    }

    #[test]
    fn empty_accumulator_cannot_aggregate() {
        let mut acc = OutcomeAccumulator::new();
        assert_eq!(
            acc.statistics(0.95, IntervalMethod::Percentile),
            Err(AggregationError::NoOutcomes)
        );
    }

    #[test]
    fn outcomes_come_out_sorted() {
        let mut acc = fill(&[0.9, 0.1, 0.5]);
        acc.seal();
        assert_eq!(acc.outcomes(), vec![0.1, 0.5, 0.9]);
    }
}
