//! Statistics engine: outcome scores → summary statistics and risk metrics.
//!
//! Every reduction runs over a sorted copy of the outcomes, so the result
//! depends only on the multiset of values and never on how they were
//! partitioned or in which order batches finished.

pub mod accumulator;
pub mod sensitivity;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::AggregationError;
use crate::model::IntervalMethod;
use crate::sampling::marginal::StandardNormal;

pub use accumulator::OutcomeAccumulator;
pub use sensitivity::{dominant_factors, FactorSensitivity};

/// Outcomes below this count as failures for `probability_of_failure`.
pub const FAILURE_CUTOFF: f64 = 0.5;

const TAIL_TOLERANCE: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
    pub level: f64,
    pub method: IntervalMethod,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Percentiles {
    pub p5: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p95: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub count: usize,
    /// Success probability.
    pub mean: f64,
    /// Population standard deviation (volatility).
    pub std_dev: f64,
    pub standard_error: f64,
    pub confidence_interval: ConfidenceInterval,
    /// Outcome at the (1 - confidence_level) percentile.
    pub value_at_risk: f64,
    /// Mean of outcomes at or below `value_at_risk`.
    pub expected_shortfall: f64,
    pub skewness: f64,
    /// Excess kurtosis.
    pub kurtosis: f64,
    pub min: f64,
    pub max: f64,
    pub percentiles: Percentiles,
    pub probability_of_failure: f64,
}

impl Statistics {
    pub fn volatility(&self) -> f64 {
        self.std_dev
    }

    /// Flat view used for the result's `risk_metrics` map.
    pub fn risk_metrics(&self) -> BTreeMap<String, f64> {
        [
            ("volatility", self.std_dev),
            ("standard_error", self.standard_error),
            ("value_at_risk", self.value_at_risk),
            ("expected_shortfall", self.expected_shortfall),
            ("skewness", self.skewness),
            ("kurtosis", self.kurtosis),
            ("min", self.min),
            ("max", self.max),
            ("p5", self.percentiles.p5),
            ("p25", self.percentiles.p25),
            ("median", self.percentiles.p50),
            ("p75", self.percentiles.p75),
            ("p95", self.percentiles.p95),
            ("probability_of_failure", self.probability_of_failure),
            ("confidence_level", self.confidence_interval.level),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }
}

/// `aggregate(outcomes, confidence_level)` with a percentile interval.
pub fn aggregate(outcomes: &[f64], confidence_level: f64) -> Result<Statistics, AggregationError> {
    aggregate_with(outcomes, confidence_level, IntervalMethod::Percentile)
}

pub fn aggregate_with(
    outcomes: &[f64],
    confidence_level: f64,
    method: IntervalMethod,
) -> Result<Statistics, AggregationError> {
    if let Some((index, &value)) = outcomes.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(AggregationError::NonFiniteOutcome { index, value });
    }
    let mut sorted = outcomes.to_vec();
    sorted.sort_by(f64::total_cmp);
    statistics_from_sorted(&sorted, confidence_level, method)
}

/// Core reduction. `sorted` must be ascending and finite.
pub(crate) fn statistics_from_sorted(
    sorted: &[f64],
    confidence_level: f64,
    method: IntervalMethod,
) -> Result<Statistics, AggregationError> {
    if !confidence_level.is_finite() || confidence_level <= 0.0 || confidence_level >= 1.0 {
        return Err(AggregationError::InvalidConfidenceLevel(confidence_level));
    }
    if sorted.is_empty() {
        return Err(AggregationError::NoOutcomes);
    }
    let n = sorted.len() as f64;
    let last = sorted.len() - 1;
    if sorted[0] == sorted[last] {
        return Ok(constant_statistics(sorted[0], sorted.len(), confidence_level, method));
    }
    let mean = compensated_sum(sorted) / n;

    let (mut m2, mut m3, mut m4) = (0.0, 0.0, 0.0);
    for &value in sorted {
        let d = value - mean;
        let d2 = d * d;
        m2 += d2;
        m3 += d2 * d;
        m4 += d2 * d2;
    }
    let variance = m2 / n;
    let std_dev = variance.sqrt();
    let (skewness, kurtosis) = if std_dev > f64::EPSILON {
        (
            (m3 / n) / (variance * std_dev),
            (m4 / n) / (variance * variance) - 3.0,
        )
    } else {
        (0.0, 0.0)
    };
    let standard_error = std_dev / n.sqrt();

    let tail = 1.0 - confidence_level;
    let confidence_interval = match method {
        IntervalMethod::Percentile => ConfidenceInterval {
            lower: interpolate(sorted, tail / 2.0),
            upper: interpolate(sorted, 1.0 - tail / 2.0),
            level: confidence_level,
            method,
        },
        IntervalMethod::Normal => {
            let z = StandardNormal::default().quantile(1.0 - tail / 2.0);
            ConfidenceInterval {
                lower: mean - z * standard_error,
                upper: mean + z * standard_error,
                level: confidence_level,
                method,
            }
        }
    };

    let value_at_risk = interpolate(sorted, tail);
    // Interpolation can land a rounding step below a sample that sits exactly on the threshold.
    let threshold = value_at_risk + TAIL_TOLERANCE * value_at_risk.abs().max(1.0);
    let tail_count = sorted.partition_point(|&v| v <= threshold);
    // value_at_risk >= sorted[0], so the tail always holds at least one value.
    let expected_shortfall = compensated_sum(&sorted[..tail_count]) / tail_count.max(1) as f64;

    let failures = sorted.partition_point(|&v| v < FAILURE_CUTOFF);

    Ok(Statistics {
        count: sorted.len(),
        mean,
        std_dev,
        standard_error,
        confidence_interval,
        value_at_risk,
        expected_shortfall,
        skewness,
        kurtosis,
        min: sorted[0],
        max: sorted[last],
        percentiles: Percentiles {
            p5: interpolate(sorted, 0.05),
            p25: interpolate(sorted, 0.25),
            p50: interpolate(sorted, 0.50),
            p75: interpolate(sorted, 0.75),
            p95: interpolate(sorted, 0.95),
        },
        probability_of_failure: failures as f64 / n,
    })
}

/// Every outcome equal: no spread, so every location and tail metric is the
/// value itself.
fn constant_statistics(
    value: f64,
    count: usize,
    confidence_level: f64,
    method: IntervalMethod,
) -> Statistics {
    Statistics {
        count,
        mean: value,
        std_dev: 0.0,
        standard_error: 0.0,
        confidence_interval: ConfidenceInterval {
            lower: value,
            upper: value,
            level: confidence_level,
            method,
        },
        value_at_risk: value,
        expected_shortfall: value,
        skewness: 0.0,
        kurtosis: 0.0,
        min: value,
        max: value,
        percentiles: Percentiles {
            p5: value,
            p25: value,
            p50: value,
            p75: value,
            p95: value,
        },
        probability_of_failure: if value < FAILURE_CUTOFF { 1.0 } else { 0.0 },
    }
}

/// Neumaier-compensated sum.
fn compensated_sum(values: &[f64]) -> f64 {
    let mut sum = 0.0_f64;
    let mut compensation = 0.0_f64;
    for &value in values {
        let t = sum + value;
        if sum.abs() >= value.abs() {
            compensation += (sum - t) + value;
        } else {
            compensation += (value - t) + sum;
        }
        sum = t;
    }
    sum + compensation
}

/// Linear-interpolated quantile `q ∈ [0, 1]` of an ascending slice; `None`
/// when the slice is empty.
pub fn percentile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    (!sorted.is_empty()).then(|| interpolate(sorted, q))
}

/// `sorted` must be non-empty.
fn interpolate(sorted: &[f64], q: f64) -> f64 {
    if sorted.len() == 1 {
        return sorted[0];
    }
    let rank = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let frac = rank - lower as f64;
        sorted[lower] + (sorted[upper] - sorted[lower]) * frac
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64, tol: f64) {
        assert!((a - b).abs() <= tol, "expected {b}, got {a}");
    }

    #[test]
    fn single_outcome_collapses_interval() {
        for method in [IntervalMethod::Percentile, IntervalMethod::Normal] {
            let s = aggregate_with(&[0.42], 0.95, method).unwrap();
            assert_eq!(s.confidence_interval.lower, 0.42);
            assert_eq!(s.confidence_interval.upper, 0.42);
            assert_eq!(s.std_dev, 0.0);
            assert_eq!(s.value_at_risk, 0.42);
            assert_eq!(s.expected_shortfall, 0.42);
        }
    }

    #[test]
    fn constant_outcomes_do_not_produce_nan() {
        let s = aggregate(&[0.6; 250], 0.9).unwrap();
        assert_eq!(s.std_dev, 0.0);
        assert_eq!(s.value_at_risk, s.mean);
        assert_eq!(s.expected_shortfall, s.mean);
        assert_eq!(s.skewness, 0.0);
        assert_eq!(s.kurtosis, 0.0);
        assert!(s.risk_metrics().values().all(|v| v.is_finite()));
    }

    #[test]
    fn large_constant_vectors_report_the_value_exactly() {
        for (value, n) in [(0.3, 10_000), (0.7, 10), (0.1, 100_003)] {
            let s = aggregate(&vec![value; n], 0.9).unwrap();
            assert_eq!(s.mean, value);
            assert_eq!(s.std_dev, 0.0);
            assert_eq!(s.value_at_risk, s.mean);
            assert_eq!(s.expected_shortfall, s.mean);
            assert_eq!(s.skewness, 0.0);
            assert_eq!(s.kurtosis, 0.0);
            assert_eq!(s.percentiles.p50, value);
            assert_eq!(s.confidence_interval.lower, value);
            assert_eq!(s.confidence_interval.upper, value);
        }
        assert_eq!(aggregate(&[0.3; 4], 0.9).unwrap().probability_of_failure, 1.0);
    }

    #[test]
    fn compensated_mean_of_repeated_tenths() {
        let outcomes = vec![0.1; 1_000_000];
        let mixed: Vec<f64> = outcomes.iter().copied().chain([0.2]).collect();
        let s = aggregate(&mixed, 0.9).unwrap();
        approx(s.mean, (0.1 * 1_000_000.0 + 0.2) / 1_000_001.0, 1e-15);
    }

    #[test]
    fn percentile_of_empty_slice_is_none() {
        assert_eq!(percentile_sorted(&[], 0.5), None);
        approx(percentile_sorted(&[0.2, 0.4], 0.5).unwrap(), 0.3, 1e-12);
        assert_eq!(percentile_sorted(&[0.25], 0.9), Some(0.25));
    }

    #[test]
    fn known_moments_and_tail() {
        let outcomes: Vec<f64> = (0..=100).map(|i| i as f64 / 100.0).collect();
        let s = aggregate(&outcomes, 0.9).unwrap();
        approx(s.mean, 0.5, 1e-12);
        approx(s.value_at_risk, 0.10, 1e-12);
        // outcomes 0.00..=0.10
        approx(s.expected_shortfall, 0.05, 1e-12);
        approx(s.confidence_interval.lower, 0.05, 1e-12);
        approx(s.confidence_interval.upper, 0.95, 1e-12);
        approx(s.skewness, 0.0, 1e-9);
        // uniform grid: excess kurtosis close to -1.2
        approx(s.kurtosis, -1.2, 0.01);
        approx(s.probability_of_failure, 50.0 / 101.0, 1e-12);
    }

    #[test]
    fn order_does_not_matter() {
        let forward: Vec<f64> = (0..1000).map(|i| ((i * 7919) % 1000) as f64 / 997.0).collect();
        let mut reversed = forward.clone();
        reversed.reverse();
        assert_eq!(aggregate(&forward, 0.95).unwrap(), aggregate(&reversed, 0.95).unwrap());
    }

    #[test]
    fn rejects_empty_and_non_finite_input() {
        assert_eq!(aggregate(&[], 0.95), Err(AggregationError::NoOutcomes));
        assert!(matches!(
            aggregate(&[0.1, f64::NAN], 0.95),
            Err(AggregationError::NonFiniteOutcome { index: 1, .. })
        ));
        assert!(matches!(
            aggregate(&[0.1], 1.0),
            Err(AggregationError::InvalidConfidenceLevel(_))
        ));
    }

    #[test]
    fn normal_interval_is_symmetric_about_mean() {
        let outcomes: Vec<f64> = (0..400).map(|i| (i % 20) as f64 / 20.0).collect();
        let s = aggregate_with(&outcomes, 0.95, IntervalMethod::Normal).unwrap();
        approx(s.mean - s.confidence_interval.lower, s.confidence_interval.upper - s.mean, 1e-12);
        approx(s.confidence_interval.upper - s.mean, 1.959964 * s.standard_error, 1e-6);
    }
}
