//! Scenario evaluation: one sample + scenario → success rate in [0, 1].
//!
//! The score is `base_success + Σ contributions`, where the contributors come
//! from the scenario category's capability set in [CategoryRegistry].

pub mod contributor;
pub mod registry;

use std::sync::Arc;

use crate::error::EvaluationError;
use crate::model::Scenario;
use crate::sampling::Sample;

pub use contributor::{FactorContributor, WeightedFactor};
pub use registry::CategoryRegistry;

/// Maps a sample to a success rate. Implementations must be pure: the same
/// `(sample, scenario)` always yields the same result.
pub trait Evaluate: Send + Sync {
    fn success_rate(&self, sample: &Sample, scenario: &Scenario) -> Result<f64, EvaluationError>;
}

impl<F> Evaluate for F
where
    F: Fn(&Sample, &Scenario) -> Result<f64, EvaluationError> + Send + Sync,
{
    fn success_rate(&self, sample: &Sample, scenario: &Scenario) -> Result<f64, EvaluationError> {
        self(sample, scenario)
    }
}

#[derive(Debug, Clone)]
pub struct ScenarioEvaluator {
    registry: Arc<CategoryRegistry>,
}

impl Default for ScenarioEvaluator {
    fn default() -> Self {
        Self::new(Arc::new(CategoryRegistry::standard()))
    }
}

impl ScenarioEvaluator {
    pub fn new(registry: Arc<CategoryRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &CategoryRegistry {
        &self.registry
    }

    /// Unclamped weighted sum; exposed for diagnostics.
    pub fn raw_score(&self, sample: &Sample, scenario: &Scenario) -> Result<f64, EvaluationError> {
        self.registry
            .resolve(scenario.category.as_deref())
            .try_fold(scenario.base_success, |acc, contributor| {
                Ok(acc + contributor.contribute(sample)?)
            })
    }
}

impl Evaluate for ScenarioEvaluator {
    fn success_rate(&self, sample: &Sample, scenario: &Scenario) -> Result<f64, EvaluationError> {
        let raw = self.raw_score(sample, scenario)?;
        if !raw.is_finite() {
            return Err(EvaluationError::NonFiniteScore(raw));
        }
        Ok(raw.clamp(0.0, 1.0))
    }
}

/// `success_rate(sample, scenario)` with the standard registry.
pub fn success_rate(sample: &Sample, scenario: &Scenario) -> Result<f64, EvaluationError> {
    ScenarioEvaluator::default().success_rate(sample, scenario)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Parameter;

    fn scenario(category: Option<&str>) -> Scenario {
        let s = Scenario::new(
            "s",
            "s",
            vec![Parameter::uniform("terrain_advantage", 0.0, 1.0).unwrap()],
        );
        match category {
            Some(c) => s.with_category(c),
            None => s,
        }
    }

    fn all_factors(value: f64) -> Sample {
        Sample::from_pairs(
            0,
            [
                ("terrain_advantage", value),
                ("resource_availability", value),
                ("timing_advantage", value),
                ("leadership_quality", value),
                ("enemy_intelligence", value),
                ("enemy_morale", value),
                ("deception_credibility", value),
                ("intelligence_superiority", value),
            ],
        )
    }

    #[test]
    fn baseline_weighted_sum() {
        let evaluator = ScenarioEvaluator::default();
        let sample = Sample::from_pairs(
            0,
            [
                ("terrain_advantage", 0.45),
                ("resource_availability", 0.7),
                ("timing_advantage", 0.5),
                ("leadership_quality", 0.75),
                ("enemy_intelligence", 0.6),
                ("enemy_morale", 0.6),
            ],
        );
        let rate = evaluator.success_rate(&sample, &scenario(None)).unwrap();
        assert!((rate - 0.7375).abs() < 1e-12, "rate={rate}");
    }

    #[test]
    fn deception_category_contributes_extra_factors() {
        let evaluator = ScenarioEvaluator::default();
        let sample = all_factors(0.5);
        let plain = evaluator.raw_score(&sample, &scenario(None)).unwrap();
        let deceptive = evaluator.raw_score(&sample, &scenario(Some("deception"))).unwrap();
        assert!((deceptive - plain - 0.15).abs() < 1e-12);
    }

    #[test]
    fn output_is_clamped() {
        let evaluator = ScenarioEvaluator::default();
        let high = scenario(Some("deception")).with_base_success(1.0);
        let sample = Sample::from_pairs(0, [("terrain_advantage", 1.0), ("deception_credibility", 1.0)]);
        assert_eq!(evaluator.success_rate(&sample, &high).unwrap(), 1.0);

        let low = scenario(None).with_base_success(0.0);
        let sample = Sample::from_pairs(0, [("enemy_morale", 1.0), ("enemy_intelligence", 1.0)]);
        assert_eq!(evaluator.success_rate(&sample, &low).unwrap(), 0.0);
    }

    #[test]
    fn evaluation_is_pure() {
        let evaluator = ScenarioEvaluator::default();
        let s = scenario(Some("deception"));
        let sample = all_factors(0.37);
        let first = evaluator.success_rate(&sample, &s).unwrap();
        for _ in 0..10 {
            assert_eq!(evaluator.success_rate(&sample, &s).unwrap(), first);
        }
    }

    #[test]
    fn closures_are_evaluators() {
        let fixed = |_: &Sample, _: &Scenario| -> Result<f64, EvaluationError> { Ok(0.25) };
        let sample = all_factors(0.5);
        assert_eq!(fixed.success_rate(&sample, &scenario(None)).unwrap(), 0.25);
    }
}
