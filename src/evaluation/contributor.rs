//! Factor contributors: small units that each add a signed term to the raw score.

use std::fmt;

use crate::error::EvaluationError;
use crate::sampling::Sample;

/// One pluggable term of the evaluation sum.
pub trait FactorContributor: fmt::Debug + Send + Sync {
    /// Factor this contributor reads, for reporting.
    fn factor(&self) -> &str;

    /// Signed contribution for `sample`. Must be pure.
    fn contribute(&self, sample: &Sample) -> Result<f64, EvaluationError>;
}

/// `weight × value` for a normalized factor in [0, 1]. Negative weights model
/// adverse factors (enemy intelligence, enemy morale).
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedFactor {
    factor: String,
    weight: f64,
}

impl WeightedFactor {
    pub fn new(factor: impl Into<String>, weight: f64) -> Self {
        Self {
            factor: factor.into(),
            weight,
        }
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }
}

impl FactorContributor for WeightedFactor {
    fn factor(&self) -> &str {
        &self.factor
    }

    fn contribute(&self, sample: &Sample) -> Result<f64, EvaluationError> {
        // Factors the scenario does not model contribute nothing.
        let Some(value) = sample.get(&self.factor) else {
            return Ok(0.0);
        };
        if !value.is_finite() {
            return Err(EvaluationError::NonFiniteFactor {
                factor: self.factor.clone(),
                value,
            });
        }
        if !(0.0..=1.0).contains(&value) {
            return Err(EvaluationError::FactorOutOfRange {
                factor: self.factor.clone(),
                value,
            });
        }
        Ok(self.weight * value)
    }
}
