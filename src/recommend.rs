//! Deterministic guidance derived from the statistics and the historical comparison.

use crate::history::ComparisonResult;
use crate::stats::{dominant_factors, FactorSensitivity, Statistics};

pub const PROCEED_AT: f64 = 0.70;
pub const CAUTION_AT: f64 = 0.50;
/// Expected shortfall below which a contingency note is added.
pub const TAIL_RISK_FLOOR: f64 = 0.30;
const DOMINANT_FACTOR_COUNT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecommendationConfig {
    /// Overall similarity above which lessons from the best match are cited.
    pub similarity_threshold: f64,
    /// Volatility above which a risk warning is emitted.
    pub volatility_threshold: f64,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.90,
            volatility_threshold: 0.20,
        }
    }
}

/// Ordered recommendations. Identical inputs always give identical output.
pub fn recommend(
    statistics: &Statistics,
    comparison: &ComparisonResult,
    sensitivity: &[FactorSensitivity],
    config: &RecommendationConfig,
) -> Vec<String> {
    let p = statistics.mean;
    let mut out = Vec::new();

    out.push(if p >= PROCEED_AT {
        format!("Proceed: estimated success probability {p:.2} is high.")
    } else if p >= CAUTION_AT {
        format!(
            "Proceed with caution and close monitoring: estimated success probability {p:.2} is moderate."
        )
    } else {
        format!(
            "Reconsider or mitigate before proceeding: estimated success probability {p:.2} is low."
        )
    });

    match (&comparison.best_match, comparison.overall_similarity) {
        (Some(best), Some(similarity)) if similarity > config.similarity_threshold => {
            out.push(format!(
                "Apply lessons from {} ({}): historical outcomes closely match this estimate (similarity {similarity:.2}).",
                best.outcome.source, best.outcome.name
            ));
        }
        _ => {}
    }
    if comparison.is_empty() {
        out.push(
            "No historical precedent was available; validate the model assumptions independently."
                .to_string(),
        );
    }

    let volatility = statistics.volatility();
    if volatility > config.volatility_threshold {
        let factors = dominant_factors(sensitivity, DOMINANT_FACTOR_COUNT);
        let named = if factors.is_empty() {
            "the modelled uncertainties".to_string()
        } else {
            factors.join(", ")
        };
        out.push(format!(
            "Risk warning: outcome volatility {volatility:.2} exceeds {:.2}; reduce uncertainty in {named}.",
            config.volatility_threshold
        ));
    }

    if statistics.expected_shortfall < TAIL_RISK_FLOOR {
        out.push(format!(
            "Prepare contingency plans: in the worst {:.0}% of outcomes the average success rate is {:.2}.",
            (1.0 - statistics.confidence_interval.level) * 100.0,
            statistics.expected_shortfall
        ));
    }

    out
}
