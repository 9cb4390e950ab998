//! Ranks historical outcomes by closeness to a simulated success probability.

use serde::Serialize;

use crate::error::ComparisonError;
use crate::history::outcome::HistoricalOutcome;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomeMatch {
    pub outcome: HistoricalOutcome,
    pub similarity_score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ComparisonResult {
    pub best_match: Option<OutcomeMatch>,
    pub average_historical_success: Option<f64>,
    pub overall_similarity: Option<f64>,
    pub comparisons: Vec<OutcomeMatch>,
    /// Records left out of the comparison, and an empty-catalog marker.
    #[serde(skip)]
    pub issues: Vec<ComparisonError>,
}

impl ComparisonResult {
    pub fn is_empty(&self) -> bool {
        self.comparisons.is_empty()
    }
}

/// `clamp(1 - |p - rate|, 0, 1)`.
pub fn similarity(success_probability: f64, historical_rate: f64) -> f64 {
    let score = 1.0 - (success_probability - historical_rate).abs();
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}

/// Compare a simulated success probability against `outcomes`.
///
/// Sorted by similarity descending, then applicability descending, then input
/// order. Malformed records are skipped and listed in `issues`; an empty
/// usable set yields an empty result rather than an error.
pub fn compare<'a, I>(success_probability: f64, outcomes: I) -> ComparisonResult
where
    I: IntoIterator<Item = &'a HistoricalOutcome>,
{
    let mut issues = Vec::new();
    let mut comparisons: Vec<OutcomeMatch> = Vec::new();
    for (index, outcome) in outcomes.into_iter().enumerate() {
        if let Err(err) = outcome.validate(index) {
            issues.push(err);
            continue;
        }
        comparisons.push(OutcomeMatch {
            similarity_score: similarity(success_probability, outcome.success_rate),
            outcome: outcome.clone(),
        });
    }

    if comparisons.is_empty() {
        issues.push(ComparisonError::EmptyCatalog);
        return ComparisonResult {
            issues,
            ..ComparisonResult::default()
        };
    }

    comparisons.sort_by(|a, b| {
        b.similarity_score
            .total_cmp(&a.similarity_score)
            .then_with(|| {
                b.outcome
                    .applicability_score
                    .total_cmp(&a.outcome.applicability_score)
            })
    });

    let n = comparisons.len() as f64;
    let average_historical_success =
        comparisons.iter().map(|m| m.outcome.success_rate).sum::<f64>() / n;
    let overall_similarity = comparisons.iter().map(|m| m.similarity_score).sum::<f64>() / n;

    ComparisonResult {
        best_match: comparisons.first().cloned(),
        average_historical_success: Some(average_historical_success),
        overall_similarity: Some(overall_similarity),
        comparisons,
        issues,
    }
}
