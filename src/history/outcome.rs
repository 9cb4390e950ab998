use serde::{Deserialize, Serialize};

use crate::error::ComparisonError;

/// A curated historical reference outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalOutcome {
    pub source: String,
    pub name: String,
    pub success_rate: f64,
    #[serde(default)]
    pub context: String,
    #[serde(default)]
    pub key_factors: Vec<String>,
    pub applicability_score: f64,
}

impl HistoricalOutcome {
    pub fn new(
        source: impl Into<String>,
        name: impl Into<String>,
        success_rate: f64,
        applicability_score: f64,
    ) -> Self {
        Self {
            source: source.into(),
            name: name.into(),
            success_rate,
            context: String::new(),
            key_factors: Vec::new(),
            applicability_score,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    pub fn with_key_factors<I, S>(mut self, factors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.key_factors = factors.into_iter().map(Into::into).collect();
        self
    }

    /// `index` is the record's position, used in the error only.
    pub fn validate(&self, index: usize) -> Result<(), ComparisonError> {
        let malformed = |reason: String| ComparisonError::MalformedRecord {
            index,
            name: self.name.clone(),
            reason,
        };
        if self.name.trim().is_empty() {
            return Err(malformed("name is empty".to_string()));
        }
        if !self.success_rate.is_finite() || !(0.0..=1.0).contains(&self.success_rate) {
            return Err(malformed(format!(
                "success_rate {} outside [0, 1]",
                self.success_rate
            )));
        }
        if !self.applicability_score.is_finite()
            || !(0.0..=1.0).contains(&self.applicability_score)
        {
            return Err(malformed(format!(
                "applicability_score {} outside [0, 1]",
                self.applicability_score
            )));
        }
        Ok(())
    }
}
