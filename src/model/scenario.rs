use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::history::HistoricalOutcome;
use crate::model::parameter::Parameter;
use crate::sampling::CorrelationMatrix;

pub const DEFAULT_ITERATIONS: usize = 10_000;
pub const MAX_ITERATIONS: usize = 10_000_000;
pub const DEFAULT_CONFIDENCE_LEVEL: f64 = 0.95;
pub const DEFAULT_BASE_SUCCESS: f64 = 0.5;

/// How much outcome volatility the caller accepts before a risk warning is raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTolerance {
    Low,
    #[default]
    Moderate,
    High,
}

impl RiskTolerance {
    pub const fn volatility_threshold(self) -> f64 {
        match self {
            Self::Low => 0.15,
            Self::Moderate => 0.20,
            Self::High => 0.25,
        }
    }
}

/// Confidence interval construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalMethod {
    /// Empirical quantiles of the simulated outcomes.
    #[default]
    Percentile,
    /// mean ± z·σ/√n.
    Normal,
}

/// Value assigned to a success and to a failure when computing `expected_value`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Payoff {
    pub on_success: f64,
    pub on_failure: f64,
}

impl Default for Payoff {
    fn default() -> Self {
        Self {
            on_success: 1.0,
            on_failure: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub iterations: usize,
    pub confidence_level: f64,
    pub risk_tolerance: RiskTolerance,
    /// Planning horizon in days. Informational; echoed into result metadata.
    pub time_horizon: Option<u32>,
    pub seed: Option<u64>,
    /// Overall wall-clock budget. When exceeded the run returns PARTIAL.
    pub time_budget_ms: Option<u64>,
    pub interval_method: IntervalMethod,
    pub payoff: Payoff,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            confidence_level: DEFAULT_CONFIDENCE_LEVEL,
            risk_tolerance: RiskTolerance::default(),
            time_horizon: None,
            seed: None,
            time_budget_ms: None,
            interval_method: IntervalMethod::default(),
            payoff: Payoff::default(),
        }
    }
}

fn default_base_success() -> f64 {
    DEFAULT_BASE_SUCCESS
}

/// A fully formed simulation request. Borrowed immutably for the whole run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Selects the evaluator capability set (e.g. "deception").
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default = "default_base_success")]
    pub base_success: f64,
    /// Used to query the historical store when no explicit references are given.
    #[serde(default)]
    pub keywords: Vec<String>,
    pub parameters: Vec<Parameter>,
    /// Ordered like `parameters`.
    #[serde(default)]
    pub correlation: Option<CorrelationMatrix>,
    #[serde(default)]
    pub historical_outcomes: Vec<HistoricalOutcome>,
    #[serde(default)]
    pub config: SimulationConfig,
}

impl Scenario {
    pub fn new(id: impl Into<String>, name: impl Into<String>, parameters: Vec<Parameter>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            category: None,
            base_success: DEFAULT_BASE_SUCCESS,
            keywords: Vec::new(),
            parameters,
            correlation: None,
            historical_outcomes: Vec::new(),
            config: SimulationConfig::default(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_base_success(mut self, base_success: f64) -> Self {
        self.base_success = base_success;
        self
    }

    pub fn with_config(mut self, config: SimulationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_correlation(mut self, correlation: CorrelationMatrix) -> Self {
        self.correlation = Some(correlation);
        self
    }

    pub fn with_historical_outcomes(mut self, outcomes: Vec<HistoricalOutcome>) -> Self {
        self.historical_outcomes = outcomes;
        self
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// Whole-scenario validation. Parameter-level constraints were already enforced
    /// when each [Parameter] was built; the correlation matrix is checked by
    /// [crate::sampling::ParameterSpace].
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::EmptyScenarioId);
        }
        if self.parameters.is_empty() {
            return Err(ValidationError::NoParameters(self.id.clone()));
        }
        let mut seen = HashSet::with_capacity(self.parameters.len());
        for parameter in &self.parameters {
            if !seen.insert(parameter.name()) {
                return Err(ValidationError::DuplicateParameter(parameter.name().to_string()));
            }
        }
        if !self.base_success.is_finite() || !(0.0..=1.0).contains(&self.base_success) {
            return Err(ValidationError::InvalidBaseSuccess(self.base_success));
        }
        self.config.validate()
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.iterations == 0 || self.iterations > MAX_ITERATIONS {
            return Err(ValidationError::InvalidIterations {
                actual: self.iterations,
                max: MAX_ITERATIONS,
            });
        }
        let level = self.confidence_level;
        if !level.is_finite() || level <= 0.0 || level >= 1.0 {
            return Err(ValidationError::InvalidConfidenceLevel(level));
        }
        if self.time_budget_ms == Some(0) {
            return Err(ValidationError::InvalidSetting {
                field: "time_budget_ms",
                constraint: " and > 0",
                value: 0.0,
            });
        }
        for (field, value) in [
            ("payoff.on_success", self.payoff.on_success),
            ("payoff.on_failure", self.payoff.on_failure),
        ] {
            if !value.is_finite() {
                return Err(ValidationError::InvalidSetting {
                    field,
                    constraint: "",
                    value,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario() -> Scenario {
        Scenario::new(
            "raid",
            "Night raid",
            vec![
                Parameter::uniform("terrain_advantage", 0.1, 0.8).unwrap(),
                Parameter::normal("enemy_morale", 0.6, 0.15, 0.0, 1.0).unwrap(),
            ],
        )
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = SimulationConfig::default();
        assert_eq!(config.iterations, 10_000);
        assert_eq!(config.confidence_level, 0.95);
        assert_eq!(config.risk_tolerance.volatility_threshold(), 0.20);
        assert!(scenario().validate().is_ok());
    }

    #[test]
    fn rejects_duplicate_parameters() {
        let mut s = scenario();
        s.parameters.push(Parameter::uniform("enemy_morale", 0.0, 1.0).unwrap());
        assert_eq!(
            s.validate(),
            Err(ValidationError::DuplicateParameter("enemy_morale".into()))
        );
    }

    #[test]
    fn rejects_confidence_level_on_the_boundary() {
        for level in [0.0, 1.0, f64::NAN] {
            let s = scenario().with_config(SimulationConfig {
                confidence_level: level,
                ..SimulationConfig::default()
            });
            assert!(matches!(
                s.validate(),
                Err(ValidationError::InvalidConfidenceLevel(_))
            ));
        }
    }

    #[test]
    fn rejects_zero_iterations_and_empty_parameter_list() {
        let s = scenario().with_config(SimulationConfig {
            iterations: 0,
            ..SimulationConfig::default()
        });
        assert!(matches!(s.validate(), Err(ValidationError::InvalidIterations { .. })));

        let empty = Scenario::new("x", "x", Vec::new());
        assert_eq!(empty.validate(), Err(ValidationError::NoParameters("x".into())));
    }

    #[test]
    fn scenario_deserializes_from_yaml_with_defaults() {
        let yaml = r#"
id: feint
name: Feint at the ford
category: deception
parameters:
  - name: deception_credibility
    distribution: { kind: triangular, low: 0.2, mode: 0.6, high: 0.9 }
    min: 0.0
    max: 1.0
config:
  iterations: 500
  seed: 7
  risk_tolerance: low
"#;
        let s: Scenario = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(s.base_success, 0.5);
        assert_eq!(s.config.iterations, 500);
        assert_eq!(s.config.confidence_level, 0.95);
        assert_eq!(s.config.risk_tolerance, RiskTolerance::Low);
        assert!(s.validate().is_ok());
    }
}
