//! Uncertain factors and their distributions.
//!
//! A [Parameter] is validated once at construction and immutable afterwards.
//! Deserialization goes through the same validation via `serde(try_from)`.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Supported marginal distributions with their distribution-specific arguments.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Distribution {
    Uniform { low: f64, high: f64 },
    Normal { mean: f64, std_dev: f64 },
    Triangular { low: f64, mode: f64, high: f64 },
    Beta { alpha: f64, beta: f64 },
    Gamma { shape: f64, rate: f64 },
    Weibull { shape: f64, scale: f64 },
    Poisson { lambda: f64 },
    Exponential { rate: f64 },
    LogNormal { mu: f64, sigma: f64 },
}

impl Distribution {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Uniform { .. } => "uniform",
            Self::Normal { .. } => "normal",
            Self::Triangular { .. } => "triangular",
            Self::Beta { .. } => "beta",
            Self::Gamma { .. } => "gamma",
            Self::Weibull { .. } => "weibull",
            Self::Poisson { .. } => "poisson",
            Self::Exponential { .. } => "exponential",
            Self::LogNormal { .. } => "log_normal",
        }
    }

    fn args(&self) -> Vec<f64> {
        match *self {
            Self::Uniform { low, high } => vec![low, high],
            Self::Normal { mean, std_dev } => vec![mean, std_dev],
            Self::Triangular { low, mode, high } => vec![low, mode, high],
            Self::Beta { alpha, beta } => vec![alpha, beta],
            Self::Gamma { shape, rate } => vec![shape, rate],
            Self::Weibull { shape, scale } => vec![shape, scale],
            Self::Poisson { lambda } => vec![lambda],
            Self::Exponential { rate } => vec![rate],
            Self::LogNormal { mu, sigma } => vec![mu, sigma],
        }
    }

    /// Checks the distribution-specific constraints. Returns the reason on failure.
    pub fn check(&self) -> Result<(), String> {
        if self.args().iter().any(|arg| !arg.is_finite()) {
            return Err(format!("{} arguments must be finite", self.kind()));
        }
        let positive = |name: &str, value: f64| {
            if value > 0.0 {
                Ok(())
            } else {
                Err(format!("{name} must be > 0 (got {value})"))
            }
        };
        match *self {
            Self::Uniform { low, high } => {
                if low < high {
                    Ok(())
                } else {
                    Err(format!("uniform requires low < high (got {low}, {high})"))
                }
            }
            Self::Normal { std_dev, .. } => positive("std_dev", std_dev),
            Self::Triangular { low, mode, high } => {
                if low < high && (low..=high).contains(&mode) {
                    Ok(())
                } else {
                    Err(format!(
                        "triangular requires low <= mode <= high and low < high (got {low}, {mode}, {high})"
                    ))
                }
            }
            Self::Beta { alpha, beta } => positive("alpha", alpha).and(positive("beta", beta)),
            Self::Gamma { shape, rate } => positive("shape", shape).and(positive("rate", rate)),
            Self::Weibull { shape, scale } => {
                positive("shape", shape).and(positive("scale", scale))
            }
            Self::Poisson { lambda } => positive("lambda", lambda),
            Self::Exponential { rate } => positive("rate", rate),
            Self::LogNormal { sigma, .. } => positive("sigma", sigma),
        }
    }
}

/// A named uncertain factor. Every sampled value is clipped to `[min, max]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ParameterSpec", into = "ParameterSpec")]
pub struct Parameter {
    name: String,
    distribution: Distribution,
    min: f64,
    max: f64,
    description: String,
}

impl Parameter {
    pub fn new(
        name: impl Into<String>,
        distribution: Distribution,
        min: f64,
        max: f64,
    ) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyParameterName);
        }
        if !min.is_finite() || !max.is_finite() || min > max {
            return Err(ValidationError::InvalidBounds {
                parameter: name,
                min,
                max,
            });
        }
        distribution
            .check()
            .map_err(|reason| ValidationError::InvalidDistribution {
                parameter: name.clone(),
                reason,
            })?;
        Ok(Self {
            name,
            distribution,
            min,
            max,
            description: String::new(),
        })
    }

    pub fn uniform(name: impl Into<String>, low: f64, high: f64) -> Result<Self, ValidationError> {
        Self::new(name, Distribution::Uniform { low, high }, low, high)
    }

    pub fn normal(
        name: impl Into<String>,
        mean: f64,
        std_dev: f64,
        min: f64,
        max: f64,
    ) -> Result<Self, ValidationError> {
        Self::new(name, Distribution::Normal { mean, std_dev }, min, max)
    }

    pub fn triangular(
        name: impl Into<String>,
        low: f64,
        mode: f64,
        high: f64,
    ) -> Result<Self, ValidationError> {
        Self::new(name, Distribution::Triangular { low, mode, high }, low, high)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn distribution(&self) -> &Distribution {
        &self.distribution
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Clip a raw draw into this parameter's bounds.
    #[inline]
    pub fn clip(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

/// Wire form of [Parameter]; validated on conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterSpec {
    pub name: String,
    pub distribution: Distribution,
    pub min: f64,
    pub max: f64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl TryFrom<ParameterSpec> for Parameter {
    type Error = ValidationError;

    fn try_from(spec: ParameterSpec) -> Result<Self, Self::Error> {
        Ok(Parameter::new(spec.name, spec.distribution, spec.min, spec.max)?
            .with_description(spec.description))
    }
}

impl From<Parameter> for ParameterSpec {
    fn from(parameter: Parameter) -> Self {
        Self {
            name: parameter.name,
            distribution: parameter.distribution,
            min: parameter.min,
            max: parameter.max,
            description: parameter.description,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_inverted_bounds() {
        let err = Parameter::normal("x", 0.5, 0.1, 1.0, 0.0).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidBounds { .. }));
    }

    #[test]
    fn rejects_non_positive_std_dev() {
        let err = Parameter::normal("x", 0.5, 0.0, 0.0, 1.0).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidDistribution { .. }));
    }

    #[test]
    fn rejects_mode_outside_triangle() {
        assert!(Parameter::triangular("t", 0.0, 1.5, 1.0).is_err());
        assert!(Parameter::triangular("t", 0.0, 0.0, 1.0).is_ok());
    }

    #[test]
    fn rejects_empty_name_and_non_finite_args() {
        assert_eq!(
            Parameter::uniform("  ", 0.0, 1.0).unwrap_err(),
            ValidationError::EmptyParameterName
        );
        assert!(Parameter::new("g", Distribution::Gamma { shape: f64::NAN, rate: 1.0 }, 0.0, 1.0).is_err());
    }

    #[test]
    fn equal_bounds_are_allowed() {
        let p = Parameter::new("fixed", Distribution::Exponential { rate: 2.0 }, 0.3, 0.3).unwrap();
        assert_eq!(p.clip(10.0), 0.3);
    }

    #[test]
    fn deserialization_validates() {
        let ok: Parameter = serde_json::from_str(
            r#"{"name":"morale","distribution":{"kind":"beta","alpha":2.0,"beta":5.0},"min":0.0,"max":1.0}"#,
        )
        .unwrap();
        assert_eq!(ok.distribution().kind(), "beta");

        let bad = serde_json::from_str::<Parameter>(
            r#"{"name":"morale","distribution":{"kind":"poisson","lambda":-1.0},"min":0.0,"max":9.0}"#,
        );
        assert!(bad.is_err());
    }
}
