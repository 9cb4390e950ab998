//! Error taxonomy for the simulation engine.
//! One enum per failure class. Validation errors are returned before any sampling;
//! the others surface as a [FailureReason] on a FAILED result or as warnings.

use serde::Serialize;

/// Malformed parameter, scenario, correlation matrix or engine configuration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("parameter name must not be empty")]
    EmptyParameterName,

    #[error("parameter '{parameter}': bounds must be finite with min <= max (got [{min}, {max}])")]
    InvalidBounds { parameter: String, min: f64, max: f64 },

    #[error("parameter '{parameter}': invalid distribution: {reason}")]
    InvalidDistribution { parameter: String, reason: String },

    #[error("duplicate parameter name '{0}'")]
    DuplicateParameter(String),

    #[error("scenario '{0}' defines no parameters")]
    NoParameters(String),

    #[error("scenario id must not be empty")]
    EmptyScenarioId,

    #[error("iterations must be between 1 and {max} (got {actual})")]
    InvalidIterations { actual: usize, max: usize },

    #[error("confidence level must lie strictly between 0 and 1 (got {0})")]
    InvalidConfidenceLevel(f64),

    #[error("base success must lie in [0, 1] (got {0})")]
    InvalidBaseSuccess(f64),

    #[error("{field} must be finite{constraint} (got {value})")]
    InvalidSetting {
        field: &'static str,
        constraint: &'static str,
        value: f64,
    },

    #[error("correlation matrix must be {expected}x{expected}, found {rows} rows")]
    CorrelationDimension { expected: usize, rows: usize },

    #[error("correlation matrix row {row} has {len} entries, expected {expected}")]
    CorrelationRowLength { row: usize, len: usize, expected: usize },

    #[error("correlation entry ({row}, {col}) = {value} is not a finite value in [-1, 1]")]
    CorrelationOutOfRange { row: usize, col: usize, value: f64 },

    #[error("correlation diagonal entry {index} must be 1 (got {value})")]
    CorrelationDiagonal { index: usize, value: f64 },

    #[error("correlation matrix is not symmetric at ({row}, {col})")]
    CorrelationAsymmetric { row: usize, col: usize },

    #[error("correlation matrix is not positive semi-definite (pivot {pivot} = {value})")]
    CorrelationNotPositiveSemiDefinite { pivot: usize, value: f64 },
}

/// A distribution produced a value that cannot enter the statistics.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SamplingError {
    #[error("parameter '{parameter}' produced non-finite value {value} at sample {sample}")]
    NonFinite {
        parameter: String,
        value: f64,
        sample: usize,
    },
}

/// A single sample could not be scored. Counted against the failure threshold.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvaluationError {
    #[error("factor '{factor}' is not finite ({value})")]
    NonFiniteFactor { factor: String, value: f64 },

    #[error("factor '{factor}' = {value} lies outside [0, 1]")]
    FactorOutOfRange { factor: String, value: f64 },

    #[error("evaluator produced non-finite score {0}")]
    NonFiniteScore(f64),

    #[error("sample rejected: {0}")]
    Rejected(String),
}

/// Statistics could not be produced.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AggregationError {
    #[error("no valid outcomes to aggregate")]
    NoOutcomes,

    #[error("confidence level must lie strictly between 0 and 1 (got {0})")]
    InvalidConfidenceLevel(f64),

    #[error("outcome {index} is not finite ({value})")]
    NonFiniteOutcome { index: usize, value: f64 },
}

/// Historical catalog problems. Never fatal; degrades the comparison section.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ComparisonError {
    #[error("historical catalog is empty")]
    EmptyCatalog,

    #[error("historical record {index} ('{name}') is malformed: {reason}")]
    MalformedRecord {
        index: usize,
        name: String,
        reason: String,
    },
}

/// Convenience error for callers that drive sampling directly.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Sampling(#[from] SamplingError),

    #[error(transparent)]
    Aggregation(#[from] AggregationError),
}

/// Structured reason attached to a FAILED [crate::SimulationResult].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    Sampling {
        message: String,
    },
    EvaluationFailureRate {
        failures: usize,
        requested: usize,
        rate: f64,
        threshold: f64,
        first_error: Option<String>,
    },
    Aggregation {
        message: String,
    },
}

impl From<SamplingError> for FailureReason {
    fn from(err: SamplingError) -> Self {
        Self::Sampling {
            message: err.to_string(),
        }
    }
}

impl From<AggregationError> for FailureReason {
    fn from(err: AggregationError) -> Self {
        Self::Aggregation {
            message: err.to_string(),
        }
    }
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sampling { message } | Self::Aggregation { message } => write!(f, "{message}"),
            Self::EvaluationFailureRate {
                failures,
                requested,
                rate,
                threshold,
                ..
            } => write!(
                f,
                "evaluation failure rate {rate:.4} ({failures}/{requested}) exceeds threshold {threshold:.4}"
            ),
        }
    }
}
