//! Monte Carlo estimation of an action's success probability and risk profile,
//! set against curated historical reference outcomes.
//!
//! ```no_run
//! use kriegspiel::{EngineConfig, HistoricalOutcomeStore, Parameter, Scenario, SimulationEngine};
//!
//! let scenario = Scenario::new(
//!     "crossing",
//!     "River crossing at dawn",
//!     vec![
//!         Parameter::uniform("terrain_advantage", 0.3, 0.8).unwrap(),
//!         Parameter::normal("enemy_morale", 0.5, 0.1, 0.0, 1.0).unwrap(),
//!     ],
//! );
//! let engine = SimulationEngine::new(EngineConfig::default(), HistoricalOutcomeStore::curated().shared());
//! let result = engine.run(&scenario).unwrap();
//! println!("{:?}", result.success_probability);
//! ```

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod evaluation;
pub mod history;
pub mod model;
pub mod parallel;
pub mod recommend;
pub mod sampling;
pub mod stats;

pub use config::EngineConfig;
pub use engine::{RunStage, SimulationEngine};
pub use error::{
    AggregationError, ComparisonError, EvaluationError, FailureReason, SamplingError,
    ValidationError,
};
pub use evaluation::{CategoryRegistry, Evaluate, ScenarioEvaluator};
pub use history::{ComparisonResult, HistoricalOutcome, HistoricalOutcomeStore, OutcomeMatch};
pub use model::{
    Distribution, IntervalMethod, Parameter, Payoff, RiskTolerance, RunStatus, Scenario,
    SimulationConfig, SimulationResult,
};
pub use recommend::{recommend, RecommendationConfig};
pub use sampling::{CorrelationMatrix, Sample};
pub use stats::{aggregate, FactorSensitivity, Statistics};
