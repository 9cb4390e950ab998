pub mod parameter;
pub mod result;
pub mod scenario;

pub use parameter::{Distribution, Parameter, ParameterSpec};
pub use result::{RunMetadata, RunStatus, SeedSource, SimulationResult};
pub use scenario::{
    IntervalMethod, Payoff, RiskTolerance, Scenario, SimulationConfig, DEFAULT_BASE_SUCCESS,
    DEFAULT_CONFIDENCE_LEVEL, DEFAULT_ITERATIONS, MAX_ITERATIONS,
};
