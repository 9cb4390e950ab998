pub mod correlation;
pub mod marginal;
pub mod rng;
pub mod space;

pub use correlation::{CholeskyFactor, CorrelationMatrix};
pub use marginal::Marginal;
pub use rng::Rng;
pub use space::{sample, ParameterSpace, Sample, Sampler};
