//! Historical reference outcomes: catalog store and similarity comparison.

pub mod catalog;
pub mod compare;
pub mod outcome;
pub mod store;

pub use compare::{compare, similarity, ComparisonResult, OutcomeMatch};
pub use outcome::HistoricalOutcome;
pub use store::{HistoricalOutcomeStore, LoadReport};
