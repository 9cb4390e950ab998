//! Run lifecycle: CREATED → SAMPLED → EVALUATED → AGGREGATED → COMPARED →
//! RECOMMENDED → COMPLETE, with FAILED reachable from any non-terminal stage.
//! Stages only move forward.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStage {
    Created,
    Sampled,
    Evaluated,
    Aggregated,
    Compared,
    Recommended,
    Complete,
    Failed,
}

impl RunStage {
    pub const fn next(self) -> Option<RunStage> {
        match self {
            Self::Created => Some(Self::Sampled),
            Self::Sampled => Some(Self::Evaluated),
            Self::Evaluated => Some(Self::Aggregated),
            Self::Aggregated => Some(Self::Compared),
            Self::Compared => Some(Self::Recommended),
            Self::Recommended => Some(Self::Complete),
            Self::Complete | Self::Failed => None,
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }
}

#[derive(Debug, Clone)]
pub struct RunState {
    trail: Vec<RunStage>,
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

impl RunState {
    pub fn new() -> Self {
        Self {
            trail: vec![RunStage::Created],
        }
    }

    pub fn stage(&self) -> RunStage {
        self.trail.last().copied().unwrap_or(RunStage::Created)
    }

    /// Step forward through every stage up to and including `target`.
    /// Targets behind the current stage, and any move out of a terminal stage, are ignored.
    pub fn advance_to(&mut self, target: RunStage) {
        if target == RunStage::Failed {
            self.fail();
            return;
        }
        while self.stage() < target {
            match self.stage().next() {
                Some(next) => {
                    tracing::debug!(stage = ?next, "run stage");
                    self.trail.push(next);
                }
                None => break,
            }
        }
    }

    pub fn fail(&mut self) {
        if !self.stage().is_terminal() {
            tracing::debug!(after = ?self.stage(), "run failed");
            self.trail.push(RunStage::Failed);
        }
    }

    pub fn trail(&self) -> &[RunStage] {
        &self.trail
    }

    pub fn into_trail(self) -> Vec<RunStage> {
        self.trail
    }
}
