//! Per-run workflow state
//!
//! Counters live in run-scoped state mutated only by the orchestrator.
//! They are never recomputed from conversation history, which bounds
//! memory growth no matter how long a conversation has run.

use crate::validation::ValidationOutcome;
use serde::{Deserialize, Serialize};

/// Result of executing an accepted query against the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionOutcome {
    Success { rows_json: String, row_count: usize },
    Failed(String),
}

/// The latest thing that happened to the in-flight candidate query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepOutcome {
    Validation(ValidationOutcome),
    Execution(ExecutionOutcome),
}

impl StepOutcome {
    pub fn is_failure(&self) -> bool {
        match self {
            StepOutcome::Validation(v) => !v.is_accepted(),
            StepOutcome::Execution(ExecutionOutcome::Failed(_)) => true,
            StepOutcome::Execution(ExecutionOutcome::Success { .. }) => false,
        }
    }

    /// Human-readable error detail, if this outcome is a failure.
    pub fn error_detail(&self) -> Option<&str> {
        match self {
            StepOutcome::Validation(outcome) => outcome.detail(),
            StepOutcome::Execution(ExecutionOutcome::Failed(message)) => Some(message),
            StepOutcome::Execution(ExecutionOutcome::Success { .. }) => None,
        }
    }
}

/// Phases of a single question-answering run, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowPhase {
    Generating,
    Executing,
    Retrying,
    Accepted,
    FallbackTriggered,
    GivenUp,
}

/// Per-run counters. Created at run start, discarded at run end, never
/// persisted across runs.
#[derive(Debug, Clone, Default)]
pub struct AttemptState {
    pub retry_count: u32,
    pub fallback_attempted: bool,
    pub last_outcome: Option<StepOutcome>,
}

impl AttemptState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an outcome; failures advance the retry counter.
    pub fn record(&mut self, outcome: StepOutcome) {
        if outcome.is_failure() {
            self.retry_count += 1;
        }
        self.last_outcome = Some(outcome);
    }

    /// Enter fallback mode: the flag is set exactly once per run, the
    /// counter resets, and the prior error is cleared.
    pub fn enter_fallback(&mut self) {
        self.fallback_attempted = true;
        self.retry_count = 0;
        self.last_outcome = None;
    }
}
