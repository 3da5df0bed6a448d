//! Routing decisions
//!
//! The transition function of the retry/fallback state machine. Pure: it
//! reads the attempt counters and the latest outcome, returns the next
//! action, and mutates nothing.

use super::state::{AttemptState, StepOutcome};
use serde::{Deserialize, Serialize};

/// Next workflow action after an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouteDecision {
    Retry,
    Accept,
    Fallback,
    GiveUp,
}

pub struct RouteDecider;

impl RouteDecider {
    /// Decide the next action from the counters and the latest outcome.
    ///
    /// An absent outcome means the execution step produced nothing yet and
    /// the only sensible move is another attempt. The fallback branch fires
    /// exactly once per run; once `fallback_attempted` is set and retries
    /// are exhausted again, the run is over.
    pub fn decide(
        state: &AttemptState,
        outcome: Option<&StepOutcome>,
        max_retries: u32,
    ) -> RouteDecision {
        let outcome = match outcome {
            Some(outcome) => outcome,
            None => return RouteDecision::Retry,
        };

        if !outcome.is_failure() {
            return RouteDecision::Accept;
        }

        if state.retry_count < max_retries {
            RouteDecision::Retry
        } else if !state.fallback_attempted {
            RouteDecision::Fallback
        } else {
            RouteDecision::GiveUp
        }
    }
}
