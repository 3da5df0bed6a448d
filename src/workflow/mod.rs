//! Retry & fallback workflow
//!
//! Run-scoped state, the pure routing decision, error classification with
//! targeted feedback, and the async runner that sequences the external
//! collaborators.

pub mod error_feedback;
pub mod feedbacks;
pub mod routing;
pub mod runner;
pub mod state;

pub use error_feedback::*;
pub use feedbacks::*;
pub use routing::*;
pub use runner::*;
pub use state::*;
