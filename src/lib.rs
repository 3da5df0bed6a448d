pub mod config;
pub mod db;
pub mod error;
pub mod llm;
pub mod prompts;
pub mod schema;
pub mod validation;
pub mod workflow;

pub use error::{Result, WardenError};
pub use schema::AllowedTables;
pub use validation::validator::{validate, RejectionKind, ValidationOutcome};
pub use workflow::routing::{RouteDecider, RouteDecision};
pub use workflow::runner::{RunReport, WorkflowRunner};
pub use workflow::state::AttemptState;
