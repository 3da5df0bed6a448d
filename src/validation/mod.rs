//! Candidate-query validation
//!
//! Reference extraction, transient-name resolution and the ordered safety
//! checks that gate every generated query before execution.

pub mod input;
pub mod table_refs;
pub mod token_tree;
pub mod transient;
pub mod validator;

pub use input::*;
pub use table_refs::*;
pub use token_tree::*;
pub use transient::*;
pub use validator::*;
