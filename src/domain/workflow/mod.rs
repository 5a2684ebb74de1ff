//! The clinical dialogue workflow: node set, routing predicates, the
//! individual steps and the engine that walks them.

mod engine;
mod error;
mod node;
pub mod nodes;
pub mod prompts;
pub mod routing;

pub use engine::{ClinicalEngine, EngineConfig, TurnOutcome};
pub use error::WorkflowError;
pub use node::WorkflowNode;
