//! Domain layer: session state, workflow steps and the seams they depend on.

pub mod clinical;
pub mod error;
pub mod llm;
pub mod session;
pub mod workflow;

pub use error::DomainError;
pub use session::{SessionState, ThreadId, WorkflowStatus};
pub use workflow::{ClinicalEngine, EngineConfig, TurnOutcome};
