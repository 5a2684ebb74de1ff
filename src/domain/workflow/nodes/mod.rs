//! The individual workflow steps. Each step reads the session state and the
//! seams it needs, and returns a [`StateUpdate`] for the engine to apply.
//!
//! [`StateUpdate`]: crate::domain::session::StateUpdate

pub mod context;
pub mod conversation;
pub mod intake;
pub mod pharmacy;
pub mod reminder;
pub mod scheduling;
pub mod triage;
pub mod validation;

pub use triage::TriageOutcome;
