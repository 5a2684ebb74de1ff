use thiserror::Error;

use crate::domain::DomainError;

/// Step-level failures raised while processing one turn.
///
/// Recoverable errors leave the session intact and surface a generic retry
/// reply; fatal ones carry a specific user-facing reply and end the turn with
/// the workflow still in progress.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The model answered outside the expected envelope. Recoverable: the
    /// user can simply rephrase.
    #[error("Malformed model output: {0}")]
    MalformedModelOutput(String),

    /// A step was entered without the state it needs (for example intake
    /// without a parseable preferred date).
    #[error("Missing precondition: {reply}")]
    MissingPrecondition { reply: String },

    /// The reasoning step kept requesting tools past the round cap.
    #[error("Tool loop exceeded {max_rounds} rounds")]
    ToolLoopExceeded { max_rounds: u32 },

    /// An external call outlived its deadline.
    #[error("Call to {target} timed out")]
    Timeout { target: &'static str },

    #[error("Gateway error: {0}")]
    Gateway(#[source] DomainError),

    #[error("Tool error: {0}")]
    Tool(#[source] DomainError),

    #[error("Persistence error: {0}")]
    Persistence(#[source] DomainError),
}

impl WorkflowError {
    pub fn missing_precondition(reply: impl Into<String>) -> Self {
        Self::MissingPrecondition {
            reply: reply.into(),
        }
    }

    /// Whether the turn can be retried verbatim by the user without any
    /// state repair.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::MalformedModelOutput(_)
                | Self::Timeout { .. }
                | Self::Gateway(_)
                | Self::Tool(_)
        )
    }

    /// The reply shown to the user when this error ends the turn.
    pub fn user_reply(&self) -> String {
        match self {
            Self::MissingPrecondition { reply } => reply.clone(),
            Self::Persistence(_) => {
                "We could not complete your request due to a system issue. \
                 Nothing has been booked or ordered. Please try again."
                    .to_string()
            }
            Self::ToolLoopExceeded { .. } => {
                "I could not finish looking that up. Could you rephrase or try again?".to_string()
            }
            _ => "Sorry, something went wrong on my side. Could you say that again?".to_string(),
        }
    }
}
