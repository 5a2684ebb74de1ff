use async_trait::async_trait;
use std::fmt::Debug;

use super::Message;
use crate::domain::clinical::ToolCallRequest;
use crate::domain::DomainError;

/// The three independent model configurations used by the workflow.
///
/// Same invocation contract everywhere; implementations differ only in
/// instruction handling, sampling temperature and expected output shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayMode {
    /// Free conversation that must answer with a JSON envelope.
    Conversation,
    /// Tool-augmented triage reasoning.
    Reasoning,
    /// Strict JSON-only validation/extraction.
    Validation,
}

impl GatewayMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Conversation => "conversation",
            Self::Reasoning => "reasoning",
            Self::Validation => "validation",
        }
    }
}

/// Outcome of one model invocation.
#[derive(Debug, Clone)]
pub enum GatewayReply {
    /// Plain (possibly JSON-encoded) assistant text.
    Text(String),
    /// The model asked for one or more domain tool invocations.
    ToolCalls(Vec<ToolCallRequest>),
}

impl GatewayReply {
    pub fn is_tool_calls(&self) -> bool {
        matches!(self, Self::ToolCalls(_))
    }
}

/// Opaque language-model invocation: system instruction plus conversation
/// history in, text or tool-call request out.
#[async_trait]
pub trait ModelGateway: Send + Sync + Debug {
    async fn invoke(
        &self,
        mode: GatewayMode,
        system_instruction: &str,
        history: &[Message],
    ) -> Result<GatewayReply, DomainError>;
}
