//! Model gateway contract and conversation message types.

mod gateway;
mod message;
mod reply;

pub use gateway::{GatewayMode, GatewayReply, ModelGateway};
pub use message::{Message, MessageRole};
pub use reply::{contains_commit_phrase, ConfirmationReply, ConversationReply};

#[cfg(test)]
pub use gateway::mock;
