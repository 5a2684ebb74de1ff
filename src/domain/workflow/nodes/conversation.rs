//! Conversation step: the only place intent and entities enter the state.

use tracing::debug;

use crate::domain::clinical::calendar;
use crate::domain::llm::{
    contains_commit_phrase, ConversationReply, GatewayMode, GatewayReply, Message, ModelGateway,
};
use crate::domain::session::{EntityMap, Intent, Route, SessionState, StateUpdate, WorkflowStatus};
use crate::domain::workflow::{prompts, WorkflowError};

pub async fn run(
    gateway: &dyn ModelGateway,
    state: &SessionState,
) -> Result<StateUpdate, WorkflowError> {
    let instruction = prompts::conversation_instruction(&calendar::current_date_stamp());

    let reply = gateway
        .invoke(GatewayMode::Conversation, &instruction, &state.messages)
        .await
        .map_err(WorkflowError::Gateway)?;

    let text = match reply {
        GatewayReply::Text(text) => text,
        GatewayReply::ToolCalls(_) => {
            return Err(WorkflowError::MalformedModelOutput(
                "Conversation step answered with tool calls".to_string(),
            ));
        }
    };

    let parsed = ConversationReply::parse(&text)
        .map_err(|e| WorkflowError::MalformedModelOutput(e.to_string()))?;

    // Persistence has not run yet, so a reply claiming a finalized booking or
    // order is treated exactly like unparseable output.
    if contains_commit_phrase(&parsed.reply) {
        return Err(WorkflowError::MalformedModelOutput(
            "Commit phrase before the side-effecting step".to_string(),
        ));
    }

    debug!(
        intent = ?parsed.intent,
        ready_for_routing = parsed.ready_for_routing,
        "Conversation step parsed reply"
    );

    let mut update = StateUpdate::new()
        .with_message(Message::assistant(&parsed.reply))
        .with_intent(parsed.intent)
        .with_entities(EntityMap::from_map(parsed.entities))
        .with_ready_for_routing(parsed.ready_for_routing)
        .with_route(Route::from(parsed.intent));

    if parsed.intent != Intent::None {
        update = update.with_status(WorkflowStatus::Wip);
    }

    Ok(update)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::llm::mock::MockModelGateway;

    fn state_with_user_turn(text: &str) -> SessionState {
        let mut state = SessionState::new();
        state.push_user_message(text);
        state
    }

    #[tokio::test]
    async fn test_extracts_intent_entities_and_reply() {
        let gateway = MockModelGateway::new().with_text(
            r#"{"reply":"What date works for you?","intent":"appointment",
                "entities":{"patient_name":"Asha","symptoms":"fever"},
                "ready_for_routing":false}"#,
        );
        let state = state_with_user_turn("I need to see a doctor, I'm Asha and I have a fever");

        let update = run(&gateway, &state).await.unwrap();

        assert_eq!(update.intent, Some(Intent::Appointment));
        assert_eq!(update.ready_for_routing, Some(false));
        assert_eq!(update.route, Some(Route::Appointment));
        assert_eq!(update.workflow_status, Some(WorkflowStatus::Wip));
        assert_eq!(update.messages.len(), 1);
        assert_eq!(update.messages[0].content, "What date works for you?");
        assert_eq!(gateway.invocations(), vec![GatewayMode::Conversation]);
    }

    #[tokio::test]
    async fn test_free_text_reply_is_recoverable() {
        let gateway = MockModelGateway::new().with_text("Sure, happy to help!");
        let state = state_with_user_turn("hi");

        let err = run(&gateway, &state).await.unwrap_err();
        assert!(matches!(err, WorkflowError::MalformedModelOutput(_)));
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn test_gateway_failure_is_recoverable() {
        let gateway = MockModelGateway::new().with_error("upstream 503");
        let state = state_with_user_turn("hi");

        let err = run(&gateway, &state).await.unwrap_err();
        assert!(matches!(err, WorkflowError::Gateway(_)));
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn test_commit_phrase_is_rejected() {
        let gateway = MockModelGateway::new().with_text(
            r#"{"reply":"Your appointment is booked for Monday!","intent":"appointment",
                "entities":{},"ready_for_routing":true}"#,
        );
        let state = state_with_user_turn("book it");

        let err = run(&gateway, &state).await.unwrap_err();
        assert!(matches!(err, WorkflowError::MalformedModelOutput(_)));
    }

    #[tokio::test]
    async fn test_small_talk_leaves_status_untouched() {
        let gateway = MockModelGateway::new().with_text(
            r#"{"reply":"Hello! How can I help?","intent":"none",
                "entities":{},"ready_for_routing":false}"#,
        );
        let state = state_with_user_turn("hello");

        let update = run(&gateway, &state).await.unwrap();
        assert_eq!(update.workflow_status, None);
        assert_eq!(update.route, Some(Route::None));
    }
}
