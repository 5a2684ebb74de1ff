//! Triage step: tool-augmented reasoning that proposes a concrete slot.

use tracing::debug;

use crate::domain::clinical::{calendar, ToolCallRequest};
use crate::domain::llm::{contains_commit_phrase, GatewayMode, GatewayReply, Message, ModelGateway};
use crate::domain::session::{SessionState, StateUpdate};
use crate::domain::workflow::{prompts, WorkflowError};

/// Result of one triage invocation: either a user-facing proposal or a batch
/// of tool calls for the engine's tool loop.
#[derive(Debug)]
pub struct TriageOutcome {
    pub update: StateUpdate,
    pub requested_tools: Option<Vec<ToolCallRequest>>,
}

pub async fn run(
    gateway: &dyn ModelGateway,
    state: &SessionState,
) -> Result<TriageOutcome, WorkflowError> {
    let draft = state.appointment_draft.as_ref().ok_or_else(|| {
        WorkflowError::missing_precondition(
            "Let's start over with your appointment details, please.",
        )
    })?;

    let instruction = prompts::triage_instruction(
        &calendar::current_date_stamp(),
        draft,
        state.context.as_ref(),
    );

    let reply = gateway
        .invoke(GatewayMode::Reasoning, &instruction, &state.messages)
        .await
        .map_err(WorkflowError::Gateway)?;

    match reply {
        GatewayReply::ToolCalls(calls) => {
            debug!(count = calls.len(), "Triage requested tool calls");
            Ok(TriageOutcome {
                update: StateUpdate::new()
                    .with_message(Message::assistant_tool_calls(calls.clone())),
                requested_tools: Some(calls),
            })
        }
        GatewayReply::Text(text) => {
            // The proposal must ask for confirmation, never claim a booking.
            if contains_commit_phrase(&text) {
                return Err(WorkflowError::MalformedModelOutput(
                    "Commit phrase before the side-effecting step".to_string(),
                ));
            }
            Ok(TriageOutcome {
                update: StateUpdate::new().with_message(Message::assistant(text)),
                requested_tools: None,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clinical::{PatientRef, ToolName};
    use crate::domain::llm::mock::MockModelGateway;
    use crate::domain::session::AppointmentDraft;
    use serde_json::json;

    fn triage_state() -> SessionState {
        let mut state = SessionState::new();
        state.push_user_message("I have chest pain, book me for 15-Feb-26");
        state.appointment_draft = Some(AppointmentDraft {
            patient: PatientRef::new(7),
            patient_name: "Asha".to_string(),
            symptoms: Some("chest pain".to_string()),
            preferred_doctor_name: None,
            preferred_specialty: None,
            preferred_date: "15-Feb-26".to_string(),
            preferred_time: Some("10:00".to_string()),
            preferred_day: "Sunday".to_string(),
        });
        state
    }

    #[tokio::test]
    async fn test_tool_request_is_surfaced_to_engine() {
        let call = ToolCallRequest::new(
            "call-1",
            ToolName::FindDoctorsBySpecialty,
            json!({"specialty": "Cardiology"}),
        );
        let gateway =
            MockModelGateway::new().with_reply(GatewayReply::ToolCalls(vec![call]));
        let state = triage_state();

        let outcome = run(&gateway, &state).await.unwrap();

        assert_eq!(outcome.requested_tools.as_ref().unwrap().len(), 1);
        assert!(outcome.update.messages[0].has_tool_calls());
        assert_eq!(gateway.invocations(), vec![GatewayMode::Reasoning]);
    }

    #[tokio::test]
    async fn test_text_proposal_flows_to_user() {
        let gateway = MockModelGateway::new()
            .with_text("Dr. Menon is available on Sunday at 10:00. Shall I proceed?");
        let state = triage_state();

        let outcome = run(&gateway, &state).await.unwrap();

        assert!(outcome.requested_tools.is_none());
        assert!(outcome.update.messages[0].content.contains("Dr. Menon"));
    }

    #[tokio::test]
    async fn test_premature_booking_claim_is_rejected() {
        let gateway = MockModelGateway::new()
            .with_text("Great news, your appointment is booked with Dr. Menon!");
        let state = triage_state();

        let err = run(&gateway, &state).await.unwrap_err();
        assert!(matches!(err, WorkflowError::MalformedModelOutput(_)));
    }

    #[tokio::test]
    async fn test_missing_draft_is_fatal() {
        let gateway = MockModelGateway::new().with_text("anything");
        let state = SessionState::new();

        let err = run(&gateway, &state).await.unwrap_err();
        assert!(!err.is_recoverable());
    }
}
