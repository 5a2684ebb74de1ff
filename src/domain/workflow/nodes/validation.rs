//! Validation gates. The appointment gate extracts the user's confirmation
//! through the validation model configuration; the medicine and reminder
//! gates are deterministic slot checks over the accumulated entities.

use tracing::debug;

use crate::domain::clinical::calendar;
use crate::domain::llm::{ConfirmationReply, GatewayMode, GatewayReply, Message, ModelGateway};
use crate::domain::session::{
    AppointmentDetails, MedicineDraft, SessionState, StateUpdate,
};
use crate::domain::workflow::{prompts, WorkflowError};

const MEDICINE_REQUIRED: &[&str] = &["medicine", "dosage", "quantity", "shipping_address"];
const REMINDER_REQUIRED: &[&str] = &["start_date", "time", "reminder_text"];

/// Appointment gate: ask the validation configuration whether the user
/// confirmed a concrete slot, then check the assembled details for
/// completeness. Booking stays unreachable until both pass.
pub async fn run_appointment(
    gateway: &dyn ModelGateway,
    state: &SessionState,
) -> Result<StateUpdate, WorkflowError> {
    let draft = state.appointment_draft.as_ref().ok_or_else(|| {
        WorkflowError::missing_precondition(
            "Let's start over with your appointment details, please.",
        )
    })?;

    let instruction = prompts::confirmation_instruction(&calendar::current_date_stamp());

    let reply = gateway
        .invoke(GatewayMode::Validation, &instruction, &state.messages)
        .await
        .map_err(WorkflowError::Gateway)?;

    let text = match reply {
        GatewayReply::Text(text) => text,
        GatewayReply::ToolCalls(_) => {
            return Err(WorkflowError::MalformedModelOutput(
                "Validation step answered with tool calls".to_string(),
            ));
        }
    };

    let confirmation = ConfirmationReply::parse(&text)
        .map_err(|e| WorkflowError::MalformedModelOutput(e.to_string()))?;

    if !confirmation.confirmed_by_user {
        debug!("Appointment validation: user has not confirmed a slot");
        return Ok(StateUpdate::new()
            .with_triage_confirmed(false)
            .with_is_valid(false));
    }

    let details = AppointmentDetails {
        patient: draft.patient,
        patient_name: Some(draft.patient_name.clone()),
        symptoms: draft.symptoms.clone(),
        doctor_id: confirmation.doctor_id,
        doctor_name: confirmation.doctor_name,
        date: confirmation.date.or_else(|| Some(draft.preferred_date.clone())),
        time: confirmation.time,
        day: confirmation.day.or_else(|| Some(draft.preferred_day.clone())),
    };

    let missing = details.missing_required();
    if !missing.is_empty() {
        let listed = missing.join(", ");
        debug!(missing = %listed, "Appointment validation incomplete");
        return Ok(StateUpdate::new()
            .with_triage_confirmed(true)
            .with_is_valid(false)
            .with_appointment_details(details)
            .with_validation_errors(format!("Missing fields: [{}]", listed))
            .with_message(Message::assistant(format!(
                "I could not verify all appointment details yet. Missing fields: [{}]. \
                 Could you provide them?",
                listed
            ))));
    }

    Ok(StateUpdate::new()
        .with_triage_confirmed(true)
        .with_is_valid(true)
        .with_cleared_validation_errors()
        .with_appointment_details(details))
}

/// Medicine gate: purely deterministic completeness check.
pub fn run_medicine(state: &SessionState) -> StateUpdate {
    let entities = &state.extracted_entities;
    let missing = entities.missing_fields(MEDICINE_REQUIRED);

    if !missing.is_empty() {
        let listed = missing.join(", ");
        return StateUpdate::new()
            .with_is_valid(false)
            .with_validation_errors(format!("Missing fields: [{}]", listed))
            .with_message(Message::assistant(format!(
                "To place the order I still need: {}.",
                listed
            )));
    }

    let draft = MedicineDraft {
        medicine: entities.get_str("medicine"),
        dosage: entities.get_str("dosage"),
        frequency: entities.get_str("frequency"),
        duration: entities.get_str("duration"),
        quantity: entities.get_str("quantity"),
        shipping_address: entities.get_str("shipping_address"),
    };

    StateUpdate::new()
        .with_is_valid(true)
        .with_cleared_validation_errors()
        .with_medicine_draft(draft)
}

/// Reminder gate: deterministic completeness check for standalone reminders.
pub fn run_reminder(state: &SessionState) -> StateUpdate {
    let missing = state.extracted_entities.missing_fields(REMINDER_REQUIRED);

    if !missing.is_empty() {
        let listed = missing.join(", ");
        return StateUpdate::new()
            .with_is_valid(false)
            .with_validation_errors(format!("Missing fields: [{}]", listed))
            .with_message(Message::assistant(format!(
                "To set the reminder I still need: {}.",
                listed
            )));
    }

    StateUpdate::new()
        .with_is_valid(true)
        .with_cleared_validation_errors()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clinical::PatientRef;
    use crate::domain::llm::mock::MockModelGateway;
    use crate::domain::session::AppointmentDraft;
    use serde_json::json;

    fn state_with_draft() -> SessionState {
        let mut state = SessionState::new();
        state.push_user_message("Yes, book Dr. Menon at 10:00");
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
    async fn test_confirmed_complete_slot_passes_the_gate() {
        let gateway = MockModelGateway::new().with_text(
            r#"{"reply":null,"doctor_id":3,"doctor_name":"Dr. Menon",
                "date":"15-Feb-26","time":"10:00","day":"Sunday",
                "confirmed_by_user":true}"#,
        );
        let state = state_with_draft();

        let update = run_appointment(&gateway, &state).await.unwrap();

        assert_eq!(update.triage_confirmed, Some(true));
        assert_eq!(update.is_valid, Some(true));
        assert_eq!(update.validation_errors, Some(None));
        let details = update.appointment_details.unwrap();
        assert_eq!(details.doctor_id, Some(3));
        assert_eq!(details.patient_name.as_deref(), Some("Asha"));
        assert_eq!(gateway.invocations(), vec![GatewayMode::Validation]);
    }

    #[tokio::test]
    async fn test_unconfirmed_slot_fails_both_flags() {
        let gateway = MockModelGateway::new().with_text(
            r#"{"reply":null,"doctor_id":null,"doctor_name":null,
                "date":null,"time":null,"day":null,"confirmed_by_user":false}"#,
        );
        let state = state_with_draft();

        let update = run_appointment(&gateway, &state).await.unwrap();

        assert_eq!(update.triage_confirmed, Some(false));
        assert_eq!(update.is_valid, Some(false));
        assert!(update.appointment_details.is_none());
    }

    #[tokio::test]
    async fn test_confirmed_but_incomplete_enumerates_missing_fields() {
        let gateway = MockModelGateway::new().with_text(
            r#"{"reply":null,"doctor_id":null,"doctor_name":"Dr. Menon",
                "date":"15-Feb-26","time":null,"day":"Sunday",
                "confirmed_by_user":true}"#,
        );
        let state = state_with_draft();

        let update = run_appointment(&gateway, &state).await.unwrap();

        assert_eq!(update.triage_confirmed, Some(true));
        assert_eq!(update.is_valid, Some(false));
        assert_eq!(
            update.validation_errors,
            Some(Some("Missing fields: [doctor_id, time]".to_string()))
        );
        assert!(update.messages[0]
            .content
            .contains("Missing fields: [doctor_id, time]"));
    }

    #[tokio::test]
    async fn test_malformed_confirmation_is_recoverable() {
        let gateway = MockModelGateway::new().with_text("I think they confirmed?");
        let state = state_with_draft();

        let err = run_appointment(&gateway, &state).await.unwrap_err();
        assert!(matches!(err, WorkflowError::MalformedModelOutput(_)));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_medicine_gate_passes_with_all_slots() {
        let mut state = SessionState::new();
        for (key, value) in [
            ("medicine", "Metformin"),
            ("dosage", "500mg"),
            ("quantity", "30"),
            ("shipping_address", "12 Lake Road"),
        ] {
            state.extracted_entities.insert(key, json!(value));
        }

        let update = run_medicine(&state);
        assert_eq!(update.is_valid, Some(true));
        let draft = update.medicine_draft.unwrap();
        assert_eq!(draft.medicine.as_deref(), Some("Metformin"));
        assert_eq!(draft.shipping_address.as_deref(), Some("12 Lake Road"));
    }

    #[test]
    fn test_medicine_gate_lists_missing_slots() {
        let mut state = SessionState::new();
        state.extracted_entities.insert("medicine", json!("Metformin"));

        let update = run_medicine(&state);
        assert_eq!(update.is_valid, Some(false));
        assert_eq!(
            update.validation_errors,
            Some(Some(
                "Missing fields: [dosage, quantity, shipping_address]".to_string()
            ))
        );
    }

    #[test]
    fn test_reminder_gate() {
        let mut state = SessionState::new();
        state.extracted_entities.insert("start_date", json!("16-Feb-26"));
        state.extracted_entities.insert("time", json!("21:00"));

        let update = run_reminder(&state);
        assert_eq!(update.is_valid, Some(false));

        state
            .extracted_entities
            .insert("reminder_text", json!("Take the evening dose"));
        let update = run_reminder(&state);
        assert_eq!(update.is_valid, Some(true));
    }
}
