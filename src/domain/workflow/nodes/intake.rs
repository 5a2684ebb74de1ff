//! Appointment intake: normalizes the extracted slots into a typed draft,
//! resolves the weekday deterministically and resolves the patient record.

use tracing::debug;

use crate::domain::clinical::{calendar, ClinicalDirectory};
use crate::domain::llm::Message;
use crate::domain::session::{AppointmentDraft, SessionState, StateUpdate};
use crate::domain::workflow::WorkflowError;

pub async fn run(
    directory: &dyn ClinicalDirectory,
    state: &SessionState,
) -> Result<StateUpdate, WorkflowError> {
    let entities = &state.extracted_entities;

    let patient_name = entities.get_str("patient_name").ok_or_else(|| {
        WorkflowError::missing_precondition("May I have the patient's full name, please?")
    })?;

    let preferred_date = entities.get_str("preferred_date").ok_or_else(|| {
        WorkflowError::missing_precondition(
            "Please share a preferred appointment date in the dd-Mon-yy format, for example 15-Feb-26.",
        )
    })?;

    // The weekday is computed here, never taken from the model.
    let preferred_day = calendar::weekday_for(&preferred_date).map_err(|_| {
        WorkflowError::missing_precondition(format!(
            "I could not read '{}' as a date. Please use the dd-Mon-yy format, for example 15-Feb-26.",
            preferred_date
        ))
    })?;

    let patient = directory
        .resolve_patient(&patient_name)
        .await
        .map_err(WorkflowError::Tool)?;

    debug!(
        patient_id = patient.as_i64(),
        date = %preferred_date,
        day = %preferred_day,
        "Appointment intake resolved draft"
    );

    let preferred_time = entities.get_str("preferred_time");
    let time_phrase = preferred_time.clone().unwrap_or_else(|| "any time".to_string());

    let draft = AppointmentDraft {
        patient,
        patient_name,
        symptoms: entities.get_str("symptoms"),
        preferred_doctor_name: entities.get_str("preferred_doctor_name"),
        preferred_specialty: entities.get_str("preferred_specialty"),
        preferred_date: preferred_date.clone(),
        preferred_time,
        preferred_day: preferred_day.clone(),
    };

    Ok(StateUpdate::new()
        .with_appointment_draft(draft)
        .with_message(Message::assistant(format!(
            "We are checking for doctor's availability on {}, {} around {}.",
            preferred_day, preferred_date, time_phrase
        ))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clinical::mock::MockClinicalDirectory;
    use crate::domain::clinical::PatientRef;
    use serde_json::json;

    fn state_with_entities(pairs: &[(&str, &str)]) -> SessionState {
        let mut state = SessionState::new();
        for (key, value) in pairs {
            state.extracted_entities.insert(*key, json!(value));
        }
        state
    }

    #[tokio::test]
    async fn test_builds_draft_and_announces_check() {
        let directory = MockClinicalDirectory::new().with_patient("Asha", 7);
        let state = state_with_entities(&[
            ("patient_name", "Asha"),
            ("symptoms", "fever, headache"),
            ("preferred_date", "15-Feb-26"),
            ("preferred_time", "10:00"),
        ]);

        let update = run(&directory, &state).await.unwrap();

        let draft = update.appointment_draft.unwrap();
        assert_eq!(draft.patient, PatientRef::new(7));
        assert_eq!(draft.preferred_day, "Sunday");
        assert_eq!(draft.symptoms.as_deref(), Some("fever, headache"));
        assert_eq!(
            update.messages[0].content,
            "We are checking for doctor's availability on Sunday, 15-Feb-26 around 10:00."
        );
    }

    #[tokio::test]
    async fn test_unknown_patient_keeps_sentinel() {
        let directory = MockClinicalDirectory::new();
        let state = state_with_entities(&[
            ("patient_name", "Brand New Patient"),
            ("preferred_date", "16-Feb-26"),
        ]);

        let update = run(&directory, &state).await.unwrap();
        assert!(update.appointment_draft.unwrap().patient.is_unresolved());
    }

    #[tokio::test]
    async fn test_missing_date_is_fatal_with_specific_reply() {
        let directory = MockClinicalDirectory::new();
        let state = state_with_entities(&[("patient_name", "Asha")]);

        let err = run(&directory, &state).await.unwrap_err();
        assert!(!err.is_recoverable());
        assert!(err.user_reply().contains("dd-Mon-yy"));
    }

    #[tokio::test]
    async fn test_unparseable_date_is_fatal() {
        let directory = MockClinicalDirectory::new();
        let state = state_with_entities(&[
            ("patient_name", "Asha"),
            ("preferred_date", "next Tuesday"),
        ]);

        let err = run(&directory, &state).await.unwrap_err();
        assert!(err.user_reply().contains("next Tuesday"));
    }

    #[tokio::test]
    async fn test_time_defaults_to_any_time() {
        let directory = MockClinicalDirectory::new();
        let state = state_with_entities(&[
            ("patient_name", "Asha"),
            ("preferred_date", "16-Feb-26"),
        ]);

        let update = run(&directory, &state).await.unwrap();
        assert!(update.messages[0].content.ends_with("around any time."));
    }
}
