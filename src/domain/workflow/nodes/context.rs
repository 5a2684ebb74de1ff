//! Context step: surfaces prior medical history for returning patients.

use tracing::debug;

use crate::domain::clinical::ClinicalDirectory;
use crate::domain::llm::Message;
use crate::domain::session::{PatientContext, SessionState, StateUpdate};
use crate::domain::workflow::WorkflowError;

pub async fn run(
    directory: &dyn ClinicalDirectory,
    state: &SessionState,
) -> Result<StateUpdate, WorkflowError> {
    let draft = state.appointment_draft.as_ref().ok_or_else(|| {
        WorkflowError::missing_precondition(
            "Let's start over with your appointment details, please.",
        )
    })?;

    // New patients have no history to look up.
    if draft.patient.is_unresolved() {
        return Ok(StateUpdate::new());
    }

    let previous_conditions = directory
        .symptom_history(draft.patient)
        .await
        .map_err(WorkflowError::Tool)?;

    if previous_conditions.is_empty() {
        return Ok(StateUpdate::new());
    }

    debug!(
        patient_id = draft.patient.as_i64(),
        conditions = previous_conditions.len(),
        "Context step found prior history"
    );

    let summary = join_natural(&previous_conditions);

    Ok(StateUpdate::new()
        .with_context(PatientContext {
            previous_conditions,
        })
        .with_message(Message::assistant(format!(
            "You have a past medical history of {}.",
            summary
        ))))
}

/// "a", "a and b", "a, b and c".
fn join_natural(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [only] => only.clone(),
        [rest @ .., last] => format!("{} and {}", rest.join(", "), last),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clinical::mock::MockClinicalDirectory;
    use crate::domain::clinical::PatientRef;
    use crate::domain::session::AppointmentDraft;

    fn state_with_patient(patient: PatientRef) -> SessionState {
        let mut state = SessionState::new();
        state.appointment_draft = Some(AppointmentDraft {
            patient,
            patient_name: "Asha".to_string(),
            symptoms: Some("fever".to_string()),
            preferred_doctor_name: None,
            preferred_specialty: None,
            preferred_date: "15-Feb-26".to_string(),
            preferred_time: None,
            preferred_day: "Sunday".to_string(),
        });
        state
    }

    #[tokio::test]
    async fn test_known_patient_history_is_announced() {
        let directory =
            MockClinicalDirectory::new().with_history(7, vec!["diabetes", "hypertension"]);
        let state = state_with_patient(PatientRef::new(7));

        let update = run(&directory, &state).await.unwrap();

        assert_eq!(
            update.messages[0].content,
            "You have a past medical history of diabetes and hypertension."
        );
        assert_eq!(
            update.context.unwrap().previous_conditions,
            vec!["diabetes", "hypertension"]
        );
    }

    #[tokio::test]
    async fn test_new_patient_is_skipped_without_lookup() {
        let directory = MockClinicalDirectory::new();
        let state = state_with_patient(PatientRef::UNRESOLVED);

        let update = run(&directory, &state).await.unwrap();
        assert!(update.messages.is_empty());
        assert!(update.context.is_none());
        assert!(directory.calls().is_empty());
    }

    #[tokio::test]
    async fn test_empty_history_is_silent() {
        let directory = MockClinicalDirectory::new();
        let state = state_with_patient(PatientRef::new(9));

        let update = run(&directory, &state).await.unwrap();
        assert!(update.messages.is_empty());
        assert!(update.context.is_none());
    }

    #[test]
    fn test_join_natural() {
        let one = vec!["asthma".to_string()];
        let three = vec![
            "asthma".to_string(),
            "diabetes".to_string(),
            "migraine".to_string(),
        ];
        assert_eq!(join_natural(&one), "asthma");
        assert_eq!(join_natural(&three), "asthma, diabetes and migraine");
    }
}
