//! Reminder step: synthesizes the reminder text for whatever just completed
//! and dispatches it. Delivery failures never fail the turn.

use tracing::warn;

use crate::domain::clinical::Notifier;
use crate::domain::llm::Message;
use crate::domain::session::{ReminderRecord, SessionState, StateUpdate, WorkflowStatus};
use crate::domain::workflow::WorkflowError;

pub async fn run(
    notifier: &dyn Notifier,
    state: &SessionState,
) -> Result<StateUpdate, WorkflowError> {
    let text = reminder_text(state)?;

    if let Err(error) = notifier.send(&text).await {
        warn!(%error, "Reminder delivery failed; continuing");
    }

    let entities = &state.extracted_entities;
    let frequency = entities.get_str("frequency");

    let record = ReminderRecord {
        start_date: entities.get_str("start_date"),
        time: entities.get_str("time"),
        repeating: frequency.is_some(),
        frequency,
        duration: entities.get_str("duration"),
        reminder_text: text.clone(),
    };

    Ok(StateUpdate::new()
        .with_reminders(record)
        .with_message(Message::assistant(text))
        .with_status(WorkflowStatus::Completed))
}

/// Text selection follows what this turn accomplished: a fresh booking wins
/// over a fresh order, and a standalone reminder intent uses the user's own
/// text verbatim.
fn reminder_text(state: &SessionState) -> Result<String, WorkflowError> {
    if state.appointment_confirmed {
        if let Some(details) = &state.appointment_details {
            let doctor_name = details.doctor_name.as_deref().unwrap_or("your doctor");
            let date = details.date.as_deref().unwrap_or("the scheduled date");
            let time = details.time.as_deref().unwrap_or("the scheduled time");
            return Ok(format!(
                "Appointment Reminder: Your appointment is scheduled with {} on {} at {}. \
                 Please come 15 minutes early.",
                doctor_name, date, time
            ));
        }
    }

    if let Some(summary) = &state.medication_summary {
        let medicine = summary.medicine.as_deref().unwrap_or("your medicine");
        let dosage = summary.dosage.as_deref().unwrap_or_default();
        let mut text = format!("Medication Reminder: Take {} {}", medicine, dosage);
        if let Some(frequency) = summary.frequency.as_deref() {
            text.push(' ');
            text.push_str(frequency);
        }
        text.push_str(" as per the prescribed schedule.");
        return Ok(text);
    }

    state
        .extracted_entities
        .get_str("reminder_text")
        .ok_or_else(|| {
            WorkflowError::missing_precondition(
                "What should the reminder say? Please give me the reminder text.",
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clinical::notify_mock::MockNotifier;
    use crate::domain::clinical::PatientRef;
    use crate::domain::session::{AppointmentDetails, MedicationSummary};
    use serde_json::json;

    #[tokio::test]
    async fn test_appointment_reminder_text() {
        let notifier = MockNotifier::new();
        let mut state = SessionState::new();
        state.appointment_confirmed = true;
        state.appointment_details = Some(AppointmentDetails {
            patient: PatientRef::new(7),
            patient_name: Some("Asha".to_string()),
            symptoms: Some("chest pain".to_string()),
            doctor_id: Some(3),
            doctor_name: Some("Dr. Menon".to_string()),
            date: Some("15-Feb-26".to_string()),
            time: Some("10:00".to_string()),
            day: Some("Sunday".to_string()),
        });

        let update = run(&notifier, &state).await.unwrap();

        let expected = "Appointment Reminder: Your appointment is scheduled with Dr. Menon \
                        on 15-Feb-26 at 10:00. Please come 15 minutes early.";
        assert_eq!(update.reminders.as_ref().unwrap().reminder_text, expected);
        assert_eq!(notifier.sent(), vec![expected.to_string()]);
        assert_eq!(update.messages[0].content, expected);
    }

    #[tokio::test]
    async fn test_medication_reminder_text_with_frequency() {
        let notifier = MockNotifier::new();
        let mut state = SessionState::new();
        state.medication_summary = Some(MedicationSummary {
            medicine: Some("Metformin".to_string()),
            dosage: Some("500mg".to_string()),
            quantity: Some("60".to_string()),
            frequency: Some("twice daily".to_string()),
            duration: None,
            shipping_address: Some("12 Lake Road".to_string()),
        });

        let update = run(&notifier, &state).await.unwrap();

        assert_eq!(
            update.reminders.unwrap().reminder_text,
            "Medication Reminder: Take Metformin 500mg twice daily as per the prescribed schedule."
        );
    }

    #[tokio::test]
    async fn test_standalone_reminder_uses_text_verbatim() {
        let notifier = MockNotifier::new();
        let mut state = SessionState::new();
        state
            .extracted_entities
            .insert("reminder_text", json!("Take the evening insulin dose"));
        state.extracted_entities.insert("time", json!("21:00"));
        state
            .extracted_entities
            .insert("frequency", json!("daily"));

        let update = run(&notifier, &state).await.unwrap();

        let record = update.reminders.unwrap();
        assert_eq!(record.reminder_text, "Take the evening insulin dose");
        assert!(record.repeating);
        assert_eq!(record.time.as_deref(), Some("21:00"));
    }

    #[tokio::test]
    async fn test_delivery_failure_does_not_fail_the_step() {
        let notifier = MockNotifier::failing();
        let mut state = SessionState::new();
        state
            .extracted_entities
            .insert("reminder_text", json!("Drink water"));

        let update = run(&notifier, &state).await.unwrap();
        assert_eq!(update.workflow_status, Some(WorkflowStatus::Completed));
        assert!(notifier.sent().is_empty());
    }
}
