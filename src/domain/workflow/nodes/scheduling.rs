//! Scheduling step: the only place an appointment is persisted.

use tracing::info;

use crate::domain::clinical::{AppointmentRecord, BookingStore};
use crate::domain::llm::Message;
use crate::domain::session::{SessionState, StateUpdate, WorkflowStatus};
use crate::domain::workflow::WorkflowError;

pub async fn run(
    booking: &dyn BookingStore,
    state: &SessionState,
) -> Result<StateUpdate, WorkflowError> {
    let details = state.appointment_details.as_ref().ok_or_else(|| {
        WorkflowError::missing_precondition(
            "Let's start over with your appointment details, please.",
        )
    })?;

    // Validation already enumerated missing fields; anything absent here
    // means the gate was bypassed, and we refuse rather than guess.
    let (patient_name, symptoms, doctor_id, date, time) = match (
        details.patient_name.as_deref(),
        details.symptoms.as_deref(),
        details.doctor_id,
        details.date.as_deref(),
        details.time.as_deref(),
    ) {
        (Some(name), Some(symptoms), Some(doctor_id), Some(date), Some(time)) => {
            (name, symptoms, doctor_id, date, time)
        }
        _ => {
            return Err(WorkflowError::missing_precondition(
                "Some appointment details are missing. Could you confirm the slot again?",
            ));
        }
    };

    let record = AppointmentRecord {
        patient: details.patient,
        patient_name: patient_name.to_string(),
        doctor_id,
        symptoms: symptoms.to_string(),
        date: date.to_string(),
        time: time.to_string(),
    };

    let receipt = booking
        .persist_appointment(record)
        .await
        .map_err(WorkflowError::Persistence)?;

    info!(
        appointment_id = receipt.appointment_id,
        doctor_id, "Appointment persisted"
    );

    let doctor_name = details.doctor_name.as_deref().unwrap_or("the doctor");

    Ok(StateUpdate::new()
        .with_message(Message::assistant(format!(
            "Your appointment with {} on {} at {} is confirmed. Appointment ID APT-00{}.",
            doctor_name, date, time, receipt.appointment_id
        )))
        .with_status(WorkflowStatus::Completed)
        .with_appointment_confirmed(true))
}
