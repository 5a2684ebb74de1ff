//! Pharmacy step: the only place a medicine order is persisted.

use tracing::info;

use crate::domain::clinical::{BookingStore, OrderRequest};
use crate::domain::llm::Message;
use crate::domain::session::{MedicationSummary, SessionState, StateUpdate, WorkflowStatus};
use crate::domain::workflow::WorkflowError;

pub async fn run(
    booking: &dyn BookingStore,
    state: &SessionState,
) -> Result<StateUpdate, WorkflowError> {
    let draft = state.medicine_draft.as_ref().ok_or_else(|| {
        WorkflowError::missing_precondition("Let's start over with your order details, please.")
    })?;

    let (medicine, dosage, quantity, shipping_address) = match (
        draft.medicine.as_deref(),
        draft.dosage.as_deref(),
        draft.quantity.as_deref(),
        draft.shipping_address.as_deref(),
    ) {
        (Some(medicine), Some(dosage), Some(quantity), Some(address)) => {
            (medicine, dosage, quantity, address)
        }
        _ => {
            return Err(WorkflowError::missing_precondition(
                "Some order details are missing. Could you go over them again?",
            ));
        }
    };

    let receipt = booking
        .persist_medicine_order(OrderRequest {
            medicine: medicine.to_string(),
            dosage: dosage.to_string(),
            quantity: quantity.to_string(),
            shipping_address: shipping_address.to_string(),
        })
        .await
        .map_err(WorkflowError::Persistence)?;

    info!(order_id = receipt.order_id, medicine, "Medicine order persisted");

    Ok(StateUpdate::new()
        .with_message(Message::assistant(format!(
            "Your order is confirmed. Order ID ORR-000{}.",
            receipt.order_id
        )))
        .with_status(WorkflowStatus::Completed)
        .with_medication_summary(MedicationSummary {
            medicine: draft.medicine.clone(),
            dosage: draft.dosage.clone(),
            quantity: draft.quantity.clone(),
            frequency: draft.frequency.clone(),
            duration: draft.duration.clone(),
            shipping_address: draft.shipping_address.clone(),
        }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clinical::booking_mock::MockBookingStore;
    use crate::domain::session::MedicineDraft;

    fn state_with_draft() -> SessionState {
        let mut state = SessionState::new();
        state.is_valid = true;
        state.medicine_draft = Some(MedicineDraft {
            medicine: Some("Metformin".to_string()),
            dosage: Some("500mg".to_string()),
            frequency: Some("twice daily".to_string()),
            duration: Some("30 days".to_string()),
            quantity: Some("60".to_string()),
            shipping_address: Some("12 Lake Road".to_string()),
        });
        state
    }

    #[tokio::test]
    async fn test_successful_order() {
        let booking = MockBookingStore::new();
        let state = state_with_draft();

        let update = run(&booking, &state).await.unwrap();

        assert_eq!(
            update.messages[0].content,
            "Your order is confirmed. Order ID ORR-0001."
        );
        assert_eq!(update.workflow_status, Some(WorkflowStatus::Completed));
        let summary = update.medication_summary.unwrap();
        assert_eq!(summary.medicine.as_deref(), Some("Metformin"));
        assert_eq!(booking.orders().len(), 1);
    }

    #[tokio::test]
    async fn test_persistence_failure_keeps_order_unplaced() {
        let booking = MockBookingStore::new().with_failure("db down");
        let state = state_with_draft();

        let err = run(&booking, &state).await.unwrap_err();
        assert!(matches!(err, WorkflowError::Persistence(_)));
        assert!(booking.orders().is_empty());
    }

    #[tokio::test]
    async fn test_missing_draft_field_is_refused() {
        let booking = MockBookingStore::new();
        let mut state = state_with_draft();
        state.medicine_draft.as_mut().unwrap().shipping_address = None;

        let err = run(&booking, &state).await.unwrap_err();
        assert!(matches!(err, WorkflowError::MissingPrecondition { .. }));
        assert!(booking.orders().is_empty());
    }
}
