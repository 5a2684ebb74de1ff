use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use super::PatientRef;
use crate::domain::DomainError;

/// Everything the booking operation needs to persist an appointment.
///
/// `patient` may be the unresolved sentinel, in which case the store inserts a
/// new patient record under `patient_name` first, inside the same transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppointmentRecord {
    pub patient: PatientRef,
    pub patient_name: String,
    pub doctor_id: i64,
    pub symptoms: String,
    /// dd-Mon-yy, e.g. `15-Feb-26`.
    pub date: String,
    /// HH:mm.
    pub time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingReceipt {
    pub appointment_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    pub medicine: String,
    pub dosage: String,
    pub quantity: String,
    pub shipping_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub order_id: i64,
}

/// Write-side persistence for appointments and medicine orders. Each
/// operation is transactional: it either lands completely or not at all.
#[async_trait]
pub trait BookingStore: Send + Sync + Debug {
    async fn persist_appointment(
        &self,
        record: AppointmentRecord,
    ) -> Result<BookingReceipt, DomainError>;

    async fn persist_medicine_order(
        &self,
        request: OrderRequest,
    ) -> Result<OrderReceipt, DomainError>;
}
