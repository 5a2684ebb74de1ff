//! PostgreSQL implementation of the clinical directory and booking store.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::domain::clinical::{
    calendar, AppointmentRecord, BookingReceipt, BookingStore, ClinicalDirectory,
    DoctorAvailability, OrderReceipt, OrderRequest, PatientRef,
};
use crate::domain::DomainError;

/// Directory and schedule lookups return at most this many rows.
const LOOKUP_LIMIT: i64 = 5;

#[derive(Debug, Clone)]
pub struct PostgresClinicalStore {
    pool: PgPool,
}

impl PostgresClinicalStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClinicalDirectory for PostgresClinicalStore {
    async fn find_doctors_by_specialty(
        &self,
        specialty: &str,
    ) -> Result<Vec<DoctorAvailability>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT doctor_id, name, qualification, available_from, available_to, available_days
            FROM doctors
            WHERE LOWER(specialty) = LOWER($1) AND is_active
            ORDER BY available_from
            LIMIT $2
            "#,
        )
        .bind(specialty)
        .bind(LOOKUP_LIMIT)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to find doctors: {}", e)))?;

        rows.iter().map(|row| row_to_doctor(row, None)).collect()
    }

    async fn doctor_schedule(&self, name: &str) -> Result<Vec<DoctorAvailability>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT doctor_id, name, specialty, qualification,
                   available_from, available_to, available_days
            FROM doctors
            WHERE LOWER(name) LIKE $1 AND is_active
            ORDER BY available_from
            LIMIT $2
            "#,
        )
        .bind(format!("%{}%", name.to_lowercase()))
        .bind(LOOKUP_LIMIT)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get doctor schedule: {}", e)))?;

        rows.iter()
            .map(|row| {
                let specialty: Option<String> = row
                    .try_get("specialty")
                    .map_err(|e| DomainError::storage(format!("Failed to read row: {}", e)))?;
                row_to_doctor(row, specialty)
            })
            .collect()
    }

    async fn resolve_patient(&self, name: &str) -> Result<PatientRef, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT patient_id
            FROM patients
            WHERE LOWER(name) = LOWER($1)
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to resolve patient: {}", e)))?;

        match row {
            Some(row) => {
                let id: i64 = row
                    .try_get("patient_id")
                    .map_err(|e| DomainError::storage(format!("Failed to read row: {}", e)))?;
                Ok(PatientRef::new(id))
            }
            None => Ok(PatientRef::UNRESOLVED),
        }
    }

    async fn symptom_history(&self, patient: PatientRef) -> Result<Vec<String>, DomainError> {
        if patient.is_unresolved() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            r#"
            SELECT symptom
            FROM symptoms
            WHERE patient_id = $1
            ORDER BY recorded_at
            "#,
        )
        .bind(patient.as_i64())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to get symptom history: {}", e)))?;

        rows.iter()
            .map(|row| {
                row.try_get("symptom")
                    .map_err(|e| DomainError::storage(format!("Failed to read row: {}", e)))
            })
            .collect()
    }
}

#[async_trait]
impl BookingStore for PostgresClinicalStore {
    async fn persist_appointment(
        &self,
        record: AppointmentRecord,
    ) -> Result<BookingReceipt, DomainError> {
        let date = calendar::parse_date(&record.date)?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to begin transaction: {}", e)))?;

        // Unresolved patients are registered inside the same transaction.
        let patient_id = if record.patient.is_unresolved() {
            let row = sqlx::query(
                r#"
                INSERT INTO patients (name)
                VALUES ($1)
                RETURNING patient_id
                "#,
            )
            .bind(&record.patient_name)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to register patient: {}", e)))?;

            row.try_get::<i64, _>("patient_id")
                .map_err(|e| DomainError::storage(format!("Failed to read row: {}", e)))?
        } else {
            record.patient.as_i64()
        };

        let row = sqlx::query(
            r#"
            INSERT INTO appointments (patient_id, doctor_id, appointment_date, appointment_time)
            VALUES ($1, $2, $3, $4)
            RETURNING appointment_id
            "#,
        )
        .bind(patient_id)
        .bind(record.doctor_id)
        .bind(date)
        .bind(&record.time)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to book appointment: {}", e)))?;

        let appointment_id: i64 = row
            .try_get("appointment_id")
            .map_err(|e| DomainError::storage(format!("Failed to read row: {}", e)))?;

        for symptom in record.symptoms.split(',') {
            let symptom = symptom.trim();
            if symptom.is_empty() {
                continue;
            }
            sqlx::query(
                r#"
                INSERT INTO symptoms (patient_id, symptom)
                VALUES ($1, $2)
                "#,
            )
            .bind(patient_id)
            .bind(symptom)
            .execute(&mut *tx)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to record symptom: {}", e)))?;
        }

        tx.commit()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to commit booking: {}", e)))?;

        Ok(BookingReceipt { appointment_id })
    }

    async fn persist_medicine_order(
        &self,
        request: OrderRequest,
    ) -> Result<OrderReceipt, DomainError> {
        let row = sqlx::query(
            r#"
            INSERT INTO medicine_orders (medicine, dosage, quantity, shipping_address)
            VALUES ($1, $2, $3, $4)
            RETURNING order_id
            "#,
        )
        .bind(&request.medicine)
        .bind(&request.dosage)
        .bind(&request.quantity)
        .bind(&request.shipping_address)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to place order: {}", e)))?;

        let order_id: i64 = row
            .try_get("order_id")
            .map_err(|e| DomainError::storage(format!("Failed to read row: {}", e)))?;

        Ok(OrderReceipt { order_id })
    }
}

fn row_to_doctor(
    row: &sqlx::postgres::PgRow,
    specialty: Option<String>,
) -> Result<DoctorAvailability, DomainError> {
    let read = |e| DomainError::storage(format!("Failed to read row: {}", e));

    Ok(DoctorAvailability {
        doctor_id: row.try_get("doctor_id").map_err(read)?,
        name: row.try_get("name").map_err(read)?,
        specialty,
        qualification: row.try_get("qualification").map_err(read)?,
        available_from: row.try_get("available_from").map_err(read)?,
        available_to: row.try_get("available_to").map_err(read)?,
        available_days: row.try_get("available_days").map_err(read)?,
    })
}
