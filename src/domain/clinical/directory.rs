use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::domain::DomainError;

/// Resolved patient identifier. The zero sentinel means the patient is not in
/// the store yet - a new patient, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientRef(i64);

impl Default for PatientRef {
    fn default() -> Self {
        Self::UNRESOLVED
    }
}

impl PatientRef {
    pub const UNRESOLVED: PatientRef = PatientRef(0);

    pub fn new(id: i64) -> Self {
        Self(id)
    }

    pub fn is_unresolved(&self) -> bool {
        self.0 == 0
    }

    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

/// One doctor's availability row as surfaced to the triage step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorAvailability {
    pub doctor_id: i64,
    pub name: String,
    /// Present on schedule lookups; specialty searches already know it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialty: Option<String>,
    pub qualification: String,
    pub available_from: String,
    pub available_to: String,
    pub available_days: String,
}

/// Read-side clinical lookups backing the workflow.
#[async_trait]
pub trait ClinicalDirectory: Send + Sync + Debug {
    /// Active doctors of a specialty, earliest availability first, at most 5.
    async fn find_doctors_by_specialty(
        &self,
        specialty: &str,
    ) -> Result<Vec<DoctorAvailability>, DomainError>;

    /// Schedule rows for doctors whose name contains the given substring,
    /// case-insensitive, at most 5.
    async fn doctor_schedule(&self, name: &str) -> Result<Vec<DoctorAvailability>, DomainError>;

    /// Case-insensitive exact name match; `PatientRef::UNRESOLVED` when absent.
    async fn resolve_patient(&self, name: &str) -> Result<PatientRef, DomainError>;

    /// All recorded symptoms for a patient; empty for the unresolved sentinel.
    async fn symptom_history(&self, patient: PatientRef) -> Result<Vec<String>, DomainError>;
}
