//! Session state: the typed record shared by every workflow step, the
//! reducer that folds step updates into it, and the persistence seam.

mod repository;
mod state;
mod update;

pub use repository::SessionRepository;
pub use state::{
    AppointmentDetails, AppointmentDraft, EntityMap, Intent, MedicationSummary, MedicineDraft,
    PatientContext, ReminderRecord, Route, SessionState, ThreadId, WorkflowStatus,
    MAX_THREAD_ID_LENGTH,
};
pub use update::StateUpdate;

#[cfg(test)]
pub use repository::mock;
