//! Partial state updates produced by workflow steps.
//!
//! Steps never mutate [`SessionState`] directly; they return a
//! [`StateUpdate`] and the engine folds it in through
//! [`SessionState::apply`]. Absent fields leave the state untouched.

use crate::domain::llm::Message;
use crate::domain::session::{
    AppointmentDetails, AppointmentDraft, EntityMap, Intent, MedicationSummary, MedicineDraft,
    PatientContext, ReminderRecord, Route, SessionState, WorkflowStatus,
};

/// One step's contribution to the session. Built with the chained setters and
/// applied atomically.
#[derive(Debug, Clone, Default)]
pub struct StateUpdate {
    pub workflow_status: Option<WorkflowStatus>,
    /// Appended to the history, never replacing it.
    pub messages: Vec<Message>,
    pub intent: Option<Intent>,
    /// Merged over the accumulated entities (additive fields union).
    pub entities: Option<EntityMap>,
    pub ready_for_routing: Option<bool>,
    pub route: Option<Route>,
    pub appointment_draft: Option<AppointmentDraft>,
    pub medicine_draft: Option<MedicineDraft>,
    pub context: Option<PatientContext>,
    pub triage_confirmed: Option<bool>,
    pub is_valid: Option<bool>,
    /// Outer `Some` assigns; `Some(None)` clears recorded errors.
    pub validation_errors: Option<Option<String>>,
    pub appointment_confirmed: Option<bool>,
    pub appointment_details: Option<AppointmentDetails>,
    pub medication_summary: Option<MedicationSummary>,
    pub reminders: Option<ReminderRecord>,
}

impl StateUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: WorkflowStatus) -> Self {
        self.workflow_status = Some(status);
        self
    }

    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    pub fn with_messages(mut self, messages: impl IntoIterator<Item = Message>) -> Self {
        self.messages.extend(messages);
        self
    }

    pub fn with_intent(mut self, intent: Intent) -> Self {
        self.intent = Some(intent);
        self
    }

    pub fn with_entities(mut self, entities: EntityMap) -> Self {
        self.entities = Some(entities);
        self
    }

    pub fn with_ready_for_routing(mut self, ready: bool) -> Self {
        self.ready_for_routing = Some(ready);
        self
    }

    pub fn with_route(mut self, route: Route) -> Self {
        self.route = Some(route);
        self
    }

    pub fn with_appointment_draft(mut self, draft: AppointmentDraft) -> Self {
        self.appointment_draft = Some(draft);
        self
    }

    pub fn with_medicine_draft(mut self, draft: MedicineDraft) -> Self {
        self.medicine_draft = Some(draft);
        self
    }

    pub fn with_context(mut self, context: PatientContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_triage_confirmed(mut self, confirmed: bool) -> Self {
        self.triage_confirmed = Some(confirmed);
        self
    }

    pub fn with_is_valid(mut self, valid: bool) -> Self {
        self.is_valid = Some(valid);
        self
    }

    pub fn with_validation_errors(mut self, errors: impl Into<String>) -> Self {
        self.validation_errors = Some(Some(errors.into()));
        self
    }

    pub fn with_cleared_validation_errors(mut self) -> Self {
        self.validation_errors = Some(None);
        self
    }

    pub fn with_appointment_confirmed(mut self, confirmed: bool) -> Self {
        self.appointment_confirmed = Some(confirmed);
        self
    }

    pub fn with_appointment_details(mut self, details: AppointmentDetails) -> Self {
        self.appointment_details = Some(details);
        self
    }

    pub fn with_medication_summary(mut self, summary: MedicationSummary) -> Self {
        self.medication_summary = Some(summary);
        self
    }

    pub fn with_reminders(mut self, record: ReminderRecord) -> Self {
        self.reminders = Some(record);
        self
    }
}

impl SessionState {
    /// Fold one step's update into the state.
    pub fn apply(&mut self, update: StateUpdate) {
        if let Some(status) = update.workflow_status {
            self.workflow_status = status;
        }
        self.messages.extend(update.messages);
        if let Some(intent) = update.intent {
            self.intent = intent;
        }
        if let Some(entities) = update.entities {
            self.extracted_entities.merge(entities);
        }
        if let Some(ready) = update.ready_for_routing {
            self.ready_for_routing = ready;
        }
        if let Some(route) = update.route {
            self.route = route;
        }
        if let Some(draft) = update.appointment_draft {
            self.appointment_draft = Some(draft);
        }
        if let Some(draft) = update.medicine_draft {
            self.medicine_draft = Some(draft);
        }
        if let Some(context) = update.context {
            self.context = Some(context);
        }
        if let Some(confirmed) = update.triage_confirmed {
            self.triage_confirmed = confirmed;
        }
        if let Some(valid) = update.is_valid {
            self.is_valid = valid;
        }
        if let Some(errors) = update.validation_errors {
            self.validation_errors = errors;
        }
        if let Some(confirmed) = update.appointment_confirmed {
            self.appointment_confirmed = confirmed;
        }
        if let Some(details) = update.appointment_details {
            self.appointment_details = Some(details);
        }
        if let Some(summary) = update.medication_summary {
            self.medication_summary = Some(summary);
        }
        if let Some(record) = update.reminders {
            self.reminders = Some(record);
        }
    }
}
