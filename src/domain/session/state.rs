use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::clinical::PatientRef;
use crate::domain::llm::Message;
use crate::domain::DomainError;

/// Maximum length for thread identifiers
pub const MAX_THREAD_ID_LENGTH: usize = 64;

static THREAD_ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9-]*[a-zA-Z0-9]$|^[a-zA-Z0-9]$").unwrap());

/// Validated conversation-thread identifier: one persistent multi-turn
/// session is keyed by one stable `ThreadId`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ThreadId(String);

impl ThreadId {
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();

        if id.is_empty() {
            return Err(DomainError::invalid_id("Thread ID cannot be empty"));
        }

        if id.len() > MAX_THREAD_ID_LENGTH {
            return Err(DomainError::invalid_id(format!(
                "Thread ID exceeds maximum length of {} characters",
                MAX_THREAD_ID_LENGTH
            )));
        }

        if !THREAD_ID_PATTERN.is_match(&id) {
            return Err(DomainError::invalid_id(format!(
                "Invalid thread ID '{}': must be alphanumeric with hyphens, start and end with alphanumeric",
                id
            )));
        }

        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ThreadId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ThreadId> for String {
    fn from(id: ThreadId) -> Self {
        id.0
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Workflow progress within the current top-level intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum WorkflowStatus {
    #[default]
    #[serde(rename = "STARTED")]
    Started,
    #[serde(rename = "WIP")]
    Wip,
    #[serde(rename = "COMPLETED")]
    Completed,
}

/// Top-level conversational intent, inferred only by the conversation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Appointment,
    OrderMedicine,
    Reminder,
    GeneralAdvise,
    #[default]
    #[serde(other)]
    None,
}

/// Routing branch derived from the intent; never user-facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Appointment,
    OrderMedicine,
    Reminder,
    #[default]
    None,
}

impl From<Intent> for Route {
    fn from(intent: Intent) -> Self {
        match intent {
            Intent::Appointment => Route::Appointment,
            Intent::OrderMedicine => Route::OrderMedicine,
            Intent::Reminder => Route::Reminder,
            Intent::GeneralAdvise | Intent::None => Route::None,
        }
    }
}

/// Slot fields that accumulate instead of being replaced on merge.
const ADDITIVE_FIELDS: &[&str] = &["symptoms"];

/// Extracted slot values, keyed by slot name. Accumulates across turns;
/// additive fields (symptoms) merge as an ordered token union and are never
/// cleared.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityMap(Map<String, Value>);

impl EntityMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// String view of a slot; numbers are rendered, null/absent is `None`.
    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.0.get(key)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Whether a slot is present with a usable (non-null, non-blank) value.
    pub fn has(&self, key: &str) -> bool {
        self.get_str(key).is_some()
    }

    /// Required slots absent from the map, in the order given.
    pub fn missing_fields(&self, required: &[&str]) -> Vec<String> {
        required
            .iter()
            .filter(|field| !self.has(field))
            .map(|field| field.to_string())
            .collect()
    }

    /// Merge incoming slots over the existing ones. Non-additive fields are
    /// replaced; additive fields union their comma-separated tokens so the
    /// merged value is always a superset of the previous one.
    pub fn merge(&mut self, incoming: EntityMap) {
        for (key, value) in incoming.0 {
            if value.is_null() {
                // Null never erases an accumulated slot.
                continue;
            }

            if ADDITIVE_FIELDS.contains(&key.as_str()) {
                let merged = match self.0.get(&key) {
                    Some(existing) => merge_additive(existing, &value),
                    None => value,
                };
                self.0.insert(key, merged);
            } else {
                self.0.insert(key, value);
            }
        }
    }
}

/// Ordered token union over comma-separated string values.
fn merge_additive(existing: &Value, incoming: &Value) -> Value {
    let mut tokens: Vec<String> = Vec::new();

    for value in [existing, incoming] {
        match value {
            Value::String(s) => {
                for token in s.split(',') {
                    let token = token.trim();
                    if !token.is_empty() && !tokens.iter().any(|t| t.eq_ignore_ascii_case(token)) {
                        tokens.push(token.to_string());
                    }
                }
            }
            Value::Array(items) => {
                for item in items {
                    if let Value::String(s) = item {
                        let token = s.trim();
                        if !token.is_empty()
                            && !tokens.iter().any(|t| t.eq_ignore_ascii_case(token))
                        {
                            tokens.push(token.to_string());
                        }
                    }
                }
            }
            _ => {}
        }
    }

    Value::String(tokens.join(", "))
}

/// Appointment slots normalized by the intake step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppointmentDraft {
    pub patient: PatientRef,
    pub patient_name: String,
    pub symptoms: Option<String>,
    pub preferred_doctor_name: Option<String>,
    pub preferred_specialty: Option<String>,
    pub preferred_date: String,
    pub preferred_time: Option<String>,
    pub preferred_day: String,
}

/// Medicine-order slots normalized on the pharmacy path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicineDraft {
    pub medicine: Option<String>,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub duration: Option<String>,
    pub quantity: Option<String>,
    pub shipping_address: Option<String>,
}

/// Prior medical history surfaced by the context step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientContext {
    pub previous_conditions: Vec<String>,
}

/// Appointment slots as confirmed by the user, assembled by the validation
/// step from the intake draft plus the confirmed slot values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppointmentDetails {
    pub patient: PatientRef,
    pub patient_name: Option<String>,
    pub symptoms: Option<String>,
    pub doctor_id: Option<i64>,
    pub doctor_name: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub day: Option<String>,
}

impl AppointmentDetails {
    /// Required fields: patient name, symptoms, doctor id, date, time.
    pub fn missing_required(&self) -> Vec<String> {
        let mut missing = Vec::new();

        if !has_text(&self.patient_name) {
            missing.push("patient_name".to_string());
        }
        if !has_text(&self.symptoms) {
            missing.push("symptoms".to_string());
        }
        if self.doctor_id.is_none() {
            missing.push("doctor_id".to_string());
        }
        if !has_text(&self.date) {
            missing.push("date".to_string());
        }
        if !has_text(&self.time) {
            missing.push("time".to_string());
        }

        missing
    }
}

fn has_text(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|s| !s.trim().is_empty())
}

/// Persisted medicine order, kept for the reminder step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationSummary {
    pub medicine: Option<String>,
    pub dosage: Option<String>,
    pub quantity: Option<String>,
    pub frequency: Option<String>,
    pub duration: Option<String>,
    pub shipping_address: Option<String>,
}

/// Dispatched reminder, with the synthesized or verbatim text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderRecord {
    pub start_date: Option<String>,
    pub time: Option<String>,
    pub frequency: Option<String>,
    pub duration: Option<String>,
    pub repeating: bool,
    pub reminder_text: String,
}

/// The single mutable record threaded through every step of one conversation
/// thread. Mutated exclusively through [`SessionState::apply`].
///
/// [`SessionState::apply`]: crate::domain::session::SessionState::apply
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub workflow_status: WorkflowStatus,
    /// Append-only; never reordered or pruned.
    pub messages: Vec<Message>,
    pub intent: Intent,
    pub extracted_entities: EntityMap,
    pub ready_for_routing: bool,
    pub route: Route,
    pub appointment_draft: Option<AppointmentDraft>,
    pub medicine_draft: Option<MedicineDraft>,
    pub context: Option<PatientContext>,
    pub triage_confirmed: bool,
    pub is_valid: bool,
    pub validation_errors: Option<String>,
    pub appointment_confirmed: bool,
    pub appointment_details: Option<AppointmentDetails>,
    pub medication_summary: Option<MedicationSummary>,
    pub reminders: Option<ReminderRecord>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            workflow_status: WorkflowStatus::Started,
            messages: Vec::new(),
            intent: Intent::None,
            extracted_entities: EntityMap::new(),
            ready_for_routing: false,
            route: Route::None,
            appointment_draft: None,
            medicine_draft: None,
            context: None,
            triage_confirmed: false,
            is_valid: false,
            validation_errors: None,
            appointment_confirmed: false,
            appointment_details: None,
            medication_summary: None,
            reminders: None,
        }
    }

    pub fn push_user_message(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content));
    }

    /// Reset every intent-scoped field when a new top-level intent begins
    /// mid-thread. Messages and accumulated entities are preserved.
    pub fn begin_intent(&mut self, intent: Intent) {
        self.intent = intent;
        self.workflow_status = WorkflowStatus::Wip;
        self.ready_for_routing = false;
        self.route = Route::None;
        self.appointment_draft = None;
        self.medicine_draft = None;
        self.context = None;
        self.triage_confirmed = false;
        self.is_valid = false;
        self.validation_errors = None;
        self.appointment_confirmed = false;
        self.appointment_details = None;
        self.medication_summary = None;
        self.reminders = None;
    }

    /// Assistant replies appended after the given message index.
    pub fn assistant_replies_since(&self, index: usize) -> Vec<String> {
        self.messages[index.min(self.messages.len())..]
            .iter()
            .filter(|m| m.is_assistant() && !m.content.is_empty())
            .map(|m| m.content.clone())
            .collect()
    }
}
