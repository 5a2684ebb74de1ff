use std::fmt;

/// The steps of the clinical dialogue workflow. The engine walks these via
/// the routing predicates; `Start` and `End` are markers, never executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowNode {
    Start,
    Conversation,
    Router,
    AppointmentIntake,
    Context,
    Triage,
    ToolLoop,
    AppointmentValidation,
    MedicineValidation,
    ReminderValidation,
    Scheduling,
    Pharmacy,
    Reminder,
    End,
}

impl WorkflowNode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Conversation => "conversation",
            Self::Router => "router",
            Self::AppointmentIntake => "appointment_intake",
            Self::Context => "context",
            Self::Triage => "triage",
            Self::ToolLoop => "tool_loop",
            Self::AppointmentValidation => "appointment_validation",
            Self::MedicineValidation => "medicine_validation",
            Self::ReminderValidation => "reminder_validation",
            Self::Scheduling => "scheduling",
            Self::Pharmacy => "pharmacy",
            Self::Reminder => "reminder",
            Self::End => "end",
        }
    }
}

impl fmt::Display for WorkflowNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
