//! Pure routing predicates over the session state.
//!
//! Every conditional edge of the workflow lives here as a total function of
//! the state, so the step sequence is testable without any model or store.

use crate::domain::session::{Route, SessionState, WorkflowStatus};
use crate::domain::workflow::WorkflowNode;

/// Entry edge for a new user turn.
///
/// A turn lands directly in triage when an appointment flow is already
/// routed and still awaiting slot confirmation; everything else starts at
/// the conversation step.
pub fn entry_node(state: &SessionState) -> WorkflowNode {
    let triage_follow_up = state.ready_for_routing
        && state.workflow_status == WorkflowStatus::Wip
        && state.route == Route::Appointment
        && !state.triage_confirmed;

    if triage_follow_up {
        WorkflowNode::Triage
    } else {
        WorkflowNode::Conversation
    }
}

/// Conversation hands off to the router only once the model has marked the
/// slots complete; otherwise the turn ends with the clarifying reply.
pub fn after_conversation(state: &SessionState) -> WorkflowNode {
    if state.ready_for_routing {
        WorkflowNode::Router
    } else {
        WorkflowNode::End
    }
}

/// Dispatch on the routed intent. Appointment flows skip intake once triage
/// has already confirmed a slot; re-running the router never repeats
/// completed stages.
pub fn route_intent(state: &SessionState) -> WorkflowNode {
    match state.route {
        Route::Appointment => {
            if state.triage_confirmed {
                WorkflowNode::AppointmentValidation
            } else {
                WorkflowNode::AppointmentIntake
            }
        }
        Route::OrderMedicine => WorkflowNode::MedicineValidation,
        Route::Reminder => WorkflowNode::ReminderValidation,
        Route::None => WorkflowNode::End,
    }
}

/// After triage the model either asked for tools or produced a reply for the
/// user; a reply always flows through appointment validation.
pub fn after_triage(requested_tools: bool) -> WorkflowNode {
    if requested_tools {
        WorkflowNode::ToolLoop
    } else {
        WorkflowNode::AppointmentValidation
    }
}

/// The booking gate: persistence is reachable only when the user confirmed a
/// concrete slot and validation passed. Either flag alone is not enough.
pub fn after_appointment_validation(state: &SessionState) -> WorkflowNode {
    if state.triage_confirmed && state.is_valid {
        WorkflowNode::Scheduling
    } else {
        WorkflowNode::End
    }
}

pub fn after_medicine_validation(state: &SessionState) -> WorkflowNode {
    if state.is_valid {
        WorkflowNode::Pharmacy
    } else {
        WorkflowNode::End
    }
}

pub fn after_reminder_validation(state: &SessionState) -> WorkflowNode {
    if state.is_valid {
        WorkflowNode::Reminder
    } else {
        WorkflowNode::End
    }
}

/// After a successful booking or order the reminder step runs; a failed
/// scheduling step ends the turn instead (handled by the engine).
pub fn after_side_effect() -> WorkflowNode {
    WorkflowNode::Reminder
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::session::Intent;

    fn wip_appointment_state() -> SessionState {
        let mut state = SessionState::new();
        state.begin_intent(Intent::Appointment);
        state.route = Route::Appointment;
        state.ready_for_routing = true;
        state
    }

    #[test]
    fn test_entry_fresh_thread_starts_at_conversation() {
        let state = SessionState::new();
        assert_eq!(entry_node(&state), WorkflowNode::Conversation);
    }

    #[test]
    fn test_entry_triage_follow_up() {
        let state = wip_appointment_state();
        assert_eq!(entry_node(&state), WorkflowNode::Triage);
    }

    #[test]
    fn test_entry_confirmed_triage_goes_back_to_conversation() {
        let mut state = wip_appointment_state();
        state.triage_confirmed = true;
        assert_eq!(entry_node(&state), WorkflowNode::Conversation);
    }

    #[test]
    fn test_entry_medicine_flow_never_enters_triage() {
        let mut state = SessionState::new();
        state.begin_intent(Intent::OrderMedicine);
        state.route = Route::OrderMedicine;
        state.ready_for_routing = true;
        assert_eq!(entry_node(&state), WorkflowNode::Conversation);
    }

    #[test]
    fn test_conversation_holds_turn_until_ready() {
        let mut state = SessionState::new();
        assert_eq!(after_conversation(&state), WorkflowNode::End);

        state.ready_for_routing = true;
        assert_eq!(after_conversation(&state), WorkflowNode::Router);
    }

    #[test]
    fn test_router_dispatch() {
        let mut state = SessionState::new();

        state.route = Route::Appointment;
        assert_eq!(route_intent(&state), WorkflowNode::AppointmentIntake);

        state.route = Route::OrderMedicine;
        assert_eq!(route_intent(&state), WorkflowNode::MedicineValidation);

        state.route = Route::Reminder;
        assert_eq!(route_intent(&state), WorkflowNode::ReminderValidation);

        state.route = Route::None;
        assert_eq!(route_intent(&state), WorkflowNode::End);
    }

    #[test]
    fn test_router_skips_intake_after_triage_confirmation() {
        let mut state = wip_appointment_state();
        state.triage_confirmed = true;
        assert_eq!(route_intent(&state), WorkflowNode::AppointmentValidation);
    }

    #[test]
    fn test_router_is_idempotent() {
        let state = wip_appointment_state();
        let first = route_intent(&state);
        let second = route_intent(&state);
        assert_eq!(first, second);
    }

    #[test]
    fn test_triage_branches_on_tool_request() {
        assert_eq!(after_triage(true), WorkflowNode::ToolLoop);
        assert_eq!(after_triage(false), WorkflowNode::AppointmentValidation);
    }

    #[test]
    fn test_booking_gate_requires_both_flags() {
        let mut state = SessionState::new();
        assert_eq!(after_appointment_validation(&state), WorkflowNode::End);

        state.triage_confirmed = true;
        assert_eq!(after_appointment_validation(&state), WorkflowNode::End);

        state.triage_confirmed = false;
        state.is_valid = true;
        assert_eq!(after_appointment_validation(&state), WorkflowNode::End);

        state.triage_confirmed = true;
        assert_eq!(after_appointment_validation(&state), WorkflowNode::Scheduling);
    }

    #[test]
    fn test_medicine_and_reminder_gates() {
        let mut state = SessionState::new();
        assert_eq!(after_medicine_validation(&state), WorkflowNode::End);
        assert_eq!(after_reminder_validation(&state), WorkflowNode::End);

        state.is_valid = true;
        assert_eq!(after_medicine_validation(&state), WorkflowNode::Pharmacy);
        assert_eq!(after_reminder_validation(&state), WorkflowNode::Reminder);
    }
}
