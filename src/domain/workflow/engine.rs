//! The turn engine: loads the session, walks the workflow nodes via the
//! routing predicates, applies each step's update and persists the result.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, warn};

use crate::domain::clinical::{
    dispatch_tool_call, BookingStore, ClinicalDirectory, Notifier, ToolCallRequest,
};
use crate::domain::llm::{Message, ModelGateway};
use crate::domain::session::{
    Intent, SessionRepository, SessionState, ThreadId, WorkflowStatus,
};
use crate::domain::workflow::{nodes, routing, WorkflowError, WorkflowNode};
use crate::domain::DomainError;

/// Bounds on one turn of processing.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Tool rounds the triage step may use within one turn.
    pub max_tool_rounds: u32,
    /// Hard cap on node transitions per turn.
    pub max_engine_steps: u32,
    /// Deadline applied to every external call.
    pub call_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_tool_rounds: 4,
            max_engine_steps: 16,
            call_timeout: Duration::from_secs(30),
        }
    }
}

/// What one processed turn hands back to the caller.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// Assistant replies produced this turn, in order.
    pub replies: Vec<String>,
    pub status: WorkflowStatus,
}

/// Orchestrates the clinical dialogue workflow over its five seams: model
/// gateway, directory, booking store, notifier and session repository.
#[derive(Debug, Clone)]
pub struct ClinicalEngine {
    gateway: Arc<dyn ModelGateway>,
    directory: Arc<dyn ClinicalDirectory>,
    booking: Arc<dyn BookingStore>,
    notifier: Arc<dyn Notifier>,
    sessions: Arc<dyn SessionRepository>,
    config: EngineConfig,
}

impl ClinicalEngine {
    pub fn new(
        gateway: Arc<dyn ModelGateway>,
        directory: Arc<dyn ClinicalDirectory>,
        booking: Arc<dyn BookingStore>,
        notifier: Arc<dyn Notifier>,
        sessions: Arc<dyn SessionRepository>,
        config: EngineConfig,
    ) -> Self {
        Self {
            gateway,
            directory,
            booking,
            notifier,
            sessions,
            config,
        }
    }

    /// Process one user turn for a thread and return the assistant replies.
    ///
    /// Step failures never poison the session: the turn ends with a
    /// user-facing reply, the state is saved as-is and the next turn can
    /// continue from it.
    pub async fn process_turn(
        &self,
        thread: &ThreadId,
        user_text: &str,
    ) -> Result<TurnOutcome, DomainError> {
        let mut state = self.sessions.load(thread).await?;
        state.push_user_message(user_text);
        let reply_mark = state.messages.len();

        if let Err(step_error) = self.walk(&mut state).await {
            if step_error.is_recoverable() {
                warn!(thread = %thread, error = %step_error, "Turn ended with recoverable error");
            } else {
                error!(thread = %thread, error = %step_error, "Turn ended with fatal step error");
                // A fatal precondition failure means the routed flow cannot
                // continue; send the next turn back through conversation.
                state.ready_for_routing = false;
            }
            state.messages.push(Message::assistant(step_error.user_reply()));
        }

        let outcome = TurnOutcome {
            replies: state.assistant_replies_since(reply_mark),
            status: state.workflow_status,
        };

        self.sessions.save(thread, state).await?;
        Ok(outcome)
    }

    /// Walk nodes until `End`, applying each step's update.
    async fn walk(&self, state: &mut SessionState) -> Result<(), WorkflowError> {
        let mut node = routing::entry_node(state);
        let mut steps = 0u32;
        let mut tool_rounds = 0u32;
        let mut pending_tools: Vec<ToolCallRequest> = Vec::new();
        let mut executed_tools: HashSet<String> = HashSet::new();

        while node != WorkflowNode::End {
            steps += 1;
            if steps > self.config.max_engine_steps {
                warn!(steps, "Engine step cap reached; ending turn");
                break;
            }
            debug!(node = %node, step = steps, "Entering workflow node");

            node = match node {
                WorkflowNode::Conversation => {
                    let update = self
                        .bounded("gateway", nodes::conversation::run(&*self.gateway, state))
                        .await?;

                    // A changed top-level intent resets every intent-scoped
                    // field before the update lands.
                    if let Some(intent) = update.intent {
                        if intent != Intent::None && intent != state.intent {
                            state.begin_intent(intent);
                        }
                    }
                    state.apply(update);
                    routing::after_conversation(state)
                }
                WorkflowNode::Router => routing::route_intent(state),
                WorkflowNode::AppointmentIntake => {
                    let update = self
                        .bounded("directory", nodes::intake::run(&*self.directory, state))
                        .await?;
                    state.apply(update);
                    WorkflowNode::Context
                }
                WorkflowNode::Context => {
                    let update = self
                        .bounded("directory", nodes::context::run(&*self.directory, state))
                        .await?;
                    state.apply(update);
                    WorkflowNode::Triage
                }
                WorkflowNode::Triage => {
                    let outcome = self
                        .bounded("gateway", nodes::triage::run(&*self.gateway, state))
                        .await?;
                    state.apply(outcome.update);
                    match outcome.requested_tools {
                        Some(calls) => {
                            pending_tools = calls;
                            routing::after_triage(true)
                        }
                        None => routing::after_triage(false),
                    }
                }
                WorkflowNode::ToolLoop => {
                    if tool_rounds >= self.config.max_tool_rounds {
                        return Err(WorkflowError::ToolLoopExceeded {
                            max_rounds: self.config.max_tool_rounds,
                        });
                    }
                    tool_rounds += 1;

                    let calls = std::mem::take(&mut pending_tools);
                    self.run_tool_round(state, calls, &mut executed_tools)
                        .await?;
                    WorkflowNode::Triage
                }
                WorkflowNode::AppointmentValidation => {
                    let update = self
                        .bounded(
                            "gateway",
                            nodes::validation::run_appointment(&*self.gateway, state),
                        )
                        .await?;
                    state.apply(update);
                    routing::after_appointment_validation(state)
                }
                WorkflowNode::MedicineValidation => {
                    state.apply(nodes::validation::run_medicine(state));
                    routing::after_medicine_validation(state)
                }
                WorkflowNode::ReminderValidation => {
                    state.apply(nodes::validation::run_reminder(state));
                    routing::after_reminder_validation(state)
                }
                WorkflowNode::Scheduling => {
                    let update = self
                        .bounded("store", nodes::scheduling::run(&*self.booking, state))
                        .await?;
                    state.apply(update);
                    routing::after_side_effect()
                }
                WorkflowNode::Pharmacy => {
                    let update = self
                        .bounded("store", nodes::pharmacy::run(&*self.booking, state))
                        .await?;
                    state.apply(update);
                    routing::after_side_effect()
                }
                WorkflowNode::Reminder => {
                    let update = self
                        .bounded("notifier", nodes::reminder::run(&*self.notifier, state))
                        .await?;
                    state.apply(update);
                    WorkflowNode::End
                }
                WorkflowNode::Start | WorkflowNode::End => WorkflowNode::End,
            };
        }

        Ok(())
    }

    /// Execute one batch of tool calls, deduplicating repeats within the
    /// turn so the model cannot spin on the same lookup.
    async fn run_tool_round(
        &self,
        state: &mut SessionState,
        calls: Vec<ToolCallRequest>,
        executed: &mut HashSet<String>,
    ) -> Result<(), WorkflowError> {
        for call in calls {
            let signature = format!("{}:{}", call.tool.as_str(), call.arguments);

            let content = if executed.contains(&signature) {
                debug!(tool = call.tool.as_str(), "Duplicate tool call skipped");
                "Result already provided in a previous tool message.".to_string()
            } else {
                let result = self
                    .bounded("tool", async {
                        dispatch_tool_call(&call, &*self.directory)
                            .await
                            .map_err(WorkflowError::Tool)
                    })
                    .await?;
                executed.insert(signature);
                result
            };

            state.messages.push(Message::tool(call.id.clone(), content));
        }
        Ok(())
    }

    async fn bounded<T, F>(&self, target: &'static str, fut: F) -> Result<T, WorkflowError>
    where
        F: Future<Output = Result<T, WorkflowError>>,
    {
        tokio::time::timeout(self.config.call_timeout, fut)
            .await
            .map_err(|_| WorkflowError::Timeout { target })?
    }
}
