use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Observable milestones of a workflow run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventType {
    WorkflowStarted,
    PlanProduced,
    ActionDispatched,
    ActionCompleted,
    ErrorRecorded,
    ToolExecuted,
    BudgetExhausted,
    WorkflowCompleted,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WorkflowStarted => "workflow_started",
            Self::PlanProduced => "plan_produced",
            Self::ActionDispatched => "action_dispatched",
            Self::ActionCompleted => "action_completed",
            Self::ErrorRecorded => "error_recorded",
            Self::ToolExecuted => "tool_executed",
            Self::BudgetExhausted => "budget_exhausted",
            Self::WorkflowCompleted => "workflow_completed",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<EventType> for String {
    fn from(event_type: EventType) -> Self {
        event_type.as_str().to_string()
    }
}

/// Event pushed to every subscriber
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowEvent {
    pub event: String,
    /// Run this event belongs to
    pub run_id: String,
    pub data: Value,
    pub timestamp: String,
}

impl WorkflowEvent {
    pub fn new(event: impl Into<String>, run_id: &str, data: Value) -> Self {
        Self {
            event: event.into(),
            run_id: run_id.to_string(),
            data,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn is(&self, event_type: EventType) -> bool {
        self.event == event_type.as_str()
    }

    pub fn workflow_started(run_id: &str, goal: &str, max_iterations: usize, agents: &[String]) -> Self {
        Self::new(
            EventType::WorkflowStarted,
            run_id,
            json!({
                "goal": goal,
                "max_iterations": max_iterations,
                "agents": agents
            }),
        )
    }

    /// `assignments` holds the chosen agent for each task, in dispatch order
    pub fn plan_produced(run_id: &str, assignments: &[&str]) -> Self {
        Self::new(
            EventType::PlanProduced,
            run_id,
            json!({
                "task_count": assignments.len(),
                "assignments": assignments
            }),
        )
    }

    pub fn action_dispatched(run_id: &str, iteration: usize, kind: &str, from: &str, to: &str) -> Self {
        Self::new(
            EventType::ActionDispatched,
            run_id,
            json!({
                "iteration": iteration,
                "kind": kind,
                "from": from,
                "to": to
            }),
        )
    }

    pub fn action_completed(run_id: &str, kind: &str, from: &str, to: &str, content: &str) -> Self {
        Self::new(
            EventType::ActionCompleted,
            run_id,
            json!({
                "kind": kind,
                "from": from,
                "to": to,
                "content": content
            }),
        )
    }

    pub fn error_recorded(run_id: &str, from: &str, to: &str, message: &str) -> Self {
        Self::new(
            EventType::ErrorRecorded,
            run_id,
            json!({
                "from": from,
                "to": to,
                "message": message
            }),
        )
    }

    pub fn tool_executed(run_id: &str, agent: &str, tool: &str, success: bool, duration_ms: u128) -> Self {
        Self::new(
            EventType::ToolExecuted,
            run_id,
            json!({
                "agent": agent,
                "tool": tool,
                "success": success,
                "duration_ms": duration_ms as u64
            }),
        )
    }

    pub fn budget_exhausted(run_id: &str, iterations: usize, pending: usize) -> Self {
        Self::new(
            EventType::BudgetExhausted,
            run_id,
            json!({
                "iterations": iterations,
                "pending_actions": pending
            }),
        )
    }

    pub fn workflow_completed(run_id: &str, iterations: usize, context_len: usize, errors: usize) -> Self {
        Self::new(
            EventType::WorkflowCompleted,
            run_id,
            json!({
                "iterations": iterations,
                "context_entries": context_len,
                "errors": errors
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names() {
        let event = WorkflowEvent::plan_produced("run-1", &["researcher", "writer"]);
        assert!(event.is(EventType::PlanProduced));
        assert_eq!(event.event, "plan_produced");
        assert_eq!(event.data["task_count"], 2);
        assert_eq!(event.data["assignments"][1], "writer");
    }

    #[test]
    fn test_serialized_shape() {
        let event = WorkflowEvent::error_recorded("run-1", "router", "ghost", "not found");
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "error_recorded");
        assert_eq!(value["run_id"], "run-1");
        assert_eq!(value["data"]["to"], "ghost");
        assert!(value["timestamp"].is_string());
    }
}
