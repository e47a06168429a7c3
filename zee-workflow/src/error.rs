use crate::ai::AiError;
use thiserror::Error;

/// Errors surfaced by workflow construction and execution.
///
/// Configuration and planning errors are fatal. Dispatch and generation errors raised
/// while draining the action queue are recorded into the context store instead of
/// being returned from `run()`.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Invalid temperature {0}. Must be between 0 and 1.")]
    InvalidTemperature(f32),

    #[error("Agent names already exist: {}", .0.join(", "))]
    DuplicateAgents(Vec<String>),

    #[error("{0} is not set")]
    MissingCredential(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to parse '{agent}' response: {reason}")]
    PlanParse { agent: String, reason: String },

    #[error("Agent '{name}' not found. Available agents: {}.", .available.join(", "))]
    AgentNotFound { name: String, available: Vec<String> },

    #[error("{0}")]
    Generation(#[from] AiError),
}

impl WorkflowError {
    pub fn plan_parse(agent: &str, reason: impl Into<String>) -> Self {
        WorkflowError::PlanParse {
            agent: agent.to_string(),
            reason: reason.into(),
        }
    }

    /// Configuration errors are raised at construction and never recovered
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            WorkflowError::InvalidTemperature(_)
                | WorkflowError::DuplicateAgents(_)
                | WorkflowError::MissingCredential(_)
                | WorkflowError::InvalidConfig(_)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, WorkflowError::AgentNotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, WorkflowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_agents_lists_every_name() {
        let err = WorkflowError::DuplicateAgents(vec!["router".to_string(), "writer".to_string()]);
        assert_eq!(err.to_string(), "Agent names already exist: router, writer");
        assert!(err.is_configuration());
    }

    #[test]
    fn test_agent_not_found_message() {
        let err = WorkflowError::AgentNotFound {
            name: "ghost".to_string(),
            available: vec!["planner".to_string(), "router".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Agent 'ghost' not found. Available agents: planner, router."
        );
        assert!(err.is_not_found());
        assert!(!err.is_configuration());
    }

    #[test]
    fn test_generation_wraps_ai_error() {
        let err: WorkflowError = AiError::with_status("rate limited", 429).into();
        assert_eq!(err.to_string(), "[HTTP 429] rate limited");
    }
}
