//! Workflow data model: tasks, actions, dependencies and context entries

use crate::ai::AttachmentPart;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::borrow::Cow;

pub const PLANNER: &str = "planner";
pub const ROUTER: &str = "router";
pub const ENDGAME: &str = "endgame";

/// Names user agents may not take. `breakdown` and `mastermind` still resolve
/// to the planner and router for plans produced against older workflow prompts.
pub const RESERVED_AGENT_NAMES: [&str; 5] = [PLANNER, "breakdown", ROUTER, "mastermind", ENDGAME];

pub const USER_ROLE: &str = "user";
pub const ERROR_ROLE: &str = "error";

/// A task's need for output produced by another agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    #[serde(rename = "agentName")]
    pub agent_name: String,
    #[serde(default)]
    pub task: String,
}

impl Dependency {
    pub fn new(agent_name: impl Into<String>, task: impl Into<String>) -> Self {
        Dependency {
            agent_name: agent_name.into(),
            task: task.into(),
        }
    }
}

/// Accepts `[{agentName, task}]`, a map of agentName to reason, or null
pub fn deserialize_dependencies<'de, D>(deserializer: D) -> Result<Vec<Dependency>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum DependencyShape {
        List(Vec<Dependency>),
        Map(std::collections::BTreeMap<String, Value>),
    }

    let shape = Option::<DependencyShape>::deserialize(deserializer)?;
    Ok(match shape {
        None => Vec::new(),
        Some(DependencyShape::List(list)) => list,
        Some(DependencyShape::Map(map)) => map
            .into_iter()
            .map(|(agent_name, reason)| {
                let task = match reason {
                    Value::String(s) => s,
                    Value::Null => String::new(),
                    other => other.to_string(),
                };
                Dependency { agent_name, task }
            })
            .collect(),
    })
}

fn deserialize_null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A task as produced by the planner, before assignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTask {
    pub instructions: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub attachments: Vec<Vec<AttachmentPart>>,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub dependencies: Vec<String>,
}

/// A task assigned to a worker by the router
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZeeTask {
    #[serde(rename = "agentName")]
    pub agent_name: String,
    pub instructions: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub attachments: Vec<Vec<AttachmentPart>>,
    #[serde(default, deserialize_with = "deserialize_dependencies")]
    pub dependencies: Vec<Dependency>,
}

impl ZeeTask {
    /// The request that dispatches this task, sent on the router's behalf
    pub fn into_action(self) -> AgentAction {
        AgentAction::Request {
            from: ROUTER.to_string(),
            to: self.agent_name,
            content: self.instructions.join("\n"),
            dependencies: self.dependencies,
            attachments: self.attachments,
        }
    }
}

/// Back-reference a follow-up keeps to the task that raised it
#[derive(Debug, Clone, PartialEq)]
pub struct FollowupOrigin {
    /// Content of the action the asking agent was working on
    pub task: String,
    /// Sender of that action
    pub from: String,
    pub dependencies: Vec<Dependency>,
    pub attachments: Vec<Vec<AttachmentPart>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Request,
    Followup,
    Response,
    Complete,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Request => "request",
            ActionKind::Followup => "followup",
            ActionKind::Response => "response",
            ActionKind::Complete => "complete",
        }
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A unit of inter-agent work. Consumed exactly once from the action queue.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentAction {
    /// Ask `to` to perform a task
    Request {
        from: String,
        to: String,
        content: String,
        dependencies: Vec<Dependency>,
        attachments: Vec<Vec<AttachmentPart>>,
    },
    /// `from` needs more information before it can finish `origin.task`
    Followup {
        from: String,
        to: String,
        question: String,
        /// Dependency summary appended to the question
        note: String,
        /// Set when the follow-up was rerouted away from an unknown agent
        redirected_from: Option<String>,
        origin: FollowupOrigin,
    },
    /// Router answer to a follow-up; recorded into the context
    Response { from: String, to: String, content: String },
    /// Final output for a task; recorded into the context
    Complete { from: String, to: String, content: String },
}

impl AgentAction {
    pub fn kind(&self) -> ActionKind {
        match self {
            AgentAction::Request { .. } => ActionKind::Request,
            AgentAction::Followup { .. } => ActionKind::Followup,
            AgentAction::Response { .. } => ActionKind::Response,
            AgentAction::Complete { .. } => ActionKind::Complete,
        }
    }

    pub fn from(&self) -> &str {
        match self {
            AgentAction::Request { from, .. }
            | AgentAction::Followup { from, .. }
            | AgentAction::Response { from, .. }
            | AgentAction::Complete { from, .. } => from,
        }
    }

    pub fn to(&self) -> &str {
        match self {
            AgentAction::Request { to, .. }
            | AgentAction::Followup { to, .. }
            | AgentAction::Response { to, .. }
            | AgentAction::Complete { to, .. } => to,
        }
    }

    /// Response and complete actions carry finished work
    pub fn is_completed(&self) -> bool {
        matches!(self, AgentAction::Response { .. } | AgentAction::Complete { .. })
    }

    /// Text shown to the destination agent as its current task
    pub fn content(&self) -> Cow<'_, str> {
        match self {
            AgentAction::Request { content, .. }
            | AgentAction::Response { content, .. }
            | AgentAction::Complete { content, .. } => Cow::Borrowed(content),
            AgentAction::Followup {
                question,
                note,
                redirected_from,
                ..
            } => {
                let mut text = format!("{}{}", question, note);
                if let Some(original) = redirected_from {
                    text.push_str(&format!(
                        "\n\nNOTE: This was originally directed to '{}' but that agent doesn't exist. Please handle this followup request.",
                        original
                    ));
                }
                Cow::Owned(text)
            }
        }
    }

    pub fn dependencies(&self) -> &[Dependency] {
        match self {
            AgentAction::Request { dependencies, .. } => dependencies,
            _ => &[],
        }
    }

    pub fn attachments(&self) -> &[Vec<AttachmentPart>] {
        match self {
            AgentAction::Request { attachments, .. } => attachments,
            _ => &[],
        }
    }
}

/// Note appended to a follow-up question so the router knows what the asker relies on
pub fn dependency_note(dependencies: &[Dependency]) -> String {
    if dependencies.is_empty() {
        "\n\nContext: Agent has no explicit dependencies".to_string()
    } else {
        let names: Vec<&str> = dependencies.iter().map(|d| d.agent_name.as_str()).collect();
        format!("\n\nContext: Agent has dependencies on: {}", names.join(", "))
    }
}

/// One entry of the shared context log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextItem {
    /// Agent name, `user` or `error`
    pub role: String,
    pub content: String,
}

impl ContextItem {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        ContextItem {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(USER_ROLE, content)
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self::new(ERROR_ROLE, content)
    }

    pub fn is_user(&self) -> bool {
        self.role == USER_ROLE
    }

    pub fn is_error(&self) -> bool {
        self.role == ERROR_ROLE
    }

    pub fn render(&self) -> String {
        format!("{}: {}", self.role, self.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dependencies_from_list_or_map() {
        let listed: ZeeTask = serde_json::from_value(json!({
            "agentName": "writer",
            "instructions": ["Write"],
            "dependencies": [{"agentName": "researcher", "task": "facts"}]
        }))
        .unwrap();
        assert_eq!(listed.dependencies, vec![Dependency::new("researcher", "facts")]);

        let mapped: ZeeTask = serde_json::from_value(json!({
            "agentName": "writer",
            "instructions": ["Write"],
            "dependencies": {"researcher": "facts", "editor": "style guide"}
        }))
        .unwrap();
        assert_eq!(
            mapped.dependencies,
            vec![
                Dependency::new("editor", "style guide"),
                Dependency::new("researcher", "facts")
            ]
        );
    }

    #[test]
    fn test_missing_optional_fields_default_to_empty() {
        let task: ZeeTask = serde_json::from_value(json!({
            "agentName": "writer",
            "instructions": ["Write"],
            "attachments": null
        }))
        .unwrap();
        assert!(task.attachments.is_empty());
        assert!(task.dependencies.is_empty());
    }

    #[test]
    fn test_task_into_request() {
        let task = ZeeTask {
            agent_name: "writer".to_string(),
            instructions: vec!["Outline".to_string(), "Draft".to_string()],
            attachments: vec![],
            dependencies: vec![Dependency::new("researcher", "facts")],
        };
        let action = task.into_action();
        assert_eq!(action.kind(), ActionKind::Request);
        assert_eq!(action.from(), ROUTER);
        assert_eq!(action.to(), "writer");
        assert_eq!(action.content(), "Outline\nDraft");
        assert_eq!(action.dependencies().len(), 1);
    }

    #[test]
    fn test_followup_content_includes_note_and_redirect() {
        let origin = FollowupOrigin {
            task: "Draft".to_string(),
            from: ROUTER.to_string(),
            dependencies: vec![],
            attachments: vec![],
        };
        let action = AgentAction::Followup {
            from: "writer".to_string(),
            to: ROUTER.to_string(),
            question: "Which tone?".to_string(),
            note: dependency_note(&[]),
            redirected_from: Some("ghost".to_string()),
            origin,
        };
        let content = action.content();
        assert!(content.starts_with("Which tone?\n\nContext: Agent has no explicit dependencies"));
        assert!(content.ends_with(
            "NOTE: This was originally directed to 'ghost' but that agent doesn't exist. Please handle this followup request."
        ));
    }

    #[test]
    fn test_dependency_note_lists_agents() {
        let note = dependency_note(&[Dependency::new("a", "x"), Dependency::new("b", "y")]);
        assert_eq!(note, "\n\nContext: Agent has dependencies on: a, b");
    }
}
