//! Tools available to the built-in agents

use super::registry::AgentRegistry;
use crate::ai::{AttachmentPart, Message};
use crate::tools::{PropertySchema, Tool, ToolContext, ToolDefinition, ToolInputSchema, ToolResult};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

pub const EXECUTE_AGENT_TOOL: &str = "execute_agent";

/// Lets the router query one worker agent directly
pub struct ExecuteAgentTool {
    workers: Arc<AgentRegistry>,
}

impl ExecuteAgentTool {
    pub fn new(workers: Arc<AgentRegistry>) -> Self {
        ExecuteAgentTool { workers }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TaskInput {
    Text(String),
    Parts(Vec<AttachmentPart>),
}

#[derive(Debug, Deserialize)]
struct ExecuteAgentParams {
    #[serde(rename = "agentName")]
    agent_name: String,
    tasks: Vec<TaskInput>,
}

#[async_trait]
impl Tool for ExecuteAgentTool {
    fn definition(&self) -> ToolDefinition {
        let mut properties = HashMap::new();
        properties.insert(
            "agentName".to_string(),
            PropertySchema::string("Name of the agent to ask").with_enum(
                &self.workers.names().iter().map(String::as_str).collect::<Vec<_>>(),
            ),
        );
        properties.insert(
            "tasks".to_string(),
            PropertySchema::array_of(
                "Messages for the agent: plain text, or an array of attachment parts",
                PropertySchema::string("Task text"),
            ),
        );

        ToolDefinition {
            name: EXECUTE_AGENT_TOOL.to_string(),
            description: "Get information from a single agent".to_string(),
            input_schema: ToolInputSchema {
                schema_type: "object".to_string(),
                properties,
                required: vec!["agentName".to_string(), "tasks".to_string()],
            },
        }
    }

    async fn execute(&self, params: Value, context: &ToolContext) -> ToolResult {
        let params: ExecuteAgentParams = match serde_json::from_value(params) {
            Ok(p) => p,
            Err(e) => return ToolResult::error(format!("Invalid parameters: {}", e)),
        };

        let Some(agent) = self.workers.get(&params.agent_name) else {
            return ToolResult::error(format!(
                "Agent '{}' not found. Available agents: '{}'.",
                params.agent_name,
                self.workers.names().join("', '")
            ));
        };

        let messages: Vec<Message> = params
            .tasks
            .into_iter()
            .map(|task| match task {
                TaskInput::Text(text) => Message::user(text),
                TaskInput::Parts(parts) => Message::user_attachments(parts),
            })
            .collect();

        log::info!(
            "[ZEE] {} asked '{}' directly ({} messages)",
            context.agent_name.as_deref().unwrap_or("router"),
            params.agent_name,
            messages.len()
        );

        let worker_context = ToolContext {
            agent_name: Some(params.agent_name.clone()),
            ..context.clone()
        };
        match agent.generate_with_context(messages, &worker_context).await {
            Ok(reply) => ToolResult::success(reply).with_metadata(json!({ "agent": params.agent_name })),
            Err(e) => ToolResult::error(format!("Agent '{}' failed: {}", params.agent_name, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::multi_agent::agent::{Agent, AgentConfig};
    use crate::ai::multi_agent::types::RESERVED_AGENT_NAMES;
    use crate::ai::{AiClient, MessageRole, MockAiClient};

    fn workers(model: Arc<AiClient>) -> Arc<AgentRegistry> {
        let researcher =
            Agent::new(AgentConfig::new("researcher", "You research facts", model.clone())).unwrap();
        let writer = Agent::new(AgentConfig::new("writer", "You write", model)).unwrap();
        Arc::new(AgentRegistry::new(vec![researcher, writer], &RESERVED_AGENT_NAMES).unwrap())
    }

    #[tokio::test]
    async fn test_runs_named_worker() {
        let model = Arc::new(AiClient::Mock(MockAiClient::from_texts(["Paris"])));
        let tool = ExecuteAgentTool::new(workers(model.clone()));

        let result = tool
            .execute(
                json!({"agentName": "researcher", "tasks": ["Capital of France?"]}),
                &ToolContext::for_agent("router"),
            )
            .await;
        assert!(result.success);
        assert_eq!(result.content, "Paris");

        let AiClient::Mock(mock) = model.as_ref() else { unreachable!() };
        let request = &mock.requests()[0];
        assert_eq!(request.system_prompt(), "You research facts");
        let last = request.last_user_message().unwrap();
        assert_eq!(last.role, MessageRole::User);
        assert_eq!(last.content, "Capital of France?");
    }

    #[tokio::test]
    async fn test_unknown_agent_lists_workers() {
        let model = Arc::new(AiClient::Mock(MockAiClient::new(vec![])));
        let tool = ExecuteAgentTool::new(workers(model));
        let result = tool
            .execute(json!({"agentName": "ghost", "tasks": ["hi"]}), &ToolContext::new())
            .await;
        assert!(!result.success);
        assert_eq!(
            result.content,
            "Agent 'ghost' not found. Available agents: 'researcher', 'writer'."
        );
    }

    #[test]
    fn test_definition_enumerates_workers() {
        let model = Arc::new(AiClient::Mock(MockAiClient::new(vec![])));
        let definition = ExecuteAgentTool::new(workers(model)).definition();
        let agent_name = &definition.input_schema.properties["agentName"];
        assert_eq!(
            agent_name.enum_values.as_deref(),
            Some(&["researcher".to_string(), "writer".to_string()][..])
        );
    }
}
