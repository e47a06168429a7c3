use super::types::{ToolContext, ToolDefinition, ToolResult};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// A capability an agent's model may invoke by name
#[async_trait]
pub trait Tool: Send + Sync {
    fn definition(&self) -> ToolDefinition;

    async fn execute(&self, params: Value, context: &ToolContext) -> ToolResult;

    fn name(&self) -> String {
        self.definition().name
    }
}

/// Name-indexed set of tools owned by a single agent
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    /// Registration order, so definitions reach the model stably
    order: Vec<String>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tools(tools: impl IntoIterator<Item = Arc<dyn Tool>>) -> Self {
        let mut registry = Self::new();
        for tool in tools {
            registry.register(tool);
        }
        registry
    }

    /// Later registrations replace earlier ones with the same name
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name();
        if self.tools.insert(name.clone(), tool).is_some() {
            log::warn!("[TOOLS] Tool '{}' registered twice, keeping the latest", name);
        } else {
            self.order.push(name);
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn names(&self) -> Vec<String> {
        self.order.clone()
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| tool.definition())
            .collect()
    }

    /// Unknown tools produce an error result for the model rather than a failure
    pub async fn execute(&self, name: &str, params: Value, context: &ToolContext) -> ToolResult {
        match self.tools.get(name) {
            Some(tool) => {
                log::info!(
                    "[TOOLS] Executing '{}' for agent {}",
                    name,
                    context.agent_name.as_deref().unwrap_or("<unknown>")
                );
                let start = std::time::Instant::now();
                let result = tool.execute(params, context).await;
                context.emit_tool_executed(name, &result, start.elapsed().as_millis());
                result
            }
            None => ToolResult::error(format!(
                "Tool '{}' is not available. Available tools: {}",
                name,
                self.order.join(", ")
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::types::{PropertySchema, ToolInputSchema};
    use serde_json::json;

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn definition(&self) -> ToolDefinition {
            let mut properties = HashMap::new();
            properties.insert("text".to_string(), PropertySchema::string("Text to echo"));
            ToolDefinition {
                name: "echo".to_string(),
                description: "Echo the input".to_string(),
                input_schema: ToolInputSchema {
                    properties,
                    required: vec!["text".to_string()],
                    ..Default::default()
                },
            }
        }

        async fn execute(&self, params: Value, _context: &ToolContext) -> ToolResult {
            match params.get("text").and_then(|v| v.as_str()) {
                Some(text) => ToolResult::success(text),
                None => ToolResult::error("Missing 'text' parameter"),
            }
        }
    }

    #[tokio::test]
    async fn test_execute_known_tool() {
        let registry = ToolRegistry::from_tools([Arc::new(EchoTool) as Arc<dyn Tool>]);
        let result = registry
            .execute("echo", json!({"text": "hi"}), &ToolContext::new())
            .await;
        assert!(result.success);
        assert_eq!(result.content, "hi");
    }

    #[tokio::test]
    async fn test_execution_is_broadcast() {
        let broadcaster = Arc::new(crate::events::EventBroadcaster::new());
        let context = ToolContext::for_agent("writer")
            .with_run_id("run-1")
            .with_broadcaster(broadcaster.clone());
        let registry = ToolRegistry::from_tools([Arc::new(EchoTool) as Arc<dyn Tool>]);

        registry.execute("echo", json!({"text": "hi"}), &context).await;

        let events = broadcaster.recent_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].data["tool"], "echo");
        assert_eq!(events[0].data["success"], true);
    }

    #[tokio::test]
    async fn test_unknown_tool_is_error_result() {
        let registry = ToolRegistry::from_tools([Arc::new(EchoTool) as Arc<dyn Tool>]);
        let result = registry.execute("nope", json!({}), &ToolContext::new()).await;
        assert!(!result.success);
        assert!(result.content.contains("Available tools: echo"));
    }

    #[test]
    fn test_duplicate_registration_keeps_single_entry() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(EchoTool));
        registry.register(Arc::new(EchoTool));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.definitions().len(), 1);
    }
}
