use crate::events::{EventBroadcaster, WorkflowEvent};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// JSON Schema property definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertySchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<PropertySchema>>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
}

impl PropertySchema {
    pub fn string(description: impl Into<String>) -> Self {
        Self::typed("string", description)
    }

    pub fn array_of(description: impl Into<String>, items: PropertySchema) -> Self {
        PropertySchema {
            items: Some(Box::new(items)),
            ..Self::typed("array", description)
        }
    }

    pub fn with_enum(mut self, values: &[&str]) -> Self {
        self.enum_values = Some(values.iter().map(|v| v.to_string()).collect());
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    fn typed(schema_type: &str, description: impl Into<String>) -> Self {
        PropertySchema {
            schema_type: schema_type.to_string(),
            description: description.into(),
            default: None,
            items: None,
            enum_values: None,
        }
    }
}

/// Tool input schema using JSON Schema format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInputSchema {
    #[serde(rename = "type")]
    pub schema_type: String,
    pub properties: HashMap<String, PropertySchema>,
    #[serde(default)]
    pub required: Vec<String>,
}

impl Default for ToolInputSchema {
    fn default() -> Self {
        ToolInputSchema {
            schema_type: "object".to_string(),
            properties: HashMap::new(),
            required: vec![],
        }
    }
}

/// Tool definition that gets sent to the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: ToolInputSchema,
}

/// Result of tool execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    /// Seconds the caller should wait before retrying a transient failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
}

impl ToolResult {
    pub fn success(content: impl Into<String>) -> Self {
        ToolResult {
            success: true,
            content: content.into(),
            error: None,
            metadata: None,
            retry_after_secs: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        let msg = message.into();
        ToolResult {
            success: false,
            content: msg.clone(),
            error: Some(msg),
            metadata: None,
            retry_after_secs: None,
        }
    }

    pub fn retryable_error(message: impl Into<String>, retry_after_secs: u64) -> Self {
        let msg = message.into();
        ToolResult {
            success: false,
            content: format!(
                "{}\n\nThis looks like a temporary upstream error. Retry after {} seconds.",
                msg, retry_after_secs
            ),
            error: Some(msg),
            metadata: None,
            retry_after_secs: Some(retry_after_secs),
        }
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn should_retry(&self) -> bool {
        self.retry_after_secs.is_some()
    }
}

/// Context provided to tools during execution
#[derive(Clone, Default)]
pub struct ToolContext {
    /// Agent whose model requested the call
    pub agent_name: Option<String>,
    /// Workflow run the call belongs to
    pub run_id: Option<String>,
    pub extra: HashMap<String, Value>,
    pub broadcaster: Option<Arc<EventBroadcaster>>,
}

impl std::fmt::Debug for ToolContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolContext")
            .field("agent_name", &self.agent_name)
            .field("run_id", &self.run_id)
            .field("extra", &self.extra.keys().collect::<Vec<_>>())
            .field("broadcaster", &self.broadcaster.is_some())
            .finish()
    }
}

impl ToolContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_agent(agent_name: impl Into<String>) -> Self {
        ToolContext {
            agent_name: Some(agent_name.into()),
            ..Self::default()
        }
    }

    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }

    pub fn with_broadcaster(mut self, broadcaster: Arc<EventBroadcaster>) -> Self {
        self.broadcaster = Some(broadcaster);
        self
    }

    /// Broadcast only when a subscriber surface is attached
    pub fn emit(&self, event: WorkflowEvent) {
        if let Some(broadcaster) = &self.broadcaster {
            broadcaster.broadcast(event);
        }
    }

    /// Report a finished tool call to subscribers
    pub fn emit_tool_executed(&self, tool_name: &str, result: &ToolResult, duration_ms: u128) {
        if self.broadcaster.is_none() {
            return;
        }
        self.emit(WorkflowEvent::tool_executed(
            self.run_id.as_deref().unwrap_or(""),
            self.agent_name.as_deref().unwrap_or(""),
            tool_name,
            result.success,
            duration_ms,
        ));
    }
}
