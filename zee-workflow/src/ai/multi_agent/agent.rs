use crate::ai::{AiClient, AiError, Message, ToolCall, ToolHistoryEntry, ToolResponse};
use crate::error::{Result, WorkflowError};
use crate::tools::{Tool, ToolContext, ToolRegistry};
use std::sync::Arc;

/// Tool rounds allowed within a single `generate` call
const MAX_TOOL_ITERATIONS: usize = 10;

/// Everything needed to build an [`Agent`]
pub struct AgentConfig {
    pub name: String,
    pub description: String,
    pub instructions: Vec<String>,
    pub tools: Vec<Arc<dyn Tool>>,
    /// Must lie in [0, 1] when set
    pub temperature: Option<f32>,
    pub model: Arc<AiClient>,
}

impl AgentConfig {
    pub fn new(name: impl Into<String>, description: impl Into<String>, model: Arc<AiClient>) -> Self {
        AgentConfig {
            name: name.into(),
            description: description.into(),
            instructions: Vec::new(),
            tools: Vec::new(),
            temperature: None,
            model,
        }
    }

    pub fn instruction(mut self, instruction: impl Into<String>) -> Self {
        self.instructions.push(instruction.into());
        self
    }

    pub fn instructions<I, S>(mut self, instructions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.instructions.extend(instructions.into_iter().map(Into::into));
        self
    }

    pub fn tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn tools(mut self, tools: impl IntoIterator<Item = Arc<dyn Tool>>) -> Self {
        self.tools.extend(tools);
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// A named capability unit wrapping a model call
pub struct Agent {
    name: String,
    description: String,
    instructions: Vec<String>,
    tools: ToolRegistry,
    temperature: Option<f32>,
    model: Arc<AiClient>,
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("instructions", &self.instructions.len())
            .field("tools", &self.tools.names())
            .field("temperature", &self.temperature)
            .field("model", &self.model.provider_label())
            .finish()
    }
}

impl Agent {
    pub fn new(config: AgentConfig) -> Result<Self> {
        if let Some(t) = config.temperature {
            if !(0.0..=1.0).contains(&t) {
                return Err(WorkflowError::InvalidTemperature(t));
            }
        }

        Ok(Agent {
            name: config.name,
            description: config.description,
            instructions: config.instructions,
            tools: ToolRegistry::from_tools(config.tools),
            temperature: config.temperature,
            model: config.model,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn instructions(&self) -> &[String] {
        &self.instructions
    }

    pub fn temperature(&self) -> Option<f32> {
        self.temperature
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Generate a reply to `messages`, framed by this agent's description and instructions
    pub async fn generate(&self, messages: Vec<Message>) -> Result<String> {
        self.generate_with_context(messages, &ToolContext::for_agent(&self.name))
            .await
    }

    /// Like [`Agent::generate`], with the context handed to any tools the model calls
    pub async fn generate_with_context(
        &self,
        messages: Vec<Message>,
        tool_context: &ToolContext,
    ) -> Result<String> {
        let mut conversation = Vec::with_capacity(messages.len() + self.instructions.len() + 1);
        conversation.push(Message::system(&self.description));
        conversation.extend(self.instructions.iter().map(Message::system));
        conversation.extend(messages);

        let definitions = self.tools.definitions();
        let mut tool_history: Vec<ToolHistoryEntry> = Vec::new();

        for round in 1..=MAX_TOOL_ITERATIONS {
            let response = self
                .model
                .generate_with_tools(
                    conversation.clone(),
                    tool_history.clone(),
                    definitions.clone(),
                    self.temperature,
                )
                .await?;

            log::debug!(
                "[AGENT] '{}' round {} - content_len: {}, tool_calls: {}",
                self.name,
                round,
                response.content.len(),
                response.tool_calls.len()
            );

            if response.tool_calls.is_empty() {
                return Ok(response.content);
            }

            let tool_responses = self.execute_tool_calls(&response.tool_calls, tool_context).await;
            tool_history.push(ToolHistoryEntry::new(response.tool_calls, tool_responses));
        }

        log::warn!(
            "[AGENT] '{}' exceeded {} tool rounds without a final response",
            self.name,
            MAX_TOOL_ITERATIONS
        );
        Err(AiError::new(format!(
            "Agent '{}' exceeded {} tool rounds without a final response",
            self.name, MAX_TOOL_ITERATIONS
        ))
        .into())
    }

    async fn execute_tool_calls(
        &self,
        tool_calls: &[ToolCall],
        tool_context: &ToolContext,
    ) -> Vec<ToolResponse> {
        let mut responses = Vec::with_capacity(tool_calls.len());

        for call in tool_calls {
            let start = std::time::Instant::now();
            let result = self
                .tools
                .execute(&call.name, call.arguments.clone(), tool_context)
                .await;

            log::info!(
                "[AGENT] '{}' tool '{}' finished in {}ms (success: {})",
                self.name,
                call.name,
                start.elapsed().as_millis(),
                result.success
            );

            responses.push(if result.success {
                ToolResponse::success(call.id.clone(), result.content)
            } else {
                ToolResponse::error(call.id.clone(), result.content)
            });
        }

        responses
    }
}
