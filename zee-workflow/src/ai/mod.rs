pub mod mock;
pub mod multi_agent;
pub mod openai;
pub mod types;

pub use mock::MockAiClient;
pub use openai::OpenAIClient;
pub use types::{AiError, AiResponse, ToolCall, ToolHistoryEntry, ToolResponse};

use crate::tools::ToolDefinition;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A multimodal part attached to a user message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AttachmentPart {
    Image {
        image: String,
        #[serde(rename = "mimeType", default, skip_serializing_if = "Option::is_none")]
        mime_type: Option<String>,
    },
    File {
        data: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
}

impl AttachmentPart {
    pub fn image(url: impl Into<String>) -> Self {
        AttachmentPart::Image {
            image: url.into(),
            mime_type: None,
        }
    }

    pub fn file(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        AttachmentPart::File {
            data: data.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Short label for logs, truncated to 60 characters
    pub fn describe(&self) -> String {
        let (kind, location) = match self {
            AttachmentPart::Image { image, .. } => ("image", image),
            AttachmentPart::File { data, .. } => ("file", data),
        };
        let preview: String = location.chars().take(60).collect();
        if location.chars().count() > 60 {
            format!("{}: {}...", kind, preview)
        } else {
            format!("{}: {}", kind, preview)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<AttachmentPart>,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    /// A user message carrying only attachment parts
    pub fn user_attachments(parts: Vec<AttachmentPart>) -> Self {
        Message {
            role: MessageRole::User,
            content: String::new(),
            attachments: parts,
        }
    }

    fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Message {
            role,
            content: content.into(),
            attachments: Vec::new(),
        }
    }
}

/// OpenAI-compatible providers and where to find them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModelProvider {
    #[default]
    OpenAi,
    DeepSeek,
    Grok,
    Gemini,
}

impl ModelProvider {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace(['-', '_'], "").as_str() {
            "openai" => Some(ModelProvider::OpenAi),
            "deepseek" => Some(ModelProvider::DeepSeek),
            "grok" | "groq" => Some(ModelProvider::Grok),
            "gemini" | "google" => Some(ModelProvider::Gemini),
            _ => None,
        }
    }

    pub fn chat_completions_url(&self) -> &'static str {
        match self {
            ModelProvider::OpenAi => "https://api.openai.com/v1/chat/completions",
            ModelProvider::DeepSeek => "https://api.deepseek.com/v1/chat/completions",
            ModelProvider::Grok => "https://api.groq.com/openai/v1/chat/completions",
            ModelProvider::Gemini => {
                "https://generativelanguage.googleapis.com/v1beta/openai/chat/completions"
            }
        }
    }

    pub fn api_key_env(&self) -> &'static str {
        match self {
            ModelProvider::OpenAi => "OPENAI_API_KEY",
            ModelProvider::DeepSeek => "DEEPSEEK_API_KEY",
            ModelProvider::Grok => "GROK_API_KEY",
            ModelProvider::Gemini => "GEMINI_API_KEY",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ModelProvider::OpenAi => "gpt-4o-mini",
            ModelProvider::DeepSeek => "deepseek-chat",
            ModelProvider::Grok => "grok-2-latest",
            ModelProvider::Gemini => "gemini-1.5-flash",
        }
    }
}

/// Unified model invoker shared by every agent in a workflow
pub enum AiClient {
    OpenAI(OpenAIClient),
    Mock(MockAiClient),
}

impl AiClient {
    /// Generate a response, optionally offering tools and replaying earlier tool rounds
    pub async fn generate_with_tools(
        &self,
        messages: Vec<Message>,
        tool_history: Vec<ToolHistoryEntry>,
        tools: Vec<ToolDefinition>,
        temperature: Option<f32>,
    ) -> Result<AiResponse, AiError> {
        match self {
            AiClient::OpenAI(client) => {
                let tool_messages = tool_history
                    .iter()
                    .flat_map(|entry| {
                        OpenAIClient::build_tool_result_messages(
                            &entry.tool_calls,
                            &entry.tool_responses,
                        )
                    })
                    .collect();
                client
                    .generate_with_tools(messages, tool_messages, tools, temperature)
                    .await
            }
            AiClient::Mock(client) => client.generate(messages, tool_history, tools, temperature),
        }
    }

    /// Plain text generation without tools
    pub async fn generate_text(
        &self,
        messages: Vec<Message>,
        temperature: Option<f32>,
    ) -> Result<String, AiError> {
        let response = self
            .generate_with_tools(messages, vec![], vec![], temperature)
            .await?;
        Ok(response.content)
    }

    pub fn provider_label(&self) -> &'static str {
        match self {
            AiClient::OpenAI(_) => "openai-compatible",
            AiClient::Mock(_) => "mock",
        }
    }
}
