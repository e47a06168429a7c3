use crate::ai::types::{AiError, AiResponse, ToolCall, ToolResponse};
use crate::ai::{AttachmentPart, Message, ModelProvider};
use crate::tools::ToolDefinition;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Client for any OpenAI-compatible chat completions endpoint
#[derive(Clone)]
pub struct OpenAIClient {
    client: Client,
    endpoint: String,
    model: String,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct OpenAICompletionRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OpenAITool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OpenAIMessage {
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<OpenAIContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<OpenAIToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

/// Plain text or an array of content parts for multimodal user turns
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum OpenAIContent {
    Text(String),
    Parts(Vec<OpenAIContentPart>),
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OpenAIContentPart {
    Text { text: String },
    ImageUrl { image_url: OpenAIImageUrl },
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OpenAIImageUrl {
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
struct OpenAITool {
    #[serde(rename = "type")]
    tool_type: String,
    function: OpenAIFunction,
}

#[derive(Debug, Clone, Serialize)]
struct OpenAIFunction {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OpenAIToolCall {
    pub id: String,
    #[serde(rename = "type")]
    pub call_type: String,
    pub function: OpenAIFunctionCall,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OpenAIFunctionCall {
    pub name: String,
    pub arguments: String,
}

#[derive(Debug, Deserialize)]
struct OpenAICompletionResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
    tool_calls: Option<Vec<OpenAIToolCall>>,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorResponse {
    error: OpenAIError,
}

#[derive(Debug, Deserialize)]
struct OpenAIError {
    message: String,
}

impl OpenAIClient {
    pub fn new(
        api_key: &str,
        endpoint: Option<&str>,
        model: Option<&str>,
        max_tokens: Option<u32>,
    ) -> Result<Self, AiError> {
        let endpoint_url = endpoint
            .filter(|e| !e.is_empty())
            .unwrap_or(ModelProvider::OpenAi.chat_completions_url())
            .to_string();

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        // Local endpoints often run without a key
        if !api_key.is_empty() {
            let auth_value = header::HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| AiError::new(format!("Invalid API key format: {}", e)))?;
            headers.insert(header::AUTHORIZATION, auth_value);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| AiError::new(format!("Failed to create HTTP client: {}", e)))?;

        let model_name = match model {
            Some(m) if !m.is_empty() => m.to_string(),
            _ => ModelProvider::OpenAi.default_model().to_string(),
        };

        Ok(Self {
            client,
            endpoint: endpoint_url,
            model: model_name,
            max_tokens: max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        })
    }

    /// Client for a known provider, using its endpoint and default model
    pub fn for_provider(
        provider: ModelProvider,
        api_key: &str,
        model: Option<&str>,
        max_tokens: Option<u32>,
    ) -> Result<Self, AiError> {
        let model = model
            .filter(|m| !m.is_empty())
            .unwrap_or(provider.default_model());
        Self::new(
            api_key,
            Some(provider.chat_completions_url()),
            Some(model),
            max_tokens,
        )
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn generate_with_tools(
        &self,
        messages: Vec<Message>,
        tool_history: Vec<OpenAIMessage>,
        tools: Vec<ToolDefinition>,
        temperature: Option<f32>,
    ) -> Result<AiResponse, AiError> {
        let mut api_messages: Vec<OpenAIMessage> =
            messages.into_iter().map(Self::to_api_message).collect();

        // Previous tool rounds go after the conversation
        api_messages.extend(tool_history);

        let openai_tools: Option<Vec<OpenAITool>> = if tools.is_empty() {
            None
        } else {
            Some(tools.iter().map(Self::to_api_tool).collect())
        };

        let request = OpenAICompletionRequest {
            model: self.model.clone(),
            messages: api_messages,
            max_tokens: self.max_tokens,
            temperature,
            tools: openai_tools.clone(),
            tool_choice: if tools.is_empty() { None } else { Some("auto".to_string()) },
        };

        log::info!(
            "[OPENAI] Sending request to {} with model {} and {} tools",
            self.endpoint,
            self.model,
            openai_tools.as_ref().map(|t| t.len()).unwrap_or(0)
        );
        log::debug!(
            "[OPENAI] Full request:\n{}",
            serde_json::to_string_pretty(&request).unwrap_or_default()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| AiError::new(format!("OpenAI API request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            if let Ok(error_response) = serde_json::from_str::<OpenAIErrorResponse>(&error_text) {
                return Err(AiError::with_status(
                    format!("OpenAI API error: {}", error_response.error.message),
                    status.as_u16(),
                ));
            }

            return Err(AiError::with_status(
                format!("OpenAI API returned error status: {}, body: {}", status, error_text),
                status.as_u16(),
            ));
        }

        let response_text = response
            .text()
            .await
            .map_err(|e| AiError::new(format!("Failed to read OpenAI response: {}", e)))?;

        log::debug!("[OPENAI] Raw response:\n{}", response_text);

        Self::parse_completion(&response_text)
    }

    fn to_api_message(message: Message) -> OpenAIMessage {
        let content = if message.attachments.is_empty() {
            OpenAIContent::Text(message.content)
        } else {
            let mut parts = Vec::with_capacity(message.attachments.len() + 1);
            if !message.content.is_empty() {
                parts.push(OpenAIContentPart::Text {
                    text: message.content,
                });
            }
            parts.extend(message.attachments.into_iter().map(Self::to_api_part));
            OpenAIContent::Parts(parts)
        };

        OpenAIMessage {
            role: message.role.to_string(),
            content: Some(content),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    fn to_api_part(part: AttachmentPart) -> OpenAIContentPart {
        match part {
            AttachmentPart::Image { image, .. } => OpenAIContentPart::ImageUrl {
                image_url: OpenAIImageUrl { url: image },
            },
            // Chat completions has no generic file part; reference it by URL
            AttachmentPart::File { data, mime_type } => OpenAIContentPart::Text {
                text: format!("[attached file ({})]: {}", mime_type, data),
            },
        }
    }

    fn to_api_tool(tool: &ToolDefinition) -> OpenAITool {
        OpenAITool {
            tool_type: "function".to_string(),
            function: OpenAIFunction {
                name: tool.name.clone(),
                description: tool.description.clone(),
                parameters: json!({
                    "type": tool.input_schema.schema_type,
                    "properties": tool.input_schema.properties.iter().map(|(k, v)| {
                        (k.clone(), serde_json::to_value(v).unwrap_or(Value::Null))
                    }).collect::<serde_json::Map<String, Value>>(),
                    "required": tool.input_schema.required
                }),
            },
        }
    }

    fn parse_completion(body: &str) -> Result<AiResponse, AiError> {
        let response_data: OpenAICompletionResponse = serde_json::from_str(body).map_err(|e| {
            AiError::new(format!("Failed to parse OpenAI response: {} - body: {}", e, body))
        })?;

        let choice = response_data
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AiError::new("OpenAI API returned no choices"))?;

        log::info!(
            "[OPENAI] Response - content_len: {}, tool_calls: {}, finish_reason: {:?}",
            choice.message.content.as_ref().map(|c| c.len()).unwrap_or(0),
            choice.message.tool_calls.as_ref().map(|t| t.len()).unwrap_or(0),
            choice.finish_reason
        );

        let tool_calls: Vec<ToolCall> = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| {
                let args: Value =
                    serde_json::from_str(&tc.function.arguments).unwrap_or(json!({}));
                ToolCall::new(tc.id, tc.function.name, args)
            })
            .collect();

        let content = choice.message.content.unwrap_or_default();
        let is_tool_use =
            choice.finish_reason.as_deref() == Some("tool_calls") || !tool_calls.is_empty();

        Ok(if is_tool_use {
            AiResponse::with_tools(content, tool_calls)
        } else {
            AiResponse::text(content)
        })
    }

    /// Build tool result messages for continuing after tool execution
    pub fn build_tool_result_messages(
        tool_calls: &[ToolCall],
        tool_responses: &[ToolResponse],
    ) -> Vec<OpenAIMessage> {
        let mut messages = Vec::with_capacity(tool_responses.len() + 1);

        let openai_tool_calls: Vec<OpenAIToolCall> = tool_calls
            .iter()
            .map(|tc| OpenAIToolCall {
                id: tc.id.clone(),
                call_type: "function".to_string(),
                function: OpenAIFunctionCall {
                    name: tc.name.clone(),
                    arguments: serde_json::to_string(&tc.arguments).unwrap_or_default(),
                },
            })
            .collect();

        messages.push(OpenAIMessage {
            role: "assistant".to_string(),
            // Some compatible providers reject a missing content field
            content: Some(OpenAIContent::Text(String::new())),
            tool_calls: Some(openai_tool_calls),
            tool_call_id: None,
        });

        for response in tool_responses {
            messages.push(OpenAIMessage {
                role: "tool".to_string(),
                content: Some(OpenAIContent::Text(response.content.clone())),
                tool_calls: None,
                tool_call_id: Some(response.tool_call_id.clone()),
            });
        }

        messages
    }
}
