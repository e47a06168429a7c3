use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Model invocation error with status code information
#[derive(Debug, Clone)]
pub struct AiError {
    pub message: String,
    /// HTTP status code if the provider answered
    pub status_code: Option<u16>,
}

impl AiError {
    pub fn new(message: impl Into<String>) -> Self {
        AiError {
            message: message.into(),
            status_code: None,
        }
    }

    pub fn with_status(message: impl Into<String>, status_code: u16) -> Self {
        AiError {
            message: message.into(),
            status_code: Some(status_code),
        }
    }

    /// 429 and 5xx are worth retrying at the caller's discretion
    pub fn is_transient(&self) -> bool {
        matches!(self.status_code, Some(429) | Some(500..=599))
    }
}

impl fmt::Display for AiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(code) = self.status_code {
            write!(f, "[HTTP {}] {}", code, self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for AiError {}

impl From<String> for AiError {
    fn from(s: String) -> Self {
        AiError::new(s)
    }
}

impl From<&str> for AiError {
    fn from(s: &str) -> Self {
        AiError::new(s)
    }
}

/// A tool invocation requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        ToolCall {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// The result of a tool execution sent back to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResponse {
    pub tool_call_id: String,
    pub content: String,
    pub is_error: bool,
}

impl ToolResponse {
    pub fn success(tool_call_id: String, content: String) -> Self {
        ToolResponse {
            tool_call_id,
            content,
            is_error: false,
        }
    }

    pub fn error(tool_call_id: String, error: String) -> Self {
        ToolResponse {
            tool_call_id,
            content: error,
            is_error: true,
        }
    }
}

/// One round of tool calls and their responses, replayed on the next model call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolHistoryEntry {
    pub tool_calls: Vec<ToolCall>,
    pub tool_responses: Vec<ToolResponse>,
}

impl ToolHistoryEntry {
    pub fn new(tool_calls: Vec<ToolCall>, tool_responses: Vec<ToolResponse>) -> Self {
        ToolHistoryEntry {
            tool_calls,
            tool_responses,
        }
    }
}

/// Provider-agnostic model response: text, tool calls, or both
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiResponse {
    /// Text content (may be empty if only tool calls)
    pub content: String,
    pub tool_calls: Vec<ToolCall>,
    pub stop_reason: Option<String>,
}

impl AiResponse {
    pub fn text(content: impl Into<String>) -> Self {
        AiResponse {
            content: content.into(),
            tool_calls: vec![],
            stop_reason: Some("end_turn".to_string()),
        }
    }

    pub fn with_tools(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        AiResponse {
            content: content.into(),
            tool_calls,
            stop_reason: Some("tool_use".to_string()),
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    pub fn is_tool_use(&self) -> bool {
        self.stop_reason.as_deref() == Some("tool_use") || !self.tool_calls.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ai_response_text() {
        let response = AiResponse::text("Hello world");
        assert_eq!(response.content, "Hello world");
        assert!(!response.has_tool_calls());
        assert!(!response.is_tool_use());
    }

    #[test]
    fn test_ai_response_with_tools() {
        let call = ToolCall::new("call_1", "weather", serde_json::json!({"location": "Delhi"}));
        let response = AiResponse::with_tools("", vec![call]);
        assert!(response.has_tool_calls());
        assert!(response.is_tool_use());
    }

    #[test]
    fn test_transient_errors() {
        assert!(AiError::with_status("slow down", 429).is_transient());
        assert!(AiError::with_status("bad gateway", 502).is_transient());
        assert!(!AiError::with_status("bad request", 400).is_transient());
        assert!(!AiError::new("no status").is_transient());
    }
}
