//! Scripted model invoker for tests and offline runs
//!
//! Replays queued responses in order, then falls back to an optional responder
//! closure. Every request is recorded so callers can assert on what each agent saw.

use super::types::{AiError, AiResponse, ToolHistoryEntry};
use super::{Message, MessageRole};
use crate::tools::ToolDefinition;
use parking_lot::Mutex;
use std::collections::VecDeque;

type Responder = Box<dyn Fn(&MockRequest) -> Result<AiResponse, AiError> + Send + Sync>;

/// A request as seen by the mock
#[derive(Debug, Clone)]
pub struct MockRequest {
    pub messages: Vec<Message>,
    pub tool_history: Vec<ToolHistoryEntry>,
    pub tool_names: Vec<String>,
    pub temperature: Option<f32>,
}

impl MockRequest {
    /// The first system message, which agents fill with their description
    pub fn system_prompt(&self) -> &str {
        self.messages
            .iter()
            .find(|m| m.role == MessageRole::System)
            .map(|m| m.content.as_str())
            .unwrap_or("")
    }

    /// True if any system message contains the needle
    pub fn system_contains(&self, needle: &str) -> bool {
        self.messages
            .iter()
            .any(|m| m.role == MessageRole::System && m.content.contains(needle))
    }

    pub fn last_user_message(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == MessageRole::User)
    }
}

pub struct MockAiClient {
    responses: Mutex<VecDeque<Result<AiResponse, AiError>>>,
    responder: Option<Responder>,
    requests: Mutex<Vec<MockRequest>>,
}

impl MockAiClient {
    pub fn new(responses: Vec<Result<AiResponse, AiError>>) -> Self {
        MockAiClient {
            responses: Mutex::new(responses.into()),
            responder: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Text-only script, the common case in workflow tests
    pub fn from_texts<S: Into<String>>(texts: impl IntoIterator<Item = S>) -> Self {
        Self::new(texts.into_iter().map(|t| Ok(AiResponse::text(t))).collect())
    }

    /// Answer every request (after the scripted ones) with a closure
    pub fn from_fn<F>(responder: F) -> Self
    where
        F: Fn(&MockRequest) -> Result<AiResponse, AiError> + Send + Sync + 'static,
    {
        Self::new(vec![]).with_responder(responder)
    }

    pub fn with_responder<F>(mut self, responder: F) -> Self
    where
        F: Fn(&MockRequest) -> Result<AiResponse, AiError> + Send + Sync + 'static,
    {
        self.responder = Some(Box::new(responder));
        self
    }

    pub fn generate(
        &self,
        messages: Vec<Message>,
        tool_history: Vec<ToolHistoryEntry>,
        tools: Vec<ToolDefinition>,
        temperature: Option<f32>,
    ) -> Result<AiResponse, AiError> {
        let request = MockRequest {
            messages,
            tool_history,
            tool_names: tools.into_iter().map(|t| t.name).collect(),
            temperature,
        };

        let scripted = self.responses.lock().pop_front();
        let result = match (scripted, &self.responder) {
            (Some(response), _) => response,
            (None, Some(responder)) => responder(&request),
            (None, None) => Err(AiError::new("MockAiClient: no scripted responses left")),
        };

        self.requests.lock().push(request);
        result
    }

    /// Snapshot of every request received so far
    pub fn requests(&self) -> Vec<MockRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn remaining(&self) -> usize {
        self.responses.lock().len()
    }
}
