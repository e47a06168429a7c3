//! Multi-agent workflow orchestration.
//!
//! A [`ZeeWorkflow`] turns a goal into planned tasks, routes them to worker agents
//! and compiles their results into a single answer.

pub mod ai;
pub mod config;
pub mod error;
pub mod events;
pub mod tools;

pub use ai::multi_agent::{Agent, AgentConfig, WorkflowResponse, ZeeWorkflow, ZeeWorkflowOptions};
pub use ai::{AiClient, Message, MockAiClient, OpenAIClient};
pub use config::{Config, WorkflowConfig};
pub use error::{Result, WorkflowError};
pub use events::{EventBroadcaster, EventType, WorkflowEvent};
