//! ZEE multi-agent workflow
//!
//! A goal is broken into tasks by the planner, each task is assigned to a worker by
//! the router, and the resulting requests are drained from an action queue one at a
//! time. Workers reply with a prefix that says what the reply means:
//!
//! - `FOLLOWUP:` the worker needs more information; the router answers with `ANSWER:`
//!   and the worker's task is resumed with that answer
//! - `COMPLETE:` (or no prefix) the task is done and the reply is recorded
//!
//! ## Flow
//!
//! ```text
//! goal → planner → router → action queue → workers ⇄ router → endgame → answer
//! ```
//!
//! Every completed reply lands in the context store. Workers only see the context
//! written by the agents they depend on; the router sees all of it when answering a
//! follow-up. The loop stops when the queue empties or the iteration budget runs out,
//! and the endgame agent compiles the context into the final answer either way.

pub mod agent;
pub mod context;
pub mod orchestrator;
pub mod planning;
pub mod protocol;
pub mod queue;
pub mod registry;
pub mod tools;
pub mod types;

pub use agent::{Agent, AgentConfig};
pub use context::{ContextStore, ContextView};
pub use orchestrator::{WorkflowResponse, ZeeWorkflow, ZeeWorkflowOptions};
pub use protocol::AgentReply;
pub use queue::ActionQueue;
pub use registry::AgentRegistry;
pub use tools::ExecuteAgentTool;
pub use types::{
    ActionKind, AgentAction, ContextItem, Dependency, FollowupOrigin, RawTask, ZeeTask,
};
