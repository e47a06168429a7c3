//! Workflow progress events and their fan-out

pub mod broadcaster;
pub mod protocol;

pub use broadcaster::EventBroadcaster;
pub use protocol::{EventType, WorkflowEvent};
