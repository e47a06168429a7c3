use super::types::AgentAction;
use std::collections::VecDeque;

/// Pending inter-agent work.
///
/// Planned tasks wait in a FIFO queue. Continuations produced while handling an
/// action (follow-ups, answers, completions, resumed tasks) go onto a stack that is
/// always drained first, so a follow-up chain finishes before the next planned task
/// starts.
#[derive(Debug, Default)]
pub struct ActionQueue {
    tasks: VecDeque<AgentAction>,
    continuations: Vec<AgentAction>,
}

impl ActionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_task(&mut self, action: AgentAction) {
        self.tasks.push_back(action);
    }

    /// `actions` are given in the order they should be processed
    pub fn push_continuations(&mut self, actions: Vec<AgentAction>) {
        self.continuations.extend(actions.into_iter().rev());
    }

    pub fn pop(&mut self) -> Option<AgentAction> {
        self.continuations.pop().or_else(|| self.tasks.pop_front())
    }

    pub fn peek(&self) -> Option<&AgentAction> {
        self.continuations.last().or_else(|| self.tasks.front())
    }

    pub fn len(&self) -> usize {
        self.tasks.len() + self.continuations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty() && self.continuations.is_empty()
    }

    /// Pending actions in processing order
    pub fn iter(&self) -> impl Iterator<Item = &AgentAction> {
        self.continuations.iter().rev().chain(self.tasks.iter())
    }
}
