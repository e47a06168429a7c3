use super::agent::Agent;
use crate::error::{Result, WorkflowError};
use std::collections::HashMap;
use std::sync::Arc;

/// Immutable name-indexed set of agents, validated once at construction
#[derive(Debug, Default)]
pub struct AgentRegistry {
    agents: Vec<Arc<Agent>>,
    index: HashMap<String, usize>,
}

impl AgentRegistry {
    /// Fails with every conflicting name at once: duplicates within `agents` and
    /// collisions with `reserved`
    pub fn new(agents: Vec<Agent>, reserved: &[&str]) -> Result<Self> {
        let mut index = HashMap::with_capacity(agents.len());
        let mut conflicts: Vec<String> = Vec::new();

        for (position, agent) in agents.iter().enumerate() {
            let name = agent.name();
            let clashes = reserved.iter().any(|r| *r == name) || index.contains_key(name);
            if clashes {
                if !conflicts.iter().any(|c| c == name) {
                    conflicts.push(name.to_string());
                }
            } else {
                index.insert(name.to_string(), position);
            }
        }

        if !conflicts.is_empty() {
            return Err(WorkflowError::DuplicateAgents(conflicts));
        }

        Ok(AgentRegistry {
            agents: agents.into_iter().map(Arc::new).collect(),
            index,
        })
    }

    pub fn get(&self, name: &str) -> Option<Arc<Agent>> {
        self.index.get(name).map(|&i| self.agents[i].clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Lookup that reports the available names on failure
    pub fn require(&self, name: &str) -> Result<Arc<Agent>> {
        self.get(name).ok_or_else(|| WorkflowError::AgentNotFound {
            name: name.to_string(),
            available: self.names(),
        })
    }

    /// Names in registration order
    pub fn names(&self) -> Vec<String> {
        self.agents.iter().map(|a| a.name().to_string()).collect()
    }

    pub fn agents(&self) -> impl Iterator<Item = &Arc<Agent>> {
        self.agents.iter()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::multi_agent::agent::AgentConfig;
    use crate::ai::multi_agent::types::RESERVED_AGENT_NAMES;
    use crate::ai::{AiClient, MockAiClient};

    fn agent(name: &str) -> Agent {
        let model = Arc::new(AiClient::Mock(MockAiClient::new(vec![])));
        Agent::new(AgentConfig::new(name, format!("{} agent", name), model)).unwrap()
    }

    #[test]
    fn test_reports_all_conflicts_together() {
        let err = AgentRegistry::new(
            vec![agent("writer"), agent("router"), agent("writer"), agent("endgame"), agent("writer")],
            &RESERVED_AGENT_NAMES,
        )
        .unwrap_err();

        match err {
            WorkflowError::DuplicateAgents(names) => {
                assert_eq!(names, vec!["router", "writer", "endgame"]);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_legacy_names_are_reserved() {
        for name in ["breakdown", "mastermind", "planner"] {
            assert!(AgentRegistry::new(vec![agent(name)], &RESERVED_AGENT_NAMES).is_err());
        }
    }

    #[test]
    fn test_lookup() {
        let registry =
            AgentRegistry::new(vec![agent("researcher"), agent("writer")], &RESERVED_AGENT_NAMES).unwrap();
        assert_eq!(registry.names(), vec!["researcher", "writer"]);
        assert_eq!(registry.require("writer").unwrap().name(), "writer");

        let err = registry.require("ghost").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Agent 'ghost' not found. Available agents: researcher, writer."
        );
    }
}
