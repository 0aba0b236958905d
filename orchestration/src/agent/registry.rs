//! Agent Registry: process-wide map of agent id → configuration.
//!
//! Each operation takes the lock for its own duration only; running workflows
//! see registrations, updates and removals on their next step.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use super::defaults::default_agents;
use super::types::{Agent, AgentPatch};
use crate::error::WorkflowError;

/// Shared reference to AgentRegistry
pub type SharedAgentRegistry = Arc<AgentRegistry>;

#[derive(Debug, Default)]
pub struct AgentRegistry {
    agents: RwLock<HashMap<String, Agent>>,
}

impl AgentRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded with the built-in agent set.
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        for agent in default_agents() {
            let mut agents = registry.agents.write().unwrap_or_else(PoisonError::into_inner);
            agents.insert(agent.id.clone(), agent);
        }
        registry
    }

    /// Create a shared reference to this registry
    pub fn shared(self) -> SharedAgentRegistry {
        Arc::new(self)
    }

    /// Insert or overwrite by id.
    pub fn register(&self, agent: Agent) -> Result<(), WorkflowError> {
        if agent.id.trim().is_empty() {
            return Err(WorkflowError::InvalidAgent("agent id must not be empty".into()));
        }
        debug!(agent_id = %agent.id, provider = %agent.provider, "Agent registered");
        self.agents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(agent.id.clone(), agent);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<Agent> {
        self.agents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Look up an agent, failing with `AgentNotFound`.
    pub fn resolve(&self, id: &str) -> Result<Agent, WorkflowError> {
        self.get(id)
            .ok_or_else(|| WorkflowError::AgentNotFound(id.to_string()))
    }

    /// All agents, sorted by id.
    pub fn list(&self) -> Vec<Agent> {
        let mut agents: Vec<Agent> = self
            .agents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        agents.sort_by(|a, b| a.id.cmp(&b.id));
        agents
    }

    /// Merge `patch` into the stored agent. Returns false if `id` is unknown.
    pub fn update(&self, id: &str, patch: AgentPatch) -> bool {
        let mut agents = self.agents.write().unwrap_or_else(PoisonError::into_inner);
        match agents.get_mut(id) {
            Some(agent) => {
                agent.apply(patch);
                debug!(agent_id = %id, "Agent updated");
                true
            }
            None => false,
        }
    }

    /// Remove an agent. Returns whether an entry existed.
    pub fn remove(&self, id: &str) -> bool {
        self.agents
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
            .is_some()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.agents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.agents.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Provider;

    fn agent(id: &str) -> Agent {
        Agent::new(id, id, "Tester", Provider::Gemini, "gemini-1.5-pro")
    }

    #[test]
    fn test_register_is_upsert() {
        let registry = AgentRegistry::new();
        registry.register(agent("a")).unwrap();
        registry
            .register(agent("a").with_max_tokens(10))
            .unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("a").unwrap().max_tokens, 10);
    }

    #[test]
    fn test_register_rejects_empty_id() {
        let registry = AgentRegistry::new();
        let err = registry.register(agent("  ")).unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidAgent(_)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_update_unknown_returns_false() {
        let registry = AgentRegistry::new();
        assert!(!registry.update("missing", AgentPatch::default()));
    }

    #[test]
    fn test_update_merges_fields() {
        let registry = AgentRegistry::new();
        registry.register(agent("a")).unwrap();
        let updated = registry.update(
            "a",
            AgentPatch {
                role: Some("Reviewer".into()),
                ..Default::default()
            },
        );
        assert!(updated);
        let stored = registry.get("a").unwrap();
        assert_eq!(stored.role, "Reviewer");
        assert_eq!(stored.model, "gemini-1.5-pro");
    }

    #[test]
    fn test_remove_reports_existence() {
        let registry = AgentRegistry::new();
        registry.register(agent("a")).unwrap();
        assert!(registry.remove("a"));
        assert!(!registry.remove("a"));
        assert!(matches!(
            registry.resolve("a"),
            Err(WorkflowError::AgentNotFound(id)) if id == "a"
        ));
    }

    #[test]
    fn test_with_defaults_contains_workflow_roles() {
        let registry = AgentRegistry::with_defaults();
        for id in ["architect", "coder", "reviewer", "integrator"] {
            assert!(registry.contains(id), "missing default agent {id}");
        }
        let ids: Vec<String> = registry.list().into_iter().map(|a| a.id).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }
}
