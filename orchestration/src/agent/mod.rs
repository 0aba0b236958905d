//! Agents and the registry that holds them.

mod defaults;
mod registry;
mod types;

pub use defaults::default_agents;
pub use registry::{AgentRegistry, SharedAgentRegistry};
pub use types::{Agent, AgentPatch, Provider};
