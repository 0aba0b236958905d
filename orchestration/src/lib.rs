//! Multi-agent workflow orchestration.
//!
//! Drives independent LLM agents through structured multi-step conversations
//! and synthesizes a result from the step history.
//!
//! # Workflows
//!
//! - **Debate**: a proposer and a critic alternate for N rounds; an integrator
//!   then merges the last proposal with the last review (`2N + 1` steps).
//! - **Sequential**: an ordered list of agents, each building on the previous
//!   agent's output and the running narrative.
//!
//! # Failure policy
//!
//! An unknown agent id, a missing credential or a failed provider call aborts
//! the run: the step (if one was created) and the session are marked failed,
//! the caller gets a [`RunError`], and the partial session stays queryable by
//! id. A reply with an unexpected shape does not abort; it degrades to a
//! placeholder and the step carries a warning.
//!
//! # Usage
//!
//! ```no_run
//! use orchestration::{CredentialStore, Engine, EngineConfig, WorkflowContext};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let engine = Engine::new(EngineConfig::load(None)?, CredentialStore::from_env())?;
//! let context = WorkflowContext::new()
//!     .with_goal("add input validation")
//!     .with_code("function f(x){return x}");
//! let session = engine
//!     .run_sequential_workflow(context, Some(vec!["architect".into(), "coder".into()]))
//!     .await?;
//! println!("{}", session.result.map(|r| r.final_output).unwrap_or_default());
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod prompts;
pub mod provider;
pub mod session;
pub mod synthesis;
pub mod workflow;

pub use agent::{Agent, AgentPatch, AgentRegistry, Provider};
pub use config::{ConfigError, EngineConfig, ProviderEndpoints};
pub use engine::Engine;
pub use error::{ErrorCategory, ProviderError, RunError, WorkflowError};
pub use events::WorkflowEvent;
pub use provider::{CredentialStore, ProviderGateway, ProviderReply, NO_RESPONSE_PLACEHOLDER};
pub use session::{
    CodeChange, RetentionPolicy, Status, WorkflowContext, WorkflowResult, WorkflowSession,
    WorkflowStep, WorkflowType,
};
