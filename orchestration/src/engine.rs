//! The orchestration engine: owns agents, sessions and the provider gateway,
//! and exposes the caller-facing API.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::agent::{Agent, AgentPatch, AgentRegistry, Provider, SharedAgentRegistry};
use crate::config::EngineConfig;
use crate::error::{ProviderError, RunError, WorkflowError};
use crate::events::{EventBus, WorkflowEvent};
use crate::provider::{CredentialStore, HttpGateway, ProviderGateway};
use crate::session::{SessionStore, Status, WorkflowContext, WorkflowSession, WorkflowType};
use crate::synthesis;
use crate::workflow::{debate, sequential, DebatePlan, StepRunner};

const TITLE_GOAL_CHARS: usize = 80;

enum Plan {
    Debate(DebatePlan),
    Sequential(Vec<String>),
}

pub struct Engine {
    config: EngineConfig,
    registry: SharedAgentRegistry,
    sessions: SessionStore,
    gateway: Arc<dyn ProviderGateway>,
    credentials: Arc<CredentialStore>,
    events: EventBus,
    /// Cancellation tokens of sessions whose driver is still running.
    running: Mutex<HashMap<String, CancellationToken>>,
}

impl Engine {
    /// Engine backed by the real vendor APIs.
    pub fn new(config: EngineConfig, credentials: CredentialStore) -> Result<Self, ProviderError> {
        let credentials = Arc::new(credentials);
        let gateway = HttpGateway::new(config.endpoints.clone(), Arc::clone(&credentials))?;
        Ok(Self::with_gateway(config, Arc::new(gateway), credentials))
    }

    /// Engine with a caller-supplied gateway and the default agent set.
    pub fn with_gateway(
        config: EngineConfig,
        gateway: Arc<dyn ProviderGateway>,
        credentials: Arc<CredentialStore>,
    ) -> Self {
        let sessions = SessionStore::new(config.retention.clone());
        Self {
            config,
            registry: AgentRegistry::with_defaults().shared(),
            sessions,
            gateway,
            credentials,
            events: EventBus::new(),
            running: Mutex::new(HashMap::new()),
        }
    }

    /// Replace the agent registry, e.g. to share one between engines.
    pub fn with_registry(mut self, registry: SharedAgentRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Wrap in an `Arc` so runs can be spawned onto other tasks.
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Configuration this engine was built with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The agent registry; clone it into `with_registry` to share agents
    /// with another engine.
    pub fn registry(&self) -> &SharedAgentRegistry {
        &self.registry
    }

    // ── Workflows ──────────────────────────────────────────────────────────

    /// Run a debate. Unset participants and round count fall back to config.
    pub async fn run_debate_workflow(
        &self,
        context: WorkflowContext,
        proposer_id: Option<&str>,
        critic_id: Option<&str>,
        rounds: Option<i32>,
    ) -> Result<WorkflowSession, RunError> {
        let plan = DebatePlan {
            proposer_id: proposer_id.unwrap_or(&self.config.default_proposer).to_string(),
            critic_id: critic_id.unwrap_or(&self.config.default_critic).to_string(),
            integrator_id: self.config.integrator.clone(),
            rounds: rounds.unwrap_or(self.config.default_rounds),
        };
        let title = format!("Debate: {}", title_goal(&context));
        let description = format!(
            "{} proposes, {} reviews, {} integrates; {} round(s)",
            plan.proposer_id, plan.critic_id, plan.integrator_id, plan.rounds
        );
        let session = WorkflowSession::new(WorkflowType::Debate, title, description, context);
        self.run(session, Plan::Debate(plan)).await
    }

    /// Run a sequential pipeline. Unset ids fall back to `default_sequence`.
    pub async fn run_sequential_workflow(
        &self,
        context: WorkflowContext,
        agent_ids: Option<Vec<String>>,
    ) -> Result<WorkflowSession, RunError> {
        let agent_ids = agent_ids.unwrap_or_else(|| self.config.default_sequence.clone());
        let title = format!("Sequential: {}", title_goal(&context));
        let description = format!("Pipeline: {}", agent_ids.join(" → "));
        let session = WorkflowSession::new(WorkflowType::Sequential, title, description, context);
        self.run(session, Plan::Sequential(agent_ids)).await
    }

    async fn run(&self, mut session: WorkflowSession, plan: Plan) -> Result<WorkflowSession, RunError> {
        let session_id = session.id.clone();
        let workflow_type = session.workflow_type;
        let context = session.context.clone();

        session
            .start()
            .map_err(|e| RunError::new(session_id.clone(), e.into()))?;
        let cancel = CancellationToken::new();
        self.running().insert(session_id.clone(), cancel.clone());
        let evicted = self.sessions.insert(session);

        self.events.publish(WorkflowEvent::SessionStarted {
            session_id: session_id.clone(),
            workflow_type,
            timestamp: Utc::now(),
        });
        info!(session_id = %session_id, workflow = %workflow_type, evicted, "Workflow session started");

        let runner = StepRunner {
            gateway: self.gateway.as_ref(),
            store: &self.sessions,
            events: &self.events,
            step_timeout: self.config.step_timeout(),
            cancel: &cancel,
            session_id: &session_id,
        };
        let outcome = match &plan {
            Plan::Debate(plan) => debate::drive(&runner, &self.registry, &context, plan).await,
            Plan::Sequential(ids) => sequential::drive(&runner, &self.registry, &context, ids).await,
        };
        self.running().remove(&session_id);

        let completed = outcome.and_then(|final_output| {
            self.sessions
                .update(&session_id, |s| -> Result<WorkflowSession, WorkflowError> {
                    let result = synthesis::synthesize(&final_output, &s.steps, context.code());
                    s.complete(result)?;
                    Ok(s.clone())
                })
                .unwrap_or_else(|| Err(WorkflowError::SessionNotFound(session_id.clone())))
        });

        match completed {
            Ok(session) => {
                let confidence = session.result.as_ref().map(|r| r.confidence).unwrap_or_default();
                self.events.publish(WorkflowEvent::SessionFinished {
                    session_id: session_id.clone(),
                    status: Status::Completed,
                    error: None,
                    timestamp: Utc::now(),
                });
                info!(
                    session_id = %session_id,
                    steps = session.steps.len(),
                    confidence,
                    "Workflow session completed"
                );
                Ok(session)
            }
            Err(err) => {
                self.fail_session(&session_id, &err);
                Err(RunError::new(session_id, err))
            }
        }
    }

    fn fail_session(&self, session_id: &str, err: &WorkflowError) {
        let message = err.to_string();
        self.sessions.update(session_id, |s| {
            if !s.is_terminal() {
                let _ = s.fail(message.clone());
            }
        });
        self.events.publish(WorkflowEvent::SessionFinished {
            session_id: session_id.to_string(),
            status: Status::Failed,
            error: Some(message),
            timestamp: Utc::now(),
        });
        warn!(session_id = %session_id, category = %err.category(), error = %err, "Workflow session failed");
    }

    fn running(&self) -> MutexGuard<'_, HashMap<String, CancellationToken>> {
        self.running.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── Sessions ───────────────────────────────────────────────────────────

    /// Snapshot of a session, including one that is still running.
    pub fn get_session(&self, id: &str) -> Option<WorkflowSession> {
        self.sessions.get(id)
    }

    /// All retained sessions, oldest first.
    pub fn list_sessions(&self) -> Vec<WorkflowSession> {
        self.sessions.list()
    }

    /// Remove a session, cancelling it first if it is still running.
    pub fn delete_session(&self, id: &str) -> bool {
        self.cancel_session(id);
        self.sessions.remove(id).is_some()
    }

    /// Request cancellation of a running session. Returns false if it is not running.
    pub fn cancel_session(&self, id: &str) -> bool {
        match self.running().get(id) {
            Some(token) => {
                token.cancel();
                info!(session_id = %id, "Workflow session cancellation requested");
                true
            }
            None => false,
        }
    }

    /// Apply the retention policy now. Returns the number of evicted sessions.
    pub fn prune_sessions(&self) -> usize {
        self.sessions.prune()
    }

    // ── Agents ─────────────────────────────────────────────────────────────

    /// Current configuration of one agent.
    pub fn get_agent(&self, id: &str) -> Option<Agent> {
        self.registry.get(id)
    }

    /// All registered agents, sorted by id.
    pub fn list_agents(&self) -> Vec<Agent> {
        self.registry.list()
    }

    /// Register an agent, replacing any agent with the same id.
    pub fn add_agent(&self, agent: Agent) -> Result<(), WorkflowError> {
        self.registry.register(agent)
    }

    /// Merge a patch into an agent. Running workflows pick it up on their
    /// next step. Returns false if the id is unknown.
    pub fn update_agent(&self, id: &str, patch: AgentPatch) -> bool {
        self.registry.update(id, patch)
    }

    /// Remove an agent. Returns whether it existed.
    pub fn delete_agent(&self, id: &str) -> bool {
        self.registry.remove(id)
    }

    // ── Credentials and events ────────────────────────────────────────────

    /// Store an API key for `provider`. An empty key clears it.
    pub fn set_credential(&self, provider: Provider, key: impl Into<String>) {
        self.credentials.set(provider, key);
    }

    /// Whether a non-empty key is stored for `provider`.
    pub fn has_credential(&self, provider: Provider) -> bool {
        self.credentials.has(provider)
    }

    /// Receive progress events for every run started after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.events.subscribe()
    }
}

fn title_goal(context: &WorkflowContext) -> String {
    let goal = context.goal().trim();
    if goal.is_empty() {
        return "code improvement".to_string();
    }
    let mut title: String = goal.chars().take(TITLE_GOAL_CHARS).collect();
    if goal.chars().count() > TITLE_GOAL_CHARS {
        title.push('…');
    }
    title
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_engine() -> Engine {
        Engine::new(EngineConfig::default(), CredentialStore::new()).unwrap()
    }

    #[test]
    fn test_engine_starts_with_default_agents() {
        let engine = offline_engine();
        assert!(engine.get_agent("integrator").is_some());
        assert!(engine.list_agents().len() >= 4);
        assert!(engine.list_sessions().is_empty());
    }

    #[test]
    fn test_agent_crud() {
        let engine = offline_engine();
        let agent = Agent::new("docs", "Doc Writer", "Technical Writer", Provider::Gemini, "gemini-1.5-pro");
        engine.add_agent(agent).unwrap();
        assert!(engine.update_agent(
            "docs",
            AgentPatch {
                temperature: Some(0.7),
                ..Default::default()
            }
        ));
        assert!((engine.get_agent("docs").unwrap().temperature - 0.7).abs() < f32::EPSILON);
        assert!(engine.delete_agent("docs"));
        assert!(engine.get_agent("docs").is_none());
        assert!(!engine.delete_agent("docs"));
    }

    #[test]
    fn test_set_credential() {
        let engine = offline_engine();
        assert!(!engine.has_credential(Provider::Anthropic));
        engine.set_credential(Provider::Anthropic, "sk-ant");
        assert!(engine.has_credential(Provider::Anthropic));
    }

    #[test]
    fn test_cancel_unknown_session() {
        let engine = offline_engine();
        assert!(!engine.cancel_session("missing"));
        assert!(!engine.delete_session("missing"));
    }

    #[test]
    fn test_title_goal() {
        assert_eq!(title_goal(&WorkflowContext::new()), "code improvement");
        let long = "x".repeat(100);
        let title = title_goal(&WorkflowContext::new().with_goal(long));
        assert_eq!(title.chars().count(), TITLE_GOAL_CHARS + 1);
    }
}
