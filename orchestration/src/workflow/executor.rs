//! Executes one step: record it as running, call the gateway under a deadline
//! and the session's cancellation token, record the terminal state.

use std::time::{Duration, Instant};

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::agent::Agent;
use crate::error::WorkflowError;
use crate::events::{EventBus, WorkflowEvent};
use crate::prompts;
use crate::provider::{ProviderGateway, ProviderReply};
use crate::session::{SessionStore, WorkflowStep};

/// Everything a driver needs to run steps for one session.
pub struct StepRunner<'a> {
    pub gateway: &'a dyn ProviderGateway,
    pub store: &'a SessionStore,
    pub events: &'a EventBus,
    pub step_timeout: Duration,
    pub cancel: &'a CancellationToken,
    pub session_id: &'a str,
}

impl StepRunner<'_> {
    /// Run one step on `agent` and return its output text.
    ///
    /// On error the step (if created) is already recorded as failed.
    pub async fn execute(&self, agent: &Agent, prompt: &str) -> Result<String, WorkflowError> {
        self.ensure_not_cancelled()?;

        let input = prompts::compose_full_prompt(&agent.system_prompt, prompt);
        let mut step = WorkflowStep::new(agent.id.clone(), input);
        step.start()?;
        self.store
            .update(self.session_id, |s| s.push_step(step.clone()))
            .ok_or_else(|| WorkflowError::SessionNotFound(self.session_id.to_string()))??;

        self.events.publish(WorkflowEvent::StepStarted {
            session_id: self.session_id.to_string(),
            step_id: step.id.clone(),
            agent_id: agent.id.clone(),
            timestamp: Utc::now(),
        });
        debug!(
            session_id = %self.session_id,
            step_id = %step.id,
            agent_id = %agent.id,
            provider = %agent.provider,
            "Step started"
        );

        let started = Instant::now();
        let outcome = self.call(agent, &step.input).await;
        let elapsed = started.elapsed();

        match outcome {
            Ok(reply) => {
                if let Some(warning) = &reply.warning {
                    warn!(session_id = %self.session_id, agent_id = %agent.id, %warning, "Degraded provider response");
                }
                step.complete(reply.text.clone(), reply.warning.clone(), elapsed)?;
                self.record(&step)?;
                self.finished(&step, reply.is_degraded());
                info!(
                    session_id = %self.session_id,
                    agent_id = %agent.id,
                    duration_ms = step.duration_ms.unwrap_or_default(),
                    "Step completed"
                );
                Ok(reply.text)
            }
            Err(err) => {
                step.fail(err.to_string(), elapsed)?;
                if let Err(record_err) = self.record(&step) {
                    debug!(session_id = %self.session_id, error = %record_err, "Failed step not recorded");
                }
                self.finished(&step, false);
                warn!(
                    session_id = %self.session_id,
                    agent_id = %agent.id,
                    category = %err.category(),
                    error = %err,
                    "Step failed"
                );
                Err(err)
            }
        }
    }

    fn ensure_not_cancelled(&self) -> Result<(), WorkflowError> {
        if self.cancel.is_cancelled() {
            return Err(WorkflowError::Cancelled(format!(
                "session {} was cancelled",
                self.session_id
            )));
        }
        Ok(())
    }

    async fn call(&self, agent: &Agent, input: &str) -> Result<ProviderReply, WorkflowError> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(WorkflowError::Cancelled(format!(
                "session {} was cancelled",
                self.session_id
            ))),
            res = tokio::time::timeout(self.step_timeout, self.gateway.send(agent, input)) => match res {
                Ok(Ok(reply)) => Ok(reply),
                Ok(Err(e)) => Err(e.into()),
                Err(_) => Err(WorkflowError::Timeout {
                    agent_id: agent.id.clone(),
                    seconds: self.step_timeout.as_secs(),
                }),
            },
        }
    }

    fn record(&self, step: &WorkflowStep) -> Result<(), WorkflowError> {
        match self.store.update(self.session_id, |s| s.replace_step(step.clone())) {
            Some(true) => Ok(()),
            _ => Err(WorkflowError::SessionNotFound(self.session_id.to_string())),
        }
    }

    fn finished(&self, step: &WorkflowStep, degraded: bool) {
        self.events.publish(WorkflowEvent::StepFinished {
            session_id: self.session_id.to_string(),
            step_id: step.id.clone(),
            agent_id: step.agent_id.clone(),
            status: step.status,
            duration_ms: step.duration_ms.unwrap_or_default(),
            degraded,
            timestamp: Utc::now(),
        });
    }
}
