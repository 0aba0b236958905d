//! Session and step records.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::state::{Status, TransitionError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowType {
    Debate,
    Sequential,
}

impl fmt::Display for WorkflowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Debate => write!(f, "debate"),
            Self::Sequential => write!(f, "sequential"),
        }
    }
}

/// Caller-supplied task description. Read-only to the drivers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowContext {
    pub project_path: Option<String>,
    pub selected_code: Option<String>,
    pub file_path: Option<String>,
    pub user_goal: Option<String>,
    pub additional_context: Option<String>,
}

impl WorkflowContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_goal(mut self, goal: impl Into<String>) -> Self {
        self.user_goal = Some(goal.into());
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.selected_code = Some(code.into());
        self
    }

    pub fn with_file_path(mut self, path: impl Into<String>) -> Self {
        self.file_path = Some(path.into());
        self
    }

    pub fn with_project_path(mut self, path: impl Into<String>) -> Self {
        self.project_path = Some(path.into());
        self
    }

    pub fn with_additional_context(mut self, text: impl Into<String>) -> Self {
        self.additional_context = Some(text.into());
        self
    }

    pub fn goal(&self) -> &str {
        self.user_goal.as_deref().unwrap_or_default()
    }

    pub fn code(&self) -> &str {
        self.selected_code.as_deref().unwrap_or_default()
    }
}

/// Before/after record for one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeChange {
    pub file_path: String,
    pub original_code: String,
    pub modified_code: String,
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowResult {
    pub final_output: String,
    /// 0–100.
    pub confidence: u8,
    pub recommendations: Vec<String>,
    pub changes: Vec<CodeChange>,
}

/// One request/response exchange with one agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub id: String,
    /// Literal agent id at the time of the call; not kept in sync with the registry.
    pub agent_id: String,
    /// Fully composed prompt that was sent.
    pub input: String,
    pub output: Option<String>,
    pub status: Status,
    pub timestamp: DateTime<Utc>,
    pub duration_ms: Option<u64>,
    /// Set when the provider reply was degraded to a placeholder.
    pub warning: Option<String>,
}

impl WorkflowStep {
    pub fn new(agent_id: impl Into<String>, input: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            agent_id: agent_id.into(),
            input: input.into(),
            output: None,
            status: Status::Pending,
            timestamp: Utc::now(),
            duration_ms: None,
            warning: None,
        }
    }

    pub fn start(&mut self) -> Result<(), TransitionError> {
        self.status.check_transition(Status::Running, "step")?;
        self.status = Status::Running;
        Ok(())
    }

    pub fn complete(
        &mut self,
        output: impl Into<String>,
        warning: Option<String>,
        duration: Duration,
    ) -> Result<(), TransitionError> {
        self.status.check_transition(Status::Completed, "step")?;
        self.status = Status::Completed;
        self.output = Some(output.into());
        self.warning = warning;
        self.duration_ms = Some(duration_ms(duration));
        Ok(())
    }

    /// Mark failed; the error description becomes the output.
    pub fn fail(&mut self, message: impl Into<String>, duration: Duration) -> Result<(), TransitionError> {
        self.status.check_transition(Status::Failed, "step")?;
        self.status = Status::Failed;
        self.output = Some(message.into());
        self.duration_ms = Some(duration_ms(duration));
        Ok(())
    }

    /// Output of a completed step.
    pub fn completed_output(&self) -> Option<&str> {
        match self.status {
            Status::Completed => self.output.as_deref(),
            _ => None,
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// One end-to-end workflow execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSession {
    pub id: String,
    #[serde(rename = "type")]
    pub workflow_type: WorkflowType,
    pub title: String,
    pub description: String,
    pub status: Status,
    pub steps: Vec<WorkflowStep>,
    pub context: WorkflowContext,
    /// Present iff `status == Completed`.
    pub result: Option<WorkflowResult>,
    /// Failure description when `status == Failed`.
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkflowSession {
    pub fn new(
        workflow_type: WorkflowType,
        title: impl Into<String>,
        description: impl Into<String>,
        context: WorkflowContext,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            workflow_type,
            title: title.into(),
            description: description.into(),
            status: Status::Pending,
            steps: Vec::new(),
            context,
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn start(&mut self) -> Result<(), TransitionError> {
        self.status.check_transition(Status::Running, "session")?;
        self.status = Status::Running;
        self.touch();
        Ok(())
    }

    /// Append a step. Only a running session accepts steps.
    pub fn push_step(&mut self, step: WorkflowStep) -> Result<(), TransitionError> {
        if self.status != Status::Running {
            return Err(TransitionError {
                entity: "session",
                from: self.status,
                to: Status::Running,
            });
        }
        self.steps.push(step);
        self.touch();
        Ok(())
    }

    /// Overwrite the step with the same id. Returns false if none matches.
    pub fn replace_step(&mut self, step: WorkflowStep) -> bool {
        match self.steps.iter_mut().find(|s| s.id == step.id) {
            Some(slot) => {
                *slot = step;
                self.touch();
                true
            }
            None => false,
        }
    }

    pub fn complete(&mut self, result: WorkflowResult) -> Result<(), TransitionError> {
        self.status.check_transition(Status::Completed, "session")?;
        self.status = Status::Completed;
        self.result = Some(result);
        self.touch();
        Ok(())
    }

    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), TransitionError> {
        self.status.check_transition(Status::Failed, "session")?;
        self.status = Status::Failed;
        self.result = None;
        self.error = Some(message.into());
        self.touch();
        Ok(())
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
