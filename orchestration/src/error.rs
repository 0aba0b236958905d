//! Error taxonomy for the workflow engine.
//!
//! | Type            | Raised by                   | Meaning                                    |
//! |-----------------|-----------------------------|--------------------------------------------|
//! | `ProviderError` | `provider::ProviderGateway` | one vendor call failed                     |
//! | `WorkflowError` | drivers, engine             | a workflow run (or engine call) failed     |
//! | `RunError`      | `Engine::run_*`             | `WorkflowError` + id of the failed session |
//!
//! Nothing in this crate retries. `ErrorCategory::is_retriable` is advisory
//! for callers that wrap the engine with their own retry policy.

use std::fmt;

use thiserror::Error;

use crate::agent::Provider;
use crate::session::TransitionError;

/// Failure of a single provider call.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// No API key configured for the provider. Raised before any network I/O.
    #[error("API key not configured for {0}")]
    MissingCredential(Provider),

    /// Transport-level failure (connect, TLS, body read).
    #[error("request to {provider} failed: {message}")]
    Request { provider: Provider, message: String },

    /// The vendor answered with a non-success HTTP status.
    #[error("{provider} API error ({status}): {body}")]
    Status {
        provider: Provider,
        status: u16,
        body: String,
    },

    /// The HTTP client could not be constructed.
    #[error("invalid provider configuration: {0}")]
    InvalidConfig(String),
}

impl ProviderError {
    /// Whether the vendor rejected the credential itself (401/403).
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self, Self::Status { status: 401 | 403, .. })
    }
}

/// Coarse classification used for logging and by callers deciding on retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Unknown agent id or invalid agent definition.
    Configuration,
    /// Missing or rejected provider credential.
    Authentication,
    /// Network failure or non-success vendor response.
    ProviderCall,
    /// A step exceeded its deadline.
    Timeout,
    /// The session was cancelled.
    Cancelled,
    /// Illegal state transition or missing session record.
    Internal,
}

impl ErrorCategory {
    pub fn is_retriable(self) -> bool {
        matches!(self, Self::ProviderCall | Self::Timeout)
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "configuration"),
            Self::Authentication => write!(f, "authentication"),
            Self::ProviderCall => write!(f, "provider_call"),
            Self::Timeout => write!(f, "timeout"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

/// Engine-level error.
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// A workflow referenced an agent id that is not registered.
    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    /// Agent definition rejected by the registry.
    #[error("Invalid agent: {0}")]
    InvalidAgent(String),

    /// Missing or rejected provider credential.
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Vendor call failed.
    #[error("Provider call failed: {0}")]
    ProviderCall(String),

    /// The provider did not answer within the step deadline.
    #[error("Step for agent {agent_id} timed out after {seconds}s")]
    Timeout { agent_id: String, seconds: u64 },

    /// The session was cancelled by the caller.
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// The session record is gone (deleted while running, or never existed).
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error(transparent)]
    Transition(#[from] TransitionError),
}

impl WorkflowError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::AgentNotFound(_) | Self::InvalidAgent(_) => ErrorCategory::Configuration,
            Self::Authentication(_) => ErrorCategory::Authentication,
            Self::ProviderCall(_) => ErrorCategory::ProviderCall,
            Self::Timeout { .. } => ErrorCategory::Timeout,
            Self::Cancelled(_) => ErrorCategory::Cancelled,
            Self::SessionNotFound(_) | Self::Transition(_) => ErrorCategory::Internal,
        }
    }
}

impl From<ProviderError> for WorkflowError {
    fn from(err: ProviderError) -> Self {
        if matches!(err, ProviderError::MissingCredential(_)) || err.is_auth_rejection() {
            Self::Authentication(err.to_string())
        } else {
            Self::ProviderCall(err.to_string())
        }
    }
}

/// A workflow run that ended in the `failed` state.
///
/// The session record, including every step recorded before the abort, stays
/// in the engine under `session_id`.
#[derive(Debug, Error)]
#[error("workflow session {session_id} failed: {source}")]
pub struct RunError {
    pub session_id: String,
    #[source]
    pub source: WorkflowError,
}

impl RunError {
    pub fn new(session_id: impl Into<String>, source: WorkflowError) -> Self {
        Self {
            session_id: session_id.into(),
            source,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        self.source.category()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credential_maps_to_authentication() {
        let err: WorkflowError = ProviderError::MissingCredential(Provider::Anthropic).into();
        assert_eq!(err.category(), ErrorCategory::Authentication);
        assert!(err.to_string().contains("anthropic"));
    }

    #[test]
    fn unauthorized_status_maps_to_authentication() {
        let err: WorkflowError = ProviderError::Status {
            provider: Provider::OpenAi,
            status: 401,
            body: "invalid key".into(),
        }
        .into();
        assert_eq!(err.category(), ErrorCategory::Authentication);
    }

    #[test]
    fn server_error_maps_to_provider_call() {
        let err: WorkflowError = ProviderError::Status {
            provider: Provider::Gemini,
            status: 503,
            body: "overloaded".into(),
        }
        .into();
        assert_eq!(err.category(), ErrorCategory::ProviderCall);
        assert!(err.category().is_retriable());
        assert!(err.to_string().contains("503"));
    }

    #[test]
    fn configuration_errors_are_terminal() {
        let err = WorkflowError::AgentNotFound("ghost".into());
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert!(!err.category().is_retriable());
        assert_eq!(err.to_string(), "Agent not found: ghost");
    }

    #[test]
    fn run_error_keeps_session_id() {
        let err = RunError::new("s-1", WorkflowError::Cancelled("by caller".into()));
        assert_eq!(err.session_id, "s-1");
        assert_eq!(err.category(), ErrorCategory::Cancelled);
        assert!(err.to_string().contains("s-1"));
    }
}
