//! Provider Gateway: send one composed prompt to an agent's backend.
//!
//! The gateway does no prompt composition of its own; callers pass the final
//! text (system prompt already prefixed). Transport and credential problems
//! are errors. A response whose body does not have the expected shape is
//! *not* an error: it degrades to [`NO_RESPONSE_PLACEHOLDER`] with a warning
//! attached, so one odd reply does not abort a multi-step workflow.

mod credentials;
mod http;
pub mod shapes;

use async_trait::async_trait;

pub use credentials::CredentialStore;
pub use http::HttpGateway;

use crate::agent::Agent;
use crate::error::ProviderError;

/// Output substituted when a response carries no extractable text.
pub const NO_RESPONSE_PLACEHOLDER: &str = "No response generated";

/// Text returned by a provider, plus a warning when it was degraded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderReply {
    pub text: String,
    pub warning: Option<String>,
}

impl ProviderReply {
    pub fn complete(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            warning: None,
        }
    }

    /// Placeholder reply for an unexpected response shape.
    pub fn degraded(reason: impl Into<String>) -> Self {
        Self {
            text: NO_RESPONSE_PLACEHOLDER.to_string(),
            warning: Some(reason.into()),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.warning.is_some()
    }
}

/// Single-method capability: prompt in, text out.
#[async_trait]
pub trait ProviderGateway: Send + Sync {
    async fn send(&self, agent: &Agent, prompt: &str) -> Result<ProviderReply, ProviderError>;
}
