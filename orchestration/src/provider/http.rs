//! reqwest-backed gateway that talks to the real vendor APIs.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use super::credentials::CredentialStore;
use super::shapes;
use super::{ProviderGateway, ProviderReply};
use crate::agent::{Agent, Provider};
use crate::config::ProviderEndpoints;
use crate::error::ProviderError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Dispatches by `agent.provider` to the matching vendor envelope.
///
/// No request-level timeout is set here; the step deadline is enforced by the
/// workflow executor around the whole call.
pub struct HttpGateway {
    client: reqwest::Client,
    endpoints: ProviderEndpoints,
    credentials: Arc<CredentialStore>,
}

impl HttpGateway {
    pub fn new(
        endpoints: ProviderEndpoints,
        credentials: Arc<CredentialStore>,
    ) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| ProviderError::InvalidConfig(e.to_string()))?;
        Ok(Self::with_client(client, endpoints, credentials))
    }

    pub fn with_client(
        client: reqwest::Client,
        endpoints: ProviderEndpoints,
        credentials: Arc<CredentialStore>,
    ) -> Self {
        Self {
            client,
            endpoints,
            credentials,
        }
    }

    fn url(&self, agent: &Agent) -> String {
        format!(
            "{}{}",
            self.endpoints.base_url(agent.provider).trim_end_matches('/'),
            shapes::endpoint_path(agent)
        )
    }
}

#[async_trait]
impl ProviderGateway for HttpGateway {
    async fn send(&self, agent: &Agent, prompt: &str) -> Result<ProviderReply, ProviderError> {
        let provider = agent.provider;
        let api_key = self.credentials.get(provider);
        if api_key.is_empty() {
            return Err(ProviderError::MissingCredential(provider));
        }

        let request = self
            .client
            .post(self.url(agent))
            .json(&shapes::build_request(agent, prompt));
        let request = match provider {
            Provider::Anthropic => request
                .header("x-api-key", api_key.as_str())
                .header("anthropic-version", self.endpoints.anthropic_version.as_str()),
            Provider::OpenAi => request.bearer_auth(&api_key),
            Provider::Gemini => request.header("x-goog-api-key", api_key.as_str()),
        };

        debug!(agent_id = %agent.id, %provider, model = %agent.model, "Sending provider request");

        let response = request.send().await.map_err(|e| ProviderError::Request {
            provider,
            message: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Status {
                provider,
                status: status.as_u16(),
                body,
            });
        }

        let raw = response.text().await.map_err(|e| ProviderError::Request {
            provider,
            message: e.to_string(),
        })?;

        let body: Value = match serde_json::from_str(&raw) {
            Ok(body) => body,
            Err(e) => {
                warn!(agent_id = %agent.id, %provider, error = %e, "Unparseable provider response");
                return Ok(ProviderReply::degraded(format!(
                    "{provider} response was not valid JSON: {e}"
                )));
            }
        };

        match shapes::extract_text(provider, &body) {
            Some(text) => Ok(ProviderReply::complete(text)),
            None => {
                warn!(agent_id = %agent.id, %provider, "Provider response had no generated text");
                Ok(ProviderReply::degraded(format!(
                    "{provider} response had no generated text"
                )))
            }
        }
    }
}
