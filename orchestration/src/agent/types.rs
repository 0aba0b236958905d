//! Agent identity: who answers a step, on which backend, with what budget.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Backend vendor an agent is served by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Anthropic,
    OpenAi,
    Gemini,
}

impl Provider {
    /// Environment variable holding this provider's API key.
    pub fn credential_env_var(self) -> &'static str {
        match self {
            Self::Anthropic => "ANTHROPIC_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Gemini => "GEMINI_API_KEY",
        }
    }

    pub fn all() -> &'static [Provider] {
        &[Provider::Anthropic, Provider::OpenAi, Provider::Gemini]
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Anthropic => write!(f, "anthropic"),
            Self::OpenAi => write!(f, "openai"),
            Self::Gemini => write!(f, "gemini"),
        }
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "anthropic" | "claude" => Ok(Self::Anthropic),
            "openai" | "gpt" => Ok(Self::OpenAi),
            "gemini" | "google" => Ok(Self::Gemini),
            other => Err(format!("unknown provider: {other}")),
        }
    }
}

/// A reusable AI persona.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    /// Unique, stable registry key.
    pub id: String,
    /// Display name; used when rendering one agent's output for another.
    pub name: String,
    /// Human-readable role label, e.g. "Software Architect".
    pub role: String,
    /// Prefixed to every prompt sent under this agent.
    pub system_prompt: String,
    /// Sampling temperature, 0.0–1.0.
    pub temperature: f32,
    /// Output token budget.
    pub max_tokens: u32,
    /// Vendor model identifier.
    pub model: String,
    pub provider: Provider,
}

impl Agent {
    /// New agent with an empty system prompt, temperature 0.3 and a
    /// 4096-token output budget.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        role: impl Into<String>,
        provider: Provider,
        model: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role: role.into(),
            system_prompt: String::new(),
            temperature: 0.3,
            max_tokens: 4096,
            model: model.into(),
            provider,
        }
    }

    /// Text prefixed to every prompt this agent receives.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// Sampling temperature forwarded to the provider unchanged.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Output token budget forwarded to the provider.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Merge the set fields of `patch` into this agent. The id never changes.
    pub fn apply(&mut self, patch: AgentPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(role) = patch.role {
            self.role = role;
        }
        if let Some(system_prompt) = patch.system_prompt {
            self.system_prompt = system_prompt;
        }
        if let Some(temperature) = patch.temperature {
            self.temperature = temperature;
        }
        if let Some(max_tokens) = patch.max_tokens {
            self.max_tokens = max_tokens;
        }
        if let Some(model) = patch.model {
            self.model = model;
        }
        if let Some(provider) = patch.provider {
            self.provider = provider;
        }
    }
}

/// Partial update for `AgentRegistry::update`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentPatch {
    pub name: Option<String>,
    pub role: Option<String>,
    pub system_prompt: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub model: Option<String>,
    pub provider: Option<Provider>,
}
