//! Engine configuration.
//!
//! ## Precedence (highest to lowest)
//!
//! 1. Environment variable overrides (`ORCH_*`)
//! 2. Values from the TOML file passed to [`EngineConfig::load`]
//! 3. Built-in defaults
//!
//! API keys are not part of this file; see [`crate::provider::CredentialStore`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::agent::Provider;
use crate::session::RetentionPolicy;

const DEFAULT_STEP_TIMEOUT_SECS: u64 = 120;
const DEFAULT_ROUNDS: i32 = 3;
const DEFAULT_PROPOSER: &str = "coder";
const DEFAULT_CRITIC: &str = "reviewer";
const DEFAULT_INTEGRATOR: &str = "integrator";

const DEFAULT_ANTHROPIC_URL: &str = "https://api.anthropic.com";
const DEFAULT_OPENAI_URL: &str = "https://api.openai.com";
const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_ANTHROPIC_VERSION: &str = "2023-06-01";

const ENV_STEP_TIMEOUT_SECS: &str = "ORCH_STEP_TIMEOUT_SECS";
const ENV_DEFAULT_ROUNDS: &str = "ORCH_DEFAULT_ROUNDS";
const ENV_MAX_SESSIONS: &str = "ORCH_MAX_SESSIONS";
const ENV_SESSION_TTL_SECS: &str = "ORCH_SESSION_TTL_SECS";
const ENV_ANTHROPIC_URL: &str = "ORCH_ANTHROPIC_URL";
const ENV_OPENAI_URL: &str = "ORCH_OPENAI_URL";
const ENV_GEMINI_URL: &str = "ORCH_GEMINI_URL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Base URLs for each vendor API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderEndpoints {
    pub anthropic: String,
    pub openai: String,
    pub gemini: String,
    /// Value of the `anthropic-version` header.
    pub anthropic_version: String,
}

impl Default for ProviderEndpoints {
    fn default() -> Self {
        Self {
            anthropic: DEFAULT_ANTHROPIC_URL.to_string(),
            openai: DEFAULT_OPENAI_URL.to_string(),
            gemini: DEFAULT_GEMINI_URL.to_string(),
            anthropic_version: DEFAULT_ANTHROPIC_VERSION.to_string(),
        }
    }
}

impl ProviderEndpoints {
    pub fn base_url(&self, provider: Provider) -> &str {
        match provider {
            Provider::Anthropic => &self.anthropic,
            Provider::OpenAi => &self.openai,
            Provider::Gemini => &self.gemini,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Deadline for a single provider call.
    pub step_timeout_secs: u64,
    /// Debate rounds when the caller does not pass a count.
    pub default_rounds: i32,
    pub default_proposer: String,
    pub default_critic: String,
    /// Agent that runs the debate finalize step.
    pub integrator: String,
    /// Agent ids for a sequential run when the caller does not pass a list.
    pub default_sequence: Vec<String>,
    pub retention: RetentionPolicy,
    pub endpoints: ProviderEndpoints,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            step_timeout_secs: DEFAULT_STEP_TIMEOUT_SECS,
            default_rounds: DEFAULT_ROUNDS,
            default_proposer: DEFAULT_PROPOSER.to_string(),
            default_critic: DEFAULT_CRITIC.to_string(),
            integrator: DEFAULT_INTEGRATOR.to_string(),
            default_sequence: vec![
                "architect".to_string(),
                "coder".to_string(),
                "reviewer".to_string(),
            ],
            retention: RetentionPolicy::default(),
            endpoints: ProviderEndpoints::default(),
        }
    }
}

impl EngineConfig {
    /// Load from an optional TOML file, apply `ORCH_*` overrides, validate.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml_str(&text)?
            }
            None => Self::default(),
        };
        config.apply_overrides_from(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Apply overrides from a variable lookup (the process environment in `load`).
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_STEP_TIMEOUT_SECS) {
            self.step_timeout_secs = parse_var(ENV_STEP_TIMEOUT_SECS, &v)?;
        }
        if let Some(v) = lookup(ENV_DEFAULT_ROUNDS) {
            self.default_rounds = parse_var(ENV_DEFAULT_ROUNDS, &v)?;
        }
        if let Some(v) = lookup(ENV_MAX_SESSIONS) {
            self.retention.max_sessions = Some(parse_var(ENV_MAX_SESSIONS, &v)?);
        }
        if let Some(v) = lookup(ENV_SESSION_TTL_SECS) {
            self.retention.max_age_secs = Some(parse_var(ENV_SESSION_TTL_SECS, &v)?);
        }
        if let Some(v) = lookup(ENV_ANTHROPIC_URL) {
            self.endpoints.anthropic = v;
        }
        if let Some(v) = lookup(ENV_OPENAI_URL) {
            self.endpoints.openai = v;
        }
        if let Some(v) = lookup(ENV_GEMINI_URL) {
            self.endpoints.gemini = v;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.step_timeout_secs == 0 {
            return Err(ConfigError::Invalid("step_timeout_secs must be > 0".into()));
        }
        for (field, value) in [
            ("default_proposer", &self.default_proposer),
            ("default_critic", &self.default_critic),
            ("integrator", &self.integrator),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{field} must not be empty")));
            }
        }
        if self.default_sequence.is_empty() {
            return Err(ConfigError::Invalid("default_sequence must not be empty".into()));
        }
        if self.retention.max_sessions == Some(0) {
            return Err(ConfigError::Invalid("retention.max_sessions must be > 0".into()));
        }
        for provider in Provider::all() {
            let url = self.endpoints.base_url(*provider);
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::Invalid(format!(
                    "endpoint for {provider} is not an http(s) URL: {url}"
                )));
            }
        }
        Ok(())
    }

    pub fn step_timeout(&self) -> Duration {
        Duration::from_secs(self.step_timeout_secs)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("{name}: cannot parse {value:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        config.validate().unwrap();
        assert_eq!(config.step_timeout(), Duration::from_secs(120));
        assert_eq!(config.default_rounds, 3);
        assert_eq!(config.integrator, "integrator");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            default_rounds = 1
            default_sequence = ["coder", "tester"]

            [retention]
            max_sessions = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.default_rounds, 1);
        assert_eq!(config.default_sequence, vec!["coder", "tester"]);
        assert_eq!(config.retention.max_sessions, Some(5));
        assert_eq!(config.retention.max_age_secs, Some(24 * 60 * 60));
        assert_eq!(config.step_timeout_secs, 120);
        assert_eq!(config.endpoints, ProviderEndpoints::default());
    }

    #[test]
    fn test_partial_retention_table_keeps_other_limit() {
        let config = EngineConfig::from_toml_str("[retention]\nmax_age_secs = 600\n").unwrap();
        assert_eq!(config.retention.max_age_secs, Some(600));
        assert_eq!(config.retention.max_sessions, Some(100));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("ORCH_STEP_TIMEOUT_SECS", "30"),
            ("ORCH_MAX_SESSIONS", "7"),
            ("ORCH_OPENAI_URL", "http://localhost:8000"),
        ]
        .into_iter()
        .collect();
        let mut config = EngineConfig::default();
        config
            .apply_overrides_from(|name| vars.get(name).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.step_timeout_secs, 30);
        assert_eq!(config.retention.max_sessions, Some(7));
        assert_eq!(config.endpoints.base_url(Provider::OpenAi), "http://localhost:8000");
    }

    #[test]
    fn test_bad_env_value_is_reported() {
        let mut config = EngineConfig::default();
        let err = config
            .apply_overrides_from(|name| (name == "ORCH_DEFAULT_ROUNDS").then(|| "many".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("ORCH_DEFAULT_ROUNDS"));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = EngineConfig {
            step_timeout_secs: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_rejects_non_http_endpoint() {
        let mut config = EngineConfig::default();
        config.endpoints.gemini = "ftp://example".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "integrator = \"architect\"").unwrap();
        writeln!(file, "step_timeout_secs = 45").unwrap();
        let config = EngineConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.integrator, "architect");
    }

    #[test]
    fn test_load_missing_file() {
        let err = EngineConfig::load(Some(Path::new("/nonexistent/orchestration.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_parse_error() {
        let err = EngineConfig::from_toml_str("default_rounds = \"x\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
