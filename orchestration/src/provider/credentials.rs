//! Per-provider API key lookup.

use std::collections::HashMap;
use std::fmt;
use std::sync::{PoisonError, RwLock};

use crate::agent::Provider;

/// Key/value secret lookup. `get` returns an empty string when a provider has
/// no key, and callers treat empty as "not configured".
#[derive(Default)]
pub struct CredentialStore {
    keys: RwLock<HashMap<Provider, String>>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `ANTHROPIC_API_KEY`, `OPENAI_API_KEY` and `GEMINI_API_KEY`.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let store = Self::new();
        for provider in Provider::all() {
            if let Some(key) = lookup(provider.credential_env_var()) {
                store.set(*provider, key);
            }
        }
        store
    }

    /// Set or replace a key. An empty key clears it.
    pub fn set(&self, provider: Provider, key: impl Into<String>) {
        let key = key.into();
        let mut keys = self.keys.write().unwrap_or_else(PoisonError::into_inner);
        if key.trim().is_empty() {
            keys.remove(&provider);
        } else {
            keys.insert(provider, key);
        }
    }

    pub fn get(&self, provider: Provider) -> String {
        self.keys
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&provider)
            .cloned()
            .unwrap_or_default()
    }

    pub fn has(&self, provider: Provider) -> bool {
        !self.get(provider).is_empty()
    }
}

impl fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys = self.keys.read().unwrap_or_else(PoisonError::into_inner);
        let mut configured: Vec<String> = keys.keys().map(|p| p.to_string()).collect();
        configured.sort();
        f.debug_struct("CredentialStore")
            .field("configured", &configured)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_is_empty() {
        let store = CredentialStore::new();
        assert_eq!(store.get(Provider::OpenAi), "");
        assert!(!store.has(Provider::OpenAi));
    }

    #[test]
    fn test_from_lookup_reads_vendor_variables() {
        let store = CredentialStore::from_lookup(|name| match name {
            "ANTHROPIC_API_KEY" => Some("sk-ant".to_string()),
            "GEMINI_API_KEY" => Some(String::new()),
            _ => None,
        });
        assert_eq!(store.get(Provider::Anthropic), "sk-ant");
        assert!(!store.has(Provider::Gemini));
        assert!(!store.has(Provider::OpenAi));
    }

    #[test]
    fn test_empty_set_clears() {
        let store = CredentialStore::new();
        store.set(Provider::Gemini, "g-key");
        assert!(store.has(Provider::Gemini));
        store.set(Provider::Gemini, "");
        assert!(!store.has(Provider::Gemini));
    }

    #[test]
    fn test_debug_hides_secrets() {
        let store = CredentialStore::new();
        store.set(Provider::OpenAi, "sk-secret");
        let rendered = format!("{store:?}");
        assert!(rendered.contains("openai"));
        assert!(!rendered.contains("sk-secret"));
    }
}
