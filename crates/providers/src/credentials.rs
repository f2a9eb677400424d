//! Credential lookups.
//!
//! Secrets are never stored by promptwright itself; these adapters read them
//! from the environment or from values the host hands over at startup.

use std::collections::HashMap;

use promptwright_core::backend::CredentialLookup;

use crate::openai_compat::OPENAI_API_KEY;

/// Reads credentials from environment variables.
///
/// `openai_api_key` resolves to `PROMPTWRIGHT_API_KEY`, then `OPENAI_API_KEY`.
/// Any other key resolves to the upper-cased key itself.
#[derive(Debug, Default, Clone)]
pub struct EnvCredentials;

impl EnvCredentials {
    fn var_names(key: &str) -> Vec<String> {
        if key == OPENAI_API_KEY {
            vec!["PROMPTWRIGHT_API_KEY".into(), "OPENAI_API_KEY".into()]
        } else {
            vec![key.to_ascii_uppercase()]
        }
    }
}

impl CredentialLookup for EnvCredentials {
    fn get(&self, key: &str) -> Option<String> {
        Self::var_names(key)
            .into_iter()
            .find_map(|name| std::env::var(name).ok())
            .filter(|value| !value.is_empty())
    }
}

/// Fixed in-memory credentials, e.g. an API key taken from the config file.
#[derive(Default, Clone)]
pub struct StaticCredentials {
    values: HashMap<String, String>,
}

impl StaticCredentials {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }
}

impl std::fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keys: Vec<&String> = self.values.keys().collect();
        f.debug_struct("StaticCredentials").field("keys", &keys).finish()
    }
}

impl CredentialLookup for StaticCredentials {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Tries each lookup in order and returns the first hit.
pub struct ChainedCredentials {
    lookups: Vec<Box<dyn CredentialLookup>>,
}

impl ChainedCredentials {
    pub fn new(lookups: Vec<Box<dyn CredentialLookup>>) -> Self {
        Self { lookups }
    }
}

impl CredentialLookup for ChainedCredentials {
    fn get(&self, key: &str) -> Option<String> {
        self.lookups.iter().find_map(|lookup| lookup.get(key))
    }
}
