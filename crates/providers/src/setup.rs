//! Wires backends up from configuration.

use std::sync::Arc;

use promptwright_config::AppConfig;
use promptwright_core::backend::CredentialLookup;

use crate::catalog::StaticModelCatalog;
use crate::credentials::{ChainedCredentials, EnvCredentials, StaticCredentials};
use crate::openai_compat::{OPENAI_API_KEY, OpenAiCompatBackend};

/// Everything a compiler host needs from this crate.
pub struct Backends {
    /// Serves completions (query rewrite) and embeddings.
    pub openai: Arc<OpenAiCompatBackend>,
    pub catalog: Arc<StaticModelCatalog>,
}

/// Credentials for a config: the configured key first, then the environment.
pub fn credentials_from_config(config: &AppConfig) -> Arc<dyn CredentialLookup> {
    let mut configured = StaticCredentials::new();
    if let Some(key) = &config.api_key {
        configured = configured.with(OPENAI_API_KEY, key.clone());
    }
    Arc::new(ChainedCredentials::new(vec![
        Box::new(configured),
        Box::new(EnvCredentials),
    ]))
}

/// Build backends from configuration.
pub fn build_from_config(config: &AppConfig) -> Backends {
    let credentials = credentials_from_config(config);
    let name = if config.base_url.contains("api.openai.com") {
        "openai"
    } else {
        "custom"
    };

    Backends {
        openai: Arc::new(OpenAiCompatBackend::new(name, &config.base_url, credentials)),
        catalog: Arc::new(StaticModelCatalog::with_overrides(&config.models)),
    }
}
