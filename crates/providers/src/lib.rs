//! Backend implementations for promptwright.
//!
//! Implements the collaborator traits from `promptwright_core::backend`
//! against OpenAI-compatible HTTP endpoints, plus the built-in model catalog
//! and credential lookups.

pub mod catalog;
pub mod credentials;
pub mod openai_compat;
pub mod setup;

pub use catalog::StaticModelCatalog;
pub use credentials::{ChainedCredentials, EnvCredentials, StaticCredentials};
pub use openai_compat::{OPENAI_API_KEY, OpenAiCompatBackend};
pub use setup::{Backends, build_from_config, credentials_from_config};
