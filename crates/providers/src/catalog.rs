//! Built-in model catalog: context window sizes for known models.

use std::collections::HashMap;

use promptwright_core::backend::ModelCatalog;

/// Context windows of the models promptwright knows out of the box.
const BUILTIN_MODELS: &[(&str, usize)] = &[
    ("gpt-3.5-turbo", 4097),
    ("gpt-3.5-turbo-16k", 16384),
    ("gpt-4", 8192),
    ("gpt-4-32k", 32768),
    ("gpt-4o", 128000),
    ("text-davinci-003", 4097),
    ("text-curie-001", 2049),
    ("text-babbage-001", 2049),
    ("text-ada-001", 2049),
];

/// A model catalog backed by a fixed table plus user overrides.
#[derive(Debug, Clone)]
pub struct StaticModelCatalog {
    models: HashMap<String, usize>,
}

impl StaticModelCatalog {
    /// The built-in table only.
    pub fn builtin() -> Self {
        let models = BUILTIN_MODELS
            .iter()
            .map(|(name, max)| (name.to_string(), *max))
            .collect();
        Self { models }
    }

    /// The built-in table with `overrides` layered on top.
    pub fn with_overrides(overrides: &HashMap<String, usize>) -> Self {
        let mut catalog = Self::builtin();
        catalog
            .models
            .extend(overrides.iter().map(|(k, v)| (k.clone(), *v)));
        catalog
    }

    /// All known models, sorted by name.
    pub fn models(&self) -> Vec<(&str, usize)> {
        let mut list: Vec<(&str, usize)> =
            self.models.iter().map(|(k, v)| (k.as_str(), *v)).collect();
        list.sort_by(|a, b| a.0.cmp(b.0));
        list
    }
}

impl Default for StaticModelCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ModelCatalog for StaticModelCatalog {
    fn max_tokens(&self, model: &str) -> Option<usize> {
        self.models.get(model).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_models_known() {
        let catalog = StaticModelCatalog::builtin();
        assert_eq!(catalog.max_tokens("gpt-3.5-turbo"), Some(4097));
        assert_eq!(catalog.max_tokens("gpt-4"), Some(8192));
        assert_eq!(catalog.max_tokens("text-davinci-003"), Some(4097));
        assert_eq!(catalog.max_tokens("mystery-model"), None);
    }

    #[test]
    fn overrides_replace_and_extend() {
        let overrides = HashMap::from([
            ("gpt-4".to_string(), 1000),
            ("llama-local".to_string(), 2048),
        ]);
        let catalog = StaticModelCatalog::with_overrides(&overrides);
        assert_eq!(catalog.max_tokens("gpt-4"), Some(1000));
        assert_eq!(catalog.max_tokens("llama-local"), Some(2048));
        assert_eq!(catalog.max_tokens("gpt-3.5-turbo"), Some(4097));
    }

    #[test]
    fn models_listing_is_sorted() {
        let catalog = StaticModelCatalog::builtin();
        let names: Vec<&str> = catalog.models().into_iter().map(|(n, _)| n).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert_eq!(names.len(), BUILTIN_MODELS.len());
    }
}
