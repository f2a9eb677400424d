//! `promptwright models`: list known models and their context windows.

use anyhow::Context;
use promptwright_config::AppConfig;
use promptwright_providers::StaticModelCatalog;

pub fn run() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load config")?;
    let catalog = StaticModelCatalog::with_overrides(&config.models);

    println!("  {:<24} {:>10}", "Model", "Max tokens");
    for (model, max_tokens) in catalog.models() {
        let marker = if model == config.default_model { "*" } else { " " };
        println!("{marker} {model:<24} {max_tokens:>10}");
    }
    println!();
    println!(
        "Unknown models use {} tokens (completion.fallback_max_tokens).",
        config.completion.fallback_max_tokens
    );
    Ok(())
}
