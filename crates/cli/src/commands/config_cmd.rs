//! `promptwright config`: configuration management commands.

use anyhow::Context;
use promptwright_config::AppConfig;

pub fn validate() -> anyhow::Result<()> {
    println!("Validating configuration...");

    let config = AppConfig::load().context("Config error")?;
    println!("   Config parsed successfully");

    let mut warnings = Vec::new();
    if !config.has_api_key() {
        warnings.push("No API key set (set PROMPTWRIGHT_API_KEY or OPENAI_API_KEY)");
    }
    if !config.contextual_search.index_path().exists() {
        warnings.push("Project not indexed yet; contextual search will fall back to history");
    }

    if warnings.is_empty() {
        println!("   All checks passed");
    } else {
        println!();
        for w in &warnings {
            println!("   warning: {w}");
        }
    }

    println!();
    println!("   Base URL:       {}", config.base_url);
    println!("   Model:          {}", config.default_model);
    println!(
        "   System prompt:  {}",
        if config.system_prompt.trim().is_empty() { "default" } else { "override" }
    );
    println!("   Index:          {}", config.contextual_search.index_path().display());
    Ok(())
}

pub fn show() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load config")?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

pub fn path() {
    println!("{}", config_path().display());
}

pub fn init() {
    println!("{}", AppConfig::default_toml());
}

fn config_path() -> std::path::PathBuf {
    AppConfig::config_dir().join("config.toml")
}
