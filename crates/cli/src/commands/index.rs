//! `promptwright index`: embed a project directory for contextual search.

use anyhow::{Context, bail};
use promptwright_config::AppConfig;
use promptwright_index::{IndexFile, IndexStore, Indexer};
use std::path::Path;

pub async fn run(dir: &Path) -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load config")?;
    let backends = promptwright_providers::build_from_config(&config);
    if !backends.openai.has_api_key() {
        bail!(
            "No API key configured. Set PROMPTWRIGHT_API_KEY or OPENAI_API_KEY, or add api_key to {}",
            AppConfig::config_dir().join("config.toml").display()
        );
    }

    let search = &config.contextual_search;
    println!("Indexing {} ...", dir.display());

    let indexer = Indexer::new(
        backends.openai.clone(),
        search.embedding_model.clone(),
        search.chunk_lines,
    );
    let report = indexer.index_dir(dir).await?;

    let store = IndexStore::new(search.index_path());
    let chunks = report.chunks.len();
    store.save(&IndexFile::new(indexer.embedding_model(), report.chunks))?;

    println!("   Files indexed:  {}", report.files_indexed);
    println!("   Files skipped:  {}", report.files_skipped);
    println!("   Chunks:         {chunks}");
    println!("   Saved to:       {}", store.path().display());
    Ok(())
}
