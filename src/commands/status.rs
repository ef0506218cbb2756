use std::path::Path;

use anyhow::Result;
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::dedup::CacheStore;
use crate::model::FragmentInventoryManifest;
use crate::util::read_json;

#[cfg(test)]
mod tests;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSummary {
    pub hashes: usize,
    pub documents: usize,
    pub entries: usize,
}

pub fn run(args: StatusArgs) -> Result<()> {
    let cache_path = args.resolved_cache_path();
    let inventory_path = args
        .cache_root
        .join("manifests")
        .join("fragment_inventory.json");

    info!(cache_root = %args.cache_root.display(), "status requested");

    match summarize_cache(&cache_path) {
        Some(summary) => info!(
            path = %cache_path.display(),
            hashes = summary.hashes,
            documents = summary.documents,
            entries = summary.entries,
            "cache status"
        ),
        None => warn!(path = %cache_path.display(), "cache file missing"),
    }

    if inventory_path.exists() {
        let inventory: FragmentInventoryManifest = read_json(&inventory_path)?;
        info!(
            generated_at = %inventory.generated_at,
            file_count = inventory.file_count,
            source = %inventory.source_directory,
            "loaded inventory manifest"
        );
    } else {
        warn!(path = %inventory_path.display(), "inventory manifest missing");
    }

    Ok(())
}

/// Returns `None` when there is no cache file. An unreadable file counts as
/// an empty cache, matching what the next `process` run would see.
pub fn summarize_cache(cache_path: &Path) -> Option<CacheSummary> {
    if !cache_path.exists() {
        return None;
    }

    let store = CacheStore::load(cache_path);
    let mut entries = 0;
    for (name, count) in store.texts().documents() {
        info!(doc = %name, entries = count, "cached document");
        entries += count;
    }

    Some(CacheSummary {
        hashes: store.index().len(),
        documents: store.texts().document_count(),
        entries,
    })
}
