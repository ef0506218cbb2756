use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::model::DocumentTextEntry;
use crate::util::{read_json, write_json_pretty};

use super::fingerprint::{Fingerprint, FingerprintIndex};

/// Previously processed documents' paragraph projections, keyed by document
/// name. This is the comparison corpus for the semantic pass.
#[derive(Debug, Clone, Default)]
pub struct DocumentTextCache {
    documents: BTreeMap<String, Vec<DocumentTextEntry>>,
}

impl DocumentTextCache {
    pub fn get(&self, document_name: &str) -> &[DocumentTextEntry] {
        self.documents
            .get(document_name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn put(&mut self, document_name: &str, entries: Vec<DocumentTextEntry>) {
        self.documents.insert(document_name.to_string(), entries);
    }

    /// Every cached entry except those of `document_name`, tagged with the
    /// name of the document it came from.
    pub fn entries_excluding<'a>(
        &'a self,
        document_name: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a DocumentTextEntry)> + 'a {
        self.documents
            .iter()
            .filter(move |(name, _)| name.as_str() != document_name)
            .flat_map(|(name, entries)| entries.iter().map(move |entry| (name.as_str(), entry)))
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    pub fn documents(&self) -> impl Iterator<Item = (&str, usize)> {
        self.documents
            .iter()
            .map(|(name, entries)| (name.as_str(), entries.len()))
    }
}

/// On-disk layout of the cache file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheRecord {
    #[serde(default)]
    global_hashes: Vec<String>,
    #[serde(default)]
    processed_docs: BTreeMap<String, Vec<DocumentTextEntry>>,
}

/// In-memory cache state taken before a document is processed.
#[derive(Debug, Clone)]
pub struct CacheCheckpoint {
    index: FingerprintIndex,
    texts: DocumentTextCache,
}

/// Handle over the persistent cache file. Loaded once per run and saved at
/// the run boundary; a single process is assumed to own the file.
#[derive(Debug)]
pub struct CacheStore {
    path: PathBuf,
    index: FingerprintIndex,
    texts: DocumentTextCache,
}

impl CacheStore {
    pub fn empty(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            index: FingerprintIndex::default(),
            texts: DocumentTextCache::default(),
        }
    }

    /// Missing or unreadable files yield an empty store; this never fails.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            info!(path = %path.display(), "cache file missing; starting with empty cache");
            return Self::empty(path);
        }

        let record = match read_json::<CacheRecord>(path) {
            Ok(record) => record,
            Err(error) => {
                warn!(path = %path.display(), error = %format!("{error:#}"), "failed to load cache; starting with empty cache");
                return Self::empty(path);
            }
        };

        let total_hashes = record.global_hashes.len();
        let hashes = record
            .global_hashes
            .iter()
            .filter_map(|value| Fingerprint::from_hex(value))
            .collect::<Vec<Fingerprint>>();
        if hashes.len() != total_hashes {
            warn!(
                path = %path.display(),
                skipped = total_hashes - hashes.len(),
                "ignored malformed fingerprints in cache"
            );
        }

        let store = Self {
            path: path.to_path_buf(),
            index: FingerprintIndex::from_hashes(hashes),
            texts: DocumentTextCache {
                documents: record.processed_docs,
            },
        };

        info!(
            path = %path.display(),
            hashes = store.index.len(),
            documents = store.texts.document_count(),
            "loaded cache"
        );
        store
    }

    pub fn save(&self) -> Result<()> {
        let record = CacheRecord {
            global_hashes: self
                .index
                .iter()
                .map(|fingerprint| fingerprint.as_str().to_string())
                .collect(),
            processed_docs: self.texts.documents.clone(),
        };
        write_json_pretty(&self.path, &record)?;

        info!(
            path = %self.path.display(),
            hashes = self.index.len(),
            documents = self.texts.document_count(),
            "saved cache"
        );
        Ok(())
    }

    /// Saves and logs instead of propagating: losing the cache only costs
    /// continuity for future runs.
    pub fn save_best_effort(&self) -> bool {
        match self.save() {
            Ok(()) => true,
            Err(error) => {
                warn!(path = %self.path.display(), error = %format!("{error:#}"), "failed to save cache; results of this run are kept");
                false
            }
        }
    }

    pub fn checkpoint(&self) -> CacheCheckpoint {
        CacheCheckpoint {
            index: self.index.clone(),
            texts: self.texts.clone(),
        }
    }

    pub fn restore(&mut self, checkpoint: CacheCheckpoint) {
        self.index = checkpoint.index;
        self.texts = checkpoint.texts;
    }

    pub fn index(&self) -> &FingerprintIndex {
        &self.index
    }

    pub fn index_mut(&mut self) -> &mut FingerprintIndex {
        &mut self.index
    }

    pub fn texts(&self) -> &DocumentTextCache {
        &self.texts
    }

    pub fn texts_mut(&mut self) -> &mut DocumentTextCache {
        &mut self.texts
    }
}
