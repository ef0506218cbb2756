mod cache;
mod engine;
mod fingerprint;
mod report;
mod similarity;

use serde::Serialize;

pub use cache::CacheStore;
pub use engine::DeduplicationEngine;
pub use report::DedupReport;

pub const DEFAULT_FUZZY_THRESHOLD: u8 = 90;
pub const DEFAULT_SEMANTIC_THRESHOLD: f64 = 0.85;
pub const DEFAULT_MIN_TEXT_LEN: usize = 50;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct DedupConfig {
    /// Token-set ratio (0–100) at which two paragraphs of one container are
    /// near-duplicates.
    pub fuzzy_threshold: u8,
    pub fuzzy_within_containers: bool,
    /// Cosine similarity (0–1) at which a cross-document pair is reported.
    pub semantic_threshold: f64,
    /// Normalized paragraphs shorter than this are not cached or reported.
    pub min_text_len: usize,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            fuzzy_within_containers: true,
            semantic_threshold: DEFAULT_SEMANTIC_THRESHOLD,
            min_text_len: DEFAULT_MIN_TEXT_LEN,
        }
    }
}
