use serde::Serialize;

use super::fingerprint::Fingerprint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateScope {
    /// Already committed by an earlier document (or an earlier run).
    CrossDocument,
    /// Repeats an earlier paragraph of the same document.
    WithinDocument,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExactDuplicate {
    pub fingerprint: Fingerprint,
    pub scope: DuplicateScope,
    pub article_title: String,
    pub chapter: Option<String>,
    pub section: Option<String>,
    pub paragraph_number: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FuzzyDrop {
    pub container: String,
    pub dropped_text: String,
    pub similar_to: String,
    pub ratio: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct SemanticMatch {
    pub previous_document: String,
    pub previous_article_title: String,
    pub previous_paragraph_number: Option<String>,
    pub previous_text: String,
    pub current_article_title: String,
    pub current_paragraph_number: Option<String>,
    pub current_text: String,
    pub similarity: f64,
    pub same_normalized_text: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PruneCounts {
    pub paragraphs_before: usize,
    pub paragraphs_after: usize,
    pub exact_pruned: usize,
    pub fuzzy_pruned: usize,
    pub containers_dropped: usize,
}

/// Findings for one document. Building it never changes the fingerprint
/// index; only the pruning pass commits fingerprints.
#[derive(Debug, Clone, Serialize)]
pub struct DedupReport {
    pub doc_id: String,
    pub document_name: String,
    pub entries_projected: usize,
    pub counts: PruneCounts,
    pub exact_duplicates: Vec<ExactDuplicate>,
    pub fuzzy_drops: Vec<FuzzyDrop>,
    pub semantic_matches: Vec<SemanticMatch>,
}

impl DedupReport {
    pub fn cross_document_duplicates(&self) -> usize {
        self.exact_duplicates
            .iter()
            .filter(|duplicate| duplicate.scope == DuplicateScope::CrossDocument)
            .count()
    }
}
