use std::collections::HashSet;

use tracing::{debug, info};

use crate::model::{
    Article, Chapter, ChapterChild, Document, DocumentTextEntry, Paragraph, Section, SectionChild,
    StructureNode,
};
use crate::normalize::Normalizer;

use super::DedupConfig;
use super::cache::{CacheCheckpoint, CacheStore};
use super::fingerprint::{Fingerprint, FingerprintIndex};
use super::report::{
    DedupReport, DuplicateScope, ExactDuplicate, FuzzyDrop, PruneCounts, SemanticMatch,
};
use super::similarity::{cosine_similarity, tfidf_vectors, token_set_ratio};

/// Titles of the containers enclosing a paragraph.
#[derive(Debug, Clone, Copy, Default)]
struct Ancestry<'s> {
    chapter: Option<&'s str>,
    section: Option<&'s str>,
    article: Option<&'s str>,
}

#[derive(Debug, Clone)]
struct ProjectedEntry {
    entry: DocumentTextEntry,
    fingerprint: Fingerprint,
}

/// Prunes exact and near-duplicate paragraphs against the shared cache and
/// reports semantic near-duplicates across documents.
pub struct DeduplicationEngine<'a> {
    store: &'a mut CacheStore,
    normalizer: &'a Normalizer,
    config: DedupConfig,
}

impl<'a> DeduplicationEngine<'a> {
    pub fn new(store: &'a mut CacheStore, normalizer: &'a Normalizer, config: DedupConfig) -> Self {
        Self {
            store,
            normalizer,
            config,
        }
    }

    pub fn checkpoint(&self) -> CacheCheckpoint {
        self.store.checkpoint()
    }

    /// Undoes every commit made since `checkpoint`.
    pub fn rollback(&mut self, checkpoint: CacheCheckpoint) {
        self.store.restore(checkpoint);
    }

    pub fn process(&mut self, document: Document) -> (Document, DedupReport) {
        let document_name = document.name.clone();
        let doc_id = document.doc_id.clone();

        let entries = self.project_entries(&document.structure);
        let exact_duplicates = self.exact_report(&entries);

        let Document {
            doc_id: pruned_id,
            name,
            version,
            publication_date,
            first_page,
            last_page,
            structure,
        } = document;

        let mut pass = PrunePass {
            index: self.store.index_mut(),
            normalizer: self.normalizer,
            fuzzy_threshold: self
                .config
                .fuzzy_within_containers
                .then_some(self.config.fuzzy_threshold),
            counts: PruneCounts::default(),
            fuzzy_drops: Vec::new(),
        };
        let pruned_structure = pass.prune_nodes(structure);
        let PrunePass {
            counts,
            fuzzy_drops,
            ..
        } = pass;

        let semantic_matches = self.semantic_report(&document_name, &entries);

        let entries_projected = entries.len();
        let replaced = self.store.texts().get(&document_name).len();
        if replaced > 0 {
            debug!(doc = %document_name, replaced, "replacing cached entries");
        }
        self.store.texts_mut().put(
            &document_name,
            entries.into_iter().map(|projected| projected.entry).collect(),
        );

        let report = DedupReport {
            doc_id,
            document_name,
            entries_projected,
            counts,
            exact_duplicates,
            fuzzy_drops,
            semantic_matches,
        };

        info!(
            doc = %report.document_name,
            paragraphs_before = report.counts.paragraphs_before,
            paragraphs_after = report.counts.paragraphs_after,
            exact_pruned = report.counts.exact_pruned,
            fuzzy_pruned = report.counts.fuzzy_pruned,
            cross_document_duplicates = report.cross_document_duplicates(),
            semantic_matches = report.semantic_matches.len(),
            "deduplicated document"
        );

        let pruned = Document {
            doc_id: pruned_id,
            name,
            version,
            publication_date,
            first_page,
            last_page,
            structure: pruned_structure,
        };
        (pruned, report)
    }

    fn project_entries(&self, structure: &[StructureNode]) -> Vec<ProjectedEntry> {
        let mut entries = Vec::new();
        walk_paragraphs(structure, &mut |ancestry, paragraph| {
            let normalized_text = self.normalizer.normalize(&paragraph.text);
            if normalized_text.chars().count() < self.config.min_text_len {
                return;
            }

            let article_title = ancestry.article.unwrap_or_default();
            entries.push(ProjectedEntry {
                fingerprint: Fingerprint::of_paragraph(
                    self.normalizer,
                    article_title,
                    &paragraph.text,
                ),
                entry: DocumentTextEntry {
                    full_text: paragraph.text.clone(),
                    normalized_text,
                    article_title: article_title.to_string(),
                    chapter: ancestry.chapter.map(ToOwned::to_owned),
                    section: ancestry.section.map(ToOwned::to_owned),
                    paragraph_number: paragraph.number.clone(),
                },
            });
        });
        entries
    }

    /// Pure query over the index as it stands before pruning.
    fn exact_report(&self, entries: &[ProjectedEntry]) -> Vec<ExactDuplicate> {
        let index = self.store.index();
        let mut seen = HashSet::<&Fingerprint>::new();
        let mut duplicates = Vec::new();

        for projected in entries {
            let first_in_document = seen.insert(&projected.fingerprint);
            let scope = if index.contains(&projected.fingerprint) {
                DuplicateScope::CrossDocument
            } else if !first_in_document {
                DuplicateScope::WithinDocument
            } else {
                continue;
            };

            duplicates.push(ExactDuplicate {
                fingerprint: projected.fingerprint.clone(),
                scope,
                article_title: projected.entry.article_title.clone(),
                chapter: projected.entry.chapter.clone(),
                section: projected.entry.section.clone(),
                paragraph_number: projected.entry.paragraph_number.clone(),
                text: projected.entry.full_text.clone(),
            });
        }

        duplicates
    }

    /// Advisory only: compares the unpruned entries against every other
    /// cached document and never touches the structure.
    fn semantic_report(
        &self,
        document_name: &str,
        entries: &[ProjectedEntry],
    ) -> Vec<SemanticMatch> {
        let previous = self
            .store
            .texts()
            .entries_excluding(document_name)
            .filter(|(_, entry)| !entry.normalized_text.trim().is_empty())
            .collect::<Vec<(&str, &DocumentTextEntry)>>();
        let current = entries
            .iter()
            .map(|projected| &projected.entry)
            .filter(|entry| !entry.normalized_text.trim().is_empty())
            .collect::<Vec<&DocumentTextEntry>>();

        if previous.is_empty() || current.is_empty() {
            debug!(
                doc = %document_name,
                previous = previous.len(),
                current = current.len(),
                "semantic corpus is empty; skipping"
            );
            return Vec::new();
        }

        let texts = previous
            .iter()
            .map(|(_, entry)| entry.normalized_text.as_str())
            .chain(current.iter().map(|entry| entry.normalized_text.as_str()))
            .collect::<Vec<&str>>();

        let Some(vectors) = tfidf_vectors(&texts) else {
            debug!(doc = %document_name, "semantic corpus has no vocabulary; skipping");
            return Vec::new();
        };
        let (previous_vectors, current_vectors) = vectors.split_at(previous.len());

        let mut matches = Vec::new();
        for ((previous_name, previous_entry), previous_vector) in
            previous.iter().zip(previous_vectors)
        {
            for (current_entry, current_vector) in current.iter().zip(current_vectors) {
                let similarity = cosine_similarity(previous_vector, current_vector);
                if similarity < self.config.semantic_threshold {
                    continue;
                }

                debug!(
                    previous_doc = %previous_name,
                    previous_article = %previous_entry.article_title,
                    current_article = %current_entry.article_title,
                    similarity,
                    "semantic near-duplicate"
                );
                matches.push(SemanticMatch {
                    previous_document: (*previous_name).to_string(),
                    previous_article_title: previous_entry.article_title.clone(),
                    previous_paragraph_number: previous_entry.paragraph_number.clone(),
                    previous_text: previous_entry.full_text.clone(),
                    current_article_title: current_entry.article_title.clone(),
                    current_paragraph_number: current_entry.paragraph_number.clone(),
                    current_text: current_entry.full_text.clone(),
                    similarity,
                    same_normalized_text: previous_entry.normalized_text
                        == current_entry.normalized_text,
                });
            }
        }

        matches.sort_by(|left, right| right.similarity.total_cmp(&left.similarity));
        matches
    }
}

fn walk_paragraphs<'s>(
    structure: &'s [StructureNode],
    visit: &mut dyn FnMut(Ancestry<'s>, &'s Paragraph),
) {
    fn walk_article<'s>(
        article: &'s Article,
        ancestry: Ancestry<'s>,
        visit: &mut dyn FnMut(Ancestry<'s>, &'s Paragraph),
    ) {
        let ancestry = Ancestry {
            article: Some(article.title.as_str()),
            ..ancestry
        };
        for paragraph in &article.paragraphs {
            visit(ancestry, paragraph);
        }
    }

    fn walk_section<'s>(
        section: &'s Section,
        ancestry: Ancestry<'s>,
        visit: &mut dyn FnMut(Ancestry<'s>, &'s Paragraph),
    ) {
        let ancestry = Ancestry {
            section: Some(section.title.as_str()),
            ..ancestry
        };
        for child in &section.children {
            match child {
                SectionChild::Article(article) => walk_article(article, ancestry, visit),
                SectionChild::Paragraph(paragraph) => visit(ancestry, paragraph),
            }
        }
    }

    for node in structure {
        match node {
            StructureNode::Chapter(chapter) => {
                let ancestry = Ancestry {
                    chapter: Some(chapter.title.as_str()),
                    ..Ancestry::default()
                };
                for child in &chapter.children {
                    match child {
                        ChapterChild::Section(section) => walk_section(section, ancestry, visit),
                        ChapterChild::Article(article) => walk_article(article, ancestry, visit),
                        ChapterChild::Paragraph(paragraph) => visit(ancestry, paragraph),
                    }
                }
            }
            StructureNode::Section(section) => walk_section(section, Ancestry::default(), visit),
            StructureNode::Article(article) => walk_article(article, Ancestry::default(), visit),
            StructureNode::Paragraph(paragraph) => visit(Ancestry::default(), paragraph),
        }
    }
}

/// Paragraphs already kept in one container, for the fuzzy comparison:
/// `(normalized, original)`.
type KeptTexts = Vec<(String, String)>;

/// The single pass that commits fingerprints. A paragraph survives only if
/// its fingerprint is not yet committed and, when fuzzy matching is on, it
/// is not a near-duplicate of a paragraph already kept in the same container.
/// Fuzzy-dropped paragraphs are committed too, so a rerun prunes them exactly.
struct PrunePass<'p> {
    index: &'p mut FingerprintIndex,
    normalizer: &'p Normalizer,
    fuzzy_threshold: Option<u8>,
    counts: PruneCounts,
    fuzzy_drops: Vec<FuzzyDrop>,
}

impl PrunePass<'_> {
    fn prune_nodes(&mut self, nodes: Vec<StructureNode>) -> Vec<StructureNode> {
        let mut kept = KeptTexts::new();
        let mut out = Vec::with_capacity(nodes.len());

        for node in nodes {
            match node {
                StructureNode::Chapter(chapter) => {
                    if let Some(chapter) = self.prune_chapter(chapter) {
                        out.push(StructureNode::Chapter(chapter));
                    }
                }
                StructureNode::Section(section) => {
                    if let Some(section) = self.prune_section(section) {
                        out.push(StructureNode::Section(section));
                    }
                }
                StructureNode::Article(article) => {
                    if let Some(article) = self.prune_article(article) {
                        out.push(StructureNode::Article(article));
                    }
                }
                StructureNode::Paragraph(paragraph) => {
                    if self.admit("", "", &paragraph, &mut kept) {
                        out.push(StructureNode::Paragraph(paragraph));
                    }
                }
            }
        }

        out
    }

    fn prune_chapter(&mut self, chapter: Chapter) -> Option<Chapter> {
        let Chapter { title, children } = chapter;
        let mut kept = KeptTexts::new();
        let mut out = Vec::with_capacity(children.len());

        for child in children {
            match child {
                ChapterChild::Section(section) => {
                    if let Some(section) = self.prune_section(section) {
                        out.push(ChapterChild::Section(section));
                    }
                }
                ChapterChild::Article(article) => {
                    if let Some(article) = self.prune_article(article) {
                        out.push(ChapterChild::Article(article));
                    }
                }
                ChapterChild::Paragraph(paragraph) => {
                    if self.admit("", &title, &paragraph, &mut kept) {
                        out.push(ChapterChild::Paragraph(paragraph));
                    }
                }
            }
        }

        self.keep_if_nonempty(
            Chapter {
                title,
                children: out,
            },
            |chapter| chapter.children.is_empty(),
        )
    }

    fn prune_section(&mut self, section: Section) -> Option<Section> {
        let Section { title, children } = section;
        let mut kept = KeptTexts::new();
        let mut out = Vec::with_capacity(children.len());

        for child in children {
            match child {
                SectionChild::Article(article) => {
                    if let Some(article) = self.prune_article(article) {
                        out.push(SectionChild::Article(article));
                    }
                }
                SectionChild::Paragraph(paragraph) => {
                    if self.admit("", &title, &paragraph, &mut kept) {
                        out.push(SectionChild::Paragraph(paragraph));
                    }
                }
            }
        }

        self.keep_if_nonempty(
            Section {
                title,
                children: out,
            },
            |section| section.children.is_empty(),
        )
    }

    fn prune_article(&mut self, article: Article) -> Option<Article> {
        let Article { title, paragraphs } = article;
        let mut kept = KeptTexts::new();
        let mut out = Vec::with_capacity(paragraphs.len());

        for paragraph in paragraphs {
            if self.admit(&title, &title, &paragraph, &mut kept) {
                out.push(paragraph);
            }
        }

        self.keep_if_nonempty(
            Article {
                title,
                paragraphs: out,
            },
            |article| article.paragraphs.is_empty(),
        )
    }

    fn keep_if_nonempty<T>(&mut self, container: T, is_empty: impl Fn(&T) -> bool) -> Option<T> {
        if is_empty(&container) {
            self.counts.containers_dropped += 1;
            None
        } else {
            Some(container)
        }
    }

    fn admit(
        &mut self,
        article_title: &str,
        container: &str,
        paragraph: &Paragraph,
        kept: &mut KeptTexts,
    ) -> bool {
        self.counts.paragraphs_before += 1;

        let fingerprint =
            Fingerprint::of_paragraph(self.normalizer, article_title, &paragraph.text);
        if self.index.contains(&fingerprint) {
            debug!(container = %container, fingerprint = %fingerprint, "pruned exact duplicate");
            self.counts.exact_pruned += 1;
            return false;
        }

        if let Some(threshold) = self.fuzzy_threshold {
            let normalized = self.normalizer.normalize(&paragraph.text);
            let near = kept
                .iter()
                .map(|(kept_normalized, kept_text)| {
                    (kept_text, token_set_ratio(kept_normalized, &normalized))
                })
                .find(|(_, ratio)| *ratio >= threshold);

            if let Some((similar_to, ratio)) = near {
                debug!(container = %container, ratio, "pruned near-duplicate");
                self.fuzzy_drops.push(FuzzyDrop {
                    container: container.to_string(),
                    dropped_text: paragraph.text.clone(),
                    similar_to: similar_to.clone(),
                    ratio,
                });
                self.counts.fuzzy_pruned += 1;
                self.index.insert(fingerprint);
                return false;
            }

            kept.push((normalized, paragraph.text.clone()));
        }

        self.index.insert(fingerprint);
        self.counts.paragraphs_after += 1;
        true
    }
}
