use anyhow::Result;
use tracing::debug;

use crate::model::{
    Article, Chapter, ChapterChild, Paragraph, Section, SectionChild, StructureNode, TextFragment,
};

use super::grammar::{LineGrammar, LineKind, capitalize_label, heading_title};

/// A container that owns an ordered paragraph list: an Article, Section,
/// Chapter or the document's top level.
pub trait ParagraphSink {
    fn push_paragraph(&mut self, paragraph: Paragraph);
    fn last_paragraph_mut(&mut self) -> Option<&mut Paragraph>;
}

impl ParagraphSink for Article {
    fn push_paragraph(&mut self, paragraph: Paragraph) {
        self.paragraphs.push(paragraph);
    }

    fn last_paragraph_mut(&mut self) -> Option<&mut Paragraph> {
        self.paragraphs.last_mut()
    }
}

impl ParagraphSink for Section {
    fn push_paragraph(&mut self, paragraph: Paragraph) {
        self.children.push(SectionChild::Paragraph(paragraph));
    }

    fn last_paragraph_mut(&mut self) -> Option<&mut Paragraph> {
        match self.children.last_mut() {
            Some(SectionChild::Paragraph(paragraph)) => Some(paragraph),
            _ => None,
        }
    }
}

impl ParagraphSink for Chapter {
    fn push_paragraph(&mut self, paragraph: Paragraph) {
        self.children.push(ChapterChild::Paragraph(paragraph));
    }

    fn last_paragraph_mut(&mut self) -> Option<&mut Paragraph> {
        match self.children.last_mut() {
            Some(ChapterChild::Paragraph(paragraph)) => Some(paragraph),
            _ => None,
        }
    }
}

impl ParagraphSink for Vec<StructureNode> {
    fn push_paragraph(&mut self, paragraph: Paragraph) {
        self.push(StructureNode::Paragraph(paragraph));
    }

    fn last_paragraph_mut(&mut self) -> Option<&mut Paragraph> {
        match self.last_mut() {
            Some(StructureNode::Paragraph(paragraph)) => Some(paragraph),
            _ => None,
        }
    }
}

/// Turns reading-order fragments into the Chapter/Section/Article/Paragraph
/// outline. Never fails on input: unrecognized lines become free text.
#[derive(Debug)]
pub struct StructureBuilder {
    grammar: LineGrammar,
}

impl StructureBuilder {
    pub fn new() -> Result<Self> {
        Ok(Self {
            grammar: LineGrammar::new()?,
        })
    }

    pub fn build(&self, fragments: &[TextFragment]) -> Vec<StructureNode> {
        let mut outline = OpenOutline::default();
        for fragment in fragments {
            outline.absorb(&self.grammar, fragment);
        }
        outline.finish()
    }
}

/// Finished top-level nodes plus at most one open Chapter, Section and
/// Article. Closing a level flushes it into the nearest open ancestor.
#[derive(Debug, Default)]
struct OpenOutline {
    top: Vec<StructureNode>,
    chapter: Option<Chapter>,
    section: Option<Section>,
    article: Option<Article>,
}

impl OpenOutline {
    fn absorb(&mut self, grammar: &LineGrammar, fragment: &TextFragment) {
        let line = fragment.text.trim();
        if line.is_empty() {
            return;
        }

        let Some(classified) = grammar.classify(line) else {
            self.continue_paragraph(line, fragment.page);
            return;
        };

        debug!(
            kind = classified.kind.as_str(),
            label = %classified.label,
            page = fragment.page,
            "classified line"
        );

        match classified.kind {
            LineKind::Title => {
                self.open_chapter(heading_title(&classified.label, &classified.rest));
            }
            LineKind::ChapterMarker => {
                self.open_section(heading_title(&classified.label, &classified.rest));
            }
            LineKind::Article => {
                let mut article = Article {
                    title: capitalize_label(&classified.label),
                    paragraphs: Vec::new(),
                };
                if !classified.rest.is_empty() {
                    article
                        .paragraphs
                        .push(Paragraph::unnumbered(&classified.rest, fragment.page));
                }
                self.open_article(article);
            }
            LineKind::Item => {
                self.deepest().push_paragraph(Paragraph::numbered(
                    &classified.label,
                    &classified.rest,
                    fragment.page,
                ));
            }
        }
    }

    fn continue_paragraph(&mut self, line: &str, page: i64) {
        let sink = self.deepest();
        match sink.last_paragraph_mut() {
            Some(paragraph) => paragraph.extend_text(line),
            None => sink.push_paragraph(Paragraph::unnumbered(line, page)),
        }
    }

    fn deepest(&mut self) -> &mut dyn ParagraphSink {
        match (
            self.article.as_mut(),
            self.section.as_mut(),
            self.chapter.as_mut(),
        ) {
            (Some(article), _, _) => article,
            (None, Some(section), _) => section,
            (None, None, Some(chapter)) => chapter,
            (None, None, None) => &mut self.top,
        }
    }

    fn open_chapter(&mut self, title: String) {
        self.close_chapter();
        self.chapter = Some(Chapter {
            title,
            children: Vec::new(),
        });
    }

    fn open_section(&mut self, title: String) {
        self.close_section();
        self.section = Some(Section {
            title,
            children: Vec::new(),
        });
    }

    fn open_article(&mut self, article: Article) {
        self.close_article();
        self.article = Some(article);
    }

    fn close_article(&mut self) {
        let Some(article) = self.article.take() else {
            return;
        };
        if let Some(section) = self.section.as_mut() {
            section.children.push(SectionChild::Article(article));
        } else if let Some(chapter) = self.chapter.as_mut() {
            chapter.children.push(ChapterChild::Article(article));
        } else {
            self.top.push(StructureNode::Article(article));
        }
    }

    fn close_section(&mut self) {
        self.close_article();
        let Some(section) = self.section.take() else {
            return;
        };
        if let Some(chapter) = self.chapter.as_mut() {
            chapter.children.push(ChapterChild::Section(section));
        } else {
            self.top.push(StructureNode::Section(section));
        }
    }

    fn close_chapter(&mut self) {
        self.close_section();
        if let Some(chapter) = self.chapter.take() {
            self.top.push(StructureNode::Chapter(chapter));
        }
    }

    fn finish(mut self) -> Vec<StructureNode> {
        self.close_chapter();
        self.top
    }
}
