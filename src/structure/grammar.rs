use anyhow::{Context, Result};
use regex::Regex;

/// What a single trimmed line opens in the outline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// `TÍTULO II`, opens a Chapter node.
    Title,
    /// `CAPÍTULO III`, opens a Section node.
    ChapterMarker,
    /// `Art. 5º ...`, opens an Article.
    Article,
    /// `§ 1º`, `Parágrafo único`, `IV -`: a numbered paragraph or item.
    Item,
}

impl LineKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LineKind::Title => "title",
            LineKind::ChapterMarker => "chapter_marker",
            LineKind::Article => "article",
            LineKind::Item => "item",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedLine {
    pub kind: LineKind,
    pub label: String,
    pub rest: String,
}

#[derive(Debug)]
struct LineRule {
    kind: LineKind,
    pattern: Regex,
}

/// Ordered pattern → line-kind rules. The first matching rule wins; a line
/// matching none of them is a continuation of the previous paragraph.
#[derive(Debug)]
pub struct LineGrammar {
    rules: Vec<LineRule>,
}

impl LineGrammar {
    pub fn new() -> Result<Self> {
        let specs: [(LineKind, &str); 5] = [
            (
                LineKind::Title,
                r"(?i)^(?P<label>t[íi]tulo\s+[ivxlcdm]+)\b\s*(?P<rest>.*)$",
            ),
            (
                LineKind::ChapterMarker,
                r"(?i)^(?P<label>cap[íi]tulo\s+[ivxlcdm]+)\b\s*(?P<rest>.*)$",
            ),
            (
                LineKind::Article,
                r"(?i)^(?P<label>art\.?\s*\d+[º°]?)\.?\s*(?P<rest>.*)$",
            ),
            (
                LineKind::Item,
                r"(?i)^(?P<label>§\s*\d+[º°]?|par[áa]grafo\s+[úu]nico)(?:\s+|$|\.\s*)(?P<rest>.*)$",
            ),
            (
                LineKind::Item,
                r"(?i)^(?P<label>[ivxlcdm]+\s*[-–—])\.?\s*(?P<rest>.*)$",
            ),
        ];

        let mut rules = Vec::with_capacity(specs.len());
        for (kind, pattern) in specs {
            rules.push(LineRule {
                kind,
                pattern: Regex::new(pattern).with_context(|| {
                    format!("failed to compile {} line regex", kind.as_str())
                })?,
            });
        }

        Ok(Self { rules })
    }

    pub fn classify(&self, line: &str) -> Option<ClassifiedLine> {
        self.rules.iter().find_map(|rule| {
            let captures = rule.pattern.captures(line)?;
            let label = captures
                .name("label")
                .map(|value| value.as_str().trim().to_string())?;
            let rest = captures
                .name("rest")
                .map(|value| value.as_str().trim().to_string())
                .unwrap_or_default();
            Some(ClassifiedLine {
                kind: rule.kind,
                label,
                rest,
            })
        })
    }
}

/// `ART. 5º` → `Art. 5º`.
pub fn capitalize_label(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Upper-cases the heading marker and keeps any trailing caption verbatim.
pub fn heading_title(label: &str, rest: &str) -> String {
    let marker = label
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
        .to_uppercase();
    if rest.is_empty() {
        marker
    } else {
        format!("{marker} {rest}")
    }
}
