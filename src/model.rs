use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextFragment {
    pub text: String,
    pub page: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paragraph {
    #[serde(rename = "numero")]
    pub number: Option<String>,
    #[serde(rename = "texto")]
    pub text: String,
    #[serde(rename = "pagina")]
    pub page: i64,
}

impl Paragraph {
    pub fn numbered(number: &str, text: &str, page: i64) -> Self {
        Self {
            number: Some(number.to_string()),
            text: text.to_string(),
            page,
        }
    }

    pub fn unnumbered(text: &str, page: i64) -> Self {
        Self {
            number: None,
            text: text.to_string(),
            page,
        }
    }

    /// Joins a continuation line onto this paragraph. The first page seen is kept.
    pub fn extend_text(&mut self, line: &str) {
        if self.text.is_empty() {
            self.text.push_str(line);
        } else {
            self.text.push(' ');
            self.text.push_str(line);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "paragrafos")]
    pub paragraphs: Vec<Paragraph>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "filhos")]
    pub children: Vec<SectionChild>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "filhos")]
    pub children: Vec<ChapterChild>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tipo")]
pub enum SectionChild {
    #[serde(rename = "artigo")]
    Article(Article),
    #[serde(rename = "paragrafo")]
    Paragraph(Paragraph),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tipo")]
pub enum ChapterChild {
    #[serde(rename = "secao")]
    Section(Section),
    #[serde(rename = "artigo")]
    Article(Article),
    #[serde(rename = "paragrafo")]
    Paragraph(Paragraph),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "tipo")]
pub enum StructureNode {
    #[serde(rename = "capitulo")]
    Chapter(Chapter),
    #[serde(rename = "secao")]
    Section(Section),
    #[serde(rename = "artigo")]
    Article(Article),
    #[serde(rename = "paragrafo")]
    Paragraph(Paragraph),
}

/// Header fields plus the detected outline of one processed document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub doc_id: String,
    #[serde(rename = "nome_doc")]
    pub name: String,
    #[serde(rename = "versao")]
    pub version: String,
    #[serde(rename = "data_publicacao")]
    pub publication_date: String,
    #[serde(rename = "pagina_inicial")]
    pub first_page: i64,
    #[serde(rename = "pagina_final")]
    pub last_page: i64,
    #[serde(rename = "estrutura")]
    pub structure: Vec<StructureNode>,
}

/// Optional overrides for the document header. Every field falls back to a
/// value derived from the input file and its fragments.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMetadata {
    #[serde(default)]
    pub doc_id: Option<String>,
    #[serde(default, rename = "nome_doc")]
    pub name: Option<String>,
    #[serde(default, rename = "versao")]
    pub version: Option<String>,
    #[serde(default, rename = "data_publicacao")]
    pub publication_date: Option<String>,
    #[serde(default, rename = "pagina_inicial")]
    pub first_page: Option<i64>,
    #[serde(default, rename = "pagina_final")]
    pub last_page: Option<i64>,
}

/// Table → row → cell, as produced by the table extraction step.
pub type ExtractedTable = Vec<Vec<String>>;

/// The persisted output for one document.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentRecord {
    #[serde(flatten)]
    pub document: Document,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tables: Vec<ExtractedTable>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FragmentFileEntry {
    pub filename: String,
    pub sha256: String,
    pub fragment_count: usize,
    pub first_page: Option<i64>,
    pub last_page: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FragmentInventoryManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub source_directory: String,
    pub file_count: usize,
    pub files: Vec<FragmentFileEntry>,
}

/// One paragraph plus its ancestry, as stored in the cross-document cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentTextEntry {
    pub full_text: String,
    pub normalized_text: String,
    #[serde(default)]
    pub article_title: String,
    #[serde(default)]
    pub chapter: Option<String>,
    #[serde(default)]
    pub section: Option<String>,
    #[serde(default)]
    pub paragraph_number: Option<String>,
}
