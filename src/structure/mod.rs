mod builder;
mod grammar;

pub use builder::StructureBuilder;

use crate::model::{Document, DocumentMetadata, StructureNode, TextFragment};
use crate::util::today_utc_date;

pub const DEFAULT_VERSION: &str = "1ª versão";

/// Builds the Document record for one fragment file. Header fields come from
/// `metadata` when present, otherwise from the file stem and fragment pages.
pub fn assemble_document(
    source_stem: &str,
    metadata: &DocumentMetadata,
    fragments: &[TextFragment],
    structure: Vec<StructureNode>,
) -> Document {
    let first_seen = fragments.iter().map(|fragment| fragment.page).min();
    let last_seen = fragments.iter().map(|fragment| fragment.page).max();

    Document {
        doc_id: metadata
            .doc_id
            .clone()
            .unwrap_or_else(|| source_stem.to_string()),
        name: metadata
            .name
            .clone()
            .unwrap_or_else(|| display_name(source_stem)),
        version: metadata
            .version
            .clone()
            .unwrap_or_else(|| DEFAULT_VERSION.to_string()),
        publication_date: metadata
            .publication_date
            .clone()
            .unwrap_or_else(today_utc_date),
        first_page: metadata.first_page.or(first_seen).unwrap_or(1),
        last_page: metadata.last_page.or(last_seen).unwrap_or(1),
        structure,
    }
}

fn display_name(source_stem: &str) -> String {
    source_stem.replace(['_', '-'], " ")
}
