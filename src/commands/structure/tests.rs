use std::fs;

use crate::model::StructureNode;

use super::*;

#[test]
fn build_record_keeps_repeated_paragraphs() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = dir.path().join("estatuto-geral.json");
    fs::write(
        &input,
        r#"[
            {"text": "Art. 1º O estatuto rege a instituição.", "page": 2},
            {"text": "Art. 2º O estatuto rege a instituição.", "page": 2}
        ]"#,
    )
    .expect("write fragments");

    let record = build_record(&input).expect("record");
    assert_eq!(record.document.doc_id, "estatuto-geral");
    assert_eq!(record.document.name, "estatuto geral");
    assert_eq!(record.document.structure.len(), 2);
    assert!(
        record
            .document
            .structure
            .iter()
            .all(|node| matches!(node, StructureNode::Article(article) if article.paragraphs.len() == 1))
    );
}

#[test]
fn default_output_path_lands_under_cache_root() {
    assert_eq!(
        default_output_path(Path::new(".cache/normdedup"), "estatuto"),
        Path::new(".cache/normdedup/structure/estatuto_structure.json")
    );
}
