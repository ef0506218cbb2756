use std::fs;

use super::*;

#[test]
fn summarize_cache_counts_hashes_documents_and_entries() {
    let dir = tempfile::tempdir().expect("tempdir");
    let cache_path = dir.path().join("dedup_cache.json");
    fs::write(
        &cache_path,
        r#"{
            "global_hashes": [
                "d41d8cd98f00b204e9800998ecf8427e",
                "0cc175b9c0f1b6a831c399e269772661"
            ],
            "processed_docs": {
                "resolucao a": [
                    {"full_text": "Texto um.", "normalized_text": "texto um"},
                    {"full_text": "Texto dois.", "normalized_text": "texto dois", "article_title": "Art. 2º"}
                ],
                "resolucao b": []
            }
        }"#,
    )
    .expect("write cache");

    let summary = summarize_cache(&cache_path).expect("cache present");
    assert_eq!(
        summary,
        CacheSummary {
            hashes: 2,
            documents: 2,
            entries: 2,
        }
    );
}

#[test]
fn summarize_cache_distinguishes_missing_from_corrupt() {
    let dir = tempfile::tempdir().expect("tempdir");
    assert_eq!(summarize_cache(&dir.path().join("absent.json")), None);

    let corrupt = dir.path().join("corrupt.json");
    fs::write(&corrupt, "not json").expect("write cache");
    assert_eq!(
        summarize_cache(&corrupt),
        Some(CacheSummary {
            hashes: 0,
            documents: 0,
            entries: 0,
        })
    );
}
