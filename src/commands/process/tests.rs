use std::fs;

use serde_json::{Value, json};

use super::*;

fn write_fragments(dir: &Path, name: &str, fragments: Value) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, serde_json::to_vec(&fragments).expect("serialize fragments"))
        .expect("write fragments");
    path
}

fn regulation() -> Value {
    json!([
        {"text": "CAPÍTULO I", "page": 3},
        {"text": "Art. 1º Este regulamento disciplina as atividades complementares do curso.", "page": 3},
        {"text": "Parágrafo único. As atividades serão comprovadas por certificado.", "page": 4}
    ])
}

fn args_for(root: &Path, inputs: Vec<PathBuf>) -> ProcessArgs {
    ProcessArgs {
        inputs,
        cache_root: root.join("cache"),
        cache_path: None,
        output_dir: Some(root.join("out")),
        metadata_path: None,
        tables_path: None,
        dictionaries_path: None,
        fuzzy_threshold: crate::dedup::DEFAULT_FUZZY_THRESHOLD,
        semantic_threshold: crate::dedup::DEFAULT_SEMANTIC_THRESHOLD,
        min_text_len: crate::dedup::DEFAULT_MIN_TEXT_LEN,
        no_fuzzy: false,
        report_path: None,
        dry_run: false,
    }
}

fn read_output(root: &Path, stem: &str) -> Value {
    let raw = fs::read(root.join("out").join(format!("{stem}_output.json"))).expect("output file");
    serde_json::from_slice(&raw).expect("output json")
}

#[test]
fn batch_keeps_first_copy_and_persists_cache() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input_dir = dir.path().join("fragments");
    fs::create_dir_all(&input_dir).expect("input dir");
    write_fragments(&input_dir, "a_regulamento.json", regulation());
    write_fragments(&input_dir, "b_regulamento_copia.json", regulation());
    fs::write(input_dir.join("notes.txt"), "ignored").expect("write notes");

    let args = args_for(dir.path(), vec![input_dir.clone()]);
    let (manifest, report_path) = execute(&args).expect("process run");

    assert_eq!(manifest.documents.len(), 2);
    assert!(manifest.failed_sources.is_empty());
    assert!(manifest.cache_saved);
    assert!(dir.path().join("cache").join("dedup_cache.json").exists());
    assert!(report_path.starts_with(dir.path().join("cache").join("manifests")));

    let first = read_output(dir.path(), "a_regulamento");
    assert_eq!(first["doc_id"], "a_regulamento");
    assert_eq!(first["nome_doc"], "a regulamento");
    assert_eq!(first["versao"], "1ª versão");
    assert_eq!(first["pagina_inicial"], 3);
    assert_eq!(first["pagina_final"], 4);
    assert_eq!(first["estrutura"][0]["tipo"], "secao");
    assert!(first.get("tables").is_none());

    let second = read_output(dir.path(), "b_regulamento_copia");
    assert_eq!(second["estrutura"], json!([]));
    assert_eq!(manifest.documents[1].report.counts.exact_pruned, 2);

    // A rerun against the saved cache prunes both documents entirely.
    let (rerun, _) = execute(&args).expect("second process run");
    assert!(
        rerun
            .documents
            .iter()
            .all(|document| document.report.counts.paragraphs_after == 0)
    );
    assert_eq!(read_output(dir.path(), "a_regulamento")["estrutura"], json!([]));
}

#[test]
fn dry_run_leaves_cache_untouched() {
    let dir = tempfile::tempdir().expect("tempdir");
    let source = write_fragments(dir.path(), "regulamento.json", regulation());

    let mut args = args_for(dir.path(), vec![source]);
    args.dry_run = true;
    let (manifest, _) = execute(&args).expect("process run");

    assert!(!manifest.cache_saved);
    assert!(!dir.path().join("cache").join("dedup_cache.json").exists());

    let (again, _) = execute(&args).expect("second dry run");
    assert_eq!(again.documents[0].report.counts.paragraphs_after, 2);
}

#[test]
fn metadata_and_tables_are_merged_by_stem() {
    let dir = tempfile::tempdir().expect("tempdir");
    let source = write_fragments(dir.path(), "regulamento.json", regulation());
    let metadata_path = dir.path().join("metadata.json");
    fs::write(
        &metadata_path,
        serde_json::to_vec(&json!({
            "regulamento": {
                "doc_id": "RES-042",
                "nome_doc": "Resolução 42",
                "data_publicacao": "2021-03-15"
            }
        }))
        .expect("serialize metadata"),
    )
    .expect("write metadata");
    let tables_path = dir.path().join("tables.json");
    fs::write(
        &tables_path,
        serde_json::to_vec(&json!({
            "regulamento": [[["Atividade", "Horas"], ["Monitoria", "40"]]]
        }))
        .expect("serialize tables"),
    )
    .expect("write tables");

    let mut args = args_for(dir.path(), vec![source]);
    args.metadata_path = Some(metadata_path);
    args.tables_path = Some(tables_path);
    let (manifest, _) = execute(&args).expect("process run");
    assert_eq!(manifest.documents[0].table_count, 1);

    let record = read_output(dir.path(), "regulamento");
    assert_eq!(record["doc_id"], "RES-042");
    assert_eq!(record["nome_doc"], "Resolução 42");
    assert_eq!(record["data_publicacao"], "2021-03-15");
    assert_eq!(record["versao"], "1ª versão");
    assert_eq!(record["tables"][0][1][0], "Monitoria");
}

#[test]
fn unreadable_source_is_reported_and_skipped() {
    let dir = tempfile::tempdir().expect("tempdir");
    let good = write_fragments(dir.path(), "regulamento.json", regulation());
    let bad = dir.path().join("quebrado.json");
    fs::write(&bad, b"[{\"text\": ").expect("write broken fragments");

    let args = args_for(dir.path(), vec![good, bad]);
    let (manifest, _) = execute(&args).expect("process run");

    assert_eq!(manifest.documents.len(), 1);
    assert_eq!(manifest.failed_sources.len(), 1);
    assert!(manifest.failed_sources[0].source_path.ends_with("quebrado.json"));
    assert!(manifest.cache_saved);
}

#[test]
fn empty_inputs_and_bad_thresholds_are_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let empty_dir = dir.path().join("empty");
    fs::create_dir_all(&empty_dir).expect("empty dir");
    assert!(execute(&args_for(dir.path(), vec![empty_dir])).is_err());

    let source = write_fragments(dir.path(), "regulamento.json", regulation());
    let mut args = args_for(dir.path(), vec![source]);
    args.semantic_threshold = 1.5;
    assert!(execute(&args).is_err());
}

#[test]
fn unwritable_output_leaves_cache_without_the_document() {
    let dir = tempfile::tempdir().expect("tempdir");
    let source = write_fragments(dir.path(), "regulamento.json", regulation());
    let blocker = dir.path().join("saida");
    fs::write(&blocker, "not a directory").expect("write blocker");

    let mut args = args_for(dir.path(), vec![source]);
    args.output_dir = Some(blocker);
    let (manifest, _) = execute(&args).expect("process run");

    assert!(manifest.documents.is_empty());
    assert_eq!(manifest.failed_sources.len(), 1);
    assert!(manifest.cache_saved);

    let cache = CacheStore::load(&dir.path().join("cache").join("dedup_cache.json"));
    assert_eq!(cache.index().len(), 0);
    assert_eq!(cache.texts().document_count(), 0);

    args.output_dir = Some(dir.path().join("out"));
    let (retry, _) = execute(&args).expect("retry run");
    assert_eq!(retry.documents[0].report.counts.paragraphs_after, 2);
    assert_eq!(read_output(dir.path(), "regulamento")["estrutura"][0]["tipo"], "secao");
}

#[test]
fn claim_document_name_reports_the_earlier_source() {
    let mut claimed = ClaimedNames::new();
    assert_eq!(
        claim_document_name(&mut claimed, "Resolução 42", "res_42_v1"),
        None
    );
    assert_eq!(
        claim_document_name(&mut claimed, "Resolução 42", "res_42_v2"),
        Some("res_42_v1".to_string())
    );
    assert_eq!(claim_document_name(&mut claimed, "Resolução 43", "res_43"), None);
}

#[test]
fn sources_sharing_a_name_share_one_cache_slot() {
    let dir = tempfile::tempdir().expect("tempdir");
    let first = write_fragments(dir.path(), "res_42_v1.json", regulation());
    let second = write_fragments(
        dir.path(),
        "res_42_v2.json",
        json!([{"text": "Art. 9º Texto completamente novo desta versão revisada da resolução.", "page": 1}]),
    );
    let metadata_path = dir.path().join("metadata.json");
    fs::write(
        &metadata_path,
        serde_json::to_vec(&json!({
            "res_42_v1": {"nome_doc": "Resolução 42"},
            "res_42_v2": {"nome_doc": "Resolução 42"}
        }))
        .expect("serialize metadata"),
    )
    .expect("write metadata");

    let mut args = args_for(dir.path(), vec![first, second]);
    args.metadata_path = Some(metadata_path);
    let (manifest, _) = execute(&args).expect("process run");
    assert_eq!(manifest.documents.len(), 2);

    let cache = CacheStore::load(&dir.path().join("cache").join("dedup_cache.json"));
    assert_eq!(cache.texts().document_count(), 1);
    assert_eq!(cache.texts().get("Resolução 42").len(), 1);
}
