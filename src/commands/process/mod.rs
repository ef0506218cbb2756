use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use crate::cli::ProcessArgs;
use crate::dedup::{CacheStore, DedupConfig, DedupReport, DeduplicationEngine};
use crate::model::{DocumentMetadata, DocumentRecord, ExtractedTable, TextFragment};
use crate::normalize::{NormalizationDictionaries, Normalizer};
use crate::structure::{StructureBuilder, assemble_document};
use crate::util::{
    collect_json_files, file_stem_string, now_utc_string, read_json, sha256_file,
    utc_compact_string, write_json_pretty,
};

#[cfg(test)]
mod tests;

#[derive(Debug, Clone, Serialize)]
pub struct ProcessRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub started_at: String,
    pub completed_at: String,
    pub dry_run: bool,
    pub cache_path: String,
    pub cache_saved: bool,
    pub output_dir: String,
    pub config: DedupConfig,
    pub documents: Vec<ProcessedDocument>,
    pub failed_sources: Vec<FailedSource>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessedDocument {
    pub source_path: String,
    pub source_sha256: String,
    pub output_path: String,
    pub fragment_count: usize,
    pub table_count: usize,
    pub report: DedupReport,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedSource {
    pub source_path: String,
    pub error: String,
}

/// Side inputs keyed by file stem.
struct SideInputs {
    metadata: BTreeMap<String, DocumentMetadata>,
    tables: BTreeMap<String, Vec<ExtractedTable>>,
}

/// Source stem that first produced each document name in this run.
type ClaimedNames = BTreeMap<String, String>;

pub fn run(args: ProcessArgs) -> Result<()> {
    let (manifest, report_path) = execute(&args)?;

    write_json_pretty(&report_path, &manifest)?;
    info!(path = %report_path.display(), "wrote run report");
    info!(
        run_id = %manifest.run_id,
        documents = manifest.documents.len(),
        failed = manifest.failed_sources.len(),
        cache_saved = manifest.cache_saved,
        "process completed"
    );

    Ok(())
}

/// Runs the whole batch and returns the run report together with the path it
/// should be written to.
pub fn execute(args: &ProcessArgs) -> Result<(ProcessRunManifest, PathBuf)> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let config = dedup_config(args)?;
    let sources = collect_json_files(&args.inputs)?;
    if sources.is_empty() {
        bail!("no fragment files found in the given inputs");
    }

    let cache_path = args.resolved_cache_path();
    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| args.cache_root.join("output"));
    let report_path = args.report_path.clone().unwrap_or_else(|| {
        args.cache_root.join("manifests").join(format!(
            "process_run_{}.json",
            utc_compact_string(started_ts)
        ))
    });

    info!(
        run_id = %run_id,
        sources = sources.len(),
        cache = %cache_path.display(),
        output_dir = %output_dir.display(),
        "starting process"
    );

    let dictionaries =
        NormalizationDictionaries::load_or_default(args.dictionaries_path.as_deref());
    let normalizer = Normalizer::new(&dictionaries)?;
    let builder = StructureBuilder::new()?;
    let side_inputs = SideInputs {
        metadata: load_keyed(args.metadata_path.as_deref())?,
        tables: load_keyed(args.tables_path.as_deref())?,
    };

    let mut store = CacheStore::load(&cache_path);
    let mut documents = Vec::with_capacity(sources.len());
    let mut failed_sources = Vec::new();
    let mut claimed_names = ClaimedNames::new();
    {
        let mut engine = DeduplicationEngine::new(&mut store, &normalizer, config);
        for source in &sources {
            match process_source(
                source,
                &builder,
                &mut engine,
                &side_inputs,
                &mut claimed_names,
                &output_dir,
            ) {
                Ok(processed) => documents.push(processed),
                Err(error) => {
                    warn!(
                        path = %source.display(),
                        error = %format!("{error:#}"),
                        "skipping source"
                    );
                    failed_sources.push(FailedSource {
                        source_path: source.display().to_string(),
                        error: format!("{error:#}"),
                    });
                }
            }
        }
    }

    let cache_saved = if args.dry_run {
        info!(path = %cache_path.display(), "dry-run; cache not saved");
        false
    } else {
        store.save_best_effort()
    };

    let manifest = ProcessRunManifest {
        manifest_version: 1,
        run_id,
        started_at,
        completed_at: now_utc_string(),
        dry_run: args.dry_run,
        cache_path: cache_path.display().to_string(),
        cache_saved,
        output_dir: output_dir.display().to_string(),
        config,
        documents,
        failed_sources,
    };

    Ok((manifest, report_path))
}

fn dedup_config(args: &ProcessArgs) -> Result<DedupConfig> {
    if args.fuzzy_threshold > 100 {
        bail!(
            "--fuzzy-threshold must be within 0..=100, got {}",
            args.fuzzy_threshold
        );
    }
    if !(0.0..=1.0).contains(&args.semantic_threshold) {
        bail!(
            "--semantic-threshold must be within 0.0..=1.0, got {}",
            args.semantic_threshold
        );
    }

    Ok(DedupConfig {
        fuzzy_threshold: args.fuzzy_threshold,
        fuzzy_within_containers: !args.no_fuzzy,
        semantic_threshold: args.semantic_threshold,
        min_text_len: args.min_text_len,
    })
}

fn load_keyed<T: DeserializeOwned>(path: Option<&Path>) -> Result<BTreeMap<String, T>> {
    match path {
        Some(path) => read_json(path).with_context(|| {
            format!(
                "expected a JSON object keyed by file stem: {}",
                path.display()
            )
        }),
        None => Ok(BTreeMap::new()),
    }
}

fn process_source(
    source: &Path,
    builder: &StructureBuilder,
    engine: &mut DeduplicationEngine<'_>,
    side_inputs: &SideInputs,
    claimed_names: &mut ClaimedNames,
    output_dir: &Path,
) -> Result<ProcessedDocument> {
    let fragments: Vec<TextFragment> = read_json(source)?;
    let source_sha256 = sha256_file(source)?;
    let stem = file_stem_string(source);

    let metadata = side_inputs
        .metadata
        .get(&stem)
        .cloned()
        .unwrap_or_default();
    let document = assemble_document(&stem, &metadata, &fragments, builder.build(&fragments));
    if let Some(previous_source) = claim_document_name(claimed_names, &document.name, &stem) {
        warn!(
            doc = %document.name,
            previous_source = %previous_source,
            source = %stem,
            "document name already produced by another source; its cached entries are replaced"
        );
    }

    let checkpoint = engine.checkpoint();
    let (pruned, report) = engine.process(document);

    let tables = side_inputs.tables.get(&stem).cloned().unwrap_or_default();
    let table_count = tables.len();
    let record = DocumentRecord {
        document: pruned,
        tables,
    };

    let output_path = output_dir.join(format!("{stem}_output.json"));
    if let Err(error) = write_json_pretty(&output_path, &record) {
        engine.rollback(checkpoint);
        warn!(
            source = %source.display(),
            "output not written; cache changes for this source rolled back"
        );
        return Err(error);
    }
    info!(
        source = %source.display(),
        output = %output_path.display(),
        tables = table_count,
        "wrote document record"
    );

    Ok(ProcessedDocument {
        source_path: source.display().to_string(),
        source_sha256,
        output_path: output_path.display().to_string(),
        fragment_count: fragments.len(),
        table_count,
        report,
    })
}

/// Records `stem` as the source of `name` and returns the other source stem
/// that claimed the same name earlier in the run, if any.
fn claim_document_name(claimed: &mut ClaimedNames, name: &str, stem: &str) -> Option<String> {
    claimed
        .insert(name.to_string(), stem.to_string())
        .filter(|previous| previous != stem)
}
