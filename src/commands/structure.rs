use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::info;

use crate::cli::StructureArgs;
use crate::model::{DocumentMetadata, DocumentRecord, TextFragment};
use crate::structure::{StructureBuilder, assemble_document};
use crate::util::{file_stem_string, read_json, write_json_pretty};

#[cfg(test)]
mod tests;

pub fn run(args: StructureArgs) -> Result<()> {
    let output_path = args.output_path.clone().unwrap_or_else(|| {
        default_output_path(&args.cache_root, &file_stem_string(&args.input))
    });

    let record = build_record(&args.input)?;
    write_json_pretty(&output_path, &record)?;
    info!(
        source = %args.input.display(),
        path = %output_path.display(),
        top_level_nodes = record.document.structure.len(),
        "wrote structure"
    );

    Ok(())
}

/// Structure only: no cache is read and nothing is pruned.
pub fn build_record(input: &Path) -> Result<DocumentRecord> {
    let fragments: Vec<TextFragment> = read_json(input)?;
    let builder = StructureBuilder::new()?;
    let structure = builder.build(&fragments);

    let stem = file_stem_string(input);
    Ok(DocumentRecord {
        document: assemble_document(&stem, &DocumentMetadata::default(), &fragments, structure),
        tables: Vec::new(),
    })
}

fn default_output_path(cache_root: &Path, stem: &str) -> PathBuf {
    cache_root
        .join("structure")
        .join(format!("{stem}_structure.json"))
}
