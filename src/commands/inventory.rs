use std::path::Path;

use anyhow::{Context, Result, bail};
use tracing::info;

use crate::cli::InventoryArgs;
use crate::model::{FragmentFileEntry, FragmentInventoryManifest, TextFragment};
use crate::util::{collect_json_files, now_utc_string, read_json, sha256_file, write_json_pretty};


pub fn run(args: InventoryArgs) -> Result<()> {
    let manifest = build_manifest(&args.source_dir)?;

    if args.dry_run {
        info!(
            file_count = manifest.file_count,
            source = %manifest.source_directory,
            "inventory dry-run complete"
        );
        return Ok(());
    }

    let manifest_path = args.manifest_path.unwrap_or_else(|| {
        args.cache_root
            .join("manifests")
            .join("fragment_inventory.json")
    });

    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote inventory manifest");
    info!(file_count = manifest.file_count, "inventory completed");

    Ok(())
}

pub fn build_manifest(source_dir: &Path) -> Result<FragmentInventoryManifest> {
    if !source_dir.is_dir() {
        bail!("not a directory: {}", source_dir.display());
    }

    let paths = collect_json_files(&[source_dir.to_path_buf()])?;
    if paths.is_empty() {
        bail!("no fragment files found in {}", source_dir.display());
    }

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(ToOwned::to_owned)
            .with_context(|| format!("invalid UTF-8 filename: {}", path.display()))?;

        let fragments: Vec<TextFragment> = read_json(&path)?;
        let sha256 = sha256_file(&path)?;

        files.push(FragmentFileEntry {
            filename,
            sha256,
            fragment_count: fragments.len(),
            first_page: fragments.iter().map(|fragment| fragment.page).min(),
            last_page: fragments.iter().map(|fragment| fragment.page).max(),
        });
    }

    Ok(FragmentInventoryManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        source_directory: source_dir.display().to_string(),
        file_count: files.len(),
        files,
    })
}
