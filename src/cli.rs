use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::dedup::{DEFAULT_FUZZY_THRESHOLD, DEFAULT_MIN_TEXT_LEN, DEFAULT_SEMANTIC_THRESHOLD};

#[derive(Parser, Debug)]
#[command(
    name = "normdedup",
    version,
    about = "Structure extraction and cross-document deduplication for regulatory texts"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Process(ProcessArgs),
    Structure(StructureArgs),
    Inventory(InventoryArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ProcessArgs {
    /// Fragment files, or directories of `*.json` fragment files.
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    #[arg(long, default_value = ".cache/normdedup")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub cache_path: Option<PathBuf>,

    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// JSON object mapping file stems to document header overrides.
    #[arg(long)]
    pub metadata_path: Option<PathBuf>,

    /// JSON object mapping file stems to extracted tables.
    #[arg(long)]
    pub tables_path: Option<PathBuf>,

    #[arg(long)]
    pub dictionaries_path: Option<PathBuf>,

    #[arg(long, default_value_t = DEFAULT_FUZZY_THRESHOLD)]
    pub fuzzy_threshold: u8,

    #[arg(long, default_value_t = DEFAULT_SEMANTIC_THRESHOLD)]
    pub semantic_threshold: f64,

    #[arg(long, default_value_t = DEFAULT_MIN_TEXT_LEN)]
    pub min_text_len: usize,

    #[arg(long, default_value_t = false)]
    pub no_fuzzy: bool,

    #[arg(long)]
    pub report_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct StructureArgs {
    pub input: PathBuf,

    #[arg(long, default_value = ".cache/normdedup")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub output_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct InventoryArgs {
    pub source_dir: PathBuf,

    #[arg(long, default_value = ".cache/normdedup")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = ".cache/normdedup")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub cache_path: Option<PathBuf>,
}

impl ProcessArgs {
    pub fn resolved_cache_path(&self) -> PathBuf {
        resolve_cache_path(&self.cache_root, self.cache_path.as_ref())
    }
}

impl StatusArgs {
    pub fn resolved_cache_path(&self) -> PathBuf {
        resolve_cache_path(&self.cache_root, self.cache_path.as_ref())
    }
}

fn resolve_cache_path(cache_root: &std::path::Path, cache_path: Option<&PathBuf>) -> PathBuf {
    cache_path
        .cloned()
        .unwrap_or_else(|| cache_root.join("dedup_cache.json"))
}
