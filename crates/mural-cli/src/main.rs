//! Mural CLI - evaluate a multimodal retrieval model against a passage
//! corpus and report mean Recall@K.
//!
//! # Usage
//!
//! ```bash
//! mural --dataset-path data/okvqa \
//!       --passage-path data/passages \
//!       --image-root /data/ok-vqa \
//!       --checkpoint-path ./checkpoint \
//!       --index-name OKVQA_GS \
//!       --run-indexing --use-gpu \
//!       --ks 1,5,10,20,50,100
//! ```
//!
//! The retrieval model and index run in a separate service process reached
//! via `--endpoint`; this binary owns dataset loading, query composition,
//! batching, and scoring. Any fatal error from composition, encoding, or
//! retrieval aborts the run with a non-zero exit.

mod output;
mod run;

use anyhow::Result;
use clap::Parser;
use mural_core::config::{
    DEFAULT_INDEXING_BATCH_SIZE, DEFAULT_NBITS, DEFAULT_NUM_ROIS, DEFAULT_NUM_WORKERS,
    DEFAULT_QUERY_BATCH_SIZE,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Evaluate multimodal passage retrieval with Recall@K.
#[derive(Parser, Debug)]
#[command(name = "mural", version, about)]
pub struct Cli {
    /// Samples file, or a directory containing `{split}.jsonl`
    #[arg(long)]
    pub dataset_path: PathBuf,

    /// Passage corpus file, or a directory containing `{split}_passages.jsonl`
    #[arg(long)]
    pub passage_path: PathBuf,

    /// Dataset split to evaluate
    #[arg(long, default_value = "test")]
    pub split: String,

    /// Directory joined onto image and region paths
    #[arg(long)]
    pub image_root: Option<PathBuf>,

    /// Model checkpoint directory (tokenizer.json lives here)
    #[arg(long)]
    pub checkpoint_path: PathBuf,

    /// Base URL of the retrieval model service
    #[arg(long, default_value = "http://localhost:5000")]
    pub endpoint: String,

    /// Index root directory on the service side
    #[arg(long, default_value = ".")]
    pub index_root: String,

    /// Index name within the index root
    #[arg(long)]
    pub index_name: String,

    /// Recall cutoffs (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub ks: Option<Vec<usize>>,

    /// Region crops per query (the full image is always added on top)
    #[arg(long, default_value_t = DEFAULT_NUM_ROIS)]
    pub num_rois: usize,

    /// Queries per encode/search batch
    #[arg(long, default_value_t = DEFAULT_QUERY_BATCH_SIZE)]
    pub query_batch_size: usize,

    /// Passages per indexing batch
    #[arg(long, default_value_t = DEFAULT_INDEXING_BATCH_SIZE)]
    pub indexing_batch_size: usize,

    /// Searcher-side candidate generation batch size
    #[arg(long)]
    pub search_batch_size: Option<usize>,

    /// Bits per dimension for index compression
    #[arg(long, default_value_t = DEFAULT_NBITS)]
    pub nbits: u32,

    /// Worker threads for pixel preprocessing
    #[arg(long, default_value_t = DEFAULT_NUM_WORKERS)]
    pub num_workers: usize,

    /// Build the passage index before searching
    #[arg(long)]
    pub run_indexing: bool,

    /// Overwrite an existing index of the same name
    #[arg(long)]
    pub overwrite_index: bool,

    /// Run the service-side model on accelerated hardware
    #[arg(long)]
    pub use_gpu: bool,

    /// Output the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let report = run::execute(&cli)?;

    let rendered = if cli.json {
        output::format_json(&report)
    } else {
        output::format_human(&report)
    };
    println!("{}", rendered);

    Ok(())
}
