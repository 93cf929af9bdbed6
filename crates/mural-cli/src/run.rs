//! Run orchestration: load, compose, batch, retrieve, evaluate.

use crate::Cli;
use anyhow::{anyhow, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use mural_core::compose::compose;
use mural_core::config::{DEFAULT_RECALL_CUTOFFS, DOC_MAX_LENGTH, QUERY_MAX_TOKENS};
use mural_core::dataset::{load_passages, load_samples, PassageCorpus, Sample};
use mural_core::encoding::{BatchAdapter, ImageProcessor, QueryTokenizer};
use mural_core::evaluation::{evaluate_batch, validate_cutoffs, QueryRecall, RecallAccumulator};
use mural_core::retrieval::{
    IndexParams, Orchestrator, PassageIndexer, RemoteBackend, SearcherParams,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Final report for one evaluation run.
#[derive(Debug, Serialize)]
pub struct RunReport {
    /// Evaluated split name
    pub split: String,
    /// Index the searcher ran against
    pub index_name: String,
    /// Queries evaluated
    pub num_queries: usize,
    /// Passages in the corpus
    pub num_passages: usize,
    /// Mean Recall@K per cutoff
    pub mean_recall: BTreeMap<usize, f64>,
}

/// Resolves a dataset argument that may be a file or a split directory.
fn resolve_split_path(path: &Path, file_name: &str) -> PathBuf {
    if path.is_dir() {
        path.join(file_name)
    } else {
        path.to_path_buf()
    }
}

/// Executes one evaluation run end to end.
pub fn execute(args: &Cli) -> Result<RunReport> {
    // -- Load data ----------------------------------------------------------
    let samples_path =
        resolve_split_path(&args.dataset_path, &format!("{}.jsonl", args.split));
    let passages_path = resolve_split_path(
        &args.passage_path,
        &format!("{}_passages.jsonl", args.split),
    );

    let samples = load_samples(&samples_path, args.image_root.as_deref())
        .with_context(|| format!("Failed to load samples from {}", samples_path.display()))?;
    let corpus = load_passages(&passages_path)
        .with_context(|| format!("Failed to load passages from {}", passages_path.display()))?;

    eprintln!(
        "Loaded {} samples and {} passages (split: {})",
        samples.len(),
        corpus.len(),
        args.split
    );
    if samples.is_empty() {
        return Err(anyhow!("No samples to evaluate in {}", samples_path.display()));
    }

    let cutoffs = args
        .ks
        .clone()
        .unwrap_or_else(|| DEFAULT_RECALL_CUTOFFS.to_vec());
    validate_cutoffs(&cutoffs, corpus.len())?;
    let max_k = *cutoffs.iter().max().expect("cutoffs validated non-empty");

    // -- Acquire external handles ------------------------------------------
    let tokenizer_path = args.checkpoint_path.join("tokenizer.json");
    let tokenizer_bytes = std::fs::read(&tokenizer_path)
        .with_context(|| format!("Failed to read tokenizer: {}", tokenizer_path.display()))?;
    let tokenizer = QueryTokenizer::from_bytes(tokenizer_bytes, QUERY_MAX_TOKENS)?;
    let adapter = BatchAdapter::new(tokenizer, ImageProcessor::new(), args.num_workers)?;

    let backend = Arc::new(RemoteBackend::connect(&args.endpoint)?);

    if args.run_indexing {
        eprintln!("Indexing {} passages...", corpus.len());
        let index_path = backend.build_index(
            corpus.contents(),
            &IndexParams {
                index_root: args.index_root.clone(),
                index_name: args.index_name.clone(),
                checkpoint: args.checkpoint_path.display().to_string(),
                nbits: args.nbits,
                doc_max_length: DOC_MAX_LENGTH,
                batch_size: args.indexing_batch_size,
                overwrite: args.overwrite_index,
                use_gpu: args.use_gpu,
            },
        )?;
        info!("index ready at {}", index_path);
    } else {
        info!("skipping indexing, using existing index '{}'", args.index_name);
    }

    let searcher = backend.open_searcher(&SearcherParams {
        index_root: args.index_root.clone(),
        index_name: args.index_name.clone(),
        nbits: args.nbits,
        use_gpu: args.use_gpu,
        search_batch_size: args.search_batch_size,
    })?;

    let orchestrator = Orchestrator::new(backend.clone(), Arc::new(searcher), max_k);

    // -- Batched evaluation loop -------------------------------------------
    let mut accumulator = RecallAccumulator::new(cutoffs.clone());
    let pb = ProgressBar::new(samples.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{bar:40}] {pos}/{len}")
            .expect("static progress template"),
    );
    pb.set_message("Queries");

    for batch in samples.chunks(args.query_batch_size) {
        let records = run_batch(batch, args.num_rois, &adapter, &orchestrator, &corpus, &cutoffs)?;
        accumulator.extend(records);
        pb.inc(batch.len() as u64);
    }
    pb.finish();

    Ok(RunReport {
        split: args.split.clone(),
        index_name: args.index_name.clone(),
        num_queries: accumulator.num_queries(),
        num_passages: corpus.len(),
        mean_recall: accumulator.mean_recall(),
    })
}

/// One batch: compose -> adapt -> retrieve -> evaluate.
fn run_batch(
    batch: &[Sample],
    num_rois: usize,
    adapter: &BatchAdapter,
    orchestrator: &Orchestrator,
    corpus: &PassageCorpus,
    cutoffs: &[usize],
) -> Result<Vec<QueryRecall>> {
    let composed = batch
        .iter()
        .map(|sample| {
            compose(sample, num_rois)
                .with_context(|| format!("Failed to compose sample {}", sample.question_id))
        })
        .collect::<Result<Vec<_>>>()?;

    let input = adapter.adapt(&composed)?;
    let query_ids: Vec<String> = composed.iter().map(|q| q.query_id.clone()).collect();

    let ranking = orchestrator.retrieve(&query_ids, &input)?;

    let gold: Vec<(String, Vec<String>)> = batch
        .iter()
        .map(|s| (s.question_id.clone(), s.answers.clone()))
        .collect();

    evaluate_batch(&ranking, &gold, corpus, cutoffs).map_err(Into::into)
}
