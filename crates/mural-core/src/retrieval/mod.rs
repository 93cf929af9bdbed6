//! Retrieval seams and orchestration.
//!
//! The retrieval model's encoder and the passage index are external
//! collaborators. This module defines the traits the pipeline consumes them
//! through ([`QueryEncoder`], [`PassageSearcher`], [`PassageIndexer`]), the
//! HTTP-backed implementations ([`remote`]), and the per-batch
//! [`Orchestrator`] that drives encode and search calls and maps results
//! back to per-query ranked lists.
//!
//! Handles are acquired once per run and injected into the orchestrator;
//! nothing here reaches into shared mutable state.

pub mod orchestrator;
pub mod remote;

pub use orchestrator::Orchestrator;
pub use remote::{RemoteBackend, RemoteSearcher};

use crate::encoding::EncoderInput;
use crate::error::RetrievalError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One multi-vector ("late interaction") query embedding: one vector per
/// token position rather than a single pooled vector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiVectorEmbedding {
    /// Per-token embedding vectors
    pub vectors: Vec<Vec<f32>>,
}

impl MultiVectorEmbedding {
    /// Number of token vectors in this embedding.
    pub fn num_vectors(&self) -> usize {
        self.vectors.len()
    }

    /// Dimension of the token vectors, if any exist.
    pub fn dim(&self) -> Option<usize> {
        self.vectors.first().map(Vec::len)
    }
}

/// Ranked passages per query for one batch.
///
/// Each list is ordered by descending score with ties broken by ascending
/// passage id - the searcher owns that total order, the pipeline only
/// consumes it. A ranking result is produced once per batch and consumed
/// immediately by the evaluator.
#[derive(Debug, Clone)]
pub struct RankingResult {
    rankings: HashMap<String, Vec<(usize, f32)>>,
}

impl RankingResult {
    /// Builds a ranking result from per-query ranked lists.
    pub fn new(rankings: HashMap<String, Vec<(usize, f32)>>) -> Self {
        Self { rankings }
    }

    /// Ranked `(passage_id, score)` pairs for a query.
    pub fn get(&self, query_id: &str) -> Option<&[(usize, f32)]> {
        self.rankings.get(query_id).map(Vec::as_slice)
    }

    /// Number of queries with rankings.
    pub fn len(&self) -> usize {
        self.rankings.len()
    }

    /// Returns true if no query has a ranking.
    pub fn is_empty(&self) -> bool {
        self.rankings.is_empty()
    }
}

/// Parameters for passage index construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexParams {
    /// Directory the index lives under
    pub index_root: String,
    /// Index name within the root
    pub index_name: String,
    /// Retrieval model checkpoint used to embed passages
    pub checkpoint: String,
    /// Bits per dimension for embedding compression
    pub nbits: u32,
    /// Maximum token length for indexed passages
    pub doc_max_length: usize,
    /// Passages embedded per indexing batch
    pub batch_size: usize,
    /// Whether to overwrite an existing index of the same name
    pub overwrite: bool,
    /// Whether the service should index on accelerated hardware
    pub use_gpu: bool,
}

/// Parameters for opening a searcher over an existing index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearcherParams {
    /// Directory the index lives under
    pub index_root: String,
    /// Index name within the root
    pub index_name: String,
    /// Bits per dimension the index was built with
    pub nbits: u32,
    /// Whether to search on accelerated hardware
    pub use_gpu: bool,
    /// Optional sub-batch size for the searcher's candidate generation
    pub search_batch_size: Option<usize>,
}

/// External query encoder: encoder input in, one multi-vector embedding per
/// query out, in input order.
pub trait QueryEncoder: Send + Sync {
    /// Encodes one batch of queries.
    fn encode_batch(
        &self,
        input: &EncoderInput,
    ) -> Result<Vec<MultiVectorEmbedding>, RetrievalError>;
}

/// External passage searcher over a prebuilt index.
///
/// Returns, for every query id it serves, an ordered `(passage_id, score)`
/// list of length `k` (or fewer when the corpus is smaller).
pub trait PassageSearcher: Send + Sync {
    /// Searches the index with a batch of query embeddings.
    fn search(
        &self,
        query_ids: &[String],
        embeddings: &[MultiVectorEmbedding],
        k: usize,
    ) -> Result<HashMap<String, Vec<(usize, f32)>>, RetrievalError>;
}

/// External index builder.
pub trait PassageIndexer {
    /// Builds (or rebuilds) the passage index, returning its path.
    fn build_index(&self, passages: &[String], params: &IndexParams)
        -> Result<String, RetrievalError>;
}
