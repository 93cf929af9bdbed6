//! Error types for mural-core.
//!
//! Every stage of the pipeline fails fast: no error is caught and converted
//! to a default value, and each variant carries enough context to name the
//! offending sample, query, or passage. Dataset loading has its own error
//! type in [`crate::dataset`].

use thiserror::Error;

/// Errors raised while composing a query from a sample.
#[derive(Debug, Clone, Error)]
pub enum ComposeError {
    /// A region descriptor did not parse into its five expected fields
    #[error("Malformed region descriptor: {0}")]
    MalformedRegion(String),
    /// A referenced image could not be opened or decoded
    #[error("Unreadable image {path}: {reason}")]
    ImageUnreadable {
        /// Path of the image that failed to open
        path: String,
        /// Decoder error text
        reason: String,
    },
    /// The sample has no regions to repeat but crops were requested
    #[error("Sample has no regions but {requested} crops were requested")]
    EmptyRegionList {
        /// Number of region crops the composition asked for
        requested: usize,
    },
}

/// Errors raised while adapting composed queries into encoder input.
#[derive(Debug, Clone, Error)]
pub enum EncodeError {
    /// Tokenizer initialization failed
    #[error("Tokenizer unavailable: {0}")]
    TokenizerUnavailable(String),
    /// Batch tokenization failed
    #[error("Tokenization failed: {0}")]
    TokenizationFailed(String),
    /// Queries in one batch carry differing crop counts
    #[error("Inconsistent crop counts in batch: expected {expected}, got {actual}")]
    RaggedCropCounts {
        /// Crop count of the first query in the batch
        expected: usize,
        /// Crop count of the offending query
        actual: usize,
    },
    /// A preprocessing worker thread panicked
    #[error("Image worker thread panicked")]
    WorkerPanicked,
}

/// Errors raised while driving the external encoder and searcher.
#[derive(Debug, Clone, Error)]
pub enum RetrievalError {
    /// The external encoder rejected or failed a batch
    #[error("Query encoding failed: {0}")]
    Encode(String),
    /// The external searcher rejected or failed a batch
    #[error("Passage search failed: {0}")]
    Search(String),
    /// Index construction failed
    #[error("Index build failed: {0}")]
    Index(String),
    /// The encoder returned a different number of embeddings than queries
    #[error("Embedding count mismatch: {queries} queries, {embeddings} embeddings")]
    EmbeddingCountMismatch {
        /// Queries submitted in the batch
        queries: usize,
        /// Embeddings returned by the encoder
        embeddings: usize,
    },
    /// The searcher's result set omitted a query it was asked to serve
    #[error("Searcher returned no ranking for query {query_id}")]
    MissingQuery {
        /// Identifier of the query absent from the result set
        query_id: String,
    },
    /// Transport-level failure talking to the backend service
    #[error("Backend request failed: {0}")]
    Http(String),
}

/// Errors raised while scoring rankings against gold answers.
#[derive(Debug, Clone, Error)]
pub enum EvalError {
    /// A ranking referenced a passage id outside the corpus
    #[error("Retrieved passage id {passage_id} is outside the corpus (size {corpus_size})")]
    PassageOutOfRange {
        /// Offending passage id
        passage_id: usize,
        /// Number of passages in the corpus
        corpus_size: usize,
    },
    /// No ranking was supplied for a query under evaluation
    #[error("No ranking available for query {query_id}")]
    MissingRanking {
        /// Identifier of the query with no ranking
        query_id: String,
    },
}

/// Errors raised by run configuration validation, before any batch runs.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// No recall cutoffs were requested
    #[error("No recall cutoffs requested")]
    EmptyCutoffs,
    /// A requested cutoff exceeds the corpus size
    #[error("Recall cutoff {cutoff} exceeds corpus size {corpus_size}")]
    CutoffExceedsCorpus {
        /// Offending cutoff
        cutoff: usize,
        /// Number of passages in the corpus
        corpus_size: usize,
    },
    /// Worker count of zero leaves the adapter with no threads
    #[error("Worker count must be at least 1")]
    NoWorkers,
}

impl From<reqwest::Error> for RetrievalError {
    fn from(err: reqwest::Error) -> Self {
        RetrievalError::Http(err.to_string())
    }
}
