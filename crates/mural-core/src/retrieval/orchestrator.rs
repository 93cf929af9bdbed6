//! Per-batch retrieval orchestration.

use super::{MultiVectorEmbedding, PassageSearcher, QueryEncoder, RankingResult};
use crate::encoding::EncoderInput;
use crate::error::RetrievalError;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Drives the external encoder and searcher for one batch at a time.
///
/// The orchestrator never ranks anything itself - it trusts the searcher's
/// order. Its responsibilities are pairing embeddings with query ids
/// (positional, checked), requesting enough candidates for every cutoff in
/// one call, and refusing to treat a missing query as zero hits.
///
/// The encoder and searcher handles are injected at construction and shared
/// through `Arc`; the index is a single logical resource queried once per
/// batch, so nothing here parallelizes within a batch.
pub struct Orchestrator {
    encoder: Arc<dyn QueryEncoder>,
    searcher: Arc<dyn PassageSearcher>,
    k: usize,
}

impl Orchestrator {
    /// Creates an orchestrator requesting `k` candidates per query.
    ///
    /// `k` should be the largest requested recall cutoff, so every cutoff
    /// can be evaluated from one retrieval call.
    pub fn new(
        encoder: Arc<dyn QueryEncoder>,
        searcher: Arc<dyn PassageSearcher>,
        k: usize,
    ) -> Self {
        Self {
            encoder,
            searcher,
            k,
        }
    }

    /// Candidates requested per query.
    pub fn k(&self) -> usize {
        self.k
    }

    /// Encodes one batch and retrieves ranked passages for every query.
    ///
    /// # Errors
    ///
    /// - `RetrievalError::EmbeddingCountMismatch` when the encoder returns a
    ///   different number of embeddings than queries submitted
    /// - `RetrievalError::MissingQuery` when the searcher's result set
    ///   omits a query id from this batch
    /// - encoder/searcher errors, propagated as-is (no retries)
    pub fn retrieve(
        &self,
        query_ids: &[String],
        input: &EncoderInput,
    ) -> Result<RankingResult, RetrievalError> {
        let embeddings: Vec<MultiVectorEmbedding> = self.encoder.encode_batch(input)?;
        if embeddings.len() != query_ids.len() {
            return Err(RetrievalError::EmbeddingCountMismatch {
                queries: query_ids.len(),
                embeddings: embeddings.len(),
            });
        }

        debug!(
            "retrieving top-{} passages for {} queries",
            self.k,
            query_ids.len()
        );
        let mut results = self.searcher.search(query_ids, &embeddings, self.k)?;

        let mut rankings = HashMap::with_capacity(query_ids.len());
        for query_id in query_ids {
            let ranked = results
                .remove(query_id)
                .ok_or_else(|| RetrievalError::MissingQuery {
                    query_id: query_id.clone(),
                })?;
            rankings.insert(query_id.clone(), ranked);
        }

        Ok(RankingResult::new(rankings))
    }
}
