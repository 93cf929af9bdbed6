//! Recall@K computation and corpus-level aggregation.

use crate::dataset::PassageCorpus;
use crate::error::{ConfigError, EvalError};
use crate::retrieval::RankingResult;
use std::collections::BTreeMap;

/// Per-query recall record: cutoff -> binary hit indicator.
#[derive(Debug, Clone)]
pub struct QueryRecall {
    /// Identifier of the evaluated query
    pub query_id: String,
    /// `K -> 1.0 | 0.0` for every requested cutoff
    pub recall_at_k: BTreeMap<usize, f64>,
}

/// Validates requested recall cutoffs against the corpus before a run.
///
/// # Errors
///
/// - `ConfigError::EmptyCutoffs` when no cutoff is requested
/// - `ConfigError::CutoffExceedsCorpus` when a cutoff is larger than the
///   corpus (the searcher could never return that many candidates)
pub fn validate_cutoffs(cutoffs: &[usize], corpus_size: usize) -> Result<(), ConfigError> {
    if cutoffs.is_empty() {
        return Err(ConfigError::EmptyCutoffs);
    }
    for &cutoff in cutoffs {
        if cutoff > corpus_size {
            return Err(ConfigError::CutoffExceedsCorpus {
                cutoff,
                corpus_size,
            });
        }
    }
    Ok(())
}

/// Marks each retrieved passage as a hit or miss against the gold answers.
///
/// A passage is a hit when any answer string - whitespace-trimmed and
/// case-folded - occurs as a substring of the case-folded passage text.
/// Output order follows the ranking order.
///
/// # Errors
///
/// Returns `EvalError::PassageOutOfRange` when a ranked id does not resolve
/// to a corpus passage.
pub fn passage_hits(
    ranked: &[(usize, f32)],
    answers: &[String],
    corpus: &PassageCorpus,
) -> Result<Vec<bool>, EvalError> {
    let needles: Vec<String> = answers.iter().map(|a| a.trim().to_lowercase()).collect();

    ranked
        .iter()
        .map(|&(passage_id, _)| {
            let passage = corpus
                .get(passage_id)
                .ok_or(EvalError::PassageOutOfRange {
                    passage_id,
                    corpus_size: corpus.len(),
                })?;
            let haystack = passage.to_lowercase();
            Ok(needles.iter().any(|needle| haystack.contains(needle)))
        })
        .collect()
}

/// Collapses a hit list into per-cutoff binary recall.
///
/// `Recall@K` is 1.0 when any hit occurs within the first `K` positions.
/// Because the window only grows with `K`, recall is non-decreasing across
/// ascending cutoffs for a fixed query.
pub fn recall_from_hits(hits: &[bool], cutoffs: &[usize]) -> BTreeMap<usize, f64> {
    cutoffs
        .iter()
        .map(|&k| {
            let hit = hits.iter().take(k).any(|&h| h);
            (k, if hit { 1.0 } else { 0.0 })
        })
        .collect()
}

/// Scores one batch of queries against its ranking result.
///
/// # Arguments
///
/// * `ranking` - Ranked passages for this batch
/// * `queries` - `(query_id, gold answers)` pairs, batch order
/// * `corpus` - The passage corpus rankings resolve into
/// * `cutoffs` - Recall cutoffs to evaluate
///
/// # Errors
///
/// Returns `EvalError::MissingRanking` when a query has no ranking (a
/// missing query is never scored as zero), or `EvalError::PassageOutOfRange`
/// for unresolvable passage ids.
pub fn evaluate_batch(
    ranking: &RankingResult,
    queries: &[(String, Vec<String>)],
    corpus: &PassageCorpus,
    cutoffs: &[usize],
) -> Result<Vec<QueryRecall>, EvalError> {
    queries
        .iter()
        .map(|(query_id, answers)| {
            let ranked = ranking.get(query_id).ok_or_else(|| EvalError::MissingRanking {
                query_id: query_id.clone(),
            })?;
            let hits = passage_hits(ranked, answers, corpus)?;
            Ok(QueryRecall {
                query_id: query_id.clone(),
                recall_at_k: recall_from_hits(&hits, cutoffs),
            })
        })
        .collect()
}

/// Accumulates per-query recall records across batches and reports the
/// corpus-level mean per cutoff.
#[derive(Debug)]
pub struct RecallAccumulator {
    cutoffs: Vec<usize>,
    records: Vec<QueryRecall>,
}

impl RecallAccumulator {
    /// Creates an accumulator for the given cutoffs.
    pub fn new(cutoffs: Vec<usize>) -> Self {
        Self {
            cutoffs,
            records: Vec::new(),
        }
    }

    /// Adds one batch of records.
    pub fn extend(&mut self, records: Vec<QueryRecall>) {
        self.records.extend(records);
    }

    /// Number of queries accumulated so far.
    pub fn num_queries(&self) -> usize {
        self.records.len()
    }

    /// The cutoffs this accumulator evaluates.
    pub fn cutoffs(&self) -> &[usize] {
        &self.cutoffs
    }

    /// Mean recall per cutoff over all accumulated queries.
    ///
    /// Returns 0.0 per cutoff when no queries were evaluated.
    pub fn mean_recall(&self) -> BTreeMap<usize, f64> {
        let n = self.records.len();
        self.cutoffs
            .iter()
            .map(|&k| {
                let sum: f64 = self
                    .records
                    .iter()
                    .filter_map(|r| r.recall_at_k.get(&k))
                    .sum();
                (k, if n == 0 { 0.0 } else { sum / n as f64 })
            })
            .collect()
    }

    /// Per-query records, batch insertion order.
    pub fn records(&self) -> &[QueryRecall] {
        &self.records
    }
}
