//! Retrieval quality evaluation.
//!
//! Recall here is the binary hit indicator used for open-ended answer
//! retrieval: a query scores `Recall@K = 1` when *any* gold answer string
//! occurs (case-folded, whitespace-trimmed, as a substring) in any of its
//! top-K retrieved passages, else 0. The corpus-level metric is the mean of
//! those indicators over all evaluated queries.
//!
//! This is deliberately not the fraction-of-relevant-items recall used with
//! graded relevance judgments - answer strings, not judged passages, are
//! the ground truth.

pub mod metrics;

pub use metrics::{
    evaluate_batch, passage_hits, recall_from_hits, validate_cutoffs, QueryRecall,
    RecallAccumulator,
};
