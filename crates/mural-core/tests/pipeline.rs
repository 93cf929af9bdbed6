//! End-to-end pipeline test: compose → adapt → retrieve → evaluate.
//!
//! Exercises the full batch cycle against in-memory encoder and searcher
//! implementations, with real images on disk and a real (word-level)
//! tokenizer built in code.

use ahash::AHashMap;
use image::{Rgb, RgbImage};
use mural_core::compose::compose;
use mural_core::dataset::{PassageCorpus, Sample};
use mural_core::encoding::{BatchAdapter, EncoderInput, ImageProcessor, QueryTokenizer};
use mural_core::error::RetrievalError;
use mural_core::evaluation::{evaluate_batch, validate_cutoffs, RecallAccumulator};
use mural_core::retrieval::{
    MultiVectorEmbedding, Orchestrator, PassageSearcher, QueryEncoder,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use tokenizers::models::wordlevel::WordLevel;
use tokenizers::pre_tokenizers::whitespace::Whitespace;
use tokenizers::Tokenizer;

// ============================================================================
// Fixtures
// ============================================================================

fn word_tokenizer() -> QueryTokenizer {
    let words = [
        "[PAD]", "[UNK]", "what", "is", "the", "capital", "river", "a", "city", "photo",
    ];
    let vocab: AHashMap<String, u32> = words
        .iter()
        .enumerate()
        .map(|(i, w)| (w.to_string(), i as u32))
        .collect();
    let model = WordLevel::builder()
        .vocab(vocab)
        .unk_token("[UNK]".to_string())
        .build()
        .unwrap();
    let mut tokenizer = Tokenizer::new(model);
    tokenizer.with_pre_tokenizer(Some(Whitespace {}));
    QueryTokenizer::from_tokenizer(tokenizer, 128).unwrap()
}

fn write_image(path: &Path, width: u32, height: u32) {
    RgbImage::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, 64]))
        .save(path)
        .unwrap();
}

fn sample(dir: &TempDir, id: &str, question: &str, answers: &[&str]) -> Sample {
    let image_path = dir.path().join(format!("{}.png", id));
    write_image(&image_path, 80, 60);
    Sample {
        question_id: id.to_string(),
        question: question.to_string(),
        image_path: image_path.clone(),
        objects: vec![],
        ocr: vec![],
        caption: "a photo".to_string(),
        rois: vec![
            format!("{}|||thing_5_5_40_30", image_path.display()),
            format!("{}|||thing_10_10_50_50", image_path.display()),
        ],
        answers: answers.iter().map(|s| s.to_string()).collect(),
    }
}

struct OneVectorEncoder;

impl QueryEncoder for OneVectorEncoder {
    fn encode_batch(
        &self,
        input: &EncoderInput,
    ) -> Result<Vec<MultiVectorEmbedding>, RetrievalError> {
        Ok(input
            .input_ids
            .iter()
            .map(|ids| MultiVectorEmbedding {
                vectors: vec![vec![ids.len() as f32, 1.0]],
            })
            .collect())
    }
}

/// Serves fixed rankings: descending score, ties broken by ascending id.
struct CannedSearcher {
    table: HashMap<String, Vec<(usize, f32)>>,
}

impl PassageSearcher for CannedSearcher {
    fn search(
        &self,
        query_ids: &[String],
        embeddings: &[MultiVectorEmbedding],
        k: usize,
    ) -> Result<HashMap<String, Vec<(usize, f32)>>, RetrievalError> {
        assert_eq!(query_ids.len(), embeddings.len());
        Ok(query_ids
            .iter()
            .filter_map(|qid| {
                self.table.get(qid).map(|ranked| {
                    let mut ranked = ranked.clone();
                    ranked.truncate(k);
                    (qid.clone(), ranked)
                })
            })
            .collect())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn test_full_batch_cycle() {
    let dir = TempDir::new().unwrap();

    let samples = vec![
        sample(&dir, "q1", "what is the capital", &["paris"]),
        sample(&dir, "q2", "what is the river", &["the nile"]),
    ];

    let corpus = PassageCorpus::new(
        [
            "Berlin is a city in Germany.",
            "The capital of France is Paris.",
            "The Nile is the longest river.",
            "Rust is a systems language.",
            "Mountains rise over the valley.",
            "The ocean is deep.",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect(),
    );

    let cutoffs = vec![1, 5];
    validate_cutoffs(&cutoffs, corpus.len()).unwrap();

    // Compose: 2 regions padded to 3, plus the primary image.
    let num_rois = 3;
    let composed: Vec<_> = samples
        .iter()
        .map(|s| compose(s, num_rois).unwrap())
        .collect();
    for query in &composed {
        assert_eq!(query.crops.len(), num_rois + 1);
        assert!(query.text_sequence.starts_with("<BOQ>"));
        assert!(query.text_sequence.ends_with("<EOC>"));
    }

    // Adapt with two workers.
    let adapter =
        BatchAdapter::new(word_tokenizer(), ImageProcessor::new(), 2).unwrap();
    let input = adapter.adapt(&composed).unwrap();
    assert_eq!(input.len(), 2);
    assert_eq!(input.image_shape.images, num_rois + 1);

    // Retrieve: q1's answer passage sits at rank 2, q2's at rank 1.
    let searcher = CannedSearcher {
        table: HashMap::from([
            (
                "q1".to_string(),
                vec![(0, 0.9), (1, 0.8), (3, 0.4), (4, 0.3), (5, 0.2)],
            ),
            (
                "q2".to_string(),
                vec![(2, 0.95), (0, 0.5), (1, 0.4), (4, 0.3), (5, 0.2)],
            ),
        ]),
    };
    let orchestrator = Orchestrator::new(
        Arc::new(OneVectorEncoder),
        Arc::new(searcher),
        *cutoffs.iter().max().unwrap(),
    );

    let query_ids: Vec<String> = composed.iter().map(|q| q.query_id.clone()).collect();
    let ranking = orchestrator.retrieve(&query_ids, &input).unwrap();

    // Evaluate.
    let gold: Vec<(String, Vec<String>)> = samples
        .iter()
        .map(|s| (s.question_id.clone(), s.answers.clone()))
        .collect();
    let records = evaluate_batch(&ranking, &gold, &corpus, &cutoffs).unwrap();

    let mut accumulator = RecallAccumulator::new(cutoffs);
    accumulator.extend(records);

    let mean = accumulator.mean_recall();
    // q1 misses at rank 1, hits at rank 2; q2 hits at rank 1.
    assert!((mean[&1] - 0.5).abs() < 1e-9);
    assert!((mean[&5] - 1.0).abs() < 1e-9);
    assert_eq!(accumulator.num_queries(), 2);
}

#[test]
fn test_missing_query_fails_the_batch() {
    let dir = TempDir::new().unwrap();
    let samples = vec![
        sample(&dir, "q1", "what is the capital", &["paris"]),
        sample(&dir, "q2", "what is the river", &["nile"]),
    ];

    let composed: Vec<_> = samples.iter().map(|s| compose(s, 2).unwrap()).collect();
    let adapter = BatchAdapter::new(word_tokenizer(), ImageProcessor::new(), 1).unwrap();
    let input = adapter.adapt(&composed).unwrap();

    // Searcher only knows q1.
    let searcher = CannedSearcher {
        table: HashMap::from([("q1".to_string(), vec![(0, 0.9)])]),
    };
    let orchestrator = Orchestrator::new(Arc::new(OneVectorEncoder), Arc::new(searcher), 5);

    let query_ids: Vec<String> = composed.iter().map(|q| q.query_id.clone()).collect();
    let result = orchestrator.retrieve(&query_ids, &input);
    assert!(matches!(
        result,
        Err(RetrievalError::MissingQuery { query_id }) if query_id == "q2"
    ));
}
