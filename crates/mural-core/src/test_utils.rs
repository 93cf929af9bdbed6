//! Shared helpers for unit tests: a small in-code tokenizer, synthetic
//! images, and canned encoder/searcher implementations. Only compiled for
//! tests.

use crate::encoding::{EncoderInput, QueryTokenizer};
use crate::error::RetrievalError;
use crate::retrieval::{MultiVectorEmbedding, PassageSearcher, QueryEncoder};
use ahash::AHashMap;
use image::{DynamicImage, Rgb, RgbImage};
use std::collections::HashMap;
use std::path::Path;
use tokenizers::models::wordlevel::WordLevel;
use tokenizers::pre_tokenizers::whitespace::Whitespace;
use tokenizers::Tokenizer;

/// Builds a small word-level tokenizer entirely in code, so tests never
/// depend on a tokenizer file on disk.
pub fn test_tokenizer(max_length: usize) -> QueryTokenizer {
    let words = [
        "[PAD]", "[UNK]", "a", "car", "red", "on", "street", "the", "what", "is", "color",
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
        .expect("Failed to build test vocab");

    let mut tokenizer = Tokenizer::new(model);
    tokenizer.with_pre_tokenizer(Some(Whitespace {}));

    QueryTokenizer::from_tokenizer(tokenizer, max_length)
        .expect("Failed to configure test tokenizer")
}

/// A single-color RGB image held in memory.
pub fn solid_image(width: u32, height: u32, rgb: [u8; 3]) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(rgb)))
}

/// Writes a gradient PNG to `path`, so distinct crops have distinct pixels.
///
/// # Panics
///
/// Panics on write failure - tests should fail loudly on broken fixtures.
pub fn write_test_image(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 100])
    });
    img.save(path).expect("Failed to write test image");
}

/// Encoder returning one fixed-size embedding per query in the batch.
pub struct FixedEncoder {
    dim: usize,
}

impl FixedEncoder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl QueryEncoder for FixedEncoder {
    fn encode_batch(
        &self,
        input: &EncoderInput,
    ) -> Result<Vec<MultiVectorEmbedding>, RetrievalError> {
        Ok((0..input.len())
            .map(|i| MultiVectorEmbedding {
                vectors: vec![vec![i as f32; self.dim]],
            })
            .collect())
    }
}

/// Searcher serving canned rankings from a lookup table. Queries absent
/// from the table are simply omitted from the result set, which lets tests
/// exercise the missing-query path.
pub struct TableSearcher {
    table: HashMap<String, Vec<(usize, f32)>>,
}

impl TableSearcher {
    pub fn new() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    pub fn with(mut self, query_id: &str, ranked: Vec<(usize, f32)>) -> Self {
        self.table.insert(query_id.to_string(), ranked);
        self
    }
}

impl PassageSearcher for TableSearcher {
    fn search(
        &self,
        query_ids: &[String],
        _embeddings: &[MultiVectorEmbedding],
        k: usize,
    ) -> Result<HashMap<String, Vec<(usize, f32)>>, RetrievalError> {
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
