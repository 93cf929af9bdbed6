//! Tokenization for composed query sequences.
//!
//! Wraps a HuggingFace tokenizer with truncation and batch-longest padding,
//! so every sequence in a batch comes back with token ids and an attention
//! mask of one common length.

use crate::error::EncodeError;
use tokenizers::tokenizer::{
    PaddingParams, PaddingStrategy, Tokenizer, TruncationDirection, TruncationParams,
    TruncationStrategy,
};

/// Handle for the query tokenizer.
pub struct QueryTokenizer {
    tokenizer: Tokenizer,
    max_length: usize,
}

impl QueryTokenizer {
    /// Creates a tokenizer from serialized JSON bytes with truncation and
    /// batch padding configured.
    ///
    /// # Errors
    ///
    /// Returns `EncodeError::TokenizerUnavailable` if deserialization or
    /// configuration fails.
    pub fn from_bytes(tokenizer_bytes: Vec<u8>, max_length: usize) -> Result<Self, EncodeError> {
        let tokenizer = Tokenizer::from_bytes(tokenizer_bytes).map_err(|e| {
            EncodeError::TokenizerUnavailable(format!("Failed to deserialize tokenizer: {}", e))
        })?;
        Self::from_tokenizer(tokenizer, max_length)
    }

    /// Wraps an already-built tokenizer, configuring truncation and padding.
    pub fn from_tokenizer(
        mut tokenizer: Tokenizer,
        max_length: usize,
    ) -> Result<Self, EncodeError> {
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length,
                stride: 0,
                strategy: TruncationStrategy::LongestFirst,
                direction: TruncationDirection::Right,
            }))
            .map_err(|e| {
                EncodeError::TokenizerUnavailable(format!(
                    "Failed to configure truncation: {}",
                    e
                ))
            })?;

        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::BatchLongest,
            ..PaddingParams::default()
        }));

        Ok(Self {
            tokenizer,
            max_length,
        })
    }

    /// Returns the configured maximum sequence length.
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Encodes a batch of text sequences into token ids and attention masks.
    ///
    /// All returned rows share one length (the longest sequence in the
    /// batch, capped at `max_length`).
    ///
    /// # Errors
    ///
    /// Returns `EncodeError::TokenizationFailed` if encoding fails.
    pub fn encode_batch(
        &self,
        texts: &[&str],
    ) -> Result<(Vec<Vec<u32>>, Vec<Vec<u32>>), EncodeError> {
        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| EncodeError::TokenizationFailed(e.to_string()))?;

        let mut input_ids = Vec::with_capacity(encodings.len());
        let mut attention_mask = Vec::with_capacity(encodings.len());
        for encoding in &encodings {
            input_ids.push(encoding.get_ids().to_vec());
            attention_mask.push(encoding.get_attention_mask().to_vec());
        }

        Ok((input_ids, attention_mask))
    }
}
