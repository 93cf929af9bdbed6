//! Batch adapter between composed queries and the external encoder.
//!
//! Turns a batch of [`ComposedQuery`] values into one [`EncoderInput`]:
//! token ids and attention masks padded to a common length, plus one
//! fixed-shape pixel tensor per query. Pixel preprocessing is the expensive
//! part and fans out across worker threads on contiguous sub-ranges of the
//! batch; the static partition keeps results in input order.

pub mod images;
pub mod tokenizer;

use crate::compose::ComposedQuery;
use crate::error::{ConfigError, EncodeError};
pub use images::ImageProcessor;
use serde::{Deserialize, Serialize};
pub use tokenizer::QueryTokenizer;

/// Shape of the per-query image stack, recorded alongside the flattened
/// pixel tensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageShape {
    /// Images per query (primary + region crops)
    pub images: usize,
    /// Color channels per image
    pub channels: usize,
    /// Image height in pixels
    pub height: usize,
    /// Image width in pixels
    pub width: usize,
}

/// One encoder-ready batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncoderInput {
    /// Token ids, one row per query, padded to a common length
    pub input_ids: Vec<Vec<u32>>,
    /// Attention masks parallel to `input_ids`
    pub attention_mask: Vec<Vec<u32>>,
    /// Flattened pixel tensor per query, `images * channels * height * width`
    pub pixel_values: Vec<Vec<f32>>,
    /// Shape of each query's image stack
    pub image_shape: ImageShape,
}

impl EncoderInput {
    /// Number of queries in the batch.
    pub fn len(&self) -> usize {
        self.input_ids.len()
    }

    /// Returns true if the batch holds no queries.
    pub fn is_empty(&self) -> bool {
        self.input_ids.is_empty()
    }
}

/// Adapter converting composed query batches into encoder input.
pub struct BatchAdapter {
    tokenizer: QueryTokenizer,
    processor: ImageProcessor,
    num_workers: usize,
}

impl BatchAdapter {
    /// Creates an adapter.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NoWorkers` when `num_workers` is zero.
    pub fn new(
        tokenizer: QueryTokenizer,
        processor: ImageProcessor,
        num_workers: usize,
    ) -> Result<Self, ConfigError> {
        if num_workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        Ok(Self {
            tokenizer,
            processor,
            num_workers,
        })
    }

    /// Adapts a batch of composed queries into encoder input.
    ///
    /// Queries are independent; pixel conversion runs on up to
    /// `num_workers` threads over contiguous sub-ranges, joined in order.
    ///
    /// # Errors
    ///
    /// Returns `EncodeError::RaggedCropCounts` when queries in the batch
    /// carry differing crop counts (the encoder needs one fixed shape), or
    /// tokenization errors from the underlying tokenizer.
    pub fn adapt(&self, batch: &[ComposedQuery]) -> Result<EncoderInput, EncodeError> {
        let images_per_query = batch.first().map_or(0, |q| q.crops.len());
        let image_shape = ImageShape {
            images: images_per_query,
            channels: 3,
            height: self.processor.target_size() as usize,
            width: self.processor.target_size() as usize,
        };

        if batch.is_empty() {
            return Ok(EncoderInput {
                input_ids: vec![],
                attention_mask: vec![],
                pixel_values: vec![],
                image_shape,
            });
        }

        for query in batch {
            if query.crops.len() != images_per_query {
                return Err(EncodeError::RaggedCropCounts {
                    expected: images_per_query,
                    actual: query.crops.len(),
                });
            }
        }

        let texts: Vec<&str> = batch.iter().map(|q| q.text_sequence.as_str()).collect();
        let (input_ids, attention_mask) = self.tokenizer.encode_batch(&texts)?;

        let pixel_values = self.preprocess_batch(batch)?;

        Ok(EncoderInput {
            input_ids,
            attention_mask,
            pixel_values,
            image_shape,
        })
    }

    /// Converts every query's crop list to pixel tensors, fanning out across
    /// scoped worker threads. Workers own disjoint contiguous sub-ranges and
    /// are joined in spawn order, so output order equals input order.
    fn preprocess_batch(&self, batch: &[ComposedQuery]) -> Result<Vec<Vec<f32>>, EncodeError> {
        let chunk_size = batch.len().div_ceil(self.num_workers);
        let mut pixel_values = Vec::with_capacity(batch.len());

        std::thread::scope(|scope| {
            let handles: Vec<_> = batch
                .chunks(chunk_size)
                .map(|chunk| {
                    scope.spawn(move || {
                        chunk
                            .iter()
                            .map(|query| self.pixels_for(query))
                            .collect::<Vec<_>>()
                    })
                })
                .collect();

            for handle in handles {
                match handle.join() {
                    Ok(part) => pixel_values.extend(part),
                    Err(_) => return Err(EncodeError::WorkerPanicked),
                }
            }
            Ok(())
        })?;

        Ok(pixel_values)
    }

    fn pixels_for(&self, query: &ComposedQuery) -> Vec<f32> {
        let mut tensor = Vec::with_capacity(query.crops.len() * self.processor.tensor_len());
        for crop in &query.crops {
            tensor.extend(self.processor.preprocess(crop));
        }
        tensor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{solid_image, test_tokenizer};

    fn query(id: &str, text: &str, brightness: u8, crops: usize) -> ComposedQuery {
        ComposedQuery {
            query_id: id.to_string(),
            text_sequence: text.to_string(),
            crops: (0..crops)
                .map(|_| solid_image(32, 32, [brightness; 3]))
                .collect(),
        }
    }

    fn adapter(num_workers: usize) -> BatchAdapter {
        BatchAdapter::new(test_tokenizer(64), ImageProcessor::new(), num_workers).unwrap()
    }

    #[test]
    fn test_adapt_shapes() {
        let adapter = adapter(2);
        let batch = vec![
            query("q1", "red car", 0, 3),
            query("q2", "red car on a street", 255, 3),
        ];

        let input = adapter.adapt(&batch).unwrap();
        assert_eq!(input.len(), 2);
        assert_eq!(input.input_ids[0].len(), input.input_ids[1].len());
        assert_eq!(input.image_shape.images, 3);
        assert_eq!(input.pixel_values[0].len(), 3 * 3 * 224 * 224);
        assert_eq!(input.pixel_values[1].len(), 3 * 3 * 224 * 224);
    }

    #[test]
    fn test_worker_fanout_preserves_order() {
        let adapter = adapter(3);
        // Brightness increases with position; normalized pixel values must
        // increase in the same order regardless of worker assignment.
        let batch: Vec<ComposedQuery> = (0..5)
            .map(|i| query(&format!("q{}", i), "a car", (i * 60) as u8, 1))
            .collect();

        let input = adapter.adapt(&batch).unwrap();
        for pair in input.pixel_values.windows(2) {
            assert!(pair[0][0] < pair[1][0]);
        }
    }

    #[test]
    fn test_more_workers_than_queries() {
        let adapter = adapter(8);
        let batch = vec![query("q1", "a car", 10, 2)];
        let input = adapter.adapt(&batch).unwrap();
        assert_eq!(input.len(), 1);
    }

    #[test]
    fn test_ragged_crop_counts_rejected() {
        let adapter = adapter(2);
        let batch = vec![query("q1", "a car", 0, 3), query("q2", "a car", 0, 2)];
        assert!(matches!(
            adapter.adapt(&batch),
            Err(EncodeError::RaggedCropCounts {
                expected: 3,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_empty_batch() {
        let adapter = adapter(2);
        let input = adapter.adapt(&[]).unwrap();
        assert!(input.is_empty());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let result = BatchAdapter::new(test_tokenizer(64), ImageProcessor::new(), 0);
        assert!(matches!(result, Err(ConfigError::NoWorkers)));
    }
}
