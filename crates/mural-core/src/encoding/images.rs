//! Pixel preprocessing for the vision encoder.
//!
//! Every crop is resized to a fixed square, converted to RGB, and
//! channel-normalized, producing the flattened CHW tensor layout the
//! encoder expects.

use crate::config::{IMAGE_MEAN, IMAGE_SIZE, IMAGE_STD};
use image::DynamicImage;

/// Image preprocessor matching the retrieval model's vision input.
#[derive(Debug, Clone)]
pub struct ImageProcessor {
    target_size: u32,
    mean: [f32; 3],
    std: [f32; 3],
}

impl Default for ImageProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageProcessor {
    /// Creates a processor with the model's preprocessing parameters.
    pub fn new() -> Self {
        Self {
            target_size: IMAGE_SIZE,
            mean: IMAGE_MEAN,
            std: IMAGE_STD,
        }
    }

    /// Side length images are resized to.
    pub fn target_size(&self) -> u32 {
        self.target_size
    }

    /// Length of one preprocessed tensor: `3 * size * size`.
    pub fn tensor_len(&self) -> usize {
        3 * (self.target_size as usize) * (self.target_size as usize)
    }

    /// Converts one image into a flattened, normalized CHW tensor.
    ///
    /// Resizes to `target_size` x `target_size` with bilinear interpolation,
    /// converts to RGB, then normalizes each channel as
    /// `(value / 255 - mean) / std`.
    pub fn preprocess(&self, image: &DynamicImage) -> Vec<f32> {
        let resized = image.resize_exact(
            self.target_size,
            self.target_size,
            image::imageops::FilterType::Triangle,
        );
        let rgb = resized.to_rgb8();

        let size = self.target_size as usize;
        let plane = size * size;
        let mut tensor = vec![0f32; 3 * plane];

        for (x, y, pixel) in rgb.enumerate_pixels() {
            let idx = y as usize * size + x as usize;
            for channel in 0..3 {
                tensor[channel * plane + idx] =
                    (pixel[channel] as f32 / 255.0 - self.mean[channel]) / self.std[channel];
            }
        }

        tensor
    }
}
