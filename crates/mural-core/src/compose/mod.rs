//! Query composition: one delimited text sequence plus a fixed-length crop
//! list per sample.
//!
//! Composition is the only stage that touches image files. A composed query
//! always carries exactly `num_rois + 1` images - the full primary image
//! first, then one crop per region descriptor, padded by repeating the last
//! region or truncated to the requested count. Region boxes are sanitized
//! (see [`roi`]) before cropping.
//!
//! A [`ComposedQuery`] lives only until its batch is encoded; samples are
//! never mutated.

pub mod roi;
pub mod sequence;

use crate::dataset::Sample;
use crate::error::ComposeError;
use image::{DynamicImage, GenericImageView};
use roi::{sanitize, BoundingBox, RegionDescriptor};
pub use sequence::build_text_sequence;
use std::path::Path;

/// A query derived from one sample, ready for the encoding adapter.
#[derive(Debug, Clone)]
pub struct ComposedQuery {
    /// Identifier of the originating sample
    pub query_id: String,
    /// Delimited text sequence (question, vision, caption segments)
    pub text_sequence: String,
    /// Primary image followed by `num_rois` region crops
    pub crops: Vec<DynamicImage>,
}

/// Composes a sample into a query.
///
/// # Arguments
///
/// * `sample` - The sample to compose
/// * `num_rois` - Number of region crops to produce (the primary image is
///   prepended on top of these)
///
/// # Errors
///
/// Fails fast for the whole sample - no partial composition is returned -
/// when an image cannot be opened, a region descriptor is malformed, or the
/// sample has no regions to repeat while `num_rois > 0`.
pub fn compose(sample: &Sample, num_rois: usize) -> Result<ComposedQuery, ComposeError> {
    let text_sequence = build_text_sequence(sample);
    let primary = open_image(&sample.image_path)?;

    if sample.rois.is_empty() && num_rois > 0 {
        return Err(ComposeError::EmptyRegionList { requested: num_rois });
    }

    // Pad by repeating the last region, then truncate to the requested count.
    let mut region_strings: Vec<&String> = sample.rois.iter().collect();
    if let Some(last) = sample.rois.last() {
        while region_strings.len() < num_rois {
            region_strings.push(last);
        }
    }
    region_strings.truncate(num_rois);

    let mut crops = Vec::with_capacity(num_rois + 1);
    crops.push(primary);
    for raw in region_strings {
        let descriptor = RegionDescriptor::parse(raw)?;
        let source = open_image(&descriptor.source_image)?;
        let bbox = sanitize(descriptor.bbox, source.dimensions());
        crops.push(crop_region(&source, bbox));
    }

    Ok(ComposedQuery {
        query_id: sample.question_id.clone(),
        text_sequence,
        crops,
    })
}

fn open_image(path: &Path) -> Result<DynamicImage, ComposeError> {
    image::open(path).map_err(|e| ComposeError::ImageUnreadable {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Crops a sanitized box out of an image. Fractional box edges are rounded
/// outward so the crop never loses covered pixels; a fully collapsed box
/// still yields a 1x1 crop.
fn crop_region(image: &DynamicImage, bbox: BoundingBox) -> DynamicImage {
    let (width, height) = image.dimensions();
    let x0 = bbox.0.clamp(0.0, width as f32).floor() as u32;
    let y0 = bbox.1.clamp(0.0, height as f32).floor() as u32;
    let x1 = bbox.2.clamp(0.0, width as f32).ceil() as u32;
    let y1 = bbox.3.clamp(0.0, height as f32).ceil() as u32;

    image.crop_imm(x0, y0, x1.saturating_sub(x0).max(1), y1.saturating_sub(y0).max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Sample;
    use crate::test_utils::write_test_image;
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// Sample whose i-th region crops to a distinct (12 + i)-pixel-wide box,
    /// so padding and truncation are visible in the crop dimensions.
    fn sample_with_regions(dir: &TempDir, num_regions: usize) -> Sample {
        let image_path = dir.path().join("primary.png");
        write_test_image(&image_path, 64, 48);

        let rois = (0..num_regions)
            .map(|i| {
                format!(
                    "{}|||thing_0_0_{}_10",
                    image_path.display(),
                    12 + i
                )
            })
            .collect();

        Sample {
            question_id: "q1".to_string(),
            question: "what is shown?".to_string(),
            image_path,
            objects: vec![],
            ocr: vec![],
            caption: "a test image".to_string(),
            rois,
            answers: vec![],
        }
    }

    #[test]
    fn test_padding_repeats_last_region() {
        let dir = TempDir::new().unwrap();
        let sample = sample_with_regions(&dir, 3);

        let composed = compose(&sample, 9).unwrap();
        assert_eq!(composed.crops.len(), 10);

        // Primary image first, then the three real crops.
        assert_eq!(composed.crops[0].dimensions(), (64, 48));
        assert_eq!(composed.crops[1].dimensions(), (12, 10));
        assert_eq!(composed.crops[2].dimensions(), (13, 10));
        assert_eq!(composed.crops[3].dimensions(), (14, 10));

        // Positions 4..=9 repeat the last real region.
        for i in 4..10 {
            assert_eq!(composed.crops[i].dimensions(), (14, 10));
            assert_eq!(
                composed.crops[i].to_rgb8().as_raw(),
                composed.crops[3].to_rgb8().as_raw()
            );
        }
    }

    #[test]
    fn test_truncation_keeps_first_regions() {
        let dir = TempDir::new().unwrap();
        let sample = sample_with_regions(&dir, 12);

        let composed = compose(&sample, 9).unwrap();
        assert_eq!(composed.crops.len(), 10);
        for (i, crop) in composed.crops[1..].iter().enumerate() {
            assert_eq!(crop.dimensions(), ((12 + i) as u32, 10));
        }
    }

    #[test]
    fn test_zero_rois_yields_primary_only() {
        let dir = TempDir::new().unwrap();
        let sample = sample_with_regions(&dir, 3);

        let composed = compose(&sample, 0).unwrap();
        assert_eq!(composed.crops.len(), 1);
        assert_eq!(composed.crops[0].dimensions(), (64, 48));
    }

    #[test]
    fn test_empty_region_list_is_fatal() {
        let dir = TempDir::new().unwrap();
        let mut sample = sample_with_regions(&dir, 1);
        sample.rois.clear();

        assert!(matches!(
            compose(&sample, 9),
            Err(ComposeError::EmptyRegionList { requested: 9 })
        ));
    }

    #[test]
    fn test_unreadable_primary_image_is_fatal() {
        let dir = TempDir::new().unwrap();
        let mut sample = sample_with_regions(&dir, 1);
        sample.image_path = PathBuf::from("/nonexistent/image.png");

        assert!(matches!(
            compose(&sample, 1),
            Err(ComposeError::ImageUnreadable { .. })
        ));
    }

    #[test]
    fn test_malformed_region_is_fatal() {
        let dir = TempDir::new().unwrap();
        let mut sample = sample_with_regions(&dir, 1);
        sample.rois = vec![format!("{}|||thing_0_0_10", sample.image_path.display())];

        assert!(matches!(
            compose(&sample, 1),
            Err(ComposeError::MalformedRegion(_))
        ));
    }

    #[test]
    fn test_degenerate_region_still_crops() {
        let dir = TempDir::new().unwrap();
        let mut sample = sample_with_regions(&dir, 1);
        // A 1x1 box in the middle of the image is expanded before cropping.
        sample.rois = vec![format!("{}|||dot_30_20_31_21", sample.image_path.display())];

        let composed = compose(&sample, 1).unwrap();
        let (w, h) = composed.crops[1].dimensions();
        assert!(w >= 5 && h >= 5);
    }
}
