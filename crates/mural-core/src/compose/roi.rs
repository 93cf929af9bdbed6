//! Region descriptor parsing and bounding-box sanitization.

use crate::config::{CROP_EXPANSION, MIN_CROP_SIDE};
use crate::error::ComposeError;
use std::path::PathBuf;
use tracing::debug;

/// A bounding box in pixel coordinates: `(xmin, ymin, xmax, ymax)`.
pub type BoundingBox = (f32, f32, f32, f32);

/// A parsed region of interest.
///
/// The wire form is `{img_path}|||{class}_{xmin}_{ymin}_{xmax}_{ymax}`;
/// the suffix must split into exactly five `_`-separated fields.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionDescriptor {
    /// Image the region is cropped from
    pub source_image: PathBuf,
    /// Detector class name for the region
    pub class_name: String,
    /// Bounding box in pixel coordinates
    pub bbox: BoundingBox,
}

impl RegionDescriptor {
    /// Parses a region descriptor string.
    ///
    /// # Errors
    ///
    /// Returns `ComposeError::MalformedRegion` when the `|||` separator is
    /// missing, the suffix does not have exactly five fields, or a
    /// coordinate fails to parse.
    pub fn parse(raw: &str) -> Result<Self, ComposeError> {
        let (path, remaining) = raw
            .split_once("|||")
            .ok_or_else(|| ComposeError::MalformedRegion(raw.to_string()))?;

        let fields: Vec<&str> = remaining.split('_').collect();
        if fields.len() != 5 {
            return Err(ComposeError::MalformedRegion(raw.to_string()));
        }

        let coord = |s: &str| {
            s.parse::<f32>()
                .map_err(|_| ComposeError::MalformedRegion(raw.to_string()))
        };

        Ok(Self {
            source_image: PathBuf::from(path),
            class_name: fields[0].to_string(),
            bbox: (
                coord(fields[1])?,
                coord(fields[2])?,
                coord(fields[3])?,
                coord(fields[4])?,
            ),
        })
    }
}

/// Normalizes a degenerate bounding box against its source image size.
///
/// When both the width and the height are under [`MIN_CROP_SIDE`], each
/// undersized dimension is expanded by [`CROP_EXPANSION`] per side, clamped
/// to the image bounds. A box with only one undersized dimension is returned
/// unchanged: only fully collapsed boxes count as degenerate.
///
/// Always returns a box within `[0, width] x [0, height]`.
pub fn sanitize(bbox: BoundingBox, image_size: (u32, u32)) -> BoundingBox {
    let (mut xmin, mut ymin, mut xmax, mut ymax) = bbox;
    let (width, height) = (image_size.0 as f32, image_size.1 as f32);

    if xmax - xmin < MIN_CROP_SIDE && ymax - ymin < MIN_CROP_SIDE {
        if xmax - xmin < MIN_CROP_SIDE {
            xmin = (xmin - CROP_EXPANSION).max(0.0);
            xmax = (xmax + CROP_EXPANSION).min(width);
        }
        if ymax - ymin < MIN_CROP_SIDE {
            ymin = (ymin - CROP_EXPANSION).max(0.0);
            ymax = (ymax + CROP_EXPANSION).min(height);
        }
        debug!(
            "enlarged region {:?} -> {:?}",
            bbox,
            (xmin, ymin, xmax, ymax)
        );
    }

    (xmin, ymin, xmax, ymax)
}
