//! Pipeline configuration constants.
//!
//! These values define the query composition grammar and the default batch
//! geometry of the evaluation pipeline. They match the configuration the
//! retrieval model was trained with, so changing them silently degrades
//! retrieval quality - treat them as part of the model contract.

// =============================================================================
// Sequence Delimiters
// =============================================================================

/// Opens the question segment of a composed query.
pub const QUESTION_START: &str = "<BOQ>";
/// Closes the question segment.
pub const QUESTION_END: &str = "<EOQ>";

/// Opens the text-based vision segment (object attributes, classes, OCR).
pub const VISION_START: &str = "<BOV>";
/// Separates consecutive objects inside the vision segment.
pub const VISION_SEP: &str = "<SOV>";
/// Closes the vision segment.
pub const VISION_END: &str = "<EOV>";

/// Opens the caption segment.
pub const CAPTION_START: &str = "<BOC>";
/// Closes the caption segment.
pub const CAPTION_END: &str = "<EOC>";

/// Wraps passage content at corpus load time.
pub const PASSAGE_START: &str = "<BOK>";
/// Closes the passage wrapper.
pub const PASSAGE_END: &str = "<EOK>";

// =============================================================================
// Vision Segment Selection
// =============================================================================

/// Maximum attributes kept per detected object.
pub const ATTRIBUTE_MAX: usize = 3;

/// Minimum detector confidence for an attribute to be kept.
pub const ATTRIBUTE_THRESHOLD: f32 = 0.05;

// =============================================================================
// Region Crops
// =============================================================================

/// Minimum acceptable side length for a region crop, in pixels.
pub const MIN_CROP_SIDE: f32 = 5.0;

/// Per-side expansion applied to undersized crop dimensions, in pixels.
pub const CROP_EXPANSION: f32 = 2.5;

/// Region crops per query fed to the vision encoder (the full primary image
/// is always prepended, so the encoder sees `DEFAULT_NUM_ROIS + 1` images).
pub const DEFAULT_NUM_ROIS: usize = 9;

// =============================================================================
// Image Preprocessing (CLIP ViT-B/32 geometry)
// =============================================================================

/// Side length images are resized to before encoding.
pub const IMAGE_SIZE: u32 = 224;

/// RGB channel means for pixel normalization.
pub const IMAGE_MEAN: [f32; 3] = [0.481_454_66, 0.457_827_5, 0.408_210_73];

/// RGB channel standard deviations for pixel normalization.
pub const IMAGE_STD: [f32; 3] = [0.268_629_54, 0.261_302_58, 0.275_777_11];

// =============================================================================
// Batch Geometry & Retrieval Defaults
// =============================================================================

/// Queries encoded and searched per batch.
pub const DEFAULT_QUERY_BATCH_SIZE: usize = 8;

/// Passages per batch during index construction.
pub const DEFAULT_INDEXING_BATCH_SIZE: usize = 64;

/// Bits per dimension for index compression.
pub const DEFAULT_NBITS: u32 = 8;

/// Maximum token length for indexed passages.
pub const DOC_MAX_LENGTH: usize = 512;

/// Maximum token length for composed query sequences.
pub const QUERY_MAX_TOKENS: usize = 512;

/// Recall cutoffs evaluated when none are requested.
pub const DEFAULT_RECALL_CUTOFFS: &[usize] = &[5, 10, 20, 50, 100];

/// Worker threads for the pixel-preprocessing fan-out.
pub const DEFAULT_NUM_WORKERS: usize = 4;
