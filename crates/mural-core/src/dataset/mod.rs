//! Dataset loading for evaluation runs.
//!
//! Two inputs drive a run, both stored as JSONL (one record per line):
//!
//! ```text
//! samples.jsonl    # VQA samples: question, image, objects, OCR, caption,
//!                  # region strings, gold answers
//! passages.jsonl   # knowledge corpus: {"passage_content": "..."}
//! ```
//!
//! Raw records have a few shape irregularities inherited from the upstream
//! data (captions as strings or `{caption: ...}` records, numeric or string
//! question ids). Those are resolved once at ingestion into the normalized
//! [`Sample`] type; nothing downstream branches on record shape.

pub mod passages;
pub mod samples;

pub use passages::{load_passages, PassageCorpus};
pub use samples::{load_samples, DetectedObject, Sample};

/// Error type for dataset loading.
#[derive(Debug)]
pub enum DatasetError {
    /// IO error reading files.
    Io(std::io::Error),
    /// JSON parsing error.
    Json(serde_json::Error),
    /// Missing required file.
    MissingFile(String),
    /// Invalid data format.
    InvalidFormat(String),
}

impl std::fmt::Display for DatasetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatasetError::Io(e) => write!(f, "IO error: {}", e),
            DatasetError::Json(e) => write!(f, "JSON error: {}", e),
            DatasetError::MissingFile(path) => write!(f, "Missing file: {}", path),
            DatasetError::InvalidFormat(msg) => write!(f, "Invalid format: {}", msg),
        }
    }
}

impl std::error::Error for DatasetError {}

impl From<std::io::Error> for DatasetError {
    fn from(e: std::io::Error) -> Self {
        DatasetError::Io(e)
    }
}

impl From<serde_json::Error> for DatasetError {
    fn from(e: serde_json::Error) -> Self {
        DatasetError::Json(e)
    }
}
