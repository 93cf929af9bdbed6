//! Passage corpus loading.
//!
//! The corpus is an ordered sequence of passages; a passage's id is its
//! positional index, which is the contract shared with the external index
//! (the searcher returns positional ids). Contents are wrapped with the
//! boundary markers the retrieval model was trained with.

use super::DatasetError;
use crate::config::{PASSAGE_END, PASSAGE_START};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// An ordered, immutable passage corpus.
///
/// Passage ids are positional: `corpus.get(i)` returns the passage the
/// searcher refers to as id `i`.
#[derive(Debug, Clone)]
pub struct PassageCorpus {
    passages: Vec<String>,
}

impl PassageCorpus {
    /// Wraps raw passage contents with boundary markers, preserving order.
    pub fn new(contents: Vec<String>) -> Self {
        let passages = contents
            .into_iter()
            .map(|content| format!("{} {} {}", PASSAGE_START, content, PASSAGE_END))
            .collect();
        Self { passages }
    }

    /// Returns the wrapped passage text for a positional id.
    pub fn get(&self, passage_id: usize) -> Option<&str> {
        self.passages.get(passage_id).map(String::as_str)
    }

    /// Number of passages in the corpus.
    pub fn len(&self) -> usize {
        self.passages.len()
    }

    /// Returns true if the corpus holds no passages.
    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }

    /// All wrapped passage texts in positional order, for index construction.
    pub fn contents(&self) -> &[String] {
        &self.passages
    }
}

#[derive(Debug, Deserialize)]
struct RawPassage {
    passage_content: String,
}

/// Loads a passage corpus from a JSONL file.
///
/// # Errors
///
/// Returns `DatasetError::MissingFile` if the file does not exist, or
/// `DatasetError::InvalidFormat` naming the offending line.
pub fn load_passages(path: &Path) -> Result<PassageCorpus, DatasetError> {
    if !path.exists() {
        return Err(DatasetError::MissingFile(path.display().to_string()));
    }

    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut contents = Vec::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let raw: RawPassage = serde_json::from_str(&line).map_err(|e| {
            DatasetError::InvalidFormat(format!("Line {}: {}", line_num + 1, e))
        })?;
        contents.push(raw.passage_content);
    }

    Ok(PassageCorpus::new(contents))
}
