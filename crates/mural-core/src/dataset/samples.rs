//! VQA sample records and their normalization.
//!
//! Raw sample files carry the upstream field names (`img_path`, `img_ocr`,
//! `img_caption`, `ROIs`). Region strings are kept verbatim on the
//! normalized [`Sample`] - parsing them requires image I/O and happens at
//! composition time, not here.

use super::DatasetError;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// A detected object with scored attributes.
///
/// Invariant (checked at ingestion): `attributes` and `attribute_scores`
/// have equal length and are positionally paired.
#[derive(Debug, Clone)]
pub struct DetectedObject {
    /// Detector class name (e.g. "traffic light")
    pub class: String,
    /// Attribute strings in detector order
    pub attributes: Vec<String>,
    /// Confidence score in [0,1] for each attribute
    pub attribute_scores: Vec<f32>,
}

/// One normalized VQA sample.
///
/// Samples are read-only inputs to the pipeline; composition derives a
/// query from a sample without mutating it.
#[derive(Debug, Clone)]
pub struct Sample {
    /// Stable query identifier
    pub question_id: String,
    /// The natural-language question
    pub question: String,
    /// Path to the primary image
    pub image_path: PathBuf,
    /// Detected objects in detector order
    pub objects: Vec<DetectedObject>,
    /// OCR description strings (raw; de-duplication happens at composition)
    pub ocr: Vec<String>,
    /// Image caption, unwrapped to plain text
    pub caption: String,
    /// Region strings: `{img_path}|||{class}_{xmin}_{ymin}_{xmax}_{ymax}`
    pub rois: Vec<String>,
    /// Gold answer strings
    pub answers: Vec<String>,
}

impl Sample {
    /// Joins an image root directory onto the primary image path and every
    /// region source path. Region strings lead with their source path, so
    /// prefixing the whole string is equivalent to prefixing the path part.
    pub fn with_image_root(mut self, root: &Path) -> Self {
        self.image_path = root.join(&self.image_path);
        self.rois = self
            .rois
            .into_iter()
            .map(|roi| root.join(roi).to_string_lossy().into_owned())
            .collect();
        self
    }
}

// ============================================================================
// Raw (on-disk) shapes
// ============================================================================

/// Question ids appear as integers or strings depending on the export.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawQuestionId {
    Num(u64),
    Text(String),
}

impl RawQuestionId {
    fn into_string(self) -> String {
        match self {
            RawQuestionId::Num(n) => n.to_string(),
            RawQuestionId::Text(s) => s,
        }
    }
}

/// Captions appear as plain strings or `{"caption": "..."}` records.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawCaption {
    Text(String),
    Record { caption: String },
}

impl RawCaption {
    fn into_string(self) -> String {
        match self {
            RawCaption::Text(s) => s,
            RawCaption::Record { caption } => caption,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawObject {
    class: String,
    #[serde(default)]
    attributes: Vec<String>,
    #[serde(default)]
    attribute_scores: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct RawOcrAnnotation {
    description: String,
}

#[derive(Debug, Deserialize)]
struct RawSample {
    question_id: RawQuestionId,
    question: String,
    img_path: PathBuf,
    #[serde(default)]
    objects: Vec<RawObject>,
    #[serde(default)]
    img_ocr: Vec<RawOcrAnnotation>,
    img_caption: RawCaption,
    #[serde(rename = "ROIs", default)]
    rois: Vec<String>,
    #[serde(default)]
    answers: Vec<String>,
}

impl RawSample {
    fn normalize(self, line: usize) -> Result<Sample, DatasetError> {
        let question_id = self.question_id.into_string();
        let objects = self
            .objects
            .into_iter()
            .map(|obj| {
                if obj.attributes.len() != obj.attribute_scores.len() {
                    return Err(DatasetError::InvalidFormat(format!(
                        "Line {}: object '{}' has {} attributes but {} scores",
                        line,
                        obj.class,
                        obj.attributes.len(),
                        obj.attribute_scores.len()
                    )));
                }
                Ok(DetectedObject {
                    class: obj.class,
                    attributes: obj.attributes,
                    attribute_scores: obj.attribute_scores,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Sample {
            question_id,
            question: self.question,
            image_path: self.img_path,
            objects,
            ocr: self.img_ocr.into_iter().map(|a| a.description).collect(),
            caption: self.img_caption.into_string(),
            rois: self.rois,
            answers: self.answers,
        })
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Loads and normalizes samples from a JSONL file.
///
/// When `image_root` is given it is joined onto the primary image path and
/// every region source path of each sample.
///
/// # Errors
///
/// Returns `DatasetError::MissingFile` if the file does not exist, or
/// `DatasetError::InvalidFormat` naming the offending line for malformed
/// records.
pub fn load_samples(path: &Path, image_root: Option<&Path>) -> Result<Vec<Sample>, DatasetError> {
    if !path.exists() {
        return Err(DatasetError::MissingFile(path.display().to_string()));
    }

    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut samples = Vec::new();

    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let raw: RawSample = serde_json::from_str(&line).map_err(|e| {
            DatasetError::InvalidFormat(format!("Line {}: {}", line_num + 1, e))
        })?;
        let mut sample = raw.normalize(line_num + 1)?;
        if let Some(root) = image_root {
            sample = sample.with_image_root(root);
        }
        samples.push(sample);
    }

    Ok(samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_samples(lines: &[&str]) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("samples.jsonl");
        let mut f = File::create(&path).unwrap();
        for line in lines {
            writeln!(f, "{}", line).unwrap();
        }
        (dir, path)
    }

    #[test]
    fn test_load_normalizes_caption_shapes() {
        let (_dir, path) = write_samples(&[
            r#"{"question_id": 7, "question": "what color?", "img_path": "a.jpg", "img_caption": "a plain caption", "answers": ["red"]}"#,
            r#"{"question_id": "q8", "question": "how many?", "img_path": "b.jpg", "img_caption": {"caption": "a wrapped caption"}, "answers": ["two"]}"#,
        ]);

        let samples = load_samples(&path, None).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].question_id, "7");
        assert_eq!(samples[0].caption, "a plain caption");
        assert_eq!(samples[1].question_id, "q8");
        assert_eq!(samples[1].caption, "a wrapped caption");
    }

    #[test]
    fn test_load_full_record() {
        let (_dir, path) = write_samples(&[concat!(
            r#"{"question_id": 1, "question": "what is it?", "img_path": "img/1.jpg", "#,
            r#""objects": [{"class": "dog", "attributes": ["brown", "small"], "attribute_scores": [0.9, 0.4]}], "#,
            r#""img_ocr": [{"description": "EXIT"}], "img_caption": "a dog", "#,
            r#""ROIs": ["img/1.jpg|||dog_1_2_30_40"], "answers": ["terrier"]}"#,
        )]);

        let samples = load_samples(&path, None).unwrap();
        let s = &samples[0];
        assert_eq!(s.objects.len(), 1);
        assert_eq!(s.objects[0].attributes, vec!["brown", "small"]);
        assert_eq!(s.ocr, vec!["EXIT"]);
        assert_eq!(s.rois.len(), 1);
    }

    #[test]
    fn test_image_root_prefixes_paths() {
        let (_dir, path) = write_samples(&[
            r#"{"question_id": 1, "question": "q", "img_path": "img/1.jpg", "img_caption": "c", "ROIs": ["img/1.jpg|||dog_1_2_3_4"], "answers": []}"#,
        ]);

        let samples = load_samples(&path, Some(Path::new("/data/okvqa"))).unwrap();
        assert_eq!(samples[0].image_path, PathBuf::from("/data/okvqa/img/1.jpg"));
        assert_eq!(samples[0].rois[0], "/data/okvqa/img/1.jpg|||dog_1_2_3_4");
    }

    #[test]
    fn test_mismatched_attribute_scores_rejected() {
        let (_dir, path) = write_samples(&[
            r#"{"question_id": 1, "question": "q", "img_path": "a.jpg", "objects": [{"class": "cat", "attributes": ["black"], "attribute_scores": [0.5, 0.6]}], "img_caption": "c", "answers": []}"#,
        ]);

        let result = load_samples(&path, None);
        assert!(matches!(result, Err(DatasetError::InvalidFormat(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = load_samples(Path::new("/nonexistent/samples.jsonl"), None);
        assert!(matches!(result, Err(DatasetError::MissingFile(_))));
    }
}
