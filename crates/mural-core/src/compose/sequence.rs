//! Text sequence composition.
//!
//! A composed query is one delimited string built from three segments in
//! fixed order: question, text-based vision (object attributes, classes,
//! OCR), and caption. Composition is deterministic - the same sample always
//! yields the same sequence.

use crate::config::{
    ATTRIBUTE_MAX, ATTRIBUTE_THRESHOLD, CAPTION_END, CAPTION_START, QUESTION_END, QUESTION_START,
    VISION_END, VISION_SEP, VISION_START,
};
use crate::dataset::{DetectedObject, Sample};

/// Builds the delimited text sequence for a sample.
pub fn build_text_sequence(sample: &Sample) -> String {
    let segments = [
        question_segment(&sample.question),
        vision_segment(&sample.objects, &sample.ocr),
        caption_segment(&sample.caption),
    ];
    segments.join(" ")
}

/// Selects up to [`ATTRIBUTE_MAX`] attributes whose score exceeds
/// [`ATTRIBUTE_THRESHOLD`], preserving detector order.
pub(crate) fn select_attributes(object: &DetectedObject) -> Vec<&str> {
    let mut selected = Vec::new();
    for (attribute, &score) in object.attributes.iter().zip(&object.attribute_scores) {
        if score > ATTRIBUTE_THRESHOLD && selected.len() < ATTRIBUTE_MAX {
            selected.push(attribute.as_str());
        }
    }
    selected
}

fn question_segment(question: &str) -> String {
    [QUESTION_START, question, QUESTION_END].join(" ")
}

fn vision_segment(objects: &[DetectedObject], ocr: &[String]) -> String {
    let mut tokens: Vec<String> = vec![VISION_START.to_string()];

    for object in objects {
        tokens.extend(select_attributes(object).iter().map(|s| s.to_string()));
        tokens.push(object.class.clone());
        tokens.push(VISION_SEP.to_string());
    }

    // Unique OCR descriptions, first occurrence wins, newlines collapsed.
    let mut seen: Vec<String> = Vec::new();
    for description in ocr {
        let description = description.trim().replace('\n', " ");
        if !seen.contains(&description) {
            seen.push(description);
        }
    }
    tokens.extend(seen);

    tokens.push(VISION_END.to_string());
    tokens.join(" ")
}

fn caption_segment(caption: &str) -> String {
    [CAPTION_START, caption, CAPTION_END].join(" ")
}
