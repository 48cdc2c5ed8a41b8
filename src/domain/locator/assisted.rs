use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::{DEFAULT_CONTEXT_BLOCKS, PositionLocator, context_window};
use crate::domain::AppError;
use crate::domain::document::DocumentModel;
use crate::domain::insertion_point::InsertionPoint;
use crate::domain::prompt;
use crate::ports::TextGenerator;

static JSON_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("valid JSON span regex"));

#[derive(Debug, Deserialize)]
struct DetectionResponse {
    #[serde(default)]
    insertion_points: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct DetectedPoint {
    #[serde(alias = "anchor_index")]
    para_index: usize,
    #[serde(default)]
    description: String,
}

/// Locator that asks the text model which blocks need content.
///
/// Never fails: an unusable answer is logged and yields no points.
pub struct AssistedLocator<'a> {
    generator: &'a dyn TextGenerator,
    context_size: usize,
}

impl<'a> AssistedLocator<'a> {
    pub fn new(generator: &'a dyn TextGenerator) -> Self {
        Self { generator, context_size: DEFAULT_CONTEXT_BLOCKS }
    }

    pub fn with_context_size(mut self, size: usize) -> Self {
        self.context_size = size;
        self
    }

    fn detect(&self, model: &DocumentModel) -> Result<Vec<(usize, String)>, AppError> {
        let prompt = prompt::detection_prompt(model)?;
        let response = self.generator.generate(&prompt);
        if response.trim().is_empty() {
            return Err(AppError::Generation("empty detection response".to_string()));
        }
        parse_detection(&response, model.block_count())
    }
}

impl PositionLocator for AssistedLocator<'_> {
    fn locate(&self, model: &DocumentModel) -> Vec<InsertionPoint> {
        let detected = match self.detect(model) {
            Ok(detected) => detected,
            Err(err) => {
                warn!(error = %err, "failed to detect insertion points");
                return Vec::new();
            }
        };
        info!(count = detected.len(), "model proposed insertion points");

        detected
            .into_iter()
            .map(|(anchor, description)| {
                let (before, after) = context_window(model, anchor, self.context_size);
                InsertionPoint::new(anchor, description).with_context(before, after)
            })
            .collect()
    }
}

/// Anchors and descriptions from a detection answer, sorted and de-duplicated.
/// Entries outside `0..block_count` or without a usable index are dropped.
fn parse_detection(response: &str, block_count: usize) -> Result<Vec<(usize, String)>, AppError> {
    let span = JSON_OBJECT.find(response).ok_or_else(|| AppError::ParseError {
        what: "detection response".to_string(),
        details: "no JSON object found".to_string(),
    })?;
    let parsed: DetectionResponse =
        serde_json::from_str(span.as_str()).map_err(|e| AppError::ParseError {
            what: "detection response".to_string(),
            details: e.to_string(),
        })?;

    let mut detected: Vec<(usize, String)> = Vec::new();
    for item in parsed.insertion_points {
        match serde_json::from_value::<DetectedPoint>(item) {
            Ok(point) if point.para_index < block_count => {
                detected.push((point.para_index, point.description.trim().to_string()));
            }
            Ok(point) => debug!(index = point.para_index, block_count, "dropping out-of-range anchor"),
            Err(err) => debug!(error = %err, "dropping malformed insertion point"),
        }
    }

    detected.sort_by_key(|(anchor, _)| *anchor);
    detected.dedup_by_key(|(anchor, _)| *anchor);
    Ok(detected)
}
