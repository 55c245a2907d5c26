//! ResultParser - Roboflow Response Normalization
//!
//! ## Responsibilities
//!
//! - Recognize the two response shapes Roboflow produces (workflow runs return
//!   a list whose first entry nests the predictions, the legacy detection API
//!   returns the predictions directly)
//! - Count larva vs other detections and average the confidences
//! - Never fail: a malformed response is an expected provider edge case and
//!   normalizes to the zero summary

use serde::{Deserialize, Serialize};

/// Stamped into every successful audit record
pub const PARSER_VERSION: &str = "1.0";

/// Class label substrings that count as mosquito larvae, matched
/// case-insensitively ("jentik" is the Indonesian field term)
const LARVA_KEYWORDS: [&str; 3] = ["jentik", "larva", "larvae"];

/// Normalized detection counts for one inference
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionSummary {
    pub total_objects: u32,
    pub total_larvae: u32,
    pub total_other: u32,
    pub avg_confidence: f64,
}

impl DetectionSummary {
    /// Summary for an empty or unrecognizable response
    pub fn zero() -> Self {
        Self {
            total_objects: 0,
            total_larvae: 0,
            total_other: 0,
            avg_confidence: 0.0,
        }
    }
}

/// One detection as reported by Roboflow
#[derive(Debug, Clone, Default, Deserialize)]
struct Prediction {
    #[serde(rename = "class", default)]
    class_name: String,
    #[serde(default)]
    confidence: f64,
}

/// Container carrying a `predictions` list
#[derive(Debug, Default, Deserialize)]
struct PredictionList {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

/// First entry of a workflow run result
#[derive(Debug, Default, Deserialize)]
struct WorkflowEntry {
    #[serde(default)]
    detection_predictions: PredictionList,
}

/// The closed set of recognized response shapes, resolved once here
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawResponse {
    /// Workflow API: `[{"detection_predictions": {"predictions": [...]}}]`
    Workflow(Vec<WorkflowEntry>),
    /// Detection API: `{"predictions": [...]}`
    Detection(PredictionList),
}

fn is_larva(class_name: &str) -> bool {
    let lowered = class_name.to_lowercase();
    LARVA_KEYWORDS.iter().any(|kw| lowered.contains(kw))
}

/// Normalize a raw Roboflow response into a `DetectionSummary`.
///
/// Total over all inputs: anything that is neither a workflow result nor a
/// detection result yields the zero summary instead of an error.
pub fn parse(raw: &serde_json::Value) -> DetectionSummary {
    let predictions = match RawResponse::deserialize(raw) {
        Ok(RawResponse::Workflow(entries)) => entries
            .into_iter()
            .next()
            .map(|entry| entry.detection_predictions.predictions)
            .unwrap_or_default(),
        Ok(RawResponse::Detection(list)) => list.predictions,
        Err(_) => {
            tracing::debug!("Unrecognized inference response shape, using zero summary");
            Vec::new()
        }
    };

    if predictions.is_empty() {
        return DetectionSummary::zero();
    }

    let mut total_larvae = 0u32;
    let mut total_other = 0u32;
    let mut confidence_sum = 0.0f64;

    for prediction in &predictions {
        if is_larva(&prediction.class_name) {
            total_larvae += 1;
        } else {
            total_other += 1;
        }
        confidence_sum += prediction.confidence;
    }

    let avg = confidence_sum / predictions.len() as f64;

    DetectionSummary {
        total_objects: predictions.len() as u32,
        total_larvae,
        total_other,
        // 4 decimal places, matching what gets persisted
        avg_confidence: (avg * 10_000.0).round() / 10_000.0,
    }
}
