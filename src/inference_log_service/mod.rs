//! InferenceLogService - Inference Audit Trail
//!
//! ## Responsibilities
//!
//! - Model the append-only audit record, one per inference job
//! - Keep the raw provider response alongside the parsed counts so parser
//!   regressions stay diagnosable after the fact
//! - Persist to MySQL (`inference_results` table)

pub mod repository;

pub use repository::MySqlInferenceLogStore;

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of one inference job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Success,
    Failed,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Success => "success",
            RecordStatus::Failed => "failed",
        }
    }
}

impl std::str::FromStr for RecordStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "success" => Ok(RecordStatus::Success),
            "failed" => Ok(RecordStatus::Failed),
            other => Err(format!("unknown record status: {other}")),
        }
    }
}

/// Durable record of one inference outcome, successful or failed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceRecord {
    pub id: Uuid,
    pub image_id: Uuid,
    pub device_id: Uuid,
    pub device_code: String,
    pub inferred_at: DateTime<Utc>,
    /// Provider response exactly as received, absent on the failure path
    pub raw_response: Option<serde_json::Value>,
    pub total_objects: u32,
    pub total_larvae: u32,
    pub total_other: u32,
    pub avg_confidence: f64,
    pub parser_version: Option<String>,
    pub status: RecordStatus,
    pub error_message: Option<String>,
}

/// Audit persistence port, append-only
#[async_trait]
pub trait InferenceLogStore: Send + Sync {
    async fn append(&self, record: InferenceRecord) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_str() {
        assert_eq!("success".parse::<RecordStatus>(), Ok(RecordStatus::Success));
        assert_eq!("failed".parse::<RecordStatus>(), Ok(RecordStatus::Failed));
        assert!("pending".parse::<RecordStatus>().is_err());
        assert_eq!(RecordStatus::Success.as_str(), "success");
    }
}
