//! Inference Log Repository
//!
//! MySQL adapter for the audit store port (`inference_results` table).

use super::{InferenceLogStore, InferenceRecord};
use crate::error::{Error, Result};
use async_trait::async_trait;
use sqlx::MySqlPool;

/// MySQL-backed audit store
#[derive(Clone)]
pub struct MySqlInferenceLogStore {
    pool: MySqlPool,
}

impl MySqlInferenceLogStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InferenceLogStore for MySqlInferenceLogStore {
    async fn append(&self, record: InferenceRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO inference_results
                (id, image_id, device_id, device_code, inferred_at,
                 raw_response, total_objects, total_larvae, total_other,
                 avg_confidence, parser_version, status, error_message)
            VALUES
                (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.id.to_string())
        .bind(record.image_id.to_string())
        .bind(record.device_id.to_string())
        .bind(&record.device_code)
        .bind(record.inferred_at)
        .bind(&record.raw_response)
        .bind(record.total_objects)
        .bind(record.total_larvae)
        .bind(record.total_other)
        .bind(record.avg_confidence)
        .bind(&record.parser_version)
        .bind(record.status.as_str())
        .bind(&record.error_message)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        tracing::debug!(
            record_id = %record.id,
            device_code = %record.device_code,
            status = record.status.as_str(),
            "Inference record appended"
        );

        Ok(())
    }
}
