//! InferenceOrchestrator - Background Inference Pipeline
//!
//! ## Responsibilities
//!
//! - Run one uploaded image through the full pipeline off the upload path:
//!   provider submit, result parsing, audit record, decision, alert
//!   lifecycle, dashboard push
//! - Own the failure-recording branch: a provider failure becomes a failed
//!   audit record and a best-effort error signal to the dashboard
//! - Never surface an error to the enqueuer; every outcome is terminal here
//!
//! Jobs are independent tasks. Two jobs for the same device may run
//! concurrently; the alert service tolerates that (see `alert_service`).

use crate::alert_service::{AlertService, MySqlAlertStore};
use crate::blynk_client::{BlynkClient, Dashboard};
use crate::config::AppConfig;
use crate::decision_engine;
use crate::error::Error;
use crate::inference_log_service::{
    InferenceLogStore, InferenceRecord, MySqlInferenceLogStore, RecordStatus,
};
use crate::result_parser::{self, DetectionSummary, PARSER_VERSION};
use crate::roboflow_client::{InferenceProvider, RoboflowClient};
use chrono::Utc;
use sqlx::MySqlPool;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

/// Dashboard status pushed when inference itself failed, distinct from any
/// detection outcome
pub const ERROR_STATUS: &str = "INFERENCE ERROR";

/// One unit of background work: a single uploaded image to run through
/// inference and decision. Discarded once the job completes; only its
/// outcome is persisted.
#[derive(Debug, Clone)]
pub struct InferenceJob {
    pub image_id: Uuid,
    pub device_id: Uuid,
    pub device_code: String,
    /// Path of the stored, already-preprocessed image
    pub image_path: PathBuf,
}

/// InferenceOrchestrator instance
#[derive(Clone)]
pub struct InferenceOrchestrator {
    provider: Arc<dyn InferenceProvider>,
    audit_log: Arc<dyn InferenceLogStore>,
    alerts: AlertService,
    dashboard: Arc<dyn Dashboard>,
}

impl InferenceOrchestrator {
    /// Create new orchestrator from explicit ports
    pub fn new(
        provider: Arc<dyn InferenceProvider>,
        audit_log: Arc<dyn InferenceLogStore>,
        alerts: AlertService,
        dashboard: Arc<dyn Dashboard>,
    ) -> Self {
        Self {
            provider,
            audit_log,
            alerts,
            dashboard,
        }
    }

    /// Composition root: wire the MySQL stores and HTTP clients from config
    pub fn from_config(pool: MySqlPool, config: &AppConfig) -> Self {
        Self::new(
            Arc::new(RoboflowClient::new(config.roboflow.clone())),
            Arc::new(MySqlInferenceLogStore::new(pool.clone())),
            AlertService::new(Arc::new(MySqlAlertStore::new(pool))),
            Arc::new(BlynkClient::new(config.blynk.clone())),
        )
    }

    /// Ingestion port: detach the job onto the runtime and return
    /// immediately, so the upload response never waits on inference
    pub fn dispatch(&self, job: InferenceJob) -> tokio::task::JoinHandle<()> {
        let orchestrator = self.clone();
        tokio::spawn(async move {
            orchestrator.run_job(job).await;
        })
    }

    /// Run one job to a terminal outcome. Errors are recorded or logged,
    /// never returned.
    pub async fn run_job(&self, job: InferenceJob) {
        tracing::info!(
            device_code = %job.device_code,
            image_id = %job.image_id,
            "Inference job started"
        );

        match self.provider.submit(&job.image_path).await {
            Ok(raw) => self.complete_job(&job, raw).await,
            Err(e) => self.record_failure(&job, e).await,
        }
    }

    /// Success path: parse, persist, decide, drive alerts, push to dashboard
    async fn complete_job(&self, job: &InferenceJob, raw: serde_json::Value) {
        let summary = result_parser::parse(&raw);

        let record = InferenceRecord {
            id: Uuid::new_v4(),
            image_id: job.image_id,
            device_id: job.device_id,
            device_code: job.device_code.clone(),
            inferred_at: Utc::now(),
            raw_response: Some(raw),
            total_objects: summary.total_objects,
            total_larvae: summary.total_larvae,
            total_other: summary.total_other,
            avg_confidence: summary.avg_confidence,
            parser_version: Some(PARSER_VERSION.to_string()),
            status: RecordStatus::Success,
            error_message: None,
        };

        if let Err(e) = self.audit_log.append(record).await {
            tracing::error!(
                device_code = %job.device_code,
                image_id = %job.image_id,
                error = %e,
                "Failed to persist inference record, job lost"
            );
            return;
        }

        let decision = decision_engine::decide(summary.total_larvae);

        if let Err(e) = self.apply_alert_lifecycle(job, &summary).await {
            tracing::error!(
                device_code = %job.device_code,
                image_id = %job.image_id,
                error = %e,
                "Alert store failure, job lost"
            );
            return;
        }

        let update = self
            .dashboard
            .update_all(&job.device_code, decision.status.as_str(), summary.total_larvae)
            .await;

        tracing::info!(
            device_code = %job.device_code,
            image_id = %job.image_id,
            status = %decision.status,
            action = %decision.action,
            total_larvae = summary.total_larvae,
            total_objects = summary.total_objects,
            status_pushed = update.status_updated,
            count_pushed = update.count_updated,
            "Inference job completed"
        );
    }

    /// Check-and-create, then resolve-if-safe. Both run on every job;
    /// resolution is a no-op while the reading is unsafe.
    async fn apply_alert_lifecycle(
        &self,
        job: &InferenceJob,
        summary: &DetectionSummary,
    ) -> crate::Result<()> {
        if self
            .alerts
            .should_create_alert(&job.device_code, summary.total_larvae)
            .await?
        {
            self.alerts
                .create_alert(job.device_id, &job.device_code, summary.total_larvae)
                .await?;
        }

        self.alerts
            .resolve_alerts_if_safe(&job.device_code, summary.total_larvae)
            .await?;

        Ok(())
    }

    /// Failure branch: record the failed inference and signal the dashboard.
    /// Alert state is left untouched; a failed inference is not a safe reading.
    async fn record_failure(&self, job: &InferenceJob, error: Error) {
        tracing::warn!(
            device_code = %job.device_code,
            image_id = %job.image_id,
            error = %error,
            "Inference failed, recording failure"
        );

        let record = InferenceRecord {
            id: Uuid::new_v4(),
            image_id: job.image_id,
            device_id: job.device_id,
            device_code: job.device_code.clone(),
            inferred_at: Utc::now(),
            raw_response: None,
            total_objects: 0,
            total_larvae: 0,
            total_other: 0,
            avg_confidence: 0.0,
            parser_version: None,
            status: RecordStatus::Failed,
            error_message: Some(error.to_string()),
        };

        if let Err(e) = self.audit_log.append(record).await {
            tracing::error!(
                device_code = %job.device_code,
                image_id = %job.image_id,
                error = %e,
                "Failed to persist failure record, job lost"
            );
            return;
        }

        let pushed = self
            .dashboard
            .update_status(&job.device_code, ERROR_STATUS)
            .await;

        tracing::info!(
            device_code = %job.device_code,
            image_id = %job.image_id,
            error_pushed = pushed,
            "Inference failure recorded"
        );
    }
}
