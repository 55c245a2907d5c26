//! RoboflowClient - Inference Provider Adapter
//!
//! ## Responsibilities
//!
//! - Upload preprocessed images to Roboflow and return the raw response
//! - Support both provider APIs: serverless workflows and the legacy
//!   detection endpoint, selected from configuration
//! - Bounded request timeout; the response body is passed through opaque
//!   (shape interpretation belongs to the result parser)

use crate::config::RoboflowConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use std::path::Path;

/// Outbound inference provider port
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    /// Submit the stored image for inference and return the raw JSON response
    async fn submit(&self, image_path: &Path) -> Result<serde_json::Value>;
}

/// Which Roboflow API the client talks to
#[derive(Debug, Clone, PartialEq, Eq)]
enum ApiMode {
    /// Serverless workflow run: `{base}/{workspace}/{workflow_id}`
    Workflow { workspace: String, workflow_id: String },
    /// Legacy hosted detection: `{base}/{model_id}/{version}`
    Detection { model_id: String, version: u32 },
}

/// Roboflow HTTP client
pub struct RoboflowClient {
    client: reqwest::Client,
    config: RoboflowConfig,
    mode: Option<ApiMode>,
}

impl RoboflowClient {
    /// Create new Roboflow client.
    ///
    /// An incomplete configuration is not an error here; it surfaces as a
    /// provider failure on the first submit, which the orchestrator records
    /// like any other failed job.
    pub fn new(config: RoboflowConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        let mode = Self::resolve_mode(&config);
        match &mode {
            Some(ApiMode::Workflow { workspace, workflow_id }) => {
                tracing::info!(workspace = %workspace, workflow_id = %workflow_id, "Roboflow client in workflow mode");
            }
            Some(ApiMode::Detection { model_id, version }) => {
                tracing::info!(model_id = %model_id, version = version, "Roboflow client in detection mode");
            }
            None => {
                tracing::warn!("Roboflow not configured, inference submits will fail");
            }
        }

        Self { client, config, mode }
    }

    /// Workflow mode wins when both are configured, matching how devices are
    /// provisioned: the model id is only kept for pre-workflow deployments
    fn resolve_mode(config: &RoboflowConfig) -> Option<ApiMode> {
        if let (Some(workspace), Some(workflow_id)) = (&config.workspace, &config.workflow_id) {
            return Some(ApiMode::Workflow {
                workspace: workspace.clone(),
                workflow_id: workflow_id.clone(),
            });
        }
        config.model_id.as_ref().map(|model_id| ApiMode::Detection {
            model_id: model_id.clone(),
            version: config.model_version,
        })
    }

    async fn submit_workflow(
        &self,
        workspace: &str,
        workflow_id: &str,
        image: Vec<u8>,
    ) -> Result<serde_json::Value> {
        let url = format!("{}/{}/{}", self.config.workflow_base_url, workspace, workflow_id);

        let form = Form::new().part(
            "image",
            Part::bytes(image)
                .file_name("image.jpg")
                .mime_str("image/jpeg")?,
        );

        let resp = self
            .client
            .post(&url)
            .query(&[("api_key", self.config.api_key.as_str())])
            .multipart(form)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Provider(format!(
                "Roboflow workflow failed: {} - {}",
                status, body
            )));
        }

        Ok(resp.json().await?)
    }

    async fn submit_detection(
        &self,
        model_id: &str,
        version: u32,
        image: Vec<u8>,
    ) -> Result<serde_json::Value> {
        let url = format!("{}/{}/{}", self.config.detection_base_url, model_id, version);

        let form = Form::new().part(
            "file",
            Part::bytes(image)
                .file_name("image.jpg")
                .mime_str("image/jpeg")?,
        );

        let resp = self
            .client
            .post(&url)
            .query(&[
                ("api_key", self.config.api_key.as_str()),
                ("confidence", "40"),
                ("overlap", "30"),
            ])
            .multipart(form)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Provider(format!(
                "Roboflow detection failed: {} - {}",
                status, body
            )));
        }

        Ok(resp.json().await?)
    }
}

#[async_trait]
impl InferenceProvider for RoboflowClient {
    async fn submit(&self, image_path: &Path) -> Result<serde_json::Value> {
        if self.config.api_key.is_empty() {
            return Err(Error::Config("Roboflow API key not configured".to_string()));
        }

        let mode = self.mode.clone().ok_or_else(|| {
            Error::Config(
                "Roboflow not configured: need workspace + workflow_id, or model_id".to_string(),
            )
        })?;

        let image = tokio::fs::read(image_path).await?;

        tracing::debug!(
            image_path = %image_path.display(),
            bytes = image.len(),
            "Submitting image for inference"
        );

        match mode {
            ApiMode::Workflow { workspace, workflow_id } => {
                self.submit_workflow(&workspace, &workflow_id, image).await
            }
            ApiMode::Detection { model_id, version } => {
                self.submit_detection(&model_id, version, image).await
            }
        }
    }
}
