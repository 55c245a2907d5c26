//! BlynkClient - Dashboard Notification Adapter
//!
//! ## Responsibilities
//!
//! - Push device status (pin V0), larva count (pin V1) and danger
//!   notifications to the Blynk cloud
//! - Best effort only: every call reports a bool and never propagates an
//!   error into the pipeline
//! - No configured token means the dashboard feature is off, not broken;
//!   calls return false without any network I/O

use crate::config::BlynkConfig;
use crate::decision_engine::DeviceStatus;
use async_trait::async_trait;

/// Per-field outcome of a combined dashboard push
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardUpdate {
    pub status_updated: bool,
    pub count_updated: bool,
    /// `None` when no danger notification was warranted
    pub notification_sent: Option<bool>,
}

/// Outbound dashboard port
#[async_trait]
pub trait Dashboard: Send + Sync {
    /// Push the status string for a device
    async fn update_status(&self, device_code: &str, status: &str) -> bool;

    /// Push the current larva count
    async fn update_larva_count(&self, count: u32) -> bool;

    /// Push a free-text notification to the app
    async fn send_notification(&self, message: &str) -> bool;

    /// Push status and count, plus a danger notification when warranted.
    /// All three are attempted independently; partial failure is reported
    /// per field, never escalated.
    async fn update_all(&self, device_code: &str, status: &str, count: u32) -> DashboardUpdate {
        let status_updated = self.update_status(device_code, status).await;
        let count_updated = self.update_larva_count(count).await;

        let notification_sent = if status == DeviceStatus::Danger.as_str() {
            Some(
                self.send_notification(&format!(
                    "WARNING: Larvae detected at {}! Count: {}",
                    device_code, count
                ))
                .await,
            )
        } else {
            None
        };

        DashboardUpdate {
            status_updated,
            count_updated,
            notification_sent,
        }
    }
}

/// Blynk cloud HTTP client
pub struct BlynkClient {
    client: reqwest::Client,
    config: BlynkConfig,
}

impl BlynkClient {
    /// Create new Blynk client
    pub fn new(config: BlynkConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to create HTTP client");

        if config.auth_token.is_none() {
            tracing::info!("Blynk token not configured, dashboard updates disabled");
        }

        Self { client, config }
    }

    /// GET against the external API; any failure collapses to false
    async fn get(&self, path: &str, params: &[(&str, &str)]) -> bool {
        let token = match &self.config.auth_token {
            Some(token) => token.clone(),
            None => return false,
        };

        let url = format!("{}/{}", self.config.base_url, path);
        let mut query: Vec<(&str, &str)> = vec![("token", token.as_str())];
        query.extend_from_slice(params);

        match self.client.get(&url).query(&query).send().await {
            Ok(resp) if resp.status().is_success() => true,
            Ok(resp) => {
                tracing::warn!(path = path, status = %resp.status(), "Blynk update rejected");
                false
            }
            Err(e) => {
                tracing::warn!(path = path, error = %e, "Blynk update failed");
                false
            }
        }
    }
}

#[async_trait]
impl Dashboard for BlynkClient {
    async fn update_status(&self, device_code: &str, status: &str) -> bool {
        let ok = self.get("update", &[("V0", status)]).await;
        tracing::debug!(device_code = device_code, status = status, ok = ok, "Status pushed");
        ok
    }

    async fn update_larva_count(&self, count: u32) -> bool {
        self.get("update", &[("V1", &count.to_string())]).await
    }

    async fn send_notification(&self, message: &str) -> bool {
        self.get("notify", &[("body", message)]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disabled_client() -> BlynkClient {
        BlynkClient::new(BlynkConfig::default())
    }

    #[tokio::test]
    async fn disabled_dashboard_returns_false_without_io() {
        let client = disabled_client();
        assert!(!client.update_status("AA-01", "DANGER").await);
        assert!(!client.update_larva_count(3).await);
        assert!(!client.send_notification("hello").await);
    }

    #[tokio::test]
    async fn update_all_reports_per_field_outcomes() {
        let client = disabled_client();

        let update = client.update_all("AA-01", "DANGER", 3).await;
        assert!(!update.status_updated);
        assert!(!update.count_updated);
        // Danger still attempts the notification, which is off
        assert_eq!(update.notification_sent, Some(false));

        let update = client.update_all("AA-01", "SAFE", 0).await;
        assert_eq!(update.notification_sent, None);
    }
}
