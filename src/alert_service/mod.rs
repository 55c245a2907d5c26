//! AlertService - Alert Lifecycle Management
//!
//! ## Responsibilities
//!
//! - At most one open alert per device (dedup on creation)
//! - Create a critical alert when larvae appear and none is open
//! - Auto-resolve every open alert once the device reads safe again
//!
//! Check and create are two separate store calls. Two concurrent jobs for the
//! same device can therefore momentarily open two alerts; `resolve_all_open`
//! closes every open alert in one statement, so the next safe reading restores
//! the invariant.

pub mod repository;

pub use repository::MySqlAlertStore;

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Alert type tag for larva detections
pub const ALERT_TYPE_LARVA: &str = "LARVA_DETECTED";

/// Alert severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Info,
    Warning,
    Critical,
}

impl AlertLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::Info => "info",
            AlertLevel::Warning => "warning",
            AlertLevel::Critical => "critical",
        }
    }
}

impl std::str::FromStr for AlertLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "info" => Ok(AlertLevel::Info),
            "warning" => Ok(AlertLevel::Warning),
            "critical" => Ok(AlertLevel::Critical),
            other => Err(format!("unknown alert level: {other}")),
        }
    }
}

/// Persisted alert record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub device_id: Uuid,
    pub device_code: String,
    pub alert_type: String,
    pub message: String,
    pub level: AlertLevel,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl Alert {
    pub fn is_open(&self) -> bool {
        self.resolved_at.is_none()
    }
}

/// Alert persistence port
#[async_trait]
pub trait AlertStore: Send + Sync {
    /// Find one open alert for the device, if any
    async fn find_open(&self, device_code: &str) -> Result<Option<Alert>>;

    /// Persist a new alert
    async fn insert(&self, alert: Alert) -> Result<Alert>;

    /// Stamp `resolved_at` on every open alert for the device, atomically.
    /// Returns the number of alerts resolved.
    async fn resolve_all_open(&self, device_code: &str, resolved_at: DateTime<Utc>) -> Result<u64>;
}

/// AlertService instance
#[derive(Clone)]
pub struct AlertService {
    store: Arc<dyn AlertStore>,
}

impl AlertService {
    /// Create new AlertService over an alert store
    pub fn new(store: Arc<dyn AlertStore>) -> Self {
        Self { store }
    }

    /// A new alert is warranted iff larvae were detected and no alert is
    /// currently open for this device
    pub async fn should_create_alert(&self, device_code: &str, total_larvae: u32) -> Result<bool> {
        if total_larvae == 0 {
            return Ok(false);
        }
        Ok(self.store.find_open(device_code).await?.is_none())
    }

    /// Create and persist a critical larva alert.
    ///
    /// The caller is expected to have consulted `should_create_alert` first;
    /// this does not re-check.
    pub async fn create_alert(
        &self,
        device_id: Uuid,
        device_code: &str,
        total_larvae: u32,
    ) -> Result<Alert> {
        let alert = Alert {
            id: Uuid::new_v4(),
            device_id,
            device_code: device_code.to_string(),
            alert_type: ALERT_TYPE_LARVA.to_string(),
            message: format!("Detected {} mosquito larvae", total_larvae),
            level: AlertLevel::Critical,
            created_at: Utc::now(),
            resolved_at: None,
        };

        let alert = self.store.insert(alert).await?;

        tracing::info!(
            device_code = %alert.device_code,
            alert_id = %alert.id,
            total_larvae = total_larvae,
            "Alert created"
        );

        Ok(alert)
    }

    /// Resolve every open alert for the device when the reading is safe.
    /// Returns the number of alerts resolved (0 when the reading is unsafe).
    pub async fn resolve_alerts_if_safe(&self, device_code: &str, total_larvae: u32) -> Result<u64> {
        if total_larvae > 0 {
            return Ok(0);
        }

        let resolved = self.store.resolve_all_open(device_code, Utc::now()).await?;
        if resolved > 0 {
            tracing::info!(
                device_code = device_code,
                resolved = resolved,
                "Open alerts auto-resolved"
            );
        }
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::Mutex;

    /// In-memory store used to exercise the lifecycle rules
    #[derive(Default)]
    struct MemoryAlertStore {
        alerts: Mutex<Vec<Alert>>,
    }

    #[async_trait]
    impl AlertStore for MemoryAlertStore {
        async fn find_open(&self, device_code: &str) -> Result<Option<Alert>> {
            let alerts = self.alerts.lock().await;
            Ok(alerts
                .iter()
                .find(|a| a.device_code == device_code && a.is_open())
                .cloned())
        }

        async fn insert(&self, alert: Alert) -> Result<Alert> {
            let mut alerts = self.alerts.lock().await;
            alerts.push(alert.clone());
            Ok(alert)
        }

        async fn resolve_all_open(
            &self,
            device_code: &str,
            resolved_at: DateTime<Utc>,
        ) -> Result<u64> {
            let mut alerts = self.alerts.lock().await;
            let mut affected = 0;
            for alert in alerts
                .iter_mut()
                .filter(|a| a.device_code == device_code && a.is_open())
            {
                alert.resolved_at = Some(resolved_at);
                affected += 1;
            }
            Ok(affected)
        }
    }

    fn service() -> (AlertService, Arc<MemoryAlertStore>) {
        let store = Arc::new(MemoryAlertStore::default());
        (AlertService::new(store.clone()), store)
    }

    #[tokio::test]
    async fn no_alert_for_zero_larvae() {
        let (service, _) = service();
        assert!(!service.should_create_alert("AA-01", 0).await.unwrap());

        // Still false with an alert already open
        service
            .create_alert(Uuid::new_v4(), "AA-01", 2)
            .await
            .unwrap();
        assert!(!service.should_create_alert("AA-01", 0).await.unwrap());
    }

    #[tokio::test]
    async fn alert_deduplicated_per_device() {
        let (service, _) = service();
        let device_id = Uuid::new_v4();

        assert!(service.should_create_alert("AA-01", 3).await.unwrap());
        service.create_alert(device_id, "AA-01", 3).await.unwrap();

        // Same device now suppressed, other devices unaffected
        assert!(!service.should_create_alert("AA-01", 3).await.unwrap());
        assert!(service.should_create_alert("BB-02", 3).await.unwrap());
    }

    #[tokio::test]
    async fn created_alert_is_critical_with_count_in_message() {
        let (service, _) = service();
        let alert = service
            .create_alert(Uuid::new_v4(), "AA-01", 4)
            .await
            .unwrap();
        assert_eq!(alert.level, AlertLevel::Critical);
        assert_eq!(alert.alert_type, ALERT_TYPE_LARVA);
        assert!(alert.message.contains('4'));
        assert!(alert.is_open());
    }

    #[tokio::test]
    async fn safe_reading_resolves_all_open_alerts() {
        let (service, store) = service();
        let device_id = Uuid::new_v4();

        // Two open alerts for one device, an invariant-violating state the
        // resolver must heal in one pass
        service.create_alert(device_id, "AA-01", 1).await.unwrap();
        service.create_alert(device_id, "AA-01", 2).await.unwrap();

        let resolved = service.resolve_alerts_if_safe("AA-01", 0).await.unwrap();
        assert_eq!(resolved, 2);

        let alerts = store.alerts.lock().await;
        assert!(alerts.iter().all(|a| !a.is_open()));
    }

    #[tokio::test]
    async fn unsafe_reading_resolves_nothing() {
        let (service, store) = service();
        service
            .create_alert(Uuid::new_v4(), "AA-01", 1)
            .await
            .unwrap();

        let resolved = service.resolve_alerts_if_safe("AA-01", 2).await.unwrap();
        assert_eq!(resolved, 0);

        let alerts = store.alerts.lock().await;
        assert!(alerts[0].is_open());
    }
}
