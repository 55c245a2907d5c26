//! Alert Repository
//!
//! MySQL adapter for the alert store port (`alerts` table). Resolution is a
//! single UPDATE over the open rows of one device, so it stays atomic with
//! respect to its filter condition.

use super::{Alert, AlertLevel, AlertStore};
use crate::error::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::MySqlPool;
use uuid::Uuid;

/// MySQL-backed alert store
#[derive(Clone)]
pub struct MySqlAlertStore {
    pool: MySqlPool,
}

impl MySqlAlertStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

/// Row shape of the `alerts` table
#[derive(Debug, sqlx::FromRow)]
struct AlertRow {
    id: String,
    device_id: String,
    device_code: String,
    alert_type: String,
    alert_message: String,
    alert_level: String,
    created_at: DateTime<Utc>,
    resolved_at: Option<DateTime<Utc>>,
}

impl TryFrom<AlertRow> for Alert {
    type Error = Error;

    fn try_from(row: AlertRow) -> Result<Self> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|e| Error::Database(format!("bad alert id {}: {}", row.id, e)))?;
        let device_id = Uuid::parse_str(&row.device_id)
            .map_err(|e| Error::Database(format!("bad device id {}: {}", row.device_id, e)))?;
        let level = row
            .alert_level
            .parse::<AlertLevel>()
            .map_err(Error::Database)?;

        Ok(Alert {
            id,
            device_id,
            device_code: row.device_code,
            alert_type: row.alert_type,
            message: row.alert_message,
            level,
            created_at: row.created_at,
            resolved_at: row.resolved_at,
        })
    }
}

#[async_trait]
impl AlertStore for MySqlAlertStore {
    async fn find_open(&self, device_code: &str) -> Result<Option<Alert>> {
        let row = sqlx::query_as::<_, AlertRow>(
            r#"
            SELECT
                id, device_id, device_code, alert_type, alert_message,
                alert_level, created_at, resolved_at
            FROM alerts
            WHERE device_code = ? AND resolved_at IS NULL
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(device_code)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        row.map(Alert::try_from).transpose()
    }

    async fn insert(&self, alert: Alert) -> Result<Alert> {
        sqlx::query(
            r#"
            INSERT INTO alerts
                (id, device_id, device_code, alert_type, alert_message,
                 alert_level, created_at, resolved_at)
            VALUES
                (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(alert.id.to_string())
        .bind(alert.device_id.to_string())
        .bind(&alert.device_code)
        .bind(&alert.alert_type)
        .bind(&alert.message)
        .bind(alert.level.as_str())
        .bind(alert.created_at)
        .bind(alert.resolved_at)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        tracing::debug!(alert_id = %alert.id, device_code = %alert.device_code, "Alert persisted");
        Ok(alert)
    }

    async fn resolve_all_open(&self, device_code: &str, resolved_at: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE alerts
            SET resolved_at = ?
            WHERE device_code = ? AND resolved_at IS NULL
            "#,
        )
        .bind(resolved_at)
        .bind(device_code)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        Ok(result.rows_affected())
    }
}
