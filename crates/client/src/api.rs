//! The validation API seam.
//!
//! Everything the engine consumes from upstream goes through
//! [`ValidationApi`]; the HTTP implementation lives in
//! [`http`](crate::http), and [`StaticValidationApi`] serves tests and
//! offline callers with fixed pages.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::TransportError;

// ──────────────────────────────────────────────
// Response records
// ──────────────────────────────────────────────

/// One tenant known to the upstream store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantInfo {
    pub tenant_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ksi_count: Option<u32>,
}

/// One page of raw execution-history records. The records are untyped;
/// shape is decided by `ksi_core` at ingestion.
#[derive(Debug, Clone, Default)]
pub struct ExecutionHistoryPage {
    pub executions: Vec<serde_json::Value>,
    pub next_cursor: Option<String>,
}

/// Receipt for a trigger call.
///
/// `degraded` marks a receipt synthesized locally after the trigger
/// transport failed -- a degraded outcome is reported as degraded, never
/// masqueraded as success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerReceipt {
    pub execution_id: String,
    pub status: String,
    pub timestamp: String,
    #[serde(default)]
    pub degraded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// ──────────────────────────────────────────────
// Trait
// ──────────────────────────────────────────────

/// Asynchronous access to the upstream validation store.
///
/// Implementations own transport details only; all record reconciliation
/// stays in `ksi-core`, downstream of this seam.
#[async_trait]
pub trait ValidationApi: Send + Sync {
    /// List the tenants available for scoping.
    async fn fetch_tenants(&self) -> Result<Vec<TenantInfo>, TransportError>;

    /// Fetch one page of raw execution-history records for a tenant
    /// scope (wildcard scopes fetch across tenants).
    async fn fetch_execution_history(
        &self,
        tenant_id: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<ExecutionHistoryPage, TransportError>;

    /// Fetch raw per-validator result records, optionally filtered by
    /// tenant and execution.
    async fn fetch_validation_results(
        &self,
        tenant_id: Option<&str>,
        execution_id: Option<&str>,
    ) -> Result<Vec<serde_json::Value>, TransportError>;

    /// Start a new validation run for a tenant.
    async fn trigger_validation(
        &self,
        tenant_id: &str,
        source: &str,
    ) -> Result<TriggerReceipt, TransportError>;
}

// ──────────────────────────────────────────────
// StaticValidationApi
// ──────────────────────────────────────────────

/// A validation API that returns fixed data on every call.
///
/// A `None` receipt makes `trigger_validation` fail with a transport
/// error, which is how tests exercise the degraded-trigger path.
#[derive(Debug, Clone, Default)]
pub struct StaticValidationApi {
    pub tenants: Vec<TenantInfo>,
    pub executions: Vec<serde_json::Value>,
    pub results: Vec<serde_json::Value>,
    pub receipt: Option<TriggerReceipt>,
}

#[async_trait]
impl ValidationApi for StaticValidationApi {
    async fn fetch_tenants(&self) -> Result<Vec<TenantInfo>, TransportError> {
        Ok(self.tenants.clone())
    }

    async fn fetch_execution_history(
        &self,
        _tenant_id: &str,
        _limit: u32,
        _cursor: Option<&str>,
    ) -> Result<ExecutionHistoryPage, TransportError> {
        Ok(ExecutionHistoryPage {
            executions: self.executions.clone(),
            next_cursor: None,
        })
    }

    async fn fetch_validation_results(
        &self,
        _tenant_id: Option<&str>,
        _execution_id: Option<&str>,
    ) -> Result<Vec<serde_json::Value>, TransportError> {
        Ok(self.results.clone())
    }

    async fn trigger_validation(
        &self,
        _tenant_id: &str,
        _source: &str,
    ) -> Result<TriggerReceipt, TransportError> {
        self.receipt
            .clone()
            .ok_or_else(|| TransportError::Network("trigger endpoint unavailable".to_string()))
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_api_returns_fixed_pages() {
        let api = StaticValidationApi {
            tenants: vec![TenantInfo {
                tenant_id: "t1".to_string(),
                display_name: Some("Tenant One".to_string()),
                ksi_count: Some(5),
            }],
            executions: vec![serde_json::json!({"execution_id": "E1", "status": "COMPLETED"})],
            ..Default::default()
        };

        let tenants = api.fetch_tenants().await.unwrap();
        assert_eq!(tenants.len(), 1);
        assert_eq!(tenants[0].tenant_id, "t1");

        let page = api.fetch_execution_history("t1", 10, None).await.unwrap();
        assert_eq!(page.executions.len(), 1);
        assert!(page.next_cursor.is_none());
    }

    #[tokio::test]
    async fn static_api_without_receipt_fails_trigger() {
        let api = StaticValidationApi::default();
        let err = api.trigger_validation("t1", "manual").await.unwrap_err();
        assert!(matches!(err, TransportError::Network(_)));
    }

    #[test]
    fn tenant_info_tolerates_missing_optional_fields() {
        let info: TenantInfo =
            serde_json::from_value(serde_json::json!({"tenant_id": "t9"})).unwrap();
        assert_eq!(info.tenant_id, "t9");
        assert!(info.display_name.is_none());
        assert!(info.ksi_count.is_none());
    }
}
