//! HTTP implementation of [`ValidationApi`] against the dashboard's
//! `/api/ksi` endpoints.
//!
//! Uses `ureq` (sync) wrapped in `tokio::task::spawn_blocking` to avoid
//! blocking the async runtime. Every request carries its own timeout,
//! independent of any outer poll budget. Query values go through ureq's
//! query-pair API, which percent-encodes them; pagination cursors carry
//! raw JSON text (including `#` from composite ids) and must survive the
//! round trip intact. Upstream response envelopes come in more than one
//! shape (`{success, data: {...}}` and bare), so extraction is tolerant
//! of both.

use async_trait::async_trait;
use std::time::Duration;

use crate::api::{ExecutionHistoryPage, TenantInfo, TriggerReceipt, ValidationApi};
use crate::error::TransportError;

/// Default per-request timeout.
const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the upstream validation store.
///
/// - `base_url` is required (e.g. `https://dashboard.example.com`)
/// - bearer token from [`HttpValidationApi::with_auth_token`] or the
///   `KSI_API_AUTH_TOKEN` env var
pub struct HttpValidationApi {
    base_url: String,
    auth_token: Option<String>,
    fetch_timeout: Duration,
}

impl HttpValidationApi {
    pub fn new(base_url: &str) -> Self {
        HttpValidationApi {
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token: std::env::var("KSI_API_AUTH_TOKEN").ok(),
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    pub fn with_auth_token(mut self, token: &str) -> Self {
        self.auth_token = Some(token.to_string());
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    async fn get_json(
        &self,
        path: &str,
        params: Vec<(&'static str, String)>,
    ) -> Result<serde_json::Value, TransportError> {
        let url = format!("{}{}", self.base_url, path);
        let auth_token = self.auth_token.clone();

        let task = tokio::task::spawn_blocking(move || {
            let agent = ureq::Agent::new_with_defaults();
            let mut request = agent.get(&url);
            for (key, value) in &params {
                request = request.query(*key, value);
            }
            if let Some(ref token) = auth_token {
                request = request.header("Authorization", &format!("Bearer {}", token));
            }
            let response = request.call().map_err(map_ureq_error)?;
            response
                .into_body()
                .read_json::<serde_json::Value>()
                .map_err(|e| TransportError::Decode(e.to_string()))
        });
        self.await_with_timeout(task).await
    }

    async fn post_json(
        &self,
        path: &str,
        payload: serde_json::Value,
    ) -> Result<serde_json::Value, TransportError> {
        let url = format!("{}{}", self.base_url, path);
        let auth_token = self.auth_token.clone();

        let task = tokio::task::spawn_blocking(move || {
            let agent = ureq::Agent::new_with_defaults();
            let mut request = agent.post(&url);
            if let Some(ref token) = auth_token {
                request = request.header("Authorization", &format!("Bearer {}", token));
            }
            let response = request.send_json(&payload).map_err(map_ureq_error)?;
            response
                .into_body()
                .read_json::<serde_json::Value>()
                .map_err(|e| TransportError::Decode(e.to_string()))
        });
        self.await_with_timeout(task).await
    }

    async fn await_with_timeout(
        &self,
        task: tokio::task::JoinHandle<Result<serde_json::Value, TransportError>>,
    ) -> Result<serde_json::Value, TransportError> {
        match tokio::time::timeout(self.fetch_timeout, task).await {
            Ok(joined) => joined
                .map_err(|e| TransportError::Network(format!("task join error: {}", e)))?,
            Err(_) => Err(TransportError::Timeout {
                seconds: self.fetch_timeout.as_secs(),
            }),
        }
    }
}

fn map_ureq_error(err: ureq::Error) -> TransportError {
    match err {
        ureq::Error::StatusCode(429) => TransportError::RateLimited,
        ureq::Error::StatusCode(403) => TransportError::Forbidden,
        ureq::Error::StatusCode(status) if status >= 500 => TransportError::Server { status },
        other => TransportError::Network(other.to_string()),
    }
}

#[async_trait]
impl ValidationApi for HttpValidationApi {
    async fn fetch_tenants(&self) -> Result<Vec<TenantInfo>, TransportError> {
        let value = self.get_json("/api/ksi/tenants", Vec::new()).await?;
        tenants_from(&value)
    }

    async fn fetch_execution_history(
        &self,
        tenant_id: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<ExecutionHistoryPage, TransportError> {
        let value = self
            .get_json("/api/ksi/executions", history_query(tenant_id, limit, cursor))
            .await?;
        Ok(history_from(&value))
    }

    async fn fetch_validation_results(
        &self,
        tenant_id: Option<&str>,
        execution_id: Option<&str>,
    ) -> Result<Vec<serde_json::Value>, TransportError> {
        let value = self
            .get_json("/api/ksi/results", results_query(tenant_id, execution_id))
            .await?;
        Ok(results_from(&value))
    }

    async fn trigger_validation(
        &self,
        tenant_id: &str,
        source: &str,
    ) -> Result<TriggerReceipt, TransportError> {
        let payload = serde_json::json!({
            "tenant_id": tenant_id,
            "trigger_source": source,
        });
        let value = self.post_json("/api/ksi/validate", payload).await?;
        receipt_from(&value)
    }
}

// ──────────────────────────────────────────────
// Query construction
// ──────────────────────────────────────────────

/// Query pairs for a history fetch. The cursor is passed as one opaque
/// pair value; percent-encoding (it may hold raw JSON with `#` inside
/// composite ids) happens when the pair is attached to the request.
fn history_query(
    tenant_id: &str,
    limit: u32,
    cursor: Option<&str>,
) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if !ksi_core::scope::is_wildcard(tenant_id) {
        params.push(("tenant_id", tenant_id.to_string()));
    }
    params.push(("limit", limit.to_string()));
    if let Some(cursor) = cursor {
        params.push(("start_key", cursor.to_string()));
    }
    params
}

fn results_query(
    tenant_id: Option<&str>,
    execution_id: Option<&str>,
) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if let Some(tenant_id) = tenant_id {
        params.push(("tenant_id", tenant_id.to_string()));
    }
    if let Some(execution_id) = execution_id {
        params.push(("execution_id", execution_id.to_string()));
    }
    params
}

// ──────────────────────────────────────────────
// Envelope extraction
// ──────────────────────────────────────────────

/// The payload object: `data` when the envelope wraps one, else the
/// value itself.
fn payload_of(value: &serde_json::Value) -> &serde_json::Value {
    value.get("data").filter(|d| d.is_object()).unwrap_or(value)
}

fn tenants_from(value: &serde_json::Value) -> Result<Vec<TenantInfo>, TransportError> {
    let tenants = payload_of(value)
        .get("tenants")
        .cloned()
        .unwrap_or(serde_json::Value::Array(Vec::new()));
    serde_json::from_value(tenants).map_err(|e| TransportError::Decode(e.to_string()))
}

fn history_from(value: &serde_json::Value) -> ExecutionHistoryPage {
    let payload = payload_of(value);
    let executions = payload
        .get("executions")
        .and_then(serde_json::Value::as_array)
        .cloned()
        .unwrap_or_default();
    let next_cursor = payload
        .get("last_evaluated_key")
        .filter(|v| !v.is_null())
        .map(|v| match v.as_str() {
            Some(s) => s.to_string(),
            None => v.to_string(),
        });
    ExecutionHistoryPage {
        executions,
        next_cursor,
    }
}

fn results_from(value: &serde_json::Value) -> Vec<serde_json::Value> {
    let payload = payload_of(value);
    for field in ["validation_results", "results"] {
        if let Some(results) = payload.get(field).and_then(serde_json::Value::as_array) {
            return results.clone();
        }
    }
    Vec::new()
}

fn receipt_from(value: &serde_json::Value) -> Result<TriggerReceipt, TransportError> {
    let payload = payload_of(value);
    let execution_id = payload
        .get("execution_id")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| {
            TransportError::Decode("trigger response carries no execution_id".to_string())
        })?;
    let status = payload
        .get("status")
        .and_then(serde_json::Value::as_str)
        .unwrap_or("PENDING");
    let timestamp = payload
        .get("timestamp")
        .and_then(serde_json::Value::as_str)
        .unwrap_or("");
    Ok(TriggerReceipt {
        execution_id: execution_id.to_string(),
        status: status.to_string(),
        timestamp: timestamp.to_string(),
        degraded: false,
        message: payload
            .get("message")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string),
    })
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
