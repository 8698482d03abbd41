//! I/O boundary for the reconciliation engine -- typed access to the
//! upstream validation store plus the cancellable trigger-and-poll
//! orchestrator.
//!
//! The engine itself (`ksi-core`) is pure; this crate owns every
//! suspension point: fetches, the trigger call, timers, and
//! cancellation. Raw records cross the seam as `serde_json::Value` and
//! are reconciled downstream.

pub mod api;
pub mod error;
pub mod http;
pub mod poll;

pub use api::{ExecutionHistoryPage, StaticValidationApi, TenantInfo, TriggerReceipt, ValidationApi};
pub use error::TransportError;
pub use http::HttpValidationApi;
pub use poll::{
    cancel_pair, CancelHandle, CancelSignal, PollConfig, PollOutcome, PollResult,
    trigger_and_await,
};

// ──────────────────────────────────────────────
// Integration tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod integration_tests {
    use super::*;
    use ksi_core::{aggregate, reconcile};

    /// Fetch → reconcile → aggregate, end to end over the seam.
    #[tokio::test]
    async fn fetched_history_reconciles_and_aggregates() {
        let api = StaticValidationApi {
            executions: vec![
                serde_json::json!({
                    "execution_id": "E1#KSI-CNA-01",
                    "validator": "cna",
                    "tenant_id": "t1",
                    "timestamp": "2025-07-29T10:00:00Z",
                    "validation_result": {"assertion": true}
                }),
                serde_json::json!({
                    "execution_id": "E1#KSI-IAM-01",
                    "validator": "iam",
                    "tenant_id": "t1",
                    "timestamp": "2025-07-29T10:00:05Z",
                    "validation_result": {"assertion": false, "assertion_reason": "mfa missing"}
                }),
            ],
            ..Default::default()
        };

        let page = api.fetch_execution_history("t1", 25, None).await.unwrap();
        let out = reconcile(&page.executions, "t1");
        assert_eq!(out.executions.len(), 1);

        let overview = aggregate(&out.executions[0]);
        assert_eq!(overview.overall_pass_rate, 20);
    }
}
