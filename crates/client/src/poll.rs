//! Trigger-and-poll orchestrator.
//!
//! Issues one trigger call, then polls the execution history on a fixed
//! interval for a bounded wall-clock budget, reconciling each page and
//! watching for the triggered execution to reach a terminal status
//! (COMPLETED or FAILED). The loop holds at
//! most one in-flight fetch at a time (a tick is skipped rather than
//! overlapped), treats per-fetch failures as transient, and is
//! cancellable from outside -- on cancellation it resolves immediately
//! and produces no completion value.

use std::time::Duration;

use ksi_core::{reconcile, ExecutionStatus, NormalizedExecution};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::api::{TriggerReceipt, ValidationApi};
use crate::error::TransportError;

// ──────────────────────────────────────────────
// Configuration & outcomes
// ──────────────────────────────────────────────

/// Timing knobs for one trigger-and-poll run.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Delay between history fetches.
    pub interval: Duration,
    /// Overall wall-clock budget; the loop stops when it elapses
    /// regardless of outcome.
    pub budget: Duration,
    /// Per-fetch timeout, independent of the overall budget. An elapsed
    /// fetch is a transient failure, retried on the next tick.
    pub fetch_timeout: Duration,
    /// Page size for each history fetch.
    pub page_limit: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        PollConfig {
            interval: Duration::from_secs(5),
            budget: Duration::from_secs(120),
            fetch_timeout: Duration::from_secs(30),
            page_limit: 25,
        }
    }
}

/// How a trigger-and-poll run ended.
#[derive(Debug, Clone)]
pub enum PollOutcome {
    /// The triggered execution appeared in the history with a COMPLETED
    /// status.
    Completed(NormalizedExecution),
    /// The triggered execution reached the terminal FAILED status;
    /// polling stopped early with the failed snapshot.
    Failed(NormalizedExecution),
    /// The budget elapsed first; `last_seen` is the best snapshot of the
    /// triggered execution observed so far, if any.
    TimedOut {
        last_seen: Option<NormalizedExecution>,
    },
    /// The caller cancelled the run (tenant switch, teardown).
    Cancelled,
    /// The trigger call itself failed; the receipt is synthesized and
    /// marked degraded, and no polling was performed.
    DegradedTrigger,
}

/// Receipt plus outcome for one run.
#[derive(Debug, Clone)]
pub struct PollResult {
    pub receipt: TriggerReceipt,
    pub outcome: PollOutcome,
}

// ──────────────────────────────────────────────
// Cancellation
// ──────────────────────────────────────────────

/// Caller-held handle that stops an in-flight poll loop.
///
/// Dropping the handle without calling [`cancel`](CancelHandle::cancel)
/// lets the loop run to its budget.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// The loop-side half of a cancellation pair.
#[derive(Debug)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    /// Resolves once the paired handle cancels. Never resolves if the
    /// handle is dropped without cancelling.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Create a linked cancellation pair.
pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelSignal { rx })
}

// ──────────────────────────────────────────────
// Orchestrator
// ──────────────────────────────────────────────

/// Trigger a validation run and await its completion.
///
/// On trigger transport failure, a locally generated receipt is returned
/// with `degraded = true` and no polling happens -- a run that did not
/// start is never reported as success.
pub async fn trigger_and_await(
    api: &dyn ValidationApi,
    tenant_id: &str,
    config: &PollConfig,
    mut cancel: CancelSignal,
) -> PollResult {
    let receipt = match api.trigger_validation(tenant_id, "dashboard").await {
        Ok(receipt) => receipt,
        Err(err) => {
            return PollResult {
                receipt: degraded_receipt(&err),
                outcome: PollOutcome::DegradedTrigger,
            };
        }
    };

    let deadline = tokio::time::Instant::now() + config.budget;
    let mut ticker = tokio::time::interval(config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last_seen: Option<NormalizedExecution> = None;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                return PollResult { receipt, outcome: PollOutcome::Cancelled };
            }
            _ = ticker.tick() => {}
        }
        if tokio::time::Instant::now() >= deadline {
            return PollResult {
                receipt,
                outcome: PollOutcome::TimedOut { last_seen },
            };
        }

        let fetch = api.fetch_execution_history(tenant_id, config.page_limit, None);
        let page = tokio::select! {
            _ = cancel.cancelled() => {
                return PollResult { receipt, outcome: PollOutcome::Cancelled };
            }
            outcome = tokio::time::timeout(config.fetch_timeout, fetch) => match outcome {
                Ok(Ok(page)) => page,
                // transient: transport failure or per-fetch timeout
                Ok(Err(_)) | Err(_) => continue,
            }
        };

        let reconciled = reconcile(&page.executions, tenant_id);
        if let Some(found) = reconciled
            .executions
            .into_iter()
            .find(|e| e.execution_id == receipt.execution_id)
        {
            match found.status {
                ExecutionStatus::Completed => {
                    return PollResult {
                        receipt,
                        outcome: PollOutcome::Completed(found),
                    };
                }
                // terminal: a failed run never becomes completed, so
                // waiting out the budget buys nothing
                ExecutionStatus::Failed => {
                    return PollResult {
                        receipt,
                        outcome: PollOutcome::Failed(found),
                    };
                }
                _ => last_seen = Some(found),
            }
        }
    }
}

fn degraded_receipt(err: &TransportError) -> TriggerReceipt {
    let now = time::OffsetDateTime::now_utc();
    let timestamp = now
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "unknown".to_string());
    TriggerReceipt {
        execution_id: format!(
            "degraded-{}-{:08x}",
            now.unix_timestamp(),
            rand::random::<u32>()
        ),
        status: "DEGRADED".to_string(),
        timestamp,
        degraded: true,
        message: Some(format!("trigger failed: {}", err)),
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
