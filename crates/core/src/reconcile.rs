//! Execution reconciler -- merges heterogeneously-shaped raw records into
//! a single, tenant-scoped, de-duplicated list of normalized executions.
//!
//! Two ingestion paths feed one merge policy:
//! - individual validator records are grouped by base execution id and
//!   synthesized into execution aggregates;
//! - execution-summary records pass through directly (and win over a
//!   synthesized aggregate with the same base id, since the summary is
//!   authoritative about final status).
//!
//! The transform is pure and idempotent: re-running it on its own
//! serialized output is a no-op.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};

use crate::diag::{Diagnostic, DiagnosticKind};
use crate::normalize;
use crate::record::{self, RecordShape};
use crate::scope;
use crate::types::{
    ExecutionStatus, NormalizedExecution, NormalizedValidatorResult, Validator, ValidatorStatus,
};

/// Result of one reconciliation pass: the normalized executions
/// (newest first) plus every recovered failure.
#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub executions: Vec<NormalizedExecution>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Reconcile a raw record set for one tenant scope.
///
/// Infallible by design: malformed input degrades into diagnostics and
/// placeholder payloads, never an error or a panic.
pub fn reconcile(records: &[serde_json::Value], tenant_id: &str) -> Reconciliation {
    let mut diagnostics = Vec::new();

    if !scope::is_wildcard(tenant_id) {
        for rec in records {
            if record::tenant_id(rec).is_none() {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::MissingTenant,
                    record::record_id(rec),
                    "record has no tenant_id and was excluded from the scoped set",
                ));
            }
        }
    }
    let scoped = scope::scope(records, tenant_id);

    let mut summaries: Vec<NormalizedExecution> = Vec::new();
    let mut group_order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, SyntheticGroup> = HashMap::new();

    for rec in &scoped {
        match record::classify(rec) {
            Ok(RecordShape::ExecutionSummary { execution_id }) => {
                let execution = summary_to_execution(rec, execution_id, &mut diagnostics);
                merge_summary(&mut summaries, execution);
            }
            Ok(RecordShape::ValidatorResult { base_id, ksi_id }) => {
                if !groups.contains_key(&base_id) {
                    group_order.push(base_id.clone());
                }
                let group = groups.entry(base_id).or_default();
                group.fold(rec, ksi_id, &mut diagnostics);
            }
            Err(err) => {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::UnknownShape,
                    record::record_id(rec),
                    err.to_string(),
                ));
            }
        }
    }

    // Summaries are authoritative: drop a synthesized aggregate whose
    // base id also appears as a summary.
    let summary_ids: HashSet<String> = summaries
        .iter()
        .map(|e| e.execution_id.clone())
        .collect();

    let mut executions: Vec<NormalizedExecution> = Vec::new();
    for base_id in group_order {
        if summary_ids.contains(&base_id) {
            continue;
        }
        if let Some(group) = groups.remove(&base_id) {
            executions.push(group.into_execution(base_id));
        }
    }
    executions.extend(summaries);

    sort_newest_first(&mut executions);

    Reconciliation {
        executions,
        diagnostics,
    }
}

/// Sort newest first; executions with missing or unparseable timestamps
/// sort last, not first.
fn sort_newest_first(executions: &mut [NormalizedExecution]) {
    executions.sort_by(|a, b| {
        match (
            record::parse_timestamp(&a.timestamp),
            record::parse_timestamp(&b.timestamp),
        ) {
            (Some(ta), Some(tb)) => tb.cmp(&ta),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    });
}

/// Two summaries for the same execution id collapse into one; the one
/// with the later timestamp wins.
fn merge_summary(summaries: &mut Vec<NormalizedExecution>, execution: NormalizedExecution) {
    if let Some(existing) = summaries
        .iter_mut()
        .find(|e| e.execution_id == execution.execution_id)
    {
        let incoming = record::parse_timestamp(&execution.timestamp);
        let current = record::parse_timestamp(&existing.timestamp);
        if incoming > current {
            *existing = execution;
        }
    } else {
        summaries.push(execution);
    }
}

// ──────────────────────────────────────────────
// Synthesized aggregates (individual validator records)
// ──────────────────────────────────────────────

#[derive(Default)]
struct SyntheticGroup {
    tenant_id: String,
    timestamp_raw: String,
    timestamp: Option<time::OffsetDateTime>,
    completed: Vec<Validator>,
    requested: Vec<Validator>,
    results: HashMap<Validator, (Option<time::OffsetDateTime>, NormalizedValidatorResult)>,
    ksi_ids: BTreeSet<String>,
}

impl SyntheticGroup {
    /// Fold one individual validator record into the group.
    ///
    /// Duplicate validator entries resolve last-write-wins by timestamp:
    /// the most recent record's outcome replaces an earlier one.
    fn fold(&mut self, raw: &serde_json::Value, ksi_id: String, diagnostics: &mut Vec<Diagnostic>) {
        let mut rec = raw.clone();
        let composite = record::record_id(raw).map(str::to_string);
        for issue in normalize::normalize_record(&mut rec) {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::DecodeFailure,
                composite.as_deref(),
                format!("field '{}' failed to decode", issue.field),
            ));
        }

        let Some(validator) = record::validator_of(&rec, Some(&ksi_id)) else {
            diagnostics.push(Diagnostic::new(
                DiagnosticKind::UnknownValidator,
                composite.as_deref(),
                "record names no validator in the fixed set",
            ));
            return;
        };

        if self.tenant_id.is_empty() {
            if let Some(tenant) = record::tenant_id(&rec) {
                self.tenant_id = tenant.to_string();
            }
        }

        let ts_raw = record::timestamp(&rec).unwrap_or("").to_string();
        let ts = record::parse_timestamp(&ts_raw);
        let newer = match (ts, self.timestamp) {
            (Some(a), Some(b)) => a > b,
            (Some(_), None) => true,
            (None, _) => self.timestamp_raw.is_empty() && !ts_raw.is_empty(),
        };
        if newer {
            self.timestamp = ts;
            self.timestamp_raw = ts_raw;
        }

        self.ksi_ids.insert(ksi_id.clone());
        if !self.completed.contains(&validator) {
            self.completed.push(validator);
        }
        for v in requested_validators(&rec) {
            if !self.requested.contains(&v) {
                self.requested.push(v);
            }
        }
        if !self.requested.contains(&validator) {
            self.requested.push(validator);
        }

        let result = build_validator_result(&rec, validator, ksi_id);
        match self.results.get(&validator) {
            Some((existing_ts, _)) if ts.cmp(existing_ts) == Ordering::Less => {
                // older duplicate; the existing outcome stands
            }
            _ => {
                self.results.insert(validator, (ts, result));
            }
        }
    }

    fn into_execution(mut self, base_id: String) -> NormalizedExecution {
        let validation_results = self
            .completed
            .iter()
            .filter_map(|v| self.results.remove(v).map(|(_, r)| r))
            .collect();
        NormalizedExecution {
            execution_id: base_id,
            tenant_id: self.tenant_id,
            status: ExecutionStatus::Completed,
            timestamp: self.timestamp_raw,
            validators_completed: self.completed,
            validators_requested: self.requested,
            total_ksis_validated: self.ksi_ids.len() as u64,
            validation_results,
        }
    }
}

/// Build the normalized result for one individual validator record.
/// Status derives from the assertion: SUCCESS iff `assertion == true`.
fn build_validator_result(
    rec: &serde_json::Value,
    validator: Validator,
    ksi_id: String,
) -> NormalizedValidatorResult {
    let data = payload_of(rec);
    let assertion = assertion_of(rec, &data);
    let reason = reason_of(rec, &data);
    let status = if assertion == Some(true) {
        ValidatorStatus::Success
    } else {
        ValidatorStatus::Failed
    };
    NormalizedValidatorResult {
        validator,
        status,
        assertion,
        reason,
        ksi_id,
        data,
    }
}

// ──────────────────────────────────────────────
// Summary pass-through
// ──────────────────────────────────────────────

/// Convert an execution-summary record directly, normalizing any
/// embedded validation results and aligning them one-to-one with the
/// declared completed validators.
fn summary_to_execution(
    raw: &serde_json::Value,
    execution_id: String,
    diagnostics: &mut Vec<Diagnostic>,
) -> NormalizedExecution {
    let mut rec = raw.clone();
    for issue in normalize::normalize_record(&mut rec) {
        diagnostics.push(Diagnostic::new(
            DiagnosticKind::DecodeFailure,
            Some(&execution_id),
            format!("field '{}' failed to decode", issue.field),
        ));
    }

    let tenant_id = record::tenant_id(&rec).unwrap_or("").to_string();
    let status = rec
        .get("status")
        .and_then(serde_json::Value::as_str)
        .map(ExecutionStatus::parse)
        .unwrap_or(ExecutionStatus::Unknown);
    let timestamp = record::timestamp(&rec).unwrap_or("").to_string();

    let mut completed =
        validator_list(&rec, "validators_completed", &execution_id, diagnostics);
    let requested = if rec.get("validators_requested").is_some() {
        validator_list(&rec, "validators_requested", &execution_id, diagnostics)
    } else {
        completed.clone()
    };

    let mut results: Vec<NormalizedValidatorResult> = Vec::new();
    if let Some(entries) = rec
        .get("validation_results")
        .and_then(serde_json::Value::as_array)
    {
        for entry in entries {
            let mut entry = entry.clone();
            for issue in normalize::normalize_record(&mut entry) {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::DecodeFailure,
                    Some(&execution_id),
                    format!("embedded result field '{}' failed to decode", issue.field),
                ));
            }
            let ksi_id = embedded_ksi_id(&entry);
            let Some(validator) = record::validator_of(&entry, Some(&ksi_id)) else {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::UnknownValidator,
                    Some(&execution_id),
                    "embedded result names no validator in the fixed set",
                ));
                continue;
            };
            // one result per validator; a later duplicate entry replaces
            // the earlier one
            results.retain(|r| r.validator != validator);
            results.push(embedded_result(&entry, validator, ksi_id));
        }
    }

    // Align results with the declared completed set (the invariant the
    // aggregator relies on): a result without a declared validator adds
    // it; a declared validator without a result gets a placeholder.
    for result in &results {
        if !completed.contains(&result.validator) {
            completed.push(result.validator);
        }
    }
    for validator in &completed {
        if !results.iter().any(|r| r.validator == *validator) {
            results.push(placeholder_result(*validator, status));
        }
    }
    // keep results in completed order
    results.sort_by_key(|r| {
        completed
            .iter()
            .position(|v| v == &r.validator)
            .unwrap_or(usize::MAX)
    });

    let total_ksis_validated = rec
        .get("total_ksis_validated")
        .and_then(serde_json::Value::as_u64)
        .unwrap_or(results.len() as u64);

    NormalizedExecution {
        execution_id,
        tenant_id,
        status,
        timestamp,
        validators_completed: completed,
        validators_requested: requested,
        total_ksis_validated,
        validation_results: results,
    }
}

/// Normalized result for an embedded summary entry. Unlike individual
/// validator records, summary entries may carry an explicit status
/// (the orchestrator writes SUCCESS/ERROR for invocation outcomes),
/// which takes priority over the assertion-derived one.
fn embedded_result(
    entry: &serde_json::Value,
    validator: Validator,
    ksi_id: String,
) -> NormalizedValidatorResult {
    let data = payload_of(entry);
    let assertion = assertion_of(entry, &data);
    let reason = reason_of(entry, &data);
    let status = entry
        .get("status")
        .and_then(serde_json::Value::as_str)
        .and_then(ValidatorStatus::parse)
        .unwrap_or(if assertion == Some(true) {
            ValidatorStatus::Success
        } else {
            ValidatorStatus::Failed
        });
    NormalizedValidatorResult {
        validator,
        status,
        assertion,
        reason,
        ksi_id,
        data,
    }
}

/// Placeholder for a validator declared completed without an embedded
/// result: the outcome is unknown, not failed -- unless the execution
/// itself failed.
fn placeholder_result(
    validator: Validator,
    execution_status: ExecutionStatus,
) -> NormalizedValidatorResult {
    let status = if execution_status == ExecutionStatus::Failed {
        ValidatorStatus::Failed
    } else {
        ValidatorStatus::Error
    };
    NormalizedValidatorResult {
        validator,
        status,
        assertion: None,
        reason: String::new(),
        ksi_id: String::new(),
        data: normalize::missing_marker(),
    }
}

// ──────────────────────────────────────────────
// Field extraction helpers
// ──────────────────────────────────────────────

/// The decoded payload for one validator contribution, preferring this
/// engine's own `data` spelling (required for idempotence), then the
/// upstream spellings.
fn payload_of(rec: &serde_json::Value) -> serde_json::Value {
    for candidate in ["data", "validation_result"] {
        if let Some(value) = rec.get(candidate) {
            if !value.is_null() {
                return value.clone();
            }
        }
    }
    if let Some(body) = rec.get("result").and_then(|r| r.get("body")) {
        if !body.is_null() {
            return body.clone();
        }
    }
    normalize::missing_marker()
}

fn assertion_of(rec: &serde_json::Value, data: &serde_json::Value) -> Option<bool> {
    data.get("assertion")
        .and_then(serde_json::Value::as_bool)
        .or_else(|| rec.get("assertion").and_then(serde_json::Value::as_bool))
}

fn reason_of(rec: &serde_json::Value, data: &serde_json::Value) -> String {
    for source in [data, rec] {
        for field in ["assertion_reason", "reason"] {
            if let Some(reason) = source.get(field).and_then(serde_json::Value::as_str) {
                return reason.to_string();
            }
        }
    }
    String::new()
}

fn embedded_ksi_id(entry: &serde_json::Value) -> String {
    if let Some(ksi_id) = entry.get("ksi_id").and_then(serde_json::Value::as_str) {
        return ksi_id.to_string();
    }
    // entries copied from individual records keep their composite id
    if let Some(id) = record::record_id(entry) {
        if let Some((_, ksi)) = id.split_once(record::COMPOSITE_SEPARATOR) {
            return ksi.to_string();
        }
    }
    String::new()
}

/// Parse a field holding a list of validator names into a deduplicated,
/// first-seen-order list.
fn validator_list(
    rec: &serde_json::Value,
    field: &str,
    execution_id: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<Validator> {
    let mut out = Vec::new();
    let Some(entries) = rec.get(field).and_then(serde_json::Value::as_array) else {
        return out;
    };
    for entry in entries {
        match entry.as_str().and_then(Validator::parse) {
            Some(validator) => {
                if !out.contains(&validator) {
                    out.push(validator);
                }
            }
            None => diagnostics.push(Diagnostic::new(
                DiagnosticKind::UnknownValidator,
                Some(execution_id),
                format!("'{}' entry {} is not a known validator", field, entry),
            )),
        }
    }
    out
}

/// Validator names a record claims were requested, if it carries any.
fn requested_validators(rec: &serde_json::Value) -> Vec<Validator> {
    let mut out = Vec::new();
    if let Some(entries) = rec
        .get("validators_requested")
        .and_then(serde_json::Value::as_array)
    {
        for entry in entries {
            if let Some(v) = entry.as_str().and_then(Validator::parse) {
                if !out.contains(&v) {
                    out.push(v);
                }
            }
        }
    }
    out
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn validator_record(
        composite_id: &str,
        validator: &str,
        tenant: &str,
        assertion: bool,
        timestamp: &str,
    ) -> serde_json::Value {
        serde_json::json!({
            "execution_id": composite_id,
            "validator": validator,
            "tenant_id": tenant,
            "timestamp": timestamp,
            "validation_result": {
                "assertion": assertion,
                "assertion_reason": if assertion { "checks passed" } else { "checks failed" }
            }
        })
    }

    #[test]
    fn two_validator_records_synthesize_one_execution() {
        let records = vec![
            validator_record("E1#KSI-CNA-01", "cna", "t1", true, "2025-07-29T10:00:00Z"),
            validator_record("E1#KSI-IAM-01", "iam", "t1", false, "2025-07-29T10:00:05Z"),
        ];
        let out = reconcile(&records, "t1");
        assert_eq!(out.executions.len(), 1);
        let exec = &out.executions[0];
        assert_eq!(exec.execution_id, "E1");
        assert_eq!(exec.tenant_id, "t1");
        assert_eq!(exec.status, ExecutionStatus::Completed);
        assert_eq!(exec.timestamp, "2025-07-29T10:00:05Z");
        assert_eq!(
            exec.validators_completed,
            vec![Validator::Cna, Validator::Iam]
        );
        assert_eq!(exec.total_ksis_validated, 2);
        assert_eq!(exec.validation_results.len(), 2);
        assert_eq!(exec.validation_results[0].status, ValidatorStatus::Success);
        assert_eq!(exec.validation_results[1].status, ValidatorStatus::Failed);
        assert_eq!(exec.validation_results[1].reason, "checks failed");
    }

    #[test]
    fn duplicate_validator_resolves_last_write_wins_by_timestamp() {
        let records = vec![
            validator_record("E1#KSI-CNA-01", "cna", "t1", true, "2025-07-29T10:00:10Z"),
            // older record arrives later in the batch; it must not win
            validator_record("E1#KSI-CNA-01", "cna", "t1", false, "2025-07-29T10:00:00Z"),
        ];
        let out = reconcile(&records, "t1");
        let exec = &out.executions[0];
        assert_eq!(exec.validators_completed, vec![Validator::Cna]);
        assert_eq!(exec.validation_results.len(), 1);
        assert_eq!(exec.validation_results[0].assertion, Some(true));
    }

    #[test]
    fn validators_completed_matches_results_length() {
        let records = vec![
            validator_record("E1#KSI-CNA-01", "cna", "t1", true, "2025-07-29T10:00:00Z"),
            validator_record("E1#KSI-CNA-02", "cna", "t1", true, "2025-07-29T10:00:01Z"),
            validator_record("E1#KSI-SVC-01", "svc", "t1", true, "2025-07-29T10:00:02Z"),
        ];
        let out = reconcile(&records, "t1");
        let exec = &out.executions[0];
        assert_eq!(
            exec.validators_completed.len(),
            exec.validation_results.len()
        );
        // distinct composite ids, not distinct validators
        assert_eq!(exec.total_ksis_validated, 3);
    }

    #[test]
    fn summary_record_wins_over_synthesized_aggregate() {
        let records = vec![
            validator_record("E1#KSI-CNA-01", "cna", "t1", true, "2025-07-29T10:00:00Z"),
            serde_json::json!({
                "execution_id": "E1",
                "tenant_id": "t1",
                "status": "FAILED",
                "timestamp": "2025-07-29T10:05:00Z",
                "validators_completed": ["cna"]
            }),
        ];
        let out = reconcile(&records, "t1");
        assert_eq!(out.executions.len(), 1);
        assert_eq!(out.executions[0].status, ExecutionStatus::Failed);
    }

    #[test]
    fn tenant_scope_drops_foreign_records() {
        let records = vec![
            serde_json::json!({
                "execution_id": "E2",
                "tenant_id": "t2",
                "status": "COMPLETED",
                "timestamp": "2025-07-29T10:00:00Z"
            }),
            validator_record("E1#KSI-CNA-01", "cna", "t1", true, "2025-07-29T10:00:00Z"),
        ];
        let out = reconcile(&records, "t1");
        assert_eq!(out.executions.len(), 1);
        assert_eq!(out.executions[0].execution_id, "E1");
        assert!(out.executions.iter().all(|e| e.tenant_id == "t1"));
    }

    #[test]
    fn wildcard_scope_keeps_all_tenants() {
        let records = vec![
            validator_record("E1#KSI-CNA-01", "cna", "t1", true, "2025-07-29T10:00:00Z"),
            validator_record("E2#KSI-IAM-01", "iam", "t2", true, "2025-07-29T11:00:00Z"),
        ];
        let out = reconcile(&records, "all");
        assert_eq!(out.executions.len(), 2);
    }

    #[test]
    fn shapeless_records_become_diagnostics_not_errors() {
        let records = vec![
            serde_json::json!({"tenant_id": "t1", "noise": true}),
            validator_record("E1#KSI-CNA-01", "cna", "t1", true, "2025-07-29T10:00:00Z"),
        ];
        let out = reconcile(&records, "all");
        assert_eq!(out.executions.len(), 1);
        assert_eq!(out.diagnostics.len(), 1);
        assert_eq!(out.diagnostics[0].kind, DiagnosticKind::UnknownShape);
    }

    #[test]
    fn stringified_payload_is_decoded_before_assertion_extraction() {
        let body = serde_json::json!({"assertion": true, "assertion_reason": "ok"}).to_string();
        let records = vec![serde_json::json!({
            "execution_id": "E1#KSI-MLA-01",
            "tenant_id": "t1",
            "timestamp": "2025-07-29T10:00:00Z",
            "validation_result": body
        })];
        let out = reconcile(&records, "t1");
        let result = &out.executions[0].validation_results[0];
        assert_eq!(result.validator, Validator::Mla);
        assert_eq!(result.assertion, Some(true));
        assert_eq!(result.reason, "ok");
        assert!(result.data.is_object());
    }

    #[test]
    fn malformed_payload_yields_failed_result_with_placeholder() {
        let records = vec![serde_json::json!({
            "execution_id": "E1#KSI-CMT-01",
            "tenant_id": "t1",
            "timestamp": "2025-07-29T10:00:00Z",
            "validation_result": "{broken json"
        })];
        let out = reconcile(&records, "t1");
        let result = &out.executions[0].validation_results[0];
        assert_eq!(result.status, ValidatorStatus::Failed);
        assert_eq!(result.data["error"], "decode-error");
        assert!(out
            .diagnostics
            .iter()
            .any(|d| d.kind == DiagnosticKind::DecodeFailure));
    }

    #[test]
    fn sorted_newest_first_with_unparseable_timestamps_last() {
        let records = vec![
            serde_json::json!({
                "execution_id": "OLD", "tenant_id": "t1", "status": "COMPLETED",
                "timestamp": "2025-07-28T10:00:00Z"
            }),
            serde_json::json!({
                "execution_id": "BROKEN-TS", "tenant_id": "t1", "status": "COMPLETED",
                "timestamp": "garbage"
            }),
            serde_json::json!({
                "execution_id": "NEW", "tenant_id": "t1", "status": "COMPLETED",
                "timestamp": "2025-07-29T10:00:00Z"
            }),
        ];
        let out = reconcile(&records, "t1");
        let ids: Vec<&str> = out
            .executions
            .iter()
            .map(|e| e.execution_id.as_str())
            .collect();
        assert_eq!(ids, vec!["NEW", "OLD", "BROKEN-TS"]);
    }

    #[test]
    fn summary_aligns_completed_with_embedded_results() {
        let records = vec![serde_json::json!({
            "execution_id": "E1",
            "tenant_id": "t1",
            "status": "COMPLETED",
            "timestamp": "2025-07-29T10:00:00Z",
            "validators_completed": ["cna", "svc"],
            "validation_results": [
                {"validator": "cna", "ksi_id": "KSI-CNA-01", "assertion": true}
            ]
        })];
        let out = reconcile(&records, "t1");
        let exec = &out.executions[0];
        assert_eq!(
            exec.validators_completed.len(),
            exec.validation_results.len()
        );
        // svc was declared completed but carried no result: placeholder,
        // outcome unknown rather than failed
        let svc = exec
            .validation_results
            .iter()
            .find(|r| r.validator == Validator::Svc)
            .unwrap();
        assert_eq!(svc.status, ValidatorStatus::Error);
        assert_eq!(svc.data, normalize::missing_marker());
    }

    #[test]
    fn reconcile_is_idempotent_on_its_own_output() {
        let records = vec![
            validator_record("E1#KSI-CNA-01", "cna", "t1", true, "2025-07-29T10:00:00Z"),
            validator_record("E1#KSI-IAM-01", "iam", "t1", false, "2025-07-29T10:00:05Z"),
            serde_json::json!({
                "execution_id": "E2",
                "tenant_id": "t1",
                "status": "FAILED",
                "timestamp": "2025-07-29T11:00:00Z",
                "validators_completed": ["mla"],
                "validation_results": [
                    {"validator": "mla", "ksi_id": "KSI-MLA-01", "assertion": false,
                     "reason": "alarms missing"}
                ]
            }),
        ];
        let first = reconcile(&records, "t1");
        let reserialized: Vec<serde_json::Value> = first
            .executions
            .iter()
            .map(|e| serde_json::to_value(e).unwrap())
            .collect();
        let second = reconcile(&reserialized, "t1");
        assert_eq!(first.executions, second.executions);
        assert!(second.diagnostics.is_empty());
    }

    #[test]
    fn missing_tenant_under_scoped_request_is_diagnosed() {
        let records = vec![serde_json::json!({
            "execution_id": "E1", "status": "COMPLETED",
            "timestamp": "2025-07-29T10:00:00Z"
        })];
        let out = reconcile(&records, "t1");
        assert!(out.executions.is_empty());
        assert_eq!(out.diagnostics[0].kind, DiagnosticKind::MissingTenant);
    }
}
