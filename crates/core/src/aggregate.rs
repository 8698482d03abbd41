//! Compliance aggregator -- derives pass/fail counts, the overall pass
//! rate, per-category breakdown, and resource counters from one
//! normalized execution.
//!
//! The denominator is always the fixed five-validator set, regardless of
//! how many validators were requested. Derived output only; nothing here
//! is persisted.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::normalize;
use crate::types::{ExecutionStatus, NormalizedExecution, Validator, ValidatorStatus};

// ──────────────────────────────────────────────
// ComplianceOverview
// ──────────────────────────────────────────────

/// Per-category status in the overview. Extends [`ValidatorStatus`] with
/// `Pending` for validators that have not completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CategoryStatus {
    Success,
    Failed,
    Error,
    Pending,
}

/// One validator's entry in the overview.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryResult {
    pub status: CategoryStatus,
    pub passed: bool,
    pub data: serde_json::Value,
}

/// Resource counters summed across every validator's decoded payload.
/// Field names serialize the way the dashboard consumes them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceCounts {
    pub total: u64,
    pub subnets: u64,
    pub hosted_zones: u64,
    pub kms_keys: u64,
    pub secrets_manager_secrets: u64,
    pub iam_users: u64,
    pub iam_roles: u64,
    pub iam_policies: u64,
    pub cloudtrail_trails: u64,
    pub cloudwatch_alarms: u64,
    pub sns_topics: u64,
    pub cloudformation_stacks: u64,
}

/// The aggregated, execution-scoped compliance summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceOverview {
    /// Always the fixed set size (5).
    pub total_validators: u32,
    pub passed_validators: u32,
    pub failed_validators: u32,
    /// Integer percentage 0–100, `round(100 * passed / total)`.
    pub overall_pass_rate: u32,
    pub category_results: BTreeMap<Validator, CategoryResult>,
    pub aws_resources: ResourceCounts,
}

// ──────────────────────────────────────────────
// Aggregation
// ──────────────────────────────────────────────

/// Compute the compliance overview for one normalized execution.
///
/// A validator absent from the execution's results is PENDING, not
/// FAILED -- unless the execution's overall status is FAILED, in which
/// case absent validators are reported as FAILED. Pending validators
/// count toward neither passed nor failed.
pub fn aggregate(execution: &NormalizedExecution) -> ComplianceOverview {
    let total = Validator::ALL.len() as u32;
    let mut passed = 0u32;
    let mut failed = 0u32;
    let mut category_results = BTreeMap::new();
    let mut aws_resources = ResourceCounts::default();

    for validator in Validator::ALL {
        let result = execution
            .validation_results
            .iter()
            .find(|r| r.validator == validator);
        match result {
            Some(r) => {
                let status = match r.status {
                    ValidatorStatus::Success => CategoryStatus::Success,
                    ValidatorStatus::Failed => CategoryStatus::Failed,
                    ValidatorStatus::Error => CategoryStatus::Error,
                };
                let did_pass = r.status == ValidatorStatus::Success;
                if did_pass {
                    passed += 1;
                } else {
                    failed += 1;
                }
                count_resources(&mut aws_resources, &r.data);
                category_results.insert(
                    validator,
                    CategoryResult {
                        status,
                        passed: did_pass,
                        data: r.data.clone(),
                    },
                );
            }
            None => {
                let status = if execution.status == ExecutionStatus::Failed {
                    failed += 1;
                    CategoryStatus::Failed
                } else {
                    CategoryStatus::Pending
                };
                category_results.insert(
                    validator,
                    CategoryResult {
                        status,
                        passed: false,
                        data: normalize::missing_marker(),
                    },
                );
            }
        }
    }

    ComplianceOverview {
        total_validators: total,
        passed_validators: passed,
        failed_validators: failed,
        overall_pass_rate: ((passed as f64 / total as f64) * 100.0).round() as u32,
        category_results,
        aws_resources,
    }
}

/// Sum recognized resource arrays from one result's decoded payload,
/// whether they sit at the payload top level or nested under an
/// `aws_resources` object. Unrecognized fields are ignored.
fn count_resources(counts: &mut ResourceCounts, data: &serde_json::Value) {
    let Some(obj) = data.as_object() else {
        return;
    };
    accumulate(counts, obj);
    if let Some(nested) = obj.get("aws_resources").and_then(|v| v.as_object()) {
        accumulate(counts, nested);
    }
}

fn accumulate(counts: &mut ResourceCounts, obj: &serde_json::Map<String, serde_json::Value>) {
    for (key, value) in obj {
        let Some(len) = value.as_array().map(|a| a.len() as u64) else {
            continue;
        };
        let slot = match key.as_str() {
            "subnets" => &mut counts.subnets,
            "hosted_zones" => &mut counts.hosted_zones,
            "kms_keys" => &mut counts.kms_keys,
            "secrets" => &mut counts.secrets_manager_secrets,
            "iam_users" => &mut counts.iam_users,
            "iam_roles" => &mut counts.iam_roles,
            "iam_policies" => &mut counts.iam_policies,
            "cloudtrail_trails" => &mut counts.cloudtrail_trails,
            "cloudwatch_alarms" => &mut counts.cloudwatch_alarms,
            "sns_topics" => &mut counts.sns_topics,
            "cloudformation_stacks" => &mut counts.cloudformation_stacks,
            _ => continue,
        };
        *slot += len;
        counts.total += len;
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
