//! Normalized entity types for the reconciliation engine.
//!
//! These types are DISTINCT from the raw upstream records. Raw records
//! arrive as untyped `serde_json::Value` objects under at least three
//! incompatible shapes; everything in this module is the single
//! consistent shape the rest of the system consumes.

use serde::{Deserialize, Serialize};
use std::fmt;

// ──────────────────────────────────────────────
// Validator
// ──────────────────────────────────────────────

/// One of the five fixed compliance-check categories.
///
/// The set is closed: every execution is judged against exactly these
/// five validators regardless of how many were requested or completed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Validator {
    /// Configuration & Network Architecture
    Cna,
    /// Service Configuration
    Svc,
    /// Identity & Access Management
    Iam,
    /// Monitoring, Logging & Alerting
    Mla,
    /// Configuration Management & Tracking
    Cmt,
}

impl Validator {
    /// The full fixed validator set, in canonical order.
    pub const ALL: [Validator; 5] = [
        Validator::Cna,
        Validator::Svc,
        Validator::Iam,
        Validator::Mla,
        Validator::Cmt,
    ];

    /// Canonical lower-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Validator::Cna => "cna",
            Validator::Svc => "svc",
            Validator::Iam => "iam",
            Validator::Mla => "mla",
            Validator::Cmt => "cmt",
        }
    }

    /// Parse a validator name, case-insensitively.
    ///
    /// Returns `None` for anything outside the fixed set -- callers drop
    /// the offending record with a diagnostic rather than guessing.
    pub fn parse(name: &str) -> Option<Validator> {
        match name.to_ascii_lowercase().as_str() {
            "cna" => Some(Validator::Cna),
            "svc" => Some(Validator::Svc),
            "iam" => Some(Validator::Iam),
            "mla" => Some(Validator::Mla),
            "cmt" => Some(Validator::Cmt),
            _ => None,
        }
    }
}

impl fmt::Display for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ──────────────────────────────────────────────
// Statuses
// ──────────────────────────────────────────────

/// Overall status of one execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExecutionStatus {
    Completed,
    Running,
    Failed,
    Pending,
    Unknown,
}

impl ExecutionStatus {
    /// Parse an upstream status string, case-insensitively.
    /// Unrecognized values map to `Unknown`, never an error.
    pub fn parse(raw: &str) -> ExecutionStatus {
        match raw.to_ascii_uppercase().as_str() {
            "COMPLETED" => ExecutionStatus::Completed,
            "RUNNING" => ExecutionStatus::Running,
            "FAILED" => ExecutionStatus::Failed,
            "PENDING" => ExecutionStatus::Pending,
            _ => ExecutionStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Completed => "COMPLETED",
            ExecutionStatus::Running => "RUNNING",
            ExecutionStatus::Failed => "FAILED",
            ExecutionStatus::Pending => "PENDING",
            ExecutionStatus::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one validator's contribution to an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ValidatorStatus {
    /// The validator asserted pass.
    Success,
    /// The validator asserted fail, or produced no true assertion.
    Failed,
    /// The validator ran but produced no usable assertion.
    Error,
}

impl ValidatorStatus {
    /// Parse an explicit status string. Returns `None` when the value is
    /// not one of the known statuses (callers fall back to deriving the
    /// status from the assertion).
    pub fn parse(raw: &str) -> Option<ValidatorStatus> {
        match raw.to_ascii_uppercase().as_str() {
            "SUCCESS" => Some(ValidatorStatus::Success),
            "FAILED" => Some(ValidatorStatus::Failed),
            "ERROR" => Some(ValidatorStatus::Error),
            _ => None,
        }
    }
}

// ──────────────────────────────────────────────
// Normalized entities
// ──────────────────────────────────────────────

/// One validator's normalized outcome within an execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedValidatorResult {
    pub validator: Validator,
    pub status: ValidatorStatus,
    /// The validator's boolean pass/fail judgment, when one was produced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assertion: Option<bool>,
    /// Human-readable reason accompanying the assertion. Empty when the
    /// upstream record carried none.
    pub reason: String,
    pub ksi_id: String,
    /// Fully-decoded structured payload. Never a JSON-encoded string;
    /// absent payloads are the explicit missing marker.
    pub data: serde_json::Value,
}

/// The reconciled view of one end-to-end validation run.
///
/// Invariant: `validation_results` and `validators_completed` are aligned
/// one-to-one -- one normalized result per completed validator, no
/// duplicate validator entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedExecution {
    /// Base execution id -- composite separator stripped.
    pub execution_id: String,
    pub tenant_id: String,
    pub status: ExecutionStatus,
    /// Latest contributing raw timestamp, kept as the raw string.
    pub timestamp: String,
    /// Deduplicated, first-seen order.
    pub validators_completed: Vec<Validator>,
    pub validators_requested: Vec<Validator>,
    /// Count of distinct per-validator records folded into this execution.
    pub total_ksis_validated: u64,
    pub validation_results: Vec<NormalizedValidatorResult>,
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validator_parse_is_case_insensitive() {
        assert_eq!(Validator::parse("CNA"), Some(Validator::Cna));
        assert_eq!(Validator::parse("iam"), Some(Validator::Iam));
        assert_eq!(Validator::parse("Mla"), Some(Validator::Mla));
        assert_eq!(Validator::parse("unknown"), None);
        assert_eq!(Validator::parse(""), None);
    }

    #[test]
    fn validator_serializes_to_canonical_name() {
        assert_eq!(
            serde_json::to_value(Validator::Svc).unwrap(),
            serde_json::json!("svc")
        );
    }

    #[test]
    fn execution_status_unrecognized_maps_to_unknown() {
        assert_eq!(ExecutionStatus::parse("completed"), ExecutionStatus::Completed);
        assert_eq!(ExecutionStatus::parse("IN_PROGRESS"), ExecutionStatus::Unknown);
        assert_eq!(ExecutionStatus::parse(""), ExecutionStatus::Unknown);
    }

    #[test]
    fn validator_status_parse_falls_through() {
        assert_eq!(ValidatorStatus::parse("success"), Some(ValidatorStatus::Success));
        assert_eq!(ValidatorStatus::parse("PASS"), None);
    }
}
