//! Raw record accessors and the shape classifier.
//!
//! Upstream validator services write records under inconsistent,
//! evolving shapes: execution summaries keyed by a bare id, and
//! per-validator records keyed by a composite `<base_id>#<ksi_id>` id.
//! There is no explicit type tag, so the shape is decided ONCE here, at
//! the ingestion boundary, instead of re-inspecting structure at every
//! call site.

use crate::types::Validator;

/// Separator between the base execution id and the KSI id in a
/// composite identifier.
pub const COMPOSITE_SEPARATOR: char = '#';

// ──────────────────────────────────────────────
// RecordShape
// ──────────────────────────────────────────────

/// The shape of a raw upstream record, decided once at ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordShape {
    /// A summary of a whole execution, keyed by its bare id.
    ExecutionSummary { execution_id: String },
    /// One validator's contribution, keyed by `<base_id>#<ksi_id>`.
    ValidatorResult { base_id: String, ksi_id: String },
}

/// A record that matches neither known shape. Such records are dropped
/// with a diagnostic, never a batch abort.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShapeError {
    #[error("record has no identifier field")]
    MissingId,
    #[error("malformed composite identifier: '{id}'")]
    MalformedCompositeId { id: String },
    #[error("record '{id}' has a bare identifier but no status field")]
    MissingStatus { id: String },
}

/// Classify a raw record by structure.
///
/// An identifier containing the composite separator marks an individual
/// validator record; a bare identifier plus a `status` field marks an
/// execution summary.
pub fn classify(record: &serde_json::Value) -> Result<RecordShape, ShapeError> {
    let id = record_id(record).ok_or(ShapeError::MissingId)?;
    if let Some((base, ksi)) = id.split_once(COMPOSITE_SEPARATOR) {
        if base.is_empty() || ksi.is_empty() {
            return Err(ShapeError::MalformedCompositeId { id: id.to_string() });
        }
        return Ok(RecordShape::ValidatorResult {
            base_id: base.to_string(),
            ksi_id: ksi.to_string(),
        });
    }
    if record.get("status").is_some() {
        return Ok(RecordShape::ExecutionSummary {
            execution_id: id.to_string(),
        });
    }
    Err(ShapeError::MissingStatus { id: id.to_string() })
}

// ──────────────────────────────────────────────
// Field accessors
// ──────────────────────────────────────────────

/// The record's identifier: `execution_id`, falling back to `id`.
pub fn record_id(record: &serde_json::Value) -> Option<&str> {
    record
        .get("execution_id")
        .and_then(serde_json::Value::as_str)
        .or_else(|| record.get("id").and_then(serde_json::Value::as_str))
}

pub fn tenant_id(record: &serde_json::Value) -> Option<&str> {
    record.get("tenant_id").and_then(serde_json::Value::as_str)
}

pub fn timestamp(record: &serde_json::Value) -> Option<&str> {
    record.get("timestamp").and_then(serde_json::Value::as_str)
}

/// The record's validator category: `validator`, falling back to
/// `validator_type`, falling back to the KSI id prefix
/// (`KSI-CNA-01` → `cna`) when a composite id is available.
pub fn validator_of(record: &serde_json::Value, ksi_id: Option<&str>) -> Option<Validator> {
    record
        .get("validator")
        .and_then(serde_json::Value::as_str)
        .or_else(|| {
            record
                .get("validator_type")
                .and_then(serde_json::Value::as_str)
        })
        .and_then(Validator::parse)
        .or_else(|| ksi_id.and_then(validator_from_ksi_id))
}

/// Derive the validator category from a KSI identifier, the way the
/// upstream orchestrator groups KSIs (`KSI-CNA-01` → `cna`).
pub fn validator_from_ksi_id(ksi_id: &str) -> Option<Validator> {
    let mut parts = ksi_id.split('-');
    if !parts.next()?.eq_ignore_ascii_case("KSI") {
        return None;
    }
    Validator::parse(parts.next()?)
}

/// Parse an RFC 3339 timestamp. Unparseable or empty timestamps are
/// `None`, never a panic -- they sort last downstream.
pub fn parse_timestamp(raw: &str) -> Option<time::OffsetDateTime> {
    if raw.is_empty() {
        return None;
    }
    time::OffsetDateTime::parse(raw, &time::format_description::well_known::Rfc3339).ok()
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_id_classifies_as_validator_result() {
        let record = serde_json::json!({"execution_id": "E1#KSI-CNA-01", "tenant_id": "t1"});
        assert_eq!(
            classify(&record).unwrap(),
            RecordShape::ValidatorResult {
                base_id: "E1".to_string(),
                ksi_id: "KSI-CNA-01".to_string(),
            }
        );
    }

    #[test]
    fn bare_id_with_status_classifies_as_summary() {
        let record = serde_json::json!({"execution_id": "E1", "status": "COMPLETED"});
        assert_eq!(
            classify(&record).unwrap(),
            RecordShape::ExecutionSummary {
                execution_id: "E1".to_string(),
            }
        );
    }

    #[test]
    fn bare_id_without_status_is_rejected() {
        let record = serde_json::json!({"execution_id": "E1", "tenant_id": "t1"});
        assert!(matches!(
            classify(&record),
            Err(ShapeError::MissingStatus { .. })
        ));
    }

    #[test]
    fn record_without_identifier_is_rejected() {
        let record = serde_json::json!({"status": "COMPLETED"});
        assert_eq!(classify(&record), Err(ShapeError::MissingId));
    }

    #[test]
    fn empty_composite_halves_are_rejected() {
        let record = serde_json::json!({"execution_id": "#KSI-CNA-01"});
        assert!(matches!(
            classify(&record),
            Err(ShapeError::MalformedCompositeId { .. })
        ));

        let record = serde_json::json!({"execution_id": "E1#"});
        assert!(matches!(
            classify(&record),
            Err(ShapeError::MalformedCompositeId { .. })
        ));
    }

    #[test]
    fn id_falls_back_to_plain_id_field() {
        let record = serde_json::json!({"id": "E2", "status": "RUNNING"});
        assert_eq!(record_id(&record), Some("E2"));
    }

    #[test]
    fn validator_from_ksi_id_prefix() {
        assert_eq!(validator_from_ksi_id("KSI-CNA-01"), Some(Validator::Cna));
        assert_eq!(validator_from_ksi_id("KSI-MLA-07"), Some(Validator::Mla));
        assert_eq!(validator_from_ksi_id("KSI-XYZ-01"), None);
        assert_eq!(validator_from_ksi_id("CNA-01"), None);
        assert_eq!(validator_from_ksi_id(""), None);
    }

    #[test]
    fn validator_field_takes_priority_over_ksi_prefix() {
        let record = serde_json::json!({"validator": "iam"});
        assert_eq!(
            validator_of(&record, Some("KSI-CNA-01")),
            Some(Validator::Iam)
        );
    }

    #[test]
    fn validator_type_spelling_is_accepted() {
        let record = serde_json::json!({"validator_type": "SVC"});
        assert_eq!(validator_of(&record, None), Some(Validator::Svc));
    }

    #[test]
    fn timestamps_parse_or_sort_out() {
        assert!(parse_timestamp("2025-07-29T15:30:14Z").is_some());
        assert!(parse_timestamp("2025-07-29T15:30:14.123456+00:00").is_some());
        assert!(parse_timestamp("not-a-timestamp").is_none());
        assert!(parse_timestamp("").is_none());
    }
}
